//! Handler tests: the router driven end-to-end with `oneshot` requests
//! against an in-memory store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::IntoResponse as _,
};
use mbdf_core::{Error as ElectionError, engine::ElectionEngine, policy::Role};
use mbdf_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::util::ServiceExt as _;
use uuid::Uuid;

use crate::{ApiError, api_router};

struct App {
  router: Router,
  room:   Uuid,
  member: Uuid,
}

async fn app() -> App {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  let shared = Arc::new(store.clone());
  let engine = Arc::new(ElectionEngine::new(
    Arc::clone(&shared),
    Arc::clone(&shared),
    shared,
  ));

  let room = Uuid::new_v4();
  let member = Uuid::new_v4();
  store.add_member(room, member, Role::Member).await.unwrap();

  App { router: api_router(engine), room, member }
}

fn request(
  method: &str,
  uri: &str,
  user: Option<Uuid>,
  body: Option<Value>,
) -> Request<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    builder = builder.header("x-user-id", user.to_string());
  }
  match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  }
}

async fn body_json(response: axum::response::Response) -> Value {
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_user_header_is_unauthorized() {
  let app = app().await;
  let response = app
    .router
    .oneshot(request(
      "POST",
      &format!("/rooms/{}/candidates", app.room),
      None,
      Some(json!({ "user_id": Uuid::new_v4() })),
    ))
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
  let body = body_json(response).await;
  assert_eq!(body["error"]["kind"], "unauthorized");
}

#[tokio::test]
async fn nominate_then_duplicate_conflicts() {
  let app = app().await;
  let nominee = Uuid::new_v4();
  let uri = format!("/rooms/{}/candidates", app.room);

  let response = app
    .router
    .clone()
    .oneshot(request(
      "POST",
      &uri,
      Some(app.member),
      Some(json!({ "user_id": nominee })),
    ))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::CREATED);
  let body = body_json(response).await;
  assert_eq!(body["user_id"], json!(nominee));
  assert_eq!(body["is_selected"], json!(false));

  let response = app
    .router
    .oneshot(request(
      "POST",
      &uri,
      Some(app.member),
      Some(json!({ "user_id": nominee })),
    ))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::CONFLICT);
  let body = body_json(response).await;
  assert_eq!(body["error"]["kind"], "already_candidate");
}

#[tokio::test]
async fn list_candidates_in_nomination_order() {
  let app = app().await;
  let uri = format!("/rooms/{}/candidates", app.room);
  for _ in 0..2 {
    let response = app
      .router
      .clone()
      .oneshot(request(
        "POST",
        &uri,
        Some(app.member),
        Some(json!({ "user_id": Uuid::new_v4() })),
      ))
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
  }

  let response = app
    .router
    .oneshot(request("GET", &uri, None, None))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  let body = body_json(response).await;
  assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_score_is_bad_request() {
  let app = app().await;
  let nominate = app
    .router
    .clone()
    .oneshot(request(
      "POST",
      &format!("/rooms/{}/candidates", app.room),
      Some(app.member),
      Some(json!({ "user_id": Uuid::new_v4() })),
    ))
    .await
    .unwrap();
  let candidate = body_json(nominate).await;

  let response = app
    .router
    .oneshot(request(
      "POST",
      &format!("/rooms/{}/votes", app.room),
      Some(app.member),
      Some(json!({
        "candidate_id": candidate["candidate_id"],
        "scores": {
          "technical": 6, "experience": 3, "availability": 3,
          "communication": 3, "leadership": 3
        },
      })),
    ))
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  let body = body_json(response).await;
  assert_eq!(body["error"]["kind"], "invalid_score");
}

#[tokio::test]
async fn vote_before_window_opens_conflicts() {
  let app = app().await;
  let nominate = app
    .router
    .clone()
    .oneshot(request(
      "POST",
      &format!("/rooms/{}/candidates", app.room),
      Some(app.member),
      Some(json!({ "user_id": Uuid::new_v4() })),
    ))
    .await
    .unwrap();
  let candidate = body_json(nominate).await;

  let response = app
    .router
    .oneshot(request(
      "POST",
      &format!("/rooms/{}/votes", app.room),
      Some(app.member),
      Some(json!({
        "candidate_id": candidate["candidate_id"],
        "scores": {
          "technical": 3, "experience": 3, "availability": 3,
          "communication": 3, "leadership": 3
        },
      })),
    ))
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::CONFLICT);
  let body = body_json(response).await;
  assert_eq!(body["error"]["kind"], "voting_not_started");
  assert!(body["error"]["opens_at"].is_string());
}

#[tokio::test]
async fn outsider_vote_is_forbidden() {
  let app = app().await;
  let nominate = app
    .router
    .clone()
    .oneshot(request(
      "POST",
      &format!("/rooms/{}/candidates", app.room),
      Some(app.member),
      Some(json!({ "user_id": Uuid::new_v4() })),
    ))
    .await
    .unwrap();
  let candidate = body_json(nominate).await;

  let response = app
    .router
    .oneshot(request(
      "POST",
      &format!("/rooms/{}/votes", app.room),
      Some(Uuid::new_v4()),
      Some(json!({
        "candidate_id": candidate["candidate_id"],
        "scores": {
          "technical": 3, "experience": 3, "availability": 3,
          "communication": 3, "leadership": 3
        },
      })),
    ))
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::FORBIDDEN);
  let body = body_json(response).await;
  assert_eq!(body["error"]["kind"], "access_denied");
}

#[tokio::test]
async fn standings_for_empty_room() {
  let app = app().await;
  let response = app
    .router
    .oneshot(request(
      "GET",
      &format!("/rooms/{}/standings", app.room),
      Some(app.member),
      None,
    ))
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::OK);
  let body = body_json(response).await;
  assert_eq!(body["results"], json!([]));
  assert_eq!(body["is_finalized"], json!(false));
  assert_eq!(body["window"], Value::Null);
}

#[tokio::test]
async fn finalize_without_votes_conflicts() {
  let app = app().await;
  let nominate = app
    .router
    .clone()
    .oneshot(request(
      "POST",
      &format!("/rooms/{}/candidates", app.room),
      Some(app.member),
      Some(json!({ "user_id": Uuid::new_v4() })),
    ))
    .await
    .unwrap();
  let candidate = body_json(nominate).await;

  let response = app
    .router
    .oneshot(request(
      "POST",
      &format!("/rooms/{}/finalize", app.room),
      Some(app.member),
      Some(json!({ "candidate_id": candidate["candidate_id"] })),
    ))
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::CONFLICT);
  let body = body_json(response).await;
  assert_eq!(body["error"]["kind"], "no_votes_cast");
}

#[tokio::test]
async fn remove_candidate_returns_no_content() {
  let app = app().await;
  let nominate = app
    .router
    .clone()
    .oneshot(request(
      "POST",
      &format!("/rooms/{}/candidates", app.room),
      Some(app.member),
      Some(json!({ "user_id": Uuid::new_v4() })),
    ))
    .await
    .unwrap();
  let candidate = body_json(nominate).await;
  let candidate_id = candidate["candidate_id"].as_str().unwrap().to_owned();

  let response = app
    .router
    .clone()
    .oneshot(request(
      "DELETE",
      &format!("/rooms/{}/candidates/{candidate_id}", app.room),
      Some(app.member),
      None,
    ))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NO_CONTENT);

  // Gone now.
  let response = app
    .router
    .oneshot(request(
      "DELETE",
      &format!("/rooms/{}/candidates/{candidate_id}", app.room),
      Some(app.member),
      None,
    ))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tie_error_carries_remedial_detail() {
  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  let response = ApiError::Election(ElectionError::TieDetected {
    tied:      vec![a, b],
    max_score: 3.0,
  })
  .into_response();

  assert_eq!(response.status(), StatusCode::CONFLICT);
  let body = body_json(response).await;
  assert_eq!(body["error"]["kind"], "tie_detected");
  assert_eq!(body["error"]["max_score"], json!(3.0));
  assert_eq!(body["error"]["tied"], json!([a, b]));
}
