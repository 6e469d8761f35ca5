use super::*;
use crate::storage::KeyValueStore;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn state_with_store(rate_limit: u32) -> Arc<AppState> {
  let store = ScoreStore::in_memory().await.unwrap();
  let config = ServerConfig {
    rate_limit,
    ..ServerConfig::default()
  };
  Arc::new(AppState::new(config, Some(store)))
}

fn post_score(body: &str, ip: &str) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri("/api/score")
    .header("content-type", "application/json")
    .header("x-forwarded-for", ip)
    .body(Body::from(body.to_string()))
    .unwrap()
}

fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
  let response = build_router(state.clone()).oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, body)
}

#[tokio::test]
async fn valid_score_is_recorded() {
  let state = state_with_store(30).await;
  let (status, body) = send(&state, post_score(r#"{"username":" ada  lovelace ","score":"120"}"#, "1.1.1.1")).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "ok": true }));
  let scores = state.store.as_ref().unwrap().top_scores(10).await.unwrap();
  assert_eq!(scores[0].username, "ada lovelace");
  assert_eq!(scores[0].score, 120);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
  let state = state_with_store(30).await;
  for body in [
    r#"{"username":"","score":10}"#,
    r#"{"username":"ada","score":10.5}"#,
    r#"{"username":"ada","score":-1}"#,
    r#"{"username":"ada"}"#,
    "not json",
  ] {
    let (status, response) = send(&state, post_score(body, "2.2.2.2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(response["error"], "Invalid input.");
  }
}

#[tokio::test]
async fn thirty_first_request_in_window_is_limited() {
  let state = state_with_store(30).await;
  for _ in 0..30 {
    let (status, _) = send(&state, post_score(r#"{"username":"ada","score":1}"#, "3.3.3.3")).await;
    assert_eq!(status, StatusCode::OK);
  }
  let (status, body) = send(&state, post_score(r#"{"username":"ada","score":1}"#, "3.3.3.3")).await;
  assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
  assert_eq!(body["error"], "Too many requests. Try again soon.");

  let (status, _) = send(&state, post_score(r#"{"username":"ada","score":1}"#, "4.4.4.4, 3.3.3.3")).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_counts_invalid_requests_too() {
  let state = state_with_store(1).await;
  let (status, _) = send(&state, post_score("{}", "5.5.5.5")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = send(&state, post_score(r#"{"username":"ada","score":1}"#, "5.5.5.5")).await;
  assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn missing_store_reports_not_configured() {
  let state = Arc::new(AppState::new(ServerConfig::default(), None));
  let (status, body) = send(&state, post_score(r#"{"username":"ada","score":1}"#, "6.6.6.6")).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["error"], "Server not configured.");
  assert_eq!(state.limiter.len(), 0);

  let (status, _) = send(&state, get("/api/leaderboard")).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_reports_storage_and_sessions() {
  let state = state_with_store(30).await;
  state.sessions.insert(Uuid::new_v4(), "profile".to_string());
  let (status, body) = send(&state, get("/api/health")).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
  assert_eq!(body["version"], VERSION);
  assert_eq!(body["storage"], "connected");
  assert_eq!(body["activeSessions"], 1);
  assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));

  let bare = Arc::new(AppState::new(ServerConfig::default(), None));
  let (_, body) = send(&bare, get("/api/health")).await;
  assert_eq!(body["storage"], "not configured");
}

#[tokio::test]
async fn leaderboard_lists_best_scores_first() {
  let state = state_with_store(30).await;
  let store = state.store.as_ref().unwrap();
  store.upsert_high_score("low", 5).await.unwrap();
  store.upsert_high_score("high", 50).await.unwrap();
  store.upsert_high_score("high", 20).await.unwrap();

  let (status, body) = send(&state, get("/api/leaderboard?limit=1")).await;
  assert_eq!(status, StatusCode::OK);
  let scores = body["scores"].as_array().unwrap();
  assert_eq!(scores.len(), 1);
  assert_eq!(scores[0]["username"], "high");
  assert_eq!(scores[0]["score"], 50);

  let (_, body) = send(&state, get("/api/leaderboard?limit=bogus")).await;
  assert_eq!(body["scores"].as_array().unwrap().len(), 2);
}

#[test]
fn client_ip_prefers_forwarded_header() {
  let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
  let mut headers = HeaderMap::new();
  assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.9");
  assert_eq!(client_ip(&headers, None), "unknown");

  headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
  assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.7");

  headers.insert("x-forwarded-for", HeaderValue::from_static(""));
  assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.9");
}

#[test]
fn profile_sweep_spares_open_sessions() {
  let state = AppState::new(ServerConfig::default(), None);
  let start = std::time::Instant::now();
  for profile in ["live", "gone"] {
    state.profiles.set(&format!("{profile}:snakeBestScore"), "10".to_string());
    state.profiles.touch_at(profile, start);
  }
  state.sessions.insert(Uuid::new_v4(), "live".to_string());

  let later = start + state.config.profile_ttl + std::time::Duration::from_secs(1);
  assert_eq!(state.sweep_profiles_at(later), 1);
  assert_eq!(state.profiles.get("live:snakeBestScore").as_deref(), Some("10"));
  assert!(state.profiles.get("gone:snakeBestScore").is_none());
}
