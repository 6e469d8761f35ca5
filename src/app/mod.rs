pub mod config;
pub mod rate_limit;

use crate::game::config::GameConfig;
use crate::game::constants::VERSION;
use crate::leaderboard::store::{LeaderboardEntry, ScoreStore, DEFAULT_LIMIT};
use crate::shared::score::validate_submission;
use crate::storage::MemoryStore;
use crate::transport::ws_session::handle_socket;
use axum::{
  body::Bytes,
  extract::{ConnectInfo, Query, State, WebSocketUpgrade},
  http::{HeaderMap, HeaderValue, Method, StatusCode},
  response::{IntoResponse, Response},
  routing::{get, post},
  Json, Router,
};
use config::ServerConfig;
use dashmap::DashMap;
use rate_limit::RateLimiter;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use uuid::Uuid;

const NOT_CONFIGURED: &str = "Server not configured.";
const RATE_LIMITED: &str = "Too many requests. Try again soon.";
const INVALID_INPUT: &str = "Invalid input.";
const RECORD_FAILED: &str = "Unable to record score.";

pub struct AppState {
  pub config: ServerConfig,
  pub game: GameConfig,
  pub store: Option<ScoreStore>,
  pub limiter: Arc<RateLimiter>,
  /// Profile id of every open game socket.
  pub sessions: DashMap<Uuid, String>,
  pub profiles: Arc<MemoryStore>,
}

impl AppState {
  pub fn new(config: ServerConfig, store: Option<ScoreStore>) -> Self {
    let limiter = Arc::new(RateLimiter::new(config.rate_limit, config.rate_window));
    Self {
      game: GameConfig::for_variant(config.variant),
      config,
      store,
      limiter,
      sessions: DashMap::new(),
      profiles: Arc::new(MemoryStore::new()),
    }
  }

  /// Forgets stored profiles idle past `profile_ttl` that no open socket is using.
  pub fn sweep_profiles_at(&self, now: Instant) -> usize {
    self.profiles.sweep_idle_at(self.config.profile_ttl, now, |profile| {
      self.sessions.iter().any(|entry| entry.value() == profile)
    })
  }
}

/// Sweeps idle profiles once per `profile_ttl` until the returned handle is aborted.
pub fn spawn_profile_sweeper(state: Arc<AppState>) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(state.config.profile_ttl);
    interval.tick().await;
    loop {
      interval.tick().await;
      let removed = state.sweep_profiles_at(Instant::now());
      if removed > 0 {
        tracing::debug!(removed, remaining = state.profiles.len(), "profile sweep");
      }
    }
  })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
  status: &'static str,
  version: &'static str,
  timestamp: String,
  storage: &'static str,
  active_sessions: usize,
}

#[derive(Debug, Serialize)]
struct OkResponse {
  ok: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
  error: &'static str,
}

#[derive(Debug, Serialize)]
struct LeaderboardResponse {
  scores: Vec<LeaderboardEntry>,
}

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
  limit: Option<String>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
  let public_dir = state.config.public_dir.clone();
  let static_files =
    ServeDir::new(&public_dir).fallback(ServeFile::new(public_dir.join("index.html")));

  Router::new()
    .route("/api/health", get(health))
    .route("/api/score", post(submit_score))
    .route("/api/leaderboard", get(leaderboard))
    .route("/api/play", get(play))
    .fallback_service(static_files)
    .layer(cors_layer(&state.config))
    .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
  let origin = match &config.allowed_origins {
    Some(origins) => AllowOrigin::list(
      origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok()),
    ),
    None => AllowOrigin::from(Any),
  };
  CorsLayer::new()
    .allow_origin(origin)
    .allow_methods([Method::GET, Method::POST])
    .allow_headers(Any)
}

pub fn timestamp() -> String {
  chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// First `X-Forwarded-For` entry, else the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
  let forwarded = headers
    .get("x-forwarded-for")
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.split(',').next())
    .map(str::trim)
    .filter(|value| !value.is_empty());
  match (forwarded, peer) {
    (Some(forwarded), _) => forwarded.to_string(),
    (None, Some(peer)) => peer.ip().to_string(),
    (None, None) => "unknown".to_string(),
  }
}

fn error_response(status: StatusCode, error: &'static str) -> Response {
  (status, Json(ErrorResponse { error })).into_response()
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthResponse {
    status: "ok",
    version: VERSION,
    timestamp: timestamp(),
    storage: if state.store.is_some() { "connected" } else { "not configured" },
    active_sessions: state.sessions.len(),
  })
}

async fn submit_score(
  State(state): State<Arc<AppState>>,
  peer: Option<ConnectInfo<SocketAddr>>,
  headers: HeaderMap,
  body: Bytes,
) -> Response {
  let Some(store) = &state.store else {
    return error_response(StatusCode::INTERNAL_SERVER_ERROR, NOT_CONFIGURED);
  };

  let ip = client_ip(&headers, peer.map(|ConnectInfo(address)| address));
  if !state.limiter.allow(&ip) {
    tracing::warn!(%ip, "rate limited");
    return error_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED);
  }

  let submission = serde_json::from_slice::<serde_json::Value>(&body)
    .ok()
    .and_then(|value| validate_submission(&value).ok());
  let Some(submission) = submission else {
    return error_response(StatusCode::BAD_REQUEST, INVALID_INPUT);
  };

  if let Err(error) = store
    .upsert_high_score(&submission.username, submission.score)
    .await
  {
    tracing::error!(%error, "score submission failed");
    return error_response(StatusCode::INTERNAL_SERVER_ERROR, RECORD_FAILED);
  }

  tracing::info!(username = %submission.username, score = submission.score, "score submitted");
  (StatusCode::OK, Json(OkResponse { ok: true })).into_response()
}

async fn leaderboard(
  State(state): State<Arc<AppState>>,
  Query(params): Query<LeaderboardQuery>,
) -> Response {
  let Some(store) = &state.store else {
    return error_response(StatusCode::INTERNAL_SERVER_ERROR, NOT_CONFIGURED);
  };
  let limit = params
    .limit
    .and_then(|value| value.trim().parse::<i64>().ok())
    .unwrap_or(DEFAULT_LIMIT);

  match store.top_scores(limit).await {
    Ok(scores) => (StatusCode::OK, Json(LeaderboardResponse { scores })).into_response(),
    Err(error) => {
      tracing::error!(%error, "failed to load leaderboard");
      error_response(StatusCode::INTERNAL_SERVER_ERROR, "Unable to load leaderboard.")
    }
  }
}

async fn play(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[cfg(test)]
mod tests;
