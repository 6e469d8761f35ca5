use crate::game::constants::MAX_SCORE;
use crate::shared::names::normalize_username;
use crate::shared::score::{ScoreError, Submission};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);
const GENERIC_FAILURE: &str = "Unable to submit score right now.";

/// Secondary RPC endpoint tried when the primary server is unreachable or failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackEndpoint {
    pub url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid submission: {0}")]
    Invalid(#[from] ScoreError),
    /// The server refused the submission; carries its message.
    #[error("{0}")]
    Rejected(String),
    #[error("Unable to submit score right now.")]
    Unavailable,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

enum Attempt {
    Accepted,
    Rejected(String),
    Failed,
}

#[derive(Debug, Clone)]
pub struct ScoreClient {
    http: reqwest::Client,
    server: String,
    fallback: Option<FallbackEndpoint>,
}

impl ScoreClient {
    pub fn new(server: impl Into<String>, fallback: Option<FallbackEndpoint>) -> Self {
        Self {
            http: reqwest::Client::new(),
            server: server.into(),
            fallback,
        }
    }

    pub async fn submit(&self, username: &str, score: u32) -> Result<(), SubmitError> {
        let username = normalize_username(username).ok_or(ScoreError::InvalidUsername)?;
        if score > MAX_SCORE {
            return Err(ScoreError::OutOfRange.into());
        }
        let submission = Submission { username, score };

        match self.submit_primary(&submission).await {
            Attempt::Accepted => return Ok(()),
            Attempt::Rejected(message) => return Err(SubmitError::Rejected(message)),
            Attempt::Failed => {}
        }

        let Some(fallback) = &self.fallback else { return Err(SubmitError::Unavailable) };
        tracing::info!(url = %fallback.url, "primary score endpoint failed, trying fallback");
        match self.submit_fallback(fallback, &submission).await {
            Ok(()) => Ok(()),
            Err(error) => {
                tracing::warn!(%error, "fallback score submission failed");
                Err(SubmitError::Unavailable)
            }
        }
    }

    async fn submit_primary(&self, submission: &Submission) -> Attempt {
        let url = format!("{}/api/score", self.server.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({ "username": submission.username, "score": submission.score }))
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%url, %error, "score request failed");
                return Attempt::Failed;
            }
        };

        let status = response.status();
        if status.is_success() {
            return Attempt::Accepted;
        }
        if status == StatusCode::BAD_REQUEST || status == StatusCode::TOO_MANY_REQUESTS {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Attempt::Rejected(message);
        }
        tracing::warn!(%url, status = status.as_u16(), "score endpoint returned an error");
        Attempt::Failed
    }

    async fn submit_fallback(
        &self,
        fallback: &FallbackEndpoint,
        submission: &Submission,
    ) -> Result<(), reqwest::Error> {
        let mut request = self
            .http
            .post(&fallback.url)
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({ "p_username": submission.username, "p_score": submission.score }));
        if let Some(key) = &fallback.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }
}
