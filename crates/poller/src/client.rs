//! HTTP client for the Practicum homework status API.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use serde_json::Value;
use thiserror::Error;

use homework_common::error::BotError;

/// Reasons a [`PracticumClient`] cannot be built.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("PRACTICUM_TOKEN is not a valid header value: {0}")]
    InvalidToken(#[from] InvalidHeaderValue),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Source of raw homework status responses.
#[async_trait]
pub trait HomeworkSource: Send + Sync {
    /// Fetch every status change since the `from_date` Unix timestamp.
    ///
    /// Makes a single attempt. Retrying is the caller's job.
    async fn fetch(&self, from_date: i64) -> Result<Value, BotError>;
}

/// Practicum API client authenticated with a static OAuth token.
#[derive(Debug, Clone)]
pub struct PracticumClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PracticumClient {
    pub fn new(endpoint: impl Into<String>, token: &str) -> Result<Self, ClientBuildError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("OAuth {token}"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, e: reqwest::Error) -> BotError {
        BotError::Transport {
            endpoint: self.endpoint.clone(),
            reason: e.without_url().to_string(),
        }
    }
}

#[async_trait]
impl HomeworkSource for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value, BotError> {
        tracing::info!(
            endpoint = %self.endpoint,
            from_date,
            "Requesting homework statuses"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BotError::StatusCode {
                endpoint: self.endpoint.clone(),
                code: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| BotError::Decode(e.to_string()))
    }
}
