//! HTTP clients for the account backend.
//!
//! The clients are stateless: one request per call, no retries, no token
//! caching. Failures are normalized into [`error::ApiError`] before they
//! leave this module.

pub mod admin;
pub mod error;
pub mod types;
pub mod user;

pub use admin::AdminApi;
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use user::UserApi;

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;

/// Standard User-Agent header for atrio API requests.
pub const USER_AGENT: &str = concat!("atrio/", env!("CARGO_PKG_VERSION"));

/// Connection settings shared by the API clients.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL without a trailing slash.
    pub base_url: String,
    /// Per-request timeout; None disables it.
    pub timeout: Option<Duration>,
}

impl ApiConfig {
    /// Builds connection settings from the loaded configuration.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            base_url: config.resolve_backend_url()?,
            timeout: config.request_timeout(),
        })
    }

    /// Builds connection settings for a fixed base URL with no timeout.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    pub(crate) fn build_http(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().context("Failed to build HTTP client")
    }
}

/// Sends a request and decodes the success body as JSON.
pub(crate) async fn execute<T: DeserializeOwned>(builder: reqwest::RequestBuilder) -> ApiResult<T> {
    let response = builder
        .send()
        .await
        .map_err(|e| ApiError::from_reqwest(&e))?;

    if !response.status().is_success() {
        return Err(read_failure(response).await);
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::from_reqwest(&e))
}

/// Sends a request and discards the success body.
pub(crate) async fn execute_empty(builder: reqwest::RequestBuilder) -> ApiResult<()> {
    let response = builder
        .send()
        .await
        .map_err(|e| ApiError::from_reqwest(&e))?;

    if !response.status().is_success() {
        return Err(read_failure(response).await);
    }

    Ok(())
}

/// Turns a non-success response into a structured error.
pub(crate) async fn read_failure(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let err = ApiError::from_response(status, &body);
    debug!(status, kind = %err.kind, "backend call failed: {}", err.message);
    err
}
