//! # External Data Providers
//!
//! Thin HTTP clients for the third-party services some renderers draw
//! from. Each provider returns structured stats or a [`ProviderError`];
//! renderers turn any failure into
//! [`DotmateError::ExternalDataUnavailable`](crate::error::DotmateError)
//! and render nothing.
//!
//! - [`wakatime`]: today's coding time (status bar endpoint)
//! - [`umami`]: website analytics for a time window
//! - [`github`]: profile counters and the contribution calendar (GraphQL)

pub mod github;
pub mod umami;
pub mod wakatime;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Failure talking to an external data provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credentials missing, wrong or expired (HTTP 401/403)
    #[error("unauthorized")]
    Unauthorized,

    /// Network failure, unexpected status or malformed response
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Provider asked us to slow down (HTTP 429)
    #[error("rate limited")]
    RateLimited,
}

impl ProviderError {
    /// Map a non-success HTTP status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
            other => ProviderError::Unavailable(format!("HTTP {}", other)),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ProviderError::from_status(status),
            None => ProviderError::Unavailable(e.to_string()),
        }
    }
}

/// Send a request and decode a JSON body, mapping status codes first.
pub(crate) async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::from_status(status));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Unavailable(format!("Malformed response: {}", e)))
}

/// Send a request and return the raw body.
pub(crate) async fn fetch_bytes(request: RequestBuilder) -> Result<Vec<u8>, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::from_status(status));
    }
    Ok(response.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ProviderError::from_status(StatusCode::UNAUTHORIZED),
            ProviderError::Unauthorized
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::FORBIDDEN),
            ProviderError::Unauthorized
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS),
            ProviderError::RateLimited
        ));
        match ProviderError::from_status(StatusCode::BAD_GATEWAY) {
            ProviderError::Unavailable(msg) => assert!(msg.contains("502")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let client = reqwest::Client::new();
        let result: Result<serde_json::Value, _> =
            fetch_json(client.get("http://127.0.0.1:1/nothing")).await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }
}
