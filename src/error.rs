//! # Error Module
//!
//! Error types shared by every component of the engine.
//!
//! Two families exist:
//!
//! - [`SpiderError`] is returned synchronously to the caller: malformed seeds,
//!   invalid route patterns, bad configuration.
//! - [`FetchFailure`] describes a request whose fetch did not produce a 200
//!   response. It never crosses the pool boundary as a `Result`; the engine
//!   publishes it as an `Error` event instead.

use crate::downloader::DownloadError;
use reqwest::Method;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Errors surfaced synchronously by the engine API.
#[derive(Debug, Error)]
pub enum SpiderError {
    /// A seed could not be normalized into a request.
    #[error("malformed input {input:?}: {reason}")]
    MalformedInput { input: String, reason: String },

    /// A route pattern failed to compile.
    #[error("invalid route pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A fetch failure converted into an error value by an embedder.
    #[error(transparent)]
    FetchFailure(#[from] FetchFailure),

    /// The engine behind a handle has been dropped.
    #[error("engine has stopped")]
    EngineStopped,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpiderError {
    pub(crate) fn malformed(input: impl Into<String>, reason: impl ToString) -> Self {
        SpiderError::MalformedInput {
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}

/// Why a fetch did not produce a response.
#[derive(Debug, Clone, Error)]
pub enum FailureReason {
    /// The server answered with something other than `200`.
    #[error("unexpected status {0}")]
    Status(u16),
    /// The transport reported an error before a status was available.
    #[error("transport failure: {0}")]
    Transport(Arc<DownloadError>),
}

/// Payload of the engine's `Error` event.
///
/// Always built from the outcome of the fetch that failed.
#[derive(Debug, Clone, Error)]
#[error("{method} {url} failed: {reason}")]
pub struct FetchFailure {
    url: Url,
    method: Method,
    reason: FailureReason,
}

impl FetchFailure {
    pub fn new(url: Url, method: Method, reason: FailureReason) -> Self {
        Self {
            url,
            method,
            reason,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn reason(&self) -> &FailureReason {
        &self.reason
    }

    /// Returns the HTTP status when the failure came from a non-200 answer.
    pub fn status(&self) -> Option<u16> {
        match self.reason {
            FailureReason::Status(code) => Some(code),
            FailureReason::Transport(_) => None,
        }
    }
}
