use thiserror::Error;

use crate::provider::Feed;

/// Errors returned by the geocoding resolver and the forecast aggregator.
///
/// Failures of the UV feed never show up here; they only leave
/// `CurrentSnapshot::uv_index` unset.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The caller supplied insufficient or malformed input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The credential needed for the upstream provider is not configured.
    #[error("Server missing {variable}.\nHint: export {variable} or run `forecast configure`.")]
    UpstreamConfigMissing { variable: &'static str },

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The HTTP client itself could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller cancelled the operation before all required feeds answered.
    #[error("Request was cancelled")]
    Cancelled,
}

/// A required upstream feed failed.
#[derive(Debug, Clone, Error)]
#[error("{feed} request failed{}: {body}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
pub struct UpstreamError {
    pub feed: Feed,
    /// `None` when no HTTP response was received at all.
    pub status: Option<u16>,
    pub body: String,
}

impl UpstreamError {
    pub fn new(feed: Feed, status: Option<u16>, body: impl AsRef<str>) -> Self {
        Self {
            feed,
            status,
            body: truncate_body(body.as_ref()),
        }
    }

    pub fn transport(feed: Feed, err: &reqwest::Error) -> Self {
        Self::new(feed, err.status().map(|s| s.as_u16()), err.to_string())
    }

    pub fn malformed(feed: Feed, status: u16, err: &serde_json::Error) -> Self {
        Self::new(feed, Some(status), format!("malformed payload: {err}"))
    }
}

impl ForecastError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Upstream HTTP status, when the error came from an upstream response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream(e) => e.status,
            _ => None,
        }
    }

    /// Which feed failed, when the error came from upstream.
    pub fn feed(&self) -> Option<Feed> {
        match self {
            Self::Upstream(e) => Some(e.feed),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
