//! Client for the WHOOP developer API: OAuth2 credential lifecycle and
//! cursor-paginated record export.
//!
//! Requests, records and throttle pauses are counted through the `metrics`
//! facade (`whoop_api_requests_total`, `whoop_records_total`,
//! `whoop_throttle_pauses_total`). They are no-ops until the embedding
//! application installs a recorder.

use std::path::PathBuf;

use thiserror::Error;

pub mod config;
pub mod credential;
pub mod fetcher;
pub mod oauth;
pub mod resource;
pub mod retry;
pub mod sink;
pub mod token_manager;

pub use config::Config;
pub use credential::{Credential, CredentialStore, FileCredentialStore};
pub use fetcher::{FetchFailure, FetchReport, PageFetcher, ThrottlePolicy};
pub use oauth::OAuthClient;
pub use resource::Resource;
pub use sink::{JsonLinesSink, LineFormat, RecordSink};
pub use token_manager::{AuthorizationPrompt, TokenManager};

#[derive(Debug, Error)]
pub enum WhoopError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("credential file {} is corrupt: {source}", .path.display())]
    CorruptCredential {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("authorization failed: {0}")]
    Auth(String),
    #[error("token endpoint returned {status}: {body}")]
    TokenExchange { status: u16, body: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("api returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid redirect url: {0}")]
    InvalidRedirect(String),
}

impl WhoopError {
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => WhoopError::Auth(body),
            404 => WhoopError::NotFound(body),
            429 => WhoopError::RateLimited(body),
            _ => WhoopError::Api { status, body },
        }
    }

    /// Whether a retry of the same request could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            WhoopError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            WhoopError::RateLimited(_) => true,
            WhoopError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Read a failed response into a status code and a bounded body snippet.
pub(crate) async fn response_snippet(resp: reqwest::Response) -> (u16, String) {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    (status, body.chars().take(256).collect())
}

#[cfg(test)]
mod tests {
    use super::WhoopError;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            WhoopError::from_status(401, "nope".into()),
            WhoopError::Auth(_)
        ));
        assert!(matches!(
            WhoopError::from_status(404, String::new()),
            WhoopError::NotFound(_)
        ));
        assert!(matches!(
            WhoopError::from_status(502, String::new()),
            WhoopError::Api { status: 502, .. }
        ));
    }

    #[test]
    fn transient_classification() {
        assert!(WhoopError::from_status(503, String::new()).is_transient());
        assert!(WhoopError::from_status(429, String::new()).is_transient());
        assert!(!WhoopError::from_status(400, String::new()).is_transient());
        assert!(!WhoopError::Config("x".into()).is_transient());
    }
}
