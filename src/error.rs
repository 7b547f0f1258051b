//! Error taxonomy for the sync pipeline.
//!
//! Lookup, shape and request failures abort the run. Local file failures
//! (`Read`, `Decode`) only come out of `AttributeSet::load` and are turned
//! into a per-locale skip by the orchestrator.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No app found for bundle id '{0}'")]
    AppNotFound(String),

    #[error("App '{0}' has no App Store version")]
    NoVersion(String),

    #[error("App Store version '{0}' has no localizations")]
    NoLocalizations(String),

    /// A member the pipeline depends on was missing from a remote response.
    #[error("Unexpected App Store Connect response: missing {0}")]
    UnexpectedShape(&'static str),

    #[error("App Store Connect API error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to send request to App Store Connect: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
