use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the collaborators of a fare check run.
///
/// Only `TemplateMissing` aborts a run; every other variant degrades it.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("fare calendar source unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("malformed fare calendar response: {0}")]
    MalformedResponse(String),

    #[error("exchange rate {from}->{to} unavailable: {detail}")]
    RateUnavailable {
        from: String,
        to: String,
        detail: String,
    },

    #[error("template asset {} could not be read: {detail}", path.display())]
    TemplateMissing { path: PathBuf, detail: String },

    #[error("persisted snapshot {} is unreadable: {detail}", path.display())]
    PersistenceCorrupt { path: PathBuf, detail: String },

    #[error("notification failed: {0}")]
    NotificationFailed(String),
}
