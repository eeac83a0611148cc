//! # Engine Errors
//!
//! Classification misses and unknown clause kinds are NOT errors. What is:
//! - translation failures from `discourse-core`
//! - store failures (any failing sub-query fails the whole resolution)
//! - a closed scheduling queue or a job that died before answering
//! - configuration that cannot be read or parsed

use discourse_core::DiscourseError;
use thiserror::Error;

/// Failure reported by the external store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Store query failed: {message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Discourse(#[from] DiscourseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The queue worker is gone.
    #[error("Scheduling queue is closed")]
    QueueClosed,

    /// The job ended without delivering a result.
    #[error("Scheduled job failed before producing a result")]
    JobFailed,

    #[error("Configuration error: {0}")]
    Config(String),
}
