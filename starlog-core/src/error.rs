//! Error types for starlog-core

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for the starlog-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Bad user input (blank names, missing or invalid star costs, ...)
    #[error("validation error: {0}")]
    Validation(String),

    /// Reward not found
    #[error("reward not found: {0}")]
    RewardNotFound(String),

    /// Template not found
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Task not found
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// Reward was purchased recently and is still cooling down
    #[error("reward {reward_id} is on cooldown until {until}")]
    OnCooldown {
        reward_id: String,
        until: DateTime<Utc>,
    },

    /// Available stars do not cover the reward cost
    #[error("insufficient stars: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    /// Ending or cancelling with nothing in progress
    #[error("no active session")]
    NoActiveSession,

    /// The template document must keep at least one template
    #[error("cannot delete the last template")]
    LastTemplate,
}

/// Result type alias for starlog-core
pub type Result<T> = std::result::Result<T, Error>;
