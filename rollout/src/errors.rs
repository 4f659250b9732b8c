//! Error types for the rollout engine

use thiserror::Error;

use crate::models::config::Environment;

/// Main error type for the rollout engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Health check failed for {endpoint}")]
    HealthCheck { endpoint: String },

    #[error("Rollout error: {0}")]
    Rollout(String),

    #[error("No rollback target for {application} in {environment}")]
    NoRollbackTarget {
        application: String,
        environment: Environment,
    },

    #[error("Deployment not found: {0}")]
    NotFound(String),

    #[error("Invalid deployment state: {0}")]
    InvalidState(String),

    #[error("Deployment cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
