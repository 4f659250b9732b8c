//! Deployment record and lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::config::DeploymentConfig;

/// Lifecycle status of one deployment attempt
///
/// Monotonic within a single deploy: pending -> in_progress ->
/// {success | failed}; failed may become rolled_back when auto-rollback runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    RolledBack,
}

impl DeploymentStatus {
    /// Wire name, matching the exported JSON values
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::InProgress => "in_progress",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::RolledBack => "rolled_back",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one deployment attempt
///
/// Owned by the manager's record table for its entire lifetime; records are
/// never deleted, only appended-to and status-mutated.
#[derive(Debug, Clone)]
pub struct DeploymentRecord {
    /// Unique deployment ID
    pub id: String,

    /// The config this attempt was created from
    pub config: DeploymentConfig,

    /// Current status
    pub status: DeploymentStatus,

    /// When the attempt started
    pub start_time: DateTime<Utc>,

    /// When the attempt finished, if it has
    pub end_time: Option<DateTime<Utc>>,

    /// Append-only timestamped log
    pub logs: Vec<String>,

    /// Error message for failed attempts
    pub error_message: Option<String>,

    /// ID of the auto-rollback deployment this failure triggered, if any
    pub triggered_rollback: Option<String>,

    /// Cooperative cancellation flag, observed between phases
    pub(crate) cancel_requested: bool,
}

impl DeploymentRecord {
    /// Create a new pending record with a fresh ID
    pub fn new(config: DeploymentConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            config,
            status: DeploymentStatus::Pending,
            start_time: Utc::now(),
            end_time: None,
            logs: Vec::new(),
            error_message: None,
            triggered_rollback: None,
            cancel_requested: false,
        }
    }

    /// Append a timestamped log message
    pub fn add_log(&mut self, message: impl AsRef<str>) {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        self.logs.push(format!("[{}] {}", timestamp, message.as_ref()));
    }

    /// Whether the attempt has reached a terminal status
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            DeploymentStatus::Success | DeploymentStatus::Failed | DeploymentStatus::RolledBack
        )
    }
}
