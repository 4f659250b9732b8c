//! Deployment history export
//!
//! The exported JSON is an external contract: field names, enum string
//! values, and null handling must stay stable for downstream consumers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::config::Environment;
use crate::models::record::{DeploymentRecord, DeploymentStatus};

/// One deployment in the exported history
///
/// Application, version, and environment are pulled up from the config so
/// consumers never need to walk nested structures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentExport {
    pub id: String,
    pub application_name: String,
    pub version: String,
    pub environment: Environment,
    pub status: DeploymentStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub logs: Vec<String>,
    pub error_message: Option<String>,
}

impl From<&DeploymentRecord> for DeploymentExport {
    fn from(record: &DeploymentRecord) -> Self {
        Self {
            id: record.id.clone(),
            application_name: record.config.application_name.clone(),
            version: record.config.version.clone(),
            environment: record.config.environment,
            status: record.status,
            start_time: record.start_time,
            end_time: record.end_time,
            logs: record.logs.clone(),
            error_message: record.error_message.clone(),
        }
    }
}

/// Full history snapshot: every record plus the environment-version map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryExport {
    pub deployments: Vec<DeploymentExport>,
    pub environment_versions: BTreeMap<String, BTreeMap<String, String>>,
    pub exported_at: DateTime<Utc>,
}

impl HistoryExport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
