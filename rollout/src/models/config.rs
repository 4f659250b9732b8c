//! Deployment configuration models

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Target environment for a deployment
///
/// The key domain is closed: version tracking indexes a fixed-size table by
/// this enum rather than growing a map at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// All environments, in table order
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Staging,
        Environment::Production,
    ];

    /// Index into per-environment tables
    pub(crate) fn index(self) -> usize {
        match self {
            Environment::Development => 0,
            Environment::Staging => 1,
            Environment::Production => 2,
        }
    }

    /// Wire name, matching the exported JSON values
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rollout strategy
///
/// Exactly one variant is active per config; the canary percentage lives
/// inside its variant so a config cannot be both blue/green and canary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Strategy {
    /// Single-step rolling replace
    Rolling,

    /// Stand up a parallel environment, then switch traffic
    BlueGreen,

    /// Partial rollout at `percentage`, then promotion to 100%
    Canary { percentage: u8 },
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Rolling
    }
}

/// One endpoint probe to run after rollout
///
/// Retries and timeout are advisory: the probe implementation performs a
/// single attempt and the manager bounds total duration to
/// `(retries + 1) * timeout`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckSpec {
    /// Endpoint to probe
    pub endpoint: String,

    /// Expected HTTP status
    pub expected_status: u16,

    /// Per-attempt timeout
    pub timeout: Duration,

    /// Additional attempts after the first failure
    pub retries: u32,
}

impl HealthCheckSpec {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            expected_status: 200,
            timeout: Duration::from_secs(30),
            retries: 3,
        }
    }
}

/// Immutable description of a requested deployment
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    /// Application being deployed
    pub application_name: String,

    /// Version to deploy (opaque, no semver semantics)
    pub version: String,

    /// Target environment
    pub environment: Environment,

    /// Reference to the artifact to deploy
    pub artifact_reference: String,

    /// Probes run after rollout, in declared order
    pub health_checks: Vec<HealthCheckSpec>,

    /// Whether a failed deployment triggers auto-rollback
    pub rollback_enabled: bool,

    /// Rollout strategy
    pub strategy: Strategy,
}

impl DeploymentConfig {
    pub fn new(
        application_name: impl Into<String>,
        version: impl Into<String>,
        environment: Environment,
        artifact_reference: impl Into<String>,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            version: version.into(),
            environment,
            artifact_reference: artifact_reference.into(),
            health_checks: Vec::new(),
            rollback_enabled: true,
            strategy: Strategy::default(),
        }
    }

    pub fn with_health_checks(mut self, checks: Vec<HealthCheckSpec>) -> Self {
        self.health_checks = checks;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_rollback_enabled(mut self, enabled: bool) -> Self {
        self.rollback_enabled = enabled;
        self
    }

    /// Validate the config before any record is created
    pub fn validate(&self) -> Result<()> {
        if self.application_name.is_empty() {
            return Err(Error::Config("application_name must not be empty".into()));
        }
        if self.version.is_empty() {
            return Err(Error::Config("version must not be empty".into()));
        }
        if let Strategy::Canary { percentage } = self.strategy {
            if percentage == 0 || percentage > 100 {
                return Err(Error::Config(format!(
                    "canary percentage must be in 1..=100, got {}",
                    percentage
                )));
            }
        }
        for check in &self.health_checks {
            if check.endpoint.is_empty() {
                return Err(Error::Config("health check endpoint must not be empty".into()));
            }
            if check.timeout.is_zero() {
                return Err(Error::Config(format!(
                    "health check timeout must be positive: {}",
                    check.endpoint
                )));
            }
        }
        Ok(())
    }
}
