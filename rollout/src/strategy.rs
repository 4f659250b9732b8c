//! Rollout strategy phases and execution

use async_trait::async_trait;
use tracing::info;

use crate::errors::Result;
use crate::models::config::{DeploymentConfig, Strategy};

/// One logged phase of a rollout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutPhase {
    /// Single-step rolling replace
    Replace,

    /// Stand up the parallel (blue) environment
    StandUpParallel,

    /// Switch traffic to the new environment
    SwitchTraffic,

    /// Shift a percentage of traffic to the canary
    CanaryShift(u8),

    /// Promote the canary to 100%
    CanaryPromote,
}

impl RolloutPhase {
    /// Phases for a strategy, in execution order
    pub fn for_strategy(strategy: Strategy) -> Vec<RolloutPhase> {
        match strategy {
            Strategy::Rolling => vec![RolloutPhase::Replace],
            Strategy::BlueGreen => {
                vec![RolloutPhase::StandUpParallel, RolloutPhase::SwitchTraffic]
            }
            Strategy::Canary { percentage } => vec![
                RolloutPhase::CanaryShift(percentage),
                RolloutPhase::CanaryPromote,
            ],
        }
    }

    /// Log line recorded for this phase
    pub fn describe(&self) -> String {
        match self {
            RolloutPhase::Replace => "Executing rolling deployment".to_string(),
            RolloutPhase::StandUpParallel => "Executing blue-green deployment".to_string(),
            RolloutPhase::SwitchTraffic => {
                "Blue environment ready, switching traffic".to_string()
            }
            RolloutPhase::CanaryShift(percentage) => {
                format!("Starting canary deployment with {}% traffic", percentage)
            }
            RolloutPhase::CanaryPromote => {
                "Canary deployment successful, rolling out to 100%".to_string()
            }
        }
    }
}

/// Rollout executor collaborator
///
/// Production implementations drive real infrastructure (container runtime,
/// load balancer, scheduler) one phase at a time.
#[async_trait]
pub trait RolloutExecutor: Send + Sync {
    /// Execute one rollout phase for the given config
    async fn execute(&self, config: &DeploymentConfig, phase: &RolloutPhase) -> Result<()>;
}

/// Simulated executor that always succeeds
pub struct SimulatedExecutor;

#[async_trait]
impl RolloutExecutor for SimulatedExecutor {
    async fn execute(&self, config: &DeploymentConfig, phase: &RolloutPhase) -> Result<()> {
        info!(
            "{} v{} ({}): {}",
            config.application_name,
            config.version,
            config.environment,
            phase.describe()
        );
        Ok(())
    }
}
