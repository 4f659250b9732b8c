//! Deployment orchestration

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::errors::{Error, Result};
use crate::export::{DeploymentExport, HistoryExport};
use crate::health::{self, HealthProbe, SimulatedProbe};
use crate::models::config::{DeploymentConfig, Environment, HealthCheckSpec, Strategy};
use crate::models::record::{DeploymentRecord, DeploymentStatus};
use crate::strategy::{RolloutExecutor, RolloutPhase, SimulatedExecutor};

type KeyLock = Arc<Mutex<()>>;

/// Orchestrates deployments with health checks and automatic rollback
///
/// Owns the record table and the per-environment version table for its
/// lifetime. Deploys for the same (environment, application) pair are
/// serialized; distinct pairs run fully concurrently.
pub struct DeploymentManager {
    records: RwLock<HashMap<String, DeploymentRecord>>,
    env_versions: RwLock<[HashMap<String, String>; 3]>,
    key_locks: Mutex<HashMap<(Environment, String), KeyLock>>,
    probe: Arc<dyn HealthProbe>,
    executor: Arc<dyn RolloutExecutor>,
}

impl DeploymentManager {
    /// Create a manager with simulated collaborators
    pub fn new() -> Self {
        Self::with_collaborators(Arc::new(SimulatedProbe), Arc::new(SimulatedExecutor))
    }

    /// Create a manager with injected probe and rollout executor
    pub fn with_collaborators(
        probe: Arc<dyn HealthProbe>,
        executor: Arc<dyn RolloutExecutor>,
    ) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            env_versions: RwLock::new(Default::default()),
            key_locks: Mutex::new(HashMap::new()),
            probe,
            executor,
        }
    }

    /// Deploy an application
    ///
    /// Returns `Err` only for a malformed config, before any record exists.
    /// Rollout and health-check failures are absorbed into the returned
    /// record: callers must inspect its status and error_message, since a
    /// returned id is not evidence of success.
    pub async fn deploy(&self, config: DeploymentConfig) -> Result<String> {
        config.validate()?;

        let key_lock = self
            .key_lock(config.environment, &config.application_name)
            .await;
        let _guard = key_lock.lock().await;

        self.deploy_locked(config).await
    }

    /// Manually roll back an application to a previous version
    ///
    /// With no explicit target, selects the latest successful deployment for
    /// the (application, environment) pair; if none exists the error
    /// propagates, since there is no enclosing deploy to absorb it.
    pub async fn rollback(
        &self,
        application_name: &str,
        environment: Environment,
        target_version: Option<&str>,
    ) -> Result<String> {
        let target = match target_version {
            Some(version) => version.to_string(),
            None => self
                .latest_successful_version(application_name, environment)
                .await
                .ok_or_else(|| Error::NoRollbackTarget {
                    application: application_name.to_string(),
                    environment,
                })?,
        };

        info!(
            "Manual rollback of {} in {} to version {}",
            application_name, environment, target
        );

        let config = DeploymentConfig {
            application_name: application_name.to_string(),
            version: target.clone(),
            environment,
            artifact_reference: format!("rollback://{}", target),
            health_checks: vec![HealthCheckSpec::new(format!(
                "http://{}/health",
                application_name
            ))],
            rollback_enabled: false,
            strategy: Strategy::Rolling,
        };

        self.deploy(config).await
    }

    /// Request cancellation of an in-flight deployment
    ///
    /// The deploy loop observes the flag between rollout phases and health
    /// checks and fails the record with a cancelled reason. The record is
    /// never removed.
    pub async fn cancel(&self, id: &str) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        match record.status {
            DeploymentStatus::Pending | DeploymentStatus::InProgress => {
                record.cancel_requested = true;
                record.add_log("Cancellation requested");
                Ok(())
            }
            status => Err(Error::InvalidState(format!(
                "deployment {} is already {}",
                id, status
            ))),
        }
    }

    /// Look up one deployment record
    pub async fn get_status(&self, id: &str) -> Option<DeploymentRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// List deployments, newest first, with optional filters
    pub async fn list(
        &self,
        application_name: Option<&str>,
        environment: Option<Environment>,
    ) -> Vec<DeploymentRecord> {
        let records = self.records.read().await;
        let mut matching: Vec<DeploymentRecord> = records
            .values()
            .filter(|r| {
                application_name.is_none_or(|app| r.config.application_name == app)
                    && environment.is_none_or(|env| r.config.environment == env)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        matching
    }

    /// Snapshot of the current version per application per environment
    pub async fn environment_status(&self) -> HashMap<Environment, HashMap<String, String>> {
        let versions = self.env_versions.read().await;
        Environment::ALL
            .iter()
            .map(|&env| (env, versions[env.index()].clone()))
            .collect()
    }

    /// Export the full deployment history as JSON
    pub async fn export_history(&self) -> Result<String> {
        let records = self.records.read().await;
        let mut deployments: Vec<DeploymentExport> =
            records.values().map(DeploymentExport::from).collect();
        deployments.sort_by(|a, b| a.start_time.cmp(&b.start_time));

        let versions = self.env_versions.read().await;
        let environment_versions = Environment::ALL
            .iter()
            .map(|&env| {
                let table = versions[env.index()]
                    .iter()
                    .map(|(app, version)| (app.clone(), version.clone()))
                    .collect();
                (env.as_str().to_string(), table)
            })
            .collect();

        HistoryExport {
            deployments,
            environment_versions,
            exported_at: Utc::now(),
        }
        .to_json()
    }

    /// Deploy with the key lock already held
    ///
    /// Auto-rollback re-enters here directly so the nested call never
    /// re-acquires the (environment, application) lock.
    fn deploy_locked(
        &self,
        config: DeploymentConfig,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move {
        let mut record = DeploymentRecord::new(config.clone());
        let id = record.id.clone();
        record.add_log(format!(
            "Starting deployment of {} v{}",
            config.application_name, config.version
        ));
        self.records.write().await.insert(id.clone(), record);

        info!(
            "Deployment {} started: {} v{} -> {}",
            id, config.application_name, config.version, config.environment
        );

        match self.run_deployment(&id, &config).await {
            Ok(()) => {
                {
                    let mut versions = self.env_versions.write().await;
                    versions[config.environment.index()]
                        .insert(config.application_name.clone(), config.version.clone());
                }
                self.with_record(&id, |r| {
                    r.status = DeploymentStatus::Success;
                    r.end_time = Some(Utc::now());
                    r.add_log("Deployment completed successfully");
                })
                .await;
                info!("Deployment {} completed successfully", id);
            }
            Err(e) => {
                let cancelled = matches!(e, Error::Cancelled);
                self.with_record(&id, |r| {
                    r.status = DeploymentStatus::Failed;
                    r.end_time = Some(Utc::now());
                    r.error_message = Some(e.to_string());
                    if cancelled {
                        r.add_log("Deployment cancelled");
                    } else {
                        r.add_log(format!("Deployment failed: {}", e));
                    }
                })
                .await;
                error!("Deployment {} failed: {}", id, e);

                if config.rollback_enabled && !cancelled {
                    self.auto_rollback(&id, &config).await;
                }
            }
        }

        Ok(id)
        })
    }

    /// Run the rollout phases and health checks for one record
    async fn run_deployment(&self, id: &str, config: &DeploymentConfig) -> Result<()> {
        self.with_record(id, |r| {
            r.status = DeploymentStatus::InProgress;
            r.add_log("Deployment in progress...");
        })
        .await;

        for phase in RolloutPhase::for_strategy(config.strategy) {
            self.ensure_not_cancelled(id).await?;
            self.with_record(id, |r| r.add_log(phase.describe())).await;
            self.executor.execute(config, &phase).await?;
        }
        self.with_record(id, |r| r.add_log("Application deployed successfully"))
            .await;

        self.with_record(id, |r| r.add_log("Running health checks..."))
            .await;
        for (i, check) in config.health_checks.iter().enumerate() {
            self.ensure_not_cancelled(id).await?;
            self.with_record(id, |r| {
                r.add_log(format!("Health check {}: {}", i + 1, check.endpoint))
            })
            .await;
            health::run_check(self.probe.as_ref(), check).await?;
            self.with_record(id, |r| r.add_log(format!("Health check {} passed", i + 1)))
                .await;
        }
        self.with_record(id, |r| r.add_log("All health checks passed"))
            .await;

        self.ensure_not_cancelled(id).await?;
        Ok(())
    }

    /// Roll back a failed deployment to the last known-good version
    async fn auto_rollback(&self, failed_id: &str, config: &DeploymentConfig) {
        let previous = self
            .latest_successful_version(&config.application_name, config.environment)
            .await;

        let Some(previous) = previous else {
            warn!(
                "No rollback target for {} in {}",
                config.application_name, config.environment
            );
            self.with_record(failed_id, |r| {
                r.add_log("No previous version found for rollback")
            })
            .await;
            return;
        };

        self.with_record(failed_id, |r| {
            r.add_log(format!("Auto-rolling back to version {}", previous))
        })
        .await;

        let rollback_config = DeploymentConfig {
            application_name: config.application_name.clone(),
            version: previous.clone(),
            environment: config.environment,
            artifact_reference: format!("rollback://{}", previous),
            health_checks: config.health_checks.clone(),
            rollback_enabled: false,
            strategy: Strategy::Rolling,
        };

        // rollback_enabled is false on the nested config, so this call
        // cannot trigger another rollback: recursion depth is bounded to 1
        match self.deploy_locked(rollback_config).await {
            Ok(rollback_id) => {
                let rollback_succeeded = self
                    .with_record(&rollback_id, |r| r.status == DeploymentStatus::Success)
                    .await
                    .unwrap_or(false);
                self.with_record(failed_id, |r| {
                    r.add_log(format!("Rollback deployment: {}", rollback_id));
                    r.triggered_rollback = Some(rollback_id.clone());
                    if rollback_succeeded {
                        r.status = DeploymentStatus::RolledBack;
                    }
                })
                .await;
            }
            Err(e) => {
                error!("Auto-rollback for {} failed: {}", failed_id, e);
                self.with_record(failed_id, |r| {
                    r.add_log(format!("Auto-rollback failed: {}", e))
                })
                .await;
            }
        }
    }

    /// Latest successful version for a (application, environment) pair
    async fn latest_successful_version(
        &self,
        application_name: &str,
        environment: Environment,
    ) -> Option<String> {
        let records = self.records.read().await;
        records
            .values()
            .filter(|r| {
                r.config.application_name == application_name
                    && r.config.environment == environment
                    && r.status == DeploymentStatus::Success
            })
            .max_by_key(|r| r.start_time)
            .map(|r| r.config.version.clone())
    }

    async fn ensure_not_cancelled(&self, id: &str) -> Result<()> {
        let records = self.records.read().await;
        match records.get(id) {
            Some(r) if r.cancel_requested => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    async fn with_record<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut DeploymentRecord) -> T,
    ) -> Option<T> {
        let mut records = self.records.write().await;
        records.get_mut(id).map(f)
    }

    async fn key_lock(&self, environment: Environment, application_name: &str) -> KeyLock {
        let mut locks = self.key_locks.lock().await;
        locks
            .entry((environment, application_name.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for DeploymentManager {
    fn default() -> Self {
        Self::new()
    }
}
