//! Rollout — deployment orchestration engine
//!
//! Models deployments, health checks, per-environment version tracking, and
//! automatic rollback to the last known-good version on failure. Artifact
//! transfer and network probing live behind collaborator traits; the crate
//! ships simulated implementations for tests and demos.

pub mod errors;
pub mod export;
pub mod health;
pub mod logs;
pub mod manager;
pub mod models;
pub mod strategy;

pub use errors::{Error, Result};
pub use manager::DeploymentManager;
pub use models::config::{DeploymentConfig, Environment, HealthCheckSpec, Strategy};
pub use models::record::{DeploymentRecord, DeploymentStatus};
