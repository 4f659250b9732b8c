//! Health check execution

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::{Error, Result};
use crate::models::config::HealthCheckSpec;

/// Health probe collaborator
///
/// Production implementations perform real HTTP requests against the
/// endpoint; the probe performs a single attempt and reports the outcome.
/// Retry and timeout bounding is the caller's job.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probe the endpoint once
    async fn probe(&self, check: &HealthCheckSpec) -> Result<()>;
}

/// Simulated probe that always passes
///
/// Stands in for real network probing in demos and tests.
pub struct SimulatedProbe;

#[async_trait]
impl HealthProbe for SimulatedProbe {
    async fn probe(&self, check: &HealthCheckSpec) -> Result<()> {
        debug!("Checking health at {}", check.endpoint);
        Ok(())
    }
}

/// Run one health check with retry and timeout bounding
///
/// At most `retries + 1` attempts, each bounded by `check.timeout`, so total
/// duration never exceeds `(retries + 1) * timeout`. Exhaustion is reported
/// as a health check failure for the endpoint.
pub async fn run_check(probe: &dyn HealthProbe, check: &HealthCheckSpec) -> Result<()> {
    let attempts = check.retries.saturating_add(1);

    for attempt in 1..=attempts {
        match tokio::time::timeout(check.timeout, probe.probe(check)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => {
                warn!(
                    "Health check attempt {}/{} failed for {}: {}",
                    attempt, attempts, check.endpoint, e
                );
            }
            Err(_) => {
                warn!(
                    "Health check attempt {}/{} timed out for {}",
                    attempt, attempts, check.endpoint
                );
            }
        }
    }

    Err(Error::HealthCheck {
        endpoint: check.endpoint.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Probe that fails a fixed number of times before passing
    struct FlakyProbe {
        failures: AtomicU32,
    }

    #[async_trait]
    impl HealthProbe for FlakyProbe {
        async fn probe(&self, check: &HealthCheckSpec) -> Result<()> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::HealthCheck {
                    endpoint: check.endpoint.clone(),
                });
            }
            Ok(())
        }
    }

    /// Probe that never responds within the timeout
    struct HangingProbe;

    #[async_trait]
    impl HealthProbe for HangingProbe {
        async fn probe(&self, _check: &HealthCheckSpec) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_simulated_probe_passes() {
        let check = HealthCheckSpec::new("http://web/health");
        assert!(run_check(&SimulatedProbe, &check).await.is_ok());
    }

    #[tokio::test]
    async fn test_retries_absorb_transient_failures() {
        let probe = FlakyProbe {
            failures: AtomicU32::new(2),
        };
        let check = HealthCheckSpec::new("http://web/health");
        assert!(run_check(&probe, &check).await.is_ok());
    }

    #[tokio::test]
    async fn test_exhaustion_reports_endpoint() {
        let probe = FlakyProbe {
            failures: AtomicU32::new(10),
        };
        let mut check = HealthCheckSpec::new("http://web/health");
        check.retries = 1;
        let err = run_check(&probe, &check).await.unwrap_err();
        match err {
            Error::HealthCheck { endpoint } => assert_eq!(endpoint, "http://web/health"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_bounds_each_attempt() {
        let mut check = HealthCheckSpec::new("http://web/health");
        check.timeout = Duration::from_millis(50);
        check.retries = 2;
        let err = run_check(&HangingProbe, &check).await.unwrap_err();
        assert!(matches!(err, Error::HealthCheck { .. }));
    }
}
