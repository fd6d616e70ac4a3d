//! Process-wide remediation gate.
//!
//! The gate mode is fixed at construction from configuration and never
//! changes during a run, so every check step in a pass observes the same
//! policy. In suppress mode remediation futures are never polled; in live
//! mode provider failures are converted into records instead of
//! propagating.

use std::future::Future;

use tracing::{info, warn};

use crate::domain::RemediationRecord;
use crate::provider::ProviderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateMode {
    /// Remediations are logged as would-apply records and not executed.
    Suppress,
    /// Remediations execute against the provider.
    Live,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DryRunGate {
    mode: GateMode,
}

impl Default for DryRunGate {
    fn default() -> Self {
        // Safe default: suppress mutations.
        Self::new(GateMode::Suppress)
    }
}

impl DryRunGate {
    pub fn new(mode: GateMode) -> Self {
        Self { mode }
    }

    pub fn from_flag(dry_run: bool) -> Self {
        Self::new(if dry_run { GateMode::Suppress } else { GateMode::Live })
    }

    pub fn is_dry_run(&self) -> bool {
        self.mode == GateMode::Suppress
    }

    /// Runs one remediation under the gate and always yields a record.
    /// Provider errors are absorbed here so one resource's failed fix
    /// never aborts the rest of the audit.
    pub async fn apply<F>(&self, action: &str, target: &str, operation: F) -> RemediationRecord
    where
        F: Future<Output = Result<(), ProviderError>>,
    {
        if self.is_dry_run() {
            info!(
                event_name = "gate.would_apply",
                action,
                target,
                "dry-run mode: remediation suppressed"
            );
            return RemediationRecord {
                action: action.to_string(),
                applied: false,
                dry_run: true,
                error: None,
            };
        }

        match operation.await {
            Ok(()) => {
                info!(event_name = "gate.applied", action, target, "remediation applied");
                RemediationRecord {
                    action: action.to_string(),
                    applied: true,
                    dry_run: false,
                    error: None,
                }
            }
            Err(error) => {
                warn!(
                    event_name = "gate.apply_failed",
                    action,
                    target,
                    error = %error,
                    "remediation failed; recorded without aborting the audit"
                );
                RemediationRecord {
                    action: action.to_string(),
                    applied: false,
                    dry_run: false,
                    error: Some(error.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::{DryRunGate, GateMode};
    use crate::provider::ProviderError;

    #[tokio::test]
    async fn suppress_mode_never_polls_the_operation() {
        let gate = DryRunGate::from_flag(true);
        let executed = AtomicBool::new(false);

        let record = gate
            .apply("enable_rotation", "key-1", async {
                executed.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(!executed.load(Ordering::SeqCst));
        assert!(!record.applied);
        assert!(record.dry_run);
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn live_mode_applies_and_reports_success() {
        let gate = DryRunGate::new(GateMode::Live);
        let record = gate.apply("enable_versioning", "bucket-1", async { Ok(()) }).await;

        assert!(record.applied);
        assert!(!record.dry_run);
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn live_mode_absorbs_provider_errors() {
        let gate = DryRunGate::new(GateMode::Live);
        let record = gate
            .apply("terminate_instance", "i-1", async {
                Err(ProviderError::api("access denied"))
            })
            .await;

        assert!(!record.applied);
        assert!(!record.dry_run);
        assert_eq!(record.error.as_deref(), Some("provider call failed: access denied"));
    }
}
