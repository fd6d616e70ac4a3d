//! Key-management audit: every key must have rotation enabled.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{AuditError, DomainAuditor, RunMode};
use crate::domain::{CheckResult, Domain, DomainReport, Resource, ResourceFinding};
use crate::gate::DryRunGate;
use crate::provider::KeyProvider;

pub const ROTATION_PROPERTY: &str = "rotation";
pub const ENABLE_ROTATION_ACTION: &str = "enable_rotation";

pub struct KeyAuditor<P> {
    provider: Arc<P>,
    gate: DryRunGate,
}

impl<P: KeyProvider> KeyAuditor<P> {
    pub fn new(provider: Arc<P>, gate: DryRunGate) -> Self {
        Self { provider, gate }
    }
}

#[async_trait]
impl<P: KeyProvider> DomainAuditor for KeyAuditor<P> {
    fn domain(&self) -> Domain {
        Domain::KeyManagement
    }

    async fn run(&self, mode: RunMode) -> Result<DomainReport, AuditError> {
        let keys = self
            .provider
            .list_keys()
            .await
            .map_err(|source| AuditError::List { domain: Domain::KeyManagement, source })?;
        info!(event_name = "audit.keys.started", key_count = keys.len(), "key audit started");

        let mut report = DomainReport::empty(Domain::KeyManagement);
        for key_id in keys {
            let mut finding = ResourceFinding::new(Resource::from_id(key_id.clone()));

            match self.provider.rotation_enabled(&key_id).await {
                Ok(enabled) => {
                    finding.record_check(CheckResult::new(ROTATION_PROPERTY, enabled));
                    if !enabled {
                        info!(
                            event_name = "audit.keys.rotation_disabled",
                            key_id = %key_id,
                            "key rotation disabled"
                        );
                        if mode == RunMode::Remediate {
                            let record = self
                                .gate
                                .apply(
                                    ENABLE_ROTATION_ACTION,
                                    &key_id,
                                    self.provider.enable_rotation(&key_id),
                                )
                                .await;
                            finding.record_action(record);
                        }
                    }
                }
                Err(error) => {
                    warn!(
                        event_name = "audit.keys.check_failed",
                        key_id = %key_id,
                        error = %error,
                        "rotation check failed; marked non-compliant, no action taken"
                    );
                    finding.record_check(CheckResult::new(ROTATION_PROPERTY, false));
                }
            }

            report.push(finding);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ENABLE_ROTATION_ACTION, KeyAuditor};
    use crate::audit::{AuditError, DomainAuditor, RunMode};
    use crate::domain::Domain;
    use crate::gate::{DryRunGate, GateMode};
    use crate::provider::{FixtureProvider, KeyProvider};

    const KEYS: &str = r#"
[[keys]]
id = "key-rotating"
rotation_enabled = true

[[keys]]
id = "key-stale"
rotation_enabled = false
"#;

    #[tokio::test]
    async fn stale_key_is_fixed_live_and_state_reflects_it() {
        let provider = Arc::new(FixtureProvider::from_toml_str(KEYS).expect("fixture"));
        let auditor = KeyAuditor::new(provider.clone(), DryRunGate::new(GateMode::Live));
        let report = auditor.run(RunMode::Remediate).await.expect("audit");

        let stale = &report.findings[1];
        assert_eq!(stale.actions.len(), 1);
        assert_eq!(stale.actions[0].action, ENABLE_ROTATION_ACTION);
        assert!(stale.actions[0].applied);
        assert!(!stale.actions[0].dry_run);

        // A follow-up state read sees rotation enabled.
        assert!(provider.rotation_enabled("key-stale").await.expect("state"));
    }

    #[tokio::test]
    async fn rotating_key_produces_no_record() {
        let provider = Arc::new(FixtureProvider::from_toml_str(KEYS).expect("fixture"));
        let auditor = KeyAuditor::new(provider, DryRunGate::new(GateMode::Live));
        let report = auditor.run(RunMode::Remediate).await.expect("audit");

        assert!(report.findings[0].checks[0].compliant);
        assert!(report.findings[0].actions.is_empty());
    }

    #[tokio::test]
    async fn listing_failure_is_fatal_for_this_domain_only() {
        let provider = Arc::new(FixtureProvider::from_toml_str(KEYS).expect("fixture"));
        provider.fail_listings("kms endpoint unreachable");
        let auditor = KeyAuditor::new(provider, DryRunGate::default());

        let error = auditor.run(RunMode::Remediate).await.expect_err("listing should fail");
        assert_eq!(error.domain(), Domain::KeyManagement);
        assert!(matches!(error, AuditError::List { .. }));
    }
}
