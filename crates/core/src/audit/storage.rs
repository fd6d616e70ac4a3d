//! Storage audit: versioning, default encryption, and public access, in
//! that order, with one remediation per failing check.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{AuditError, DomainAuditor, RunMode};
use crate::domain::{CheckResult, Domain, DomainReport, Resource, ResourceFinding};
use crate::gate::DryRunGate;
use crate::provider::{ProviderError, StorageProvider};

/// One (check, remediate) pair for a bucket compliance property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StorageCheck {
    Versioning,
    Encryption,
    PublicAccess,
}

impl StorageCheck {
    const ORDER: [StorageCheck; 3] = [Self::Versioning, Self::Encryption, Self::PublicAccess];

    fn property(self) -> &'static str {
        match self {
            Self::Versioning => "versioning",
            Self::Encryption => "encryption",
            Self::PublicAccess => "public_access",
        }
    }

    fn action(self) -> &'static str {
        match self {
            Self::Versioning => "enable_versioning",
            Self::Encryption => "enable_encryption",
            Self::PublicAccess => "block_public_access",
        }
    }

    async fn check<P: StorageProvider>(
        self,
        provider: &P,
        bucket: &str,
    ) -> Result<bool, ProviderError> {
        match self {
            Self::Versioning => provider.versioning_enabled(bucket).await,
            Self::Encryption => provider.encryption_enabled(bucket).await,
            // A bucket with no block configuration reports not-blocked,
            // so it fails this check (fail-closed).
            Self::PublicAccess => provider.public_access_blocked(bucket).await,
        }
    }

    async fn remediate<P: StorageProvider>(
        self,
        provider: &P,
        bucket: &str,
    ) -> Result<(), ProviderError> {
        match self {
            Self::Versioning => provider.enable_versioning(bucket).await,
            Self::Encryption => provider.enable_encryption(bucket).await,
            Self::PublicAccess => provider.block_public_access(bucket).await,
        }
    }
}

pub struct StorageAuditor<P> {
    provider: Arc<P>,
    gate: DryRunGate,
}

impl<P: StorageProvider> StorageAuditor<P> {
    pub fn new(provider: Arc<P>, gate: DryRunGate) -> Self {
        Self { provider, gate }
    }
}

#[async_trait]
impl<P: StorageProvider> DomainAuditor for StorageAuditor<P> {
    fn domain(&self) -> Domain {
        Domain::Storage
    }

    async fn run(&self, mode: RunMode) -> Result<DomainReport, AuditError> {
        let buckets = self
            .provider
            .list_buckets()
            .await
            .map_err(|source| AuditError::List { domain: Domain::Storage, source })?;
        info!(
            event_name = "audit.storage.started",
            bucket_count = buckets.len(),
            "storage audit started"
        );

        let mut report = DomainReport::empty(Domain::Storage);
        for bucket in buckets {
            let mut finding = ResourceFinding::new(Resource::from_id(bucket.clone()));

            for step in StorageCheck::ORDER {
                match step.check(self.provider.as_ref(), &bucket).await {
                    Ok(compliant) => {
                        finding.record_check(CheckResult::new(step.property(), compliant));
                        if compliant {
                            continue;
                        }
                        info!(
                            event_name = "audit.storage.violation",
                            bucket = %bucket,
                            property = step.property(),
                            "bucket failed compliance check"
                        );
                        if mode == RunMode::Remediate {
                            let record = self
                                .gate
                                .apply(
                                    step.action(),
                                    &bucket,
                                    step.remediate(self.provider.as_ref(), &bucket),
                                )
                                .await;
                            finding.record_action(record);
                        }
                    }
                    Err(error) => {
                        warn!(
                            event_name = "audit.storage.check_failed",
                            bucket = %bucket,
                            property = step.property(),
                            error = %error,
                            "check failed; marked non-compliant, no action taken"
                        );
                        finding.record_check(CheckResult::new(step.property(), false));
                    }
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

    use super::StorageAuditor;
    use crate::audit::{DomainAuditor, RunMode};
    use crate::gate::{DryRunGate, GateMode};
    use crate::provider::FixtureProvider;

    const BUCKETS: &str = r#"
[[buckets]]
name = "hardened"
versioning = true
encryption = true
public_access_blocked = true

[[buckets]]
name = "legacy"
versioning = false
encryption = false
"#;

    #[tokio::test]
    async fn compliant_bucket_produces_checks_but_no_actions() {
        let provider = Arc::new(FixtureProvider::from_toml_str(BUCKETS).expect("fixture"));
        let auditor = StorageAuditor::new(provider, DryRunGate::new(GateMode::Live));
        let report = auditor.run(RunMode::Remediate).await.expect("audit");

        let hardened = &report.findings[0];
        assert!(hardened.is_compliant());
        assert_eq!(hardened.checks.len(), 3);
        assert!(hardened.actions.is_empty());
    }

    #[tokio::test]
    async fn checks_run_in_fixed_order() {
        let provider = Arc::new(FixtureProvider::from_toml_str(BUCKETS).expect("fixture"));
        let auditor = StorageAuditor::new(provider, DryRunGate::default());
        let report = auditor.run(RunMode::Remediate).await.expect("audit");

        let properties: Vec<&str> =
            report.findings[0].checks.iter().map(|check| check.property.as_str()).collect();
        assert_eq!(properties, vec!["versioning", "encryption", "public_access"]);
    }

    #[tokio::test]
    async fn suppress_mode_records_would_apply_without_mutating() {
        let provider = Arc::new(FixtureProvider::from_toml_str(BUCKETS).expect("fixture"));
        let auditor = StorageAuditor::new(provider.clone(), DryRunGate::from_flag(true));
        let report = auditor.run(RunMode::Remediate).await.expect("audit");

        let legacy = &report.findings[1];
        // Three failing checks, one suppressed record each.
        assert_eq!(legacy.actions.len(), 3);
        assert!(legacy.actions.iter().all(|action| !action.applied && action.dry_run));
        assert_eq!(provider.mutation_count(), 0);
    }

    #[tokio::test]
    async fn live_mode_fixes_every_violation() {
        let provider = Arc::new(FixtureProvider::from_toml_str(BUCKETS).expect("fixture"));
        let auditor = StorageAuditor::new(provider.clone(), DryRunGate::new(GateMode::Live));
        let report = auditor.run(RunMode::Remediate).await.expect("audit");

        let legacy = &report.findings[1];
        let actions: Vec<&str> = legacy.actions.iter().map(|action| action.action.as_str()).collect();
        assert_eq!(actions, vec!["enable_versioning", "enable_encryption", "block_public_access"]);
        assert!(legacy.actions.iter().all(|action| action.applied));
        assert_eq!(provider.mutation_count(), 3);
    }

    #[tokio::test]
    async fn missing_block_configuration_counts_as_public() {
        let provider = Arc::new(FixtureProvider::from_toml_str(BUCKETS).expect("fixture"));
        let auditor = StorageAuditor::new(provider, DryRunGate::default());
        let report = auditor.run(RunMode::Inspect).await.expect("audit");

        let legacy = &report.findings[1];
        let public_access =
            legacy.checks.iter().find(|check| check.property == "public_access").expect("check");
        assert!(!public_access.compliant);
    }

    #[tokio::test]
    async fn zero_buckets_is_an_empty_report_not_an_error() {
        let provider = Arc::new(FixtureProvider::default());
        let auditor = StorageAuditor::new(provider, DryRunGate::default());
        let report = auditor.run(RunMode::Remediate).await.expect("audit");

        assert!(report.findings.is_empty());
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn suppressed_runs_are_idempotent() {
        let provider = Arc::new(FixtureProvider::from_toml_str(BUCKETS).expect("fixture"));
        let auditor = StorageAuditor::new(provider, DryRunGate::from_flag(true));

        let first = auditor.run(RunMode::Remediate).await.expect("first run");
        let second = auditor.run(RunMode::Remediate).await.expect("second run");
        assert_eq!(first, second);
    }
}
