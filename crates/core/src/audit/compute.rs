//! Compute audit: flags instances whose average CPU over the lookback
//! window sits below the idle threshold and terminates them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{AuditError, DomainAuditor, RunMode};
use crate::domain::{CheckResult, Domain, DomainReport, ResourceFinding};
use crate::gate::DryRunGate;
use crate::provider::ComputeProvider;

pub const UTILIZATION_PROPERTY: &str = "utilization";
pub const TERMINATE_ACTION: &str = "terminate_instance";

pub struct ComputeAuditor<P> {
    provider: Arc<P>,
    gate: DryRunGate,
    window_hours: u32,
    idle_threshold: f64,
}

impl<P: ComputeProvider> ComputeAuditor<P> {
    pub fn new(provider: Arc<P>, gate: DryRunGate, window_hours: u32, idle_threshold: f64) -> Self {
        Self { provider, gate, window_hours, idle_threshold }
    }
}

#[async_trait]
impl<P: ComputeProvider> DomainAuditor for ComputeAuditor<P> {
    fn domain(&self) -> Domain {
        Domain::Compute
    }

    async fn run(&self, mode: RunMode) -> Result<DomainReport, AuditError> {
        let instances = self
            .provider
            .list_instances()
            .await
            .map_err(|source| AuditError::List { domain: Domain::Compute, source })?;
        info!(
            event_name = "audit.compute.started",
            instance_count = instances.len(),
            window_hours = self.window_hours,
            idle_threshold = self.idle_threshold,
            "compute audit started"
        );

        let mut report = DomainReport::empty(Domain::Compute);
        for resource in instances {
            let mut finding = ResourceFinding::new(resource.clone());

            match self.provider.utilization_average(&resource.id, self.window_hours).await {
                Ok(average) => {
                    let compliant = average >= self.idle_threshold;
                    finding.record_check(CheckResult::new(UTILIZATION_PROPERTY, compliant));

                    if compliant {
                        info!(
                            event_name = "audit.compute.active",
                            instance_id = %resource.id,
                            cpu_average = average,
                            "instance above idle threshold"
                        );
                    } else {
                        info!(
                            event_name = "audit.compute.idle",
                            instance_id = %resource.id,
                            cpu_average = average,
                            "instance below idle threshold"
                        );
                        if mode == RunMode::Remediate {
                            let record = self
                                .gate
                                .apply(
                                    TERMINATE_ACTION,
                                    &resource.id,
                                    self.provider.terminate_instance(&resource.id),
                                )
                                .await;
                            finding.record_action(record);
                        }
                    }
                }
                Err(error) => {
                    warn!(
                        event_name = "audit.compute.check_failed",
                        instance_id = %resource.id,
                        error = %error,
                        "utilization check failed; marked non-compliant, no action taken"
                    );
                    finding.record_check(CheckResult::new(UTILIZATION_PROPERTY, false));
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

    use super::{ComputeAuditor, TERMINATE_ACTION, UTILIZATION_PROPERTY};
    use crate::audit::{DomainAuditor, RunMode};
    use crate::gate::{DryRunGate, GateMode};
    use crate::provider::FixtureProvider;

    const FLEET: &str = r#"
[[instances]]
id = "i-idle"
name = "forgotten-batch"
cpu_average = 1.4

[[instances]]
id = "i-busy"
name = "api-node"
cpu_average = 62.0

[[instances]]
id = "i-dark"
name = "no-metrics"
metrics_error = "metric backend unavailable"
"#;

    fn auditor(provider: Arc<FixtureProvider>, gate: DryRunGate) -> ComputeAuditor<FixtureProvider> {
        ComputeAuditor::new(provider, gate, 48, 5.0)
    }

    #[tokio::test]
    async fn idle_instance_is_terminated_in_live_mode() {
        let provider = Arc::new(FixtureProvider::from_toml_str(FLEET).expect("fixture"));
        let report = auditor(provider.clone(), DryRunGate::new(GateMode::Live))
            .run(RunMode::Remediate)
            .await
            .expect("audit");

        let idle = &report.findings[0];
        assert_eq!(idle.resource.id, "i-idle");
        assert!(!idle.checks[0].compliant);
        assert_eq!(idle.actions.len(), 1);
        assert_eq!(idle.actions[0].action, TERMINATE_ACTION);
        assert!(idle.actions[0].applied);
        assert_eq!(provider.mutations(), vec!["terminate_instance:i-idle".to_string()]);
    }

    #[tokio::test]
    async fn busy_instance_gets_no_remediation_record() {
        let provider = Arc::new(FixtureProvider::from_toml_str(FLEET).expect("fixture"));
        let report = auditor(provider, DryRunGate::new(GateMode::Live))
            .run(RunMode::Remediate)
            .await
            .expect("audit");

        let busy = &report.findings[1];
        assert!(busy.checks[0].compliant);
        assert_eq!(busy.checks[0].property, UTILIZATION_PROPERTY);
        assert!(busy.actions.is_empty());
    }

    #[tokio::test]
    async fn metric_failure_marks_non_compliant_without_action() {
        let provider = Arc::new(FixtureProvider::from_toml_str(FLEET).expect("fixture"));
        let report = auditor(provider.clone(), DryRunGate::new(GateMode::Live))
            .run(RunMode::Remediate)
            .await
            .expect("audit");

        let dark = &report.findings[2];
        assert!(!dark.checks[0].compliant);
        assert!(dark.actions.is_empty());
        // The failed check never triggered a terminate call.
        assert_eq!(provider.mutations(), vec!["terminate_instance:i-idle".to_string()]);
    }

    #[tokio::test]
    async fn inspect_mode_checks_without_touching_the_gate() {
        let provider = Arc::new(FixtureProvider::from_toml_str(FLEET).expect("fixture"));
        let report = auditor(provider.clone(), DryRunGate::new(GateMode::Live))
            .run(RunMode::Inspect)
            .await
            .expect("audit");

        assert!(report.findings.iter().all(|finding| finding.actions.is_empty()));
        assert_eq!(provider.mutation_count(), 0);
    }

    #[tokio::test]
    async fn empty_fleet_is_a_valid_empty_report() {
        let provider = Arc::new(FixtureProvider::default());
        let report = auditor(provider, DryRunGate::default())
            .run(RunMode::Remediate)
            .await
            .expect("audit");

        assert!(report.findings.is_empty());
        assert!(report.error.is_none());
    }
}
