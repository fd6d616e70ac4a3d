//! Full audit run: route, execute the selected domains, summarize.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use cloudwarden_core::audit::{DomainAuditor, RunMode, report_or_error};
use cloudwarden_core::domain::{AuditReport, RouterDecision};

use crate::router::IntentRouter;
use crate::summarizer::Summarizer;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to summarize audit report")]
    Summarize(#[source] anyhow::Error),
}

/// Outcome of one orchestrated run. The report is complete even when a
/// domain's listing failed; those failures surface inside the report,
/// not as run-level errors. `decision` is `None` when routing was
/// disabled and the model was never consulted.
#[derive(Debug)]
pub struct AuditRun {
    pub decision: Option<RouterDecision>,
    pub report: AuditReport,
    pub summary: String,
}

pub struct AuditOrchestrator {
    auditors: Vec<Arc<dyn DomainAuditor>>,
    router: IntentRouter,
    summarizer: Summarizer,
}

impl AuditOrchestrator {
    pub fn new(
        auditors: Vec<Arc<dyn DomainAuditor>>,
        router: IntentRouter,
        summarizer: Summarizer,
    ) -> Self {
        Self { auditors, router, summarizer }
    }

    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    /// Runs the selected domain audits in their fixed registration order.
    /// With routing disabled the model is never consulted for selection;
    /// every domain runs.
    pub async fn run_audit(
        &self,
        prompt: &str,
        use_routing: bool,
    ) -> Result<AuditRun, OrchestratorError> {
        let run_id = Uuid::new_v4();
        info!(
            event_name = "orchestrator.run_started",
            run_id = %run_id,
            use_routing,
            prompt = %prompt,
            "audit run started"
        );

        let decision = if use_routing { Some(self.router.decide(prompt).await) } else { None };
        let selection =
            decision.clone().unwrap_or_else(|| RouterDecision::all("routing disabled"));

        let mut report = AuditReport::default();
        for auditor in &self.auditors {
            let domain = auditor.domain();
            if !selection.runs(domain) {
                continue;
            }
            report.insert(report_or_error(auditor.run(RunMode::Remediate).await));
        }

        let summary =
            self.summarizer.summarize(&report).await.map_err(OrchestratorError::Summarize)?;

        info!(
            event_name = "orchestrator.run_completed",
            run_id = %run_id,
            domains = report.len(),
            "audit run completed"
        );
        Ok(AuditRun { decision, report, summary })
    }
}
