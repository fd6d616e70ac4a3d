//! Turns a structured audit report into a short prose summary.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use cloudwarden_core::domain::AuditReport;

use crate::llm::LlmClient;

pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// One model call per audit run. The prose output is returned as-is;
    /// unlike routing there is no schema to enforce here, so a failure
    /// propagates to the caller instead of degrading.
    pub async fn summarize(&self, report: &AuditReport) -> Result<String> {
        let rendered =
            serde_json::to_string_pretty(report).context("failed to render report as json")?;
        let summary = self
            .llm
            .complete(&summary_directive(&rendered))
            .await
            .context("summary completion failed")?;

        info!(
            event_name = "summarizer.completed",
            domains = report.len(),
            summary_length = summary.len(),
            "audit summary produced"
        );
        Ok(summary)
    }
}

fn summary_directive(rendered_report: &str) -> String {
    format!(
        r#"Summarize the cloud audit results clearly and simply:

{rendered_report}"#
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{Result, anyhow};
    use async_trait::async_trait;

    use cloudwarden_core::domain::{AuditReport, Domain, DomainReport};

    use super::Summarizer;
    use crate::llm::LlmClient;

    struct EchoLlm;

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn complete(&self, prompt: &str) -> Result<String> {
            Ok(format!("summary of {} bytes", prompt.len()))
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("model unavailable"))
        }
    }

    fn report() -> AuditReport {
        let mut report = AuditReport::default();
        report.insert(DomainReport::empty(Domain::Compute));
        report
    }

    #[tokio::test]
    async fn summary_is_the_model_reply() {
        let summarizer = Summarizer::new(Arc::new(EchoLlm));
        let summary = summarizer.summarize(&report()).await.expect("summary");
        assert!(summary.starts_with("summary of"));
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let summarizer = Summarizer::new(Arc::new(FailingLlm));
        assert!(summarizer.summarize(&report()).await.is_err());
    }
}
