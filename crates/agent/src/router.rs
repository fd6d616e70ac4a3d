//! Intent router: asks the model which resource domains a request wants
//! audited and degrades to auditing everything when the model misbehaves.

use std::sync::Arc;

use tracing::{info, warn};

use cloudwarden_core::domain::RouterDecision;

use crate::llm::LlmClient;

pub struct IntentRouter {
    llm: Arc<dyn LlmClient>,
}

impl IntentRouter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Decides which domains to run. Never fails: a transport error or
    /// a twice-unparseable reply yields the run-everything fallback.
    pub async fn decide(&self, prompt: &str) -> RouterDecision {
        let raw = match self.llm.complete(&routing_directive(prompt)).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(
                    event_name = "router.transport_failed",
                    error = %error,
                    "routing call failed; falling back to all domains"
                );
                return RouterDecision::fallback();
            }
        };

        match parse_decision(&raw) {
            Ok(decision) => {
                info!(
                    event_name = "router.decided",
                    run_compute = decision.run_compute,
                    run_storage = decision.run_storage,
                    run_key_management = decision.run_key_management,
                    reason = %decision.reason,
                    "router decision"
                );
                return decision;
            }
            Err(error) => {
                warn!(
                    event_name = "router.parse_failed",
                    attempt = 1,
                    error = %error,
                    raw = %raw,
                    "router reply was not valid decision JSON; requesting repair"
                );
            }
        }

        let repaired = match self.llm.complete(&repair_directive(&raw)).await {
            Ok(repaired) => repaired,
            Err(error) => {
                warn!(
                    event_name = "router.transport_failed",
                    error = %error,
                    "repair call failed; falling back to all domains"
                );
                return RouterDecision::fallback();
            }
        };

        match parse_decision(&repaired) {
            Ok(decision) => {
                info!(
                    event_name = "router.repaired",
                    reason = %decision.reason,
                    "router decision recovered on second attempt"
                );
                decision
            }
            Err(error) => {
                warn!(
                    event_name = "router.fallback",
                    attempt = 2,
                    error = %error,
                    raw = %repaired,
                    "repair attempt still unparseable; auditing all domains"
                );
                RouterDecision::fallback()
            }
        }
    }
}

/// Strict parse of the decision schema. A reply wrapped in prose or
/// missing any of the three run flags is a parse failure; the repair
/// protocol handles recovery, not lenient extraction.
fn parse_decision(raw: &str) -> Result<RouterDecision, serde_json::Error> {
    serde_json::from_str(raw.trim())
}

fn routing_directive(prompt: &str) -> String {
    format!(
        r#"You are a cloud audit router.
Decide which audits should run based on this user request:

"{prompt}"

Audits:
- EC2 (compute instances)
- S3 (storage buckets)
- KMS (encryption keys)

IMPORTANT RULES:
- Output ONLY valid JSON.
- DO NOT add explanations outside the JSON.
- DO NOT add comments.
- DO NOT add markdown.
- DO NOT say "Here is the JSON".
- JUST return pure JSON.

JSON FORMAT (strict):
{{
    "run_ec2": true/false,
    "run_s3": true/false,
    "run_kms": true/false,
    "reason": "short reason"
}}"#
    )
}

fn repair_directive(previous_reply: &str) -> String {
    format!(
        r#"Convert the following text to strict JSON only.
Do NOT add any extra text.

Input:
{previous_reply}"#
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{Result, anyhow};
    use async_trait::async_trait;

    use cloudwarden_core::domain::{Domain, RouterDecision};

    use super::IntentRouter;
    use crate::llm::LlmClient;

    /// Replays a fixed sequence of replies and counts calls.
    struct ScriptedLlm {
        replies: Vec<Result<String, String>>,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<String, String>>) -> Self {
            Self { replies, calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(index) {
                Some(Ok(reply)) => Ok(reply.clone()),
                Some(Err(message)) => Err(anyhow!(message.clone())),
                None => Err(anyhow!("scripted llm exhausted")),
            }
        }
    }

    const VALID: &str =
        r#"{"run_ec2": true, "run_s3": false, "run_kms": false, "reason": "compute only"}"#;

    #[tokio::test]
    async fn clean_json_is_accepted_on_the_first_attempt() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(VALID.to_string())]));
        let router = IntentRouter::new(llm.clone());

        let decision = router.decide("check my instances").await;
        assert!(decision.runs(Domain::Compute));
        assert!(!decision.runs(Domain::Storage));
        assert!(!decision.runs(Domain::KeyManagement));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn prose_wrapped_json_triggers_one_repair_round() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(format!("Here is the JSON: {VALID}")),
            Ok(VALID.to_string()),
        ]));
        let router = IntentRouter::new(llm.clone());

        let decision = router.decide("check my instances").await;
        assert!(decision.runs(Domain::Compute));
        assert!(!decision.runs(Domain::Storage));
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn two_bad_replies_degrade_to_all_domains() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("I think you should audit compute.".to_string()),
            Ok("Sorry, still prose.".to_string()),
        ]));
        let router = IntentRouter::new(llm.clone());

        let decision = router.decide("check everything").await;
        assert_eq!(decision, RouterDecision::fallback());
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn missing_run_flag_is_a_parse_failure_not_a_default() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(r#"{"run_ec2": true, "run_s3": true, "reason": "forgot one"}"#.to_string()),
            Ok(r#"{"run_ec2": true, "run_s3": true, "reason": "forgot one"}"#.to_string()),
        ]));
        let router = IntentRouter::new(llm);

        let decision = router.decide("audit").await;
        assert_eq!(decision, RouterDecision::fallback());
    }

    #[tokio::test]
    async fn empty_prompt_still_yields_a_full_decision() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("no request, nothing to route".to_string()),
            Ok("still prose".to_string()),
        ]));
        let router = IntentRouter::new(llm);

        let decision = router.decide("").await;
        assert!(decision.run_compute);
        assert!(decision.run_storage);
        assert!(decision.run_key_management);
        assert_eq!(decision.reason, RouterDecision::FALLBACK_REASON);
    }

    #[tokio::test]
    async fn transport_error_falls_back_without_retrying() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err("connection refused".to_string())]));
        let router = IntentRouter::new(llm.clone());

        let decision = router.decide("audit").await;
        assert_eq!(decision, RouterDecision::fallback());
        assert_eq!(llm.calls(), 1);
    }
}
