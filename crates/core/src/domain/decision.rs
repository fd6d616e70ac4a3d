use serde::{Deserialize, Serialize};

use super::resource::Domain;

/// Which domain audits a free-text request should trigger.
///
/// The wire schema keeps the provider-facing field names (`run_ec2`,
/// `run_s3`, `run_kms`) because those are the names the routing directive
/// instructs the model to emit. All three booleans are mandatory on the
/// wire: a decision with a missing flag does not parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterDecision {
    #[serde(rename = "run_ec2")]
    pub run_compute: bool,
    #[serde(rename = "run_s3")]
    pub run_storage: bool,
    #[serde(rename = "run_kms")]
    pub run_key_management: bool,
    #[serde(default)]
    pub reason: String,
}

impl RouterDecision {
    pub const FALLBACK_REASON: &'static str = "fallback: parse failure";

    pub fn all(reason: impl Into<String>) -> Self {
        Self {
            run_compute: true,
            run_storage: true,
            run_key_management: true,
            reason: reason.into(),
        }
    }

    /// Terminal decision when the model output cannot be recovered:
    /// degrade to auditing everything.
    pub fn fallback() -> Self {
        Self::all(Self::FALLBACK_REASON)
    }

    pub fn runs(&self, domain: Domain) -> bool {
        match domain {
            Domain::Compute => self.run_compute,
            Domain::Storage => self.run_storage,
            Domain::KeyManagement => self.run_key_management,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RouterDecision;

    #[test]
    fn wire_names_follow_the_provider_services() {
        let decision: RouterDecision =
            serde_json::from_str(r#"{"run_ec2":true,"run_s3":false,"run_kms":true,"reason":"keys and instances"}"#)
                .expect("parse");

        assert!(decision.run_compute);
        assert!(!decision.run_storage);
        assert!(decision.run_key_management);
        assert_eq!(decision.reason, "keys and instances");
    }

    #[test]
    fn missing_boolean_field_fails_to_parse() {
        let result = serde_json::from_str::<RouterDecision>(r#"{"run_ec2":true,"run_s3":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn reason_is_optional_on_the_wire() {
        let decision: RouterDecision =
            serde_json::from_str(r#"{"run_ec2":false,"run_s3":true,"run_kms":false}"#)
                .expect("parse");
        assert!(decision.reason.is_empty());
    }
}
