use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::resource::{Domain, Resource};

/// Outcome of a single compliance check against one resource. Immutable
/// once produced: a later remediation never rewrites the pre-fix result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub property: String,
    pub compliant: bool,
}

impl CheckResult {
    pub fn new(property: impl Into<String>, compliant: bool) -> Self {
        Self { property: property.into(), compliant }
    }
}

/// Record of one remediation attempt, including suppressed ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationRecord {
    pub action: String,
    pub applied: bool,
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// All check outcomes and actions for one resource, in execution order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFinding {
    pub resource: Resource,
    pub checks: Vec<CheckResult>,
    pub actions: Vec<RemediationRecord>,
}

impl ResourceFinding {
    pub fn new(resource: Resource) -> Self {
        Self { resource, checks: Vec::new(), actions: Vec::new() }
    }

    pub fn record_check(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    pub fn record_action(&mut self, action: RemediationRecord) {
        self.actions.push(action);
    }

    pub fn is_compliant(&self) -> bool {
        self.checks.iter().all(|check| check.compliant)
    }
}

/// One domain's audit result. `error` carries the explicit outcome when
/// resource listing failed; findings stay empty in that case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainReport {
    pub domain: Domain,
    pub findings: Vec<ResourceFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DomainReport {
    pub fn empty(domain: Domain) -> Self {
        Self { domain, findings: Vec::new(), error: None }
    }

    pub fn failed(domain: Domain, message: impl Into<String>) -> Self {
        Self { domain, findings: Vec::new(), error: Some(message.into()) }
    }

    pub fn push(&mut self, finding: ResourceFinding) {
        self.findings.push(finding);
    }
}

/// Merged result of one orchestrator run. Built once, never mutated after
/// the selected domains have reported.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuditReport {
    domains: BTreeMap<Domain, DomainReport>,
}

impl AuditReport {
    pub fn insert(&mut self, report: DomainReport) {
        self.domains.insert(report.domain, report);
    }

    pub fn get(&self, domain: Domain) -> Option<&DomainReport> {
        self.domains.get(&domain)
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.domains.contains_key(&domain)
    }

    pub fn reports(&self) -> impl Iterator<Item = &DomainReport> {
        self.domains.values()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
