//! The audit engine: one auditor per resource domain, each walking its
//! provider's inventory and applying an ordered list of check steps.
//!
//! Failure containment rules:
//! - a listing failure is fatal to that domain only (`AuditError::List`);
//! - a check failure on one resource marks the property non-compliant
//!   without remediating, and the walk continues;
//! - a remediation failure is absorbed by the gate into the record.

pub mod compute;
pub mod keys;
pub mod storage;

pub use compute::ComputeAuditor;
pub use keys::KeyAuditor;
pub use storage::StorageAuditor;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Domain, DomainReport};
use crate::provider::ProviderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Checks plus remediation of failures, under the dry-run gate.
    Remediate,
    /// Checks only. Read-only regardless of gate mode.
    Inspect,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuditError {
    #[error("failed to list {domain} resources: {source}")]
    List { domain: Domain, source: ProviderError },
}

impl AuditError {
    pub fn domain(&self) -> Domain {
        match self {
            Self::List { domain, .. } => *domain,
        }
    }
}

/// One resource domain's audit capability.
#[async_trait]
pub trait DomainAuditor: Send + Sync {
    fn domain(&self) -> Domain;
    async fn run(&self, mode: RunMode) -> Result<DomainReport, AuditError>;
}

/// Folds a listing failure into the explicit per-domain error outcome so
/// callers can keep auditing sibling domains.
pub fn report_or_error(result: Result<DomainReport, AuditError>) -> DomainReport {
    match result {
        Ok(report) => report,
        Err(error) => DomainReport::failed(error.domain(), error.to_string()),
    }
}
