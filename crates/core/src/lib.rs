pub mod audit;
pub mod config;
pub mod domain;
pub mod gate;
pub mod provider;

pub use audit::{
    AuditError, ComputeAuditor, DomainAuditor, KeyAuditor, RunMode, StorageAuditor,
    report_or_error,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};
pub use domain::{
    AuditReport, CheckResult, Domain, DomainReport, RemediationRecord, Resource, ResourceFinding,
    RouterDecision,
};
pub use gate::{DryRunGate, GateMode};
pub use provider::{
    ComputeProvider, FixtureError, FixtureProvider, KeyProvider, ProviderError, StorageProvider,
};
