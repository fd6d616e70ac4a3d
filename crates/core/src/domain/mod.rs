pub mod decision;
pub mod finding;
pub mod resource;

pub use decision::RouterDecision;
pub use finding::{AuditReport, CheckResult, DomainReport, RemediationRecord, ResourceFinding};
pub use resource::{Domain, Resource};
