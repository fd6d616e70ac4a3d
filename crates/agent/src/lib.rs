//! Agent layer - LLM-assisted routing and narration over the audit core
//!
//! This crate holds every component that talks to a language model:
//! - `router` decides which resource domains a request should audit
//! - `summarizer` turns a structured audit report into prose
//! - `orchestrator` wires routing, domain execution, and summarization
//! - `client` is the HTTP-backed `LlmClient` implementation
//!
//! # Safety Principle
//!
//! The LLM is strictly a translator. It selects WHICH audits run and
//! narrates their results; it never decides compliance outcomes or
//! remediations. Those are deterministic decisions made by the audit
//! core, and a misbehaving model degrades to running everything.

pub mod client;
pub mod llm;
pub mod orchestrator;
pub mod router;
pub mod summarizer;

pub use client::HttpLlmClient;
pub use llm::LlmClient;
pub use orchestrator::{AuditOrchestrator, AuditRun, OrchestratorError};
pub use router::IntentRouter;
pub use summarizer::Summarizer;
