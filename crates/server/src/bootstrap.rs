use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use cloudwarden_agent::{AuditOrchestrator, HttpLlmClient, IntentRouter, Summarizer};
use cloudwarden_core::audit::{ComputeAuditor, DomainAuditor, KeyAuditor, StorageAuditor};
use cloudwarden_core::config::{AppConfig, ConfigError, LoadOptions};
use cloudwarden_core::gate::DryRunGate;
use cloudwarden_core::provider::{FixtureError, FixtureProvider};

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("fixture load failed: {0}")]
    Fixture(#[source] FixtureError),
    #[error("llm client setup failed: {0}")]
    Llm(#[source] anyhow::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let provider = match &config.provider.fixture_path {
        Some(path) => FixtureProvider::load(path).map_err(BootstrapError::Fixture)?,
        None => FixtureProvider::default(),
    };
    let provider = Arc::new(provider);
    info!(
        event_name = "system.bootstrap.provider_ready",
        region = %config.provider.region,
        fixture = config.provider.fixture_path.is_some(),
        "resource provider initialized"
    );

    let gate = DryRunGate::from_flag(config.provider.dry_run);
    info!(
        event_name = "system.bootstrap.gate_configured",
        dry_run = gate.is_dry_run(),
        "remediation gate configured"
    );

    let compute: Arc<dyn DomainAuditor> = Arc::new(ComputeAuditor::new(
        provider.clone(),
        gate,
        config.provider.cpu_window_hours,
        config.provider.cpu_idle_threshold,
    ));
    let storage: Arc<dyn DomainAuditor> = Arc::new(StorageAuditor::new(provider.clone(), gate));
    let keys: Arc<dyn DomainAuditor> = Arc::new(KeyAuditor::new(provider, gate));

    let llm = Arc::new(HttpLlmClient::from_config(&config.llm).map_err(BootstrapError::Llm)?);
    let orchestrator = Arc::new(AuditOrchestrator::new(
        vec![compute.clone(), storage.clone(), keys.clone()],
        IntentRouter::new(llm.clone()),
        Summarizer::new(llm),
    ));
    info!(
        event_name = "system.bootstrap.orchestrator_ready",
        model = %config.llm.model,
        "orchestrator initialized"
    );

    let state = AppState { compute, storage, keys, orchestrator, dry_run: gate.is_dry_run() };
    Ok(Application { config, state })
}
