pub mod fixture;

pub use fixture::{FixtureError, FixtureProvider, FixtureState};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Resource;

/// Failure of a single provider call. Listing failures are fatal to one
/// domain's audit; check and remediation failures are absorbed at the
/// step boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider call failed: {message}")]
    Api { message: String },
    #[error("provider call timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl ProviderError {
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api { message: message.into() }
    }
}

/// Compute-side provider surface: instance inventory, utilization
/// metrics, and the terminate action.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    async fn list_instances(&self) -> Result<Vec<Resource>, ProviderError>;
    async fn utilization_average(
        &self,
        instance_id: &str,
        window_hours: u32,
    ) -> Result<f64, ProviderError>;
    async fn terminate_instance(&self, instance_id: &str) -> Result<(), ProviderError>;
}

/// Storage-side provider surface. All mutations are idempotent at the
/// provider level: enabling an already-enabled property is a no-op.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<String>, ProviderError>;
    async fn versioning_enabled(&self, bucket: &str) -> Result<bool, ProviderError>;
    async fn encryption_enabled(&self, bucket: &str) -> Result<bool, ProviderError>;
    /// Returns `Ok(false)` both when the block configuration explicitly
    /// allows public access and when no block configuration exists at
    /// all (fail-closed).
    async fn public_access_blocked(&self, bucket: &str) -> Result<bool, ProviderError>;
    async fn enable_versioning(&self, bucket: &str) -> Result<(), ProviderError>;
    async fn enable_encryption(&self, bucket: &str) -> Result<(), ProviderError>;
    async fn block_public_access(&self, bucket: &str) -> Result<(), ProviderError>;
}

/// Key-management provider surface.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn list_keys(&self) -> Result<Vec<String>, ProviderError>;
    async fn rotation_enabled(&self, key_id: &str) -> Result<bool, ProviderError>;
    async fn enable_rotation(&self, key_id: &str) -> Result<(), ProviderError>;
}
