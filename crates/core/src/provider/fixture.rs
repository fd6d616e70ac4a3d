//! In-memory provider backing local runs and tests.
//!
//! The fixture implements all three provider traits over a mutable
//! snapshot loaded from a TOML file. Every mutating call is recorded, so
//! tests can assert that dry-run mode performed no provider mutations.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use super::{ComputeProvider, KeyProvider, ProviderError, StorageProvider};
use crate::domain::Resource;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("could not read fixture file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse fixture file `{path}`: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FixtureState {
    #[serde(default)]
    pub instances: Vec<InstanceFixture>,
    #[serde(default)]
    pub buckets: Vec<BucketFixture>,
    #[serde(default)]
    pub keys: Vec<KeyFixture>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InstanceFixture {
    pub id: String,
    #[serde(default = "default_instance_name")]
    pub name: String,
    #[serde(default)]
    pub cpu_average: f64,
    /// When set, utilization lookups for this instance fail with the
    /// given message instead of returning `cpu_average`.
    #[serde(default)]
    pub metrics_error: Option<String>,
    #[serde(default)]
    pub terminated: bool,
}

fn default_instance_name() -> String {
    "Unnamed".to_string()
}

#[derive(Clone, Debug, Deserialize)]
pub struct BucketFixture {
    pub name: String,
    #[serde(default)]
    pub versioning: bool,
    #[serde(default)]
    pub encryption: bool,
    /// `None` models a bucket with no public-access block configuration,
    /// which the audit treats the same as public access being allowed.
    #[serde(default)]
    pub public_access_blocked: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct KeyFixture {
    pub id: String,
    #[serde(default)]
    pub rotation_enabled: bool,
}

pub struct FixtureProvider {
    state: Mutex<FixtureState>,
    mutations: Mutex<Vec<String>>,
    listing_error: Mutex<Option<String>>,
}

impl Default for FixtureProvider {
    fn default() -> Self {
        Self::from_state(FixtureState::default())
    }
}

impl FixtureProvider {
    pub fn from_state(state: FixtureState) -> Self {
        Self {
            state: Mutex::new(state),
            mutations: Mutex::new(Vec::new()),
            listing_error: Mutex::new(None),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        Ok(Self::from_state(toml::from_str(raw)?))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| FixtureError::Read { path: path.to_path_buf(), source })?;
        let state = toml::from_str(&raw)
            .map_err(|source| FixtureError::Parse { path: path.to_path_buf(), source })?;
        Ok(Self::from_state(state))
    }

    /// Forces all subsequent `list_*` calls to fail, for exercising the
    /// per-domain listing-failure path.
    pub fn fail_listings(&self, message: impl Into<String>) {
        *lock(&self.listing_error) = Some(message.into());
    }

    /// Every mutating provider call received so far, as `action:target`.
    pub fn mutations(&self) -> Vec<String> {
        lock(&self.mutations).clone()
    }

    pub fn mutation_count(&self) -> usize {
        lock(&self.mutations).len()
    }

    fn record_mutation(&self, action: &str, target: &str) {
        lock(&self.mutations).push(format!("{action}:{target}"));
    }

    fn listing_guard(&self) -> Result<(), ProviderError> {
        match lock(&self.listing_error).as_ref() {
            Some(message) => Err(ProviderError::api(message.clone())),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[async_trait]
impl ComputeProvider for FixtureProvider {
    async fn list_instances(&self) -> Result<Vec<Resource>, ProviderError> {
        self.listing_guard()?;
        let state = lock(&self.state);
        Ok(state
            .instances
            .iter()
            .filter(|instance| !instance.terminated)
            .map(|instance| Resource::new(instance.id.clone(), instance.name.clone()))
            .collect())
    }

    async fn utilization_average(
        &self,
        instance_id: &str,
        _window_hours: u32,
    ) -> Result<f64, ProviderError> {
        let state = lock(&self.state);
        let instance = state
            .instances
            .iter()
            .find(|instance| instance.id == instance_id)
            .ok_or_else(|| ProviderError::api(format!("unknown instance `{instance_id}`")))?;
        match &instance.metrics_error {
            Some(message) => Err(ProviderError::api(message.clone())),
            None => Ok(instance.cpu_average),
        }
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.record_mutation("terminate_instance", instance_id);
        let mut state = lock(&self.state);
        let instance = state
            .instances
            .iter_mut()
            .find(|instance| instance.id == instance_id)
            .ok_or_else(|| ProviderError::api(format!("unknown instance `{instance_id}`")))?;
        instance.terminated = true;
        Ok(())
    }
}

#[async_trait]
impl StorageProvider for FixtureProvider {
    async fn list_buckets(&self) -> Result<Vec<String>, ProviderError> {
        self.listing_guard()?;
        let state = lock(&self.state);
        Ok(state.buckets.iter().map(|bucket| bucket.name.clone()).collect())
    }

    async fn versioning_enabled(&self, bucket: &str) -> Result<bool, ProviderError> {
        self.bucket_flag(bucket, |fixture| fixture.versioning)
    }

    async fn encryption_enabled(&self, bucket: &str) -> Result<bool, ProviderError> {
        self.bucket_flag(bucket, |fixture| fixture.encryption)
    }

    async fn public_access_blocked(&self, bucket: &str) -> Result<bool, ProviderError> {
        // Missing block configuration counts as not blocked.
        self.bucket_flag(bucket, |fixture| fixture.public_access_blocked.unwrap_or(false))
    }

    async fn enable_versioning(&self, bucket: &str) -> Result<(), ProviderError> {
        self.record_mutation("enable_versioning", bucket);
        self.update_bucket(bucket, |fixture| fixture.versioning = true)
    }

    async fn enable_encryption(&self, bucket: &str) -> Result<(), ProviderError> {
        self.record_mutation("enable_encryption", bucket);
        self.update_bucket(bucket, |fixture| fixture.encryption = true)
    }

    async fn block_public_access(&self, bucket: &str) -> Result<(), ProviderError> {
        self.record_mutation("block_public_access", bucket);
        self.update_bucket(bucket, |fixture| fixture.public_access_blocked = Some(true))
    }
}

#[async_trait]
impl KeyProvider for FixtureProvider {
    async fn list_keys(&self) -> Result<Vec<String>, ProviderError> {
        self.listing_guard()?;
        let state = lock(&self.state);
        Ok(state.keys.iter().map(|key| key.id.clone()).collect())
    }

    async fn rotation_enabled(&self, key_id: &str) -> Result<bool, ProviderError> {
        let state = lock(&self.state);
        state
            .keys
            .iter()
            .find(|key| key.id == key_id)
            .map(|key| key.rotation_enabled)
            .ok_or_else(|| ProviderError::api(format!("unknown key `{key_id}`")))
    }

    async fn enable_rotation(&self, key_id: &str) -> Result<(), ProviderError> {
        self.record_mutation("enable_rotation", key_id);
        let mut state = lock(&self.state);
        let key = state
            .keys
            .iter_mut()
            .find(|key| key.id == key_id)
            .ok_or_else(|| ProviderError::api(format!("unknown key `{key_id}`")))?;
        key.rotation_enabled = true;
        Ok(())
    }
}

impl FixtureProvider {
    fn bucket_flag(
        &self,
        bucket: &str,
        read: impl Fn(&BucketFixture) -> bool,
    ) -> Result<bool, ProviderError> {
        let state = lock(&self.state);
        state
            .buckets
            .iter()
            .find(|fixture| fixture.name == bucket)
            .map(read)
            .ok_or_else(|| ProviderError::api(format!("unknown bucket `{bucket}`")))
    }

    fn update_bucket(
        &self,
        bucket: &str,
        update: impl FnOnce(&mut BucketFixture),
    ) -> Result<(), ProviderError> {
        let mut state = lock(&self.state);
        let fixture = state
            .buckets
            .iter_mut()
            .find(|fixture| fixture.name == bucket)
            .ok_or_else(|| ProviderError::api(format!("unknown bucket `{bucket}`")))?;
        update(fixture);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FixtureProvider, ProviderError};
    use crate::provider::{ComputeProvider, KeyProvider, StorageProvider};

    const SAMPLE: &str = r#"
[[instances]]
id = "i-0aa1"
name = "batch-worker"
cpu_average = 1.2

[[buckets]]
name = "audit-logs"
versioning = true
encryption = true
public_access_blocked = true

[[buckets]]
name = "scratch"

[[keys]]
id = "key-7f"
rotation_enabled = false
"#;

    #[tokio::test]
    async fn loads_state_and_serves_reads() {
        let provider = FixtureProvider::from_toml_str(SAMPLE).expect("fixture parses");

        let instances = provider.list_instances().await.expect("list");
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "batch-worker");

        assert!(provider.versioning_enabled("audit-logs").await.expect("check"));
        // No explicit block configuration on `scratch`: treated as open.
        assert!(!provider.public_access_blocked("scratch").await.expect("check"));
        assert!(!provider.rotation_enabled("key-7f").await.expect("check"));
    }

    #[tokio::test]
    async fn mutations_are_recorded_and_applied() {
        let provider = FixtureProvider::from_toml_str(SAMPLE).expect("fixture parses");

        provider.enable_rotation("key-7f").await.expect("enable");
        provider.block_public_access("scratch").await.expect("block");

        assert!(provider.rotation_enabled("key-7f").await.expect("check"));
        assert!(provider.public_access_blocked("scratch").await.expect("check"));
        assert_eq!(
            provider.mutations(),
            vec!["enable_rotation:key-7f".to_string(), "block_public_access:scratch".to_string()]
        );
    }

    #[tokio::test]
    async fn terminated_instances_drop_out_of_listings() {
        let provider = FixtureProvider::from_toml_str(SAMPLE).expect("fixture parses");
        provider.terminate_instance("i-0aa1").await.expect("terminate");
        assert!(provider.list_instances().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn forced_listing_failure_hits_every_domain() {
        let provider = FixtureProvider::from_toml_str(SAMPLE).expect("fixture parses");
        provider.fail_listings("simulated outage");

        assert!(matches!(
            provider.list_instances().await,
            Err(ProviderError::Api { ref message }) if message == "simulated outage"
        ));
        assert!(provider.list_buckets().await.is_err());
        assert!(provider.list_keys().await.is_err());
    }

    #[tokio::test]
    async fn unknown_resources_surface_provider_errors() {
        let provider = FixtureProvider::from_toml_str(SAMPLE).expect("fixture parses");
        assert!(provider.rotation_enabled("missing").await.is_err());
        assert!(provider.utilization_average("missing", 48).await.is_err());
    }
}
