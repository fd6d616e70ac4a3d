use serde::{Deserialize, Serialize};

/// One auditable resource category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "EC2")]
    Compute,
    #[serde(rename = "S3")]
    Storage,
    #[serde(rename = "KMS")]
    KeyManagement,
}

impl Domain {
    /// Fixed audit order: compute, storage, key management.
    pub const ALL: [Domain; 3] = [Domain::Compute, Domain::Storage, Domain::KeyManagement];

    pub fn service_name(&self) -> &'static str {
        match self {
            Self::Compute => "EC2",
            Self::Storage => "S3",
            Self::KeyManagement => "KMS",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.service_name())
    }
}

/// Identity of one auditable unit, read from the provider at audit time.
/// Never persisted by the audit engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }

    /// Resources whose provider exposes no display name (buckets, keys)
    /// reuse their identifier as the name.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self { name: id.clone(), id }
    }
}
