//! Per-tenant model registry
//!
//! An in-memory cache over [`FsStore`]. Readers get an `Arc` snapshot of
//! a tenant's artifacts, so a concurrent save never exposes a
//! half-updated view; a per-key commit lock keeps at most one training
//! commit in flight per tenant.

mod store;

pub use store::{FsStore, TenantArtifacts};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use tracing::info;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LeadScoring,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeadScoring => "lead_scoring",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque tenant identifier; used verbatim in artifact file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub kind: ModelKind,
    pub tenant: TenantId,
}

impl ModelKey {
    pub fn new(kind: ModelKind, tenant: TenantId) -> Self {
        Self { kind, tenant }
    }

    pub fn lead_scoring(tenant: impl Into<String>) -> Self {
        Self::new(ModelKind::LeadScoring, TenantId::new(tenant))
    }
}

#[derive(Default)]
struct Slot {
    artifacts: Option<Arc<TenantArtifacts>>,
    commit_lock: Arc<Mutex<()>>,
}

pub struct ModelRegistry {
    store: FsStore,
    slots: RwLock<HashMap<ModelKey, Slot>>,
}

impl ModelRegistry {
    pub fn new(store: FsStore) -> Self {
        Self {
            store,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &FsStore {
        &self.store
    }

    /// Persist and cache a tenant's artifacts atomically with respect to
    /// concurrent readers: the old snapshot stays visible until the new
    /// one replaces it.
    pub fn save(&self, key: &ModelKey, artifacts: TenantArtifacts) -> Result<()> {
        self.store.save(key, &artifacts)?;
        let mut slots = self.slots.write().expect("registry lock poisoned");
        slots.entry(key.clone()).or_default().artifacts = Some(Arc::new(artifacts));
        info!(kind = %key.kind, tenant = %key.tenant, "model committed");
        Ok(())
    }

    /// Cached snapshot if present, otherwise loaded from disk and cached.
    pub fn load(&self, key: &ModelKey) -> Result<Arc<TenantArtifacts>> {
        {
            let slots = self.slots.read().expect("registry lock poisoned");
            if let Some(artifacts) = slots.get(key).and_then(|s| s.artifacts.clone()) {
                return Ok(artifacts);
            }
        }

        let artifacts = Arc::new(self.store.load(key)?);
        let mut slots = self.slots.write().expect("registry lock poisoned");
        slots.entry(key.clone()).or_default().artifacts = Some(artifacts.clone());
        Ok(artifacts)
    }

    /// Warm the cache from disk; returns the keys now cached. Unreadable
    /// artifacts are skipped (the store logs them).
    pub fn load_all(&self) -> Result<Vec<ModelKey>> {
        let loaded = self.store.load_all()?;
        let mut slots = self.slots.write().expect("registry lock poisoned");
        let mut keys = Vec::with_capacity(loaded.len());
        for (key, artifacts) in loaded {
            slots.entry(key.clone()).or_default().artifacts = Some(Arc::new(artifacts));
            keys.push(key);
        }
        info!(count = keys.len(), "registry warmed from disk");
        Ok(keys)
    }

    pub fn contains(&self, key: &ModelKey) -> bool {
        let slots = self.slots.read().expect("registry lock poisoned");
        slots.get(key).is_some_and(|s| s.artifacts.is_some())
    }

    /// Serialize training commits per key. Blocks until any in-flight
    /// commit for the same key finishes.
    pub fn lock_for_commit(&self, key: &ModelKey) -> Arc<Mutex<()>> {
        let mut slots = self.slots.write().expect("registry lock poisoned");
        slots.entry(key.clone()).or_default().commit_lock.clone()
    }
}
