//! Static tool host
//!
//! A registry-backed implementation of the `ToolHost` port: a shared set
//! of built-in capabilities visible to everyone, with per-identity sets
//! layered on top. Resolution is namespace-scoped - an identity's own
//! capabilities shadow shared ones of the same name, and nobody resolves
//! into another identity's namespace.

use crate::exec::OffloadPool;
use crate::tools::builtin::{CalculatorTool, EchoTool, TimestampTool, UuidTool};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use toolgate_domain::{Capability, CapabilitySpec, Error, Result, ToolHost};

type CapabilityMap = HashMap<String, Arc<dyn Capability>>;

/// Registry-backed tool host
#[derive(Default)]
pub struct StaticToolHost {
    /// Capabilities visible to every caller
    shared: RwLock<CapabilityMap>,
    /// Per-identity capability sets, keyed by identity id
    per_identity: RwLock<HashMap<String, CapabilityMap>>,
}

impl StaticToolHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host pre-loaded with the built-in capability set
    pub fn with_builtins(offload: OffloadPool) -> Self {
        let host = Self::new();
        host.register_shared(Arc::new(TimestampTool));
        host.register_shared(Arc::new(UuidTool));
        host.register_shared(Arc::new(EchoTool));
        host.register_shared(Arc::new(CalculatorTool::new(offload)));
        host
    }

    /// Register a capability visible to every caller
    pub fn register_shared(&self, capability: Arc<dyn Capability>) {
        if let Ok(mut shared) = self.shared.write() {
            shared.insert(capability.spec().name, capability);
        }
    }

    /// Register a capability inside one identity's namespace
    pub fn register_for_identity(&self, identity_id: &str, capability: Arc<dyn Capability>) {
        if let Ok(mut per_identity) = self.per_identity.write() {
            per_identity
                .entry(identity_id.to_string())
                .or_default()
                .insert(capability.spec().name, capability);
        }
    }

    /// Remove an identity's entire capability namespace
    pub fn remove_identity(&self, identity_id: &str) {
        if let Ok(mut per_identity) = self.per_identity.write() {
            per_identity.remove(identity_id);
        }
    }
}

#[async_trait]
impl ToolHost for StaticToolHost {
    async fn list_capabilities(&self, identity_id: Option<&str>) -> Result<Vec<CapabilitySpec>> {
        let shared = self
            .shared
            .read()
            .map_err(|_| Error::internal("Tool host lock poisoned"))?;
        let mut by_name: HashMap<String, CapabilitySpec> = shared
            .values()
            .map(|c| {
                let spec = c.spec();
                (spec.name.clone(), spec)
            })
            .collect();

        if let Some(identity_id) = identity_id {
            let per_identity = self
                .per_identity
                .read()
                .map_err(|_| Error::internal("Tool host lock poisoned"))?;
            if let Some(own) = per_identity.get(identity_id) {
                for capability in own.values() {
                    let spec = capability.spec();
                    by_name.insert(spec.name.clone(), spec);
                }
            }
        }

        let mut specs: Vec<_> = by_name.into_values().collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(specs)
    }

    async fn resolve(
        &self,
        identity_id: Option<&str>,
        name: &str,
    ) -> Result<Option<Arc<dyn Capability>>> {
        if let Some(identity_id) = identity_id {
            let per_identity = self
                .per_identity
                .read()
                .map_err(|_| Error::internal("Tool host lock poisoned"))?;
            if let Some(capability) = per_identity.get(identity_id).and_then(|own| own.get(name)) {
                return Ok(Some(Arc::clone(capability)));
            }
        }

        let shared = self
            .shared
            .read()
            .map_err(|_| Error::internal("Tool host lock poisoned"))?;
        Ok(shared.get(name).map(Arc::clone))
    }
}
