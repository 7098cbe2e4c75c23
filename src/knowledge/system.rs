//! Knowledge system facade
//!
//! One entry point holding the three stores and the relation resolver, all
//! sharing a single backend handle.

use super::backend::PersistenceBackend;
use super::memory::MemoryBackend;
use super::observation_store::ObservationStore;
use super::resolver::RelationResolver;
use super::resource_store::ResourceStore;
use super::rest::RestBackend;
use super::takeaway_store::TakeawayStore;
use crate::config::{BackendConfig, BackendKind};
use crate::error::Result;
use std::sync::Arc;

/// Composition root for the knowledge store
#[derive(Clone)]
pub struct KnowledgeSystem {
    pub resources: ResourceStore,
    pub observations: ObservationStore,
    pub takeaways: TakeawayStore,
    pub resolver: RelationResolver,
}

impl KnowledgeSystem {
    /// Build every component on top of an injected backend
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        let takeaways = TakeawayStore::new(backend.clone());
        Self {
            resources: ResourceStore::new(backend.clone()),
            observations: ObservationStore::new(backend.clone()),
            resolver: RelationResolver::new(takeaways.clone(), backend),
            takeaways,
        }
    }

    /// Build from configuration. No network I/O happens here.
    pub fn connect(config: &BackendConfig) -> Result<Self> {
        let backend: Arc<dyn PersistenceBackend> = match config.kind {
            BackendKind::Rest => Arc::new(RestBackend::from_config(config)?),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };
        tracing::info!(backend = backend.name(), "Knowledge system ready");
        Ok(Self::new(backend))
    }
}
