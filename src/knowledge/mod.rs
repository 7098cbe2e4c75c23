//! Knowledge store of resources, observations and takeaways
//!
//! Resources and observations are the raw material; takeaways link to them
//! by id. The stores sit on a pluggable `PersistenceBackend`, and the
//! relation resolver rehydrates a takeaway with its links.

pub mod backend;
pub mod memory;
pub mod observation_store;
pub mod resolver;
pub mod resource_store;
pub mod rest;
pub mod system;
pub mod takeaway_store;
pub mod types;

pub use backend::{Order, PersistenceBackend, Row};
pub use memory::MemoryBackend;
pub use observation_store::ObservationStore;
pub use resolver::RelationResolver;
pub use resource_store::ResourceStore;
pub use rest::RestBackend;
pub use system::KnowledgeSystem;
pub use takeaway_store::TakeawayStore;
pub use types::{
    LearningResource, NewObservation, NewResource, NewTakeaway, Observation, ObservationBuilder,
    ResourceBuilder, ResourceType, Takeaway, TakeawayBuilder, TakeawayWithRelations,
};
