//! Relation resolver
//!
//! Rehydrates a takeaway with the observations and resources it points to.
//! References are weak: ids that no longer resolve are dropped from the
//! attached sequences without raising an error.
//!
//! ```text
//! takeaway_id ──► TakeawayStore::get_by_id ──► None ──► Ok(None)
//!                          │
//!                          ▼
//!         ┌────────────────┴────────────────┐
//!   select_in(observations)       select_in(learning_resources)
//!         └────────────────┬────────────────┘
//!                          ▼
//!                TakeawayWithRelations
//! ```

use super::backend::{
    decode_rows, PersistenceBackend, ID_COLUMN, OBSERVATIONS_TABLE, RESOURCES_TABLE,
};
use super::takeaway_store::TakeawayStore;
use super::types::{LearningResource, Observation, TakeawayWithRelations};
use crate::error::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Attaches linked entities to takeaways at read time
#[derive(Clone)]
pub struct RelationResolver {
    takeaways: TakeawayStore,
    backend: Arc<dyn PersistenceBackend>,
}

impl RelationResolver {
    pub fn new(takeaways: TakeawayStore, backend: Arc<dyn PersistenceBackend>) -> Self {
        Self { takeaways, backend }
    }

    /// Fetch a takeaway together with its linked observations and resources.
    ///
    /// Returns `Ok(None)` when no takeaway has this id. The attached
    /// sequences come back in backend order, not id-list order.
    pub async fn resolve(&self, takeaway_id: &str) -> Result<Option<TakeawayWithRelations>> {
        let Some(takeaway) = self.takeaways.get_by_id(takeaway_id).await? else {
            tracing::debug!(takeaway_id, "Takeaway not found");
            return Ok(None);
        };

        let observation_ids = takeaway.observation_ids.clone().unwrap_or_default();
        let resource_ids = takeaway.resource_ids.clone().unwrap_or_default();

        let (observations, resources) = futures::try_join!(
            self.fetch_linked::<Observation>(OBSERVATIONS_TABLE, &observation_ids),
            self.fetch_linked::<LearningResource>(RESOURCES_TABLE, &resource_ids),
        )?;

        let missing = (observation_ids.len() + resource_ids.len())
            .saturating_sub(observations.len() + resources.len());
        if missing > 0 {
            tracing::debug!(takeaway_id, "Some linked ids did not resolve");
        }

        Ok(Some(TakeawayWithRelations {
            takeaway,
            observations,
            resources,
        }))
    }

    async fn fetch_linked<T: DeserializeOwned>(&self, table: &str, ids: &[String]) -> Result<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.backend.select_in(table, ID_COLUMN, ids).await?;
        decode_rows(rows)
    }
}
