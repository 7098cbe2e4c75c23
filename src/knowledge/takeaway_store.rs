//! Store for takeaways
//!
//! Linked observation and resource ids are stored as given; nothing checks
//! that they exist.

use super::backend::{
    decode_row, decode_rows, encode_row, Order, PersistenceBackend, ID_COLUMN, TAKEAWAYS_TABLE,
};
use super::types::{NewTakeaway, Takeaway};
use crate::error::Result;
use std::sync::Arc;

const CREATED_AT_COLUMN: &str = "created_at";

/// Table-backed store for `Takeaway` records
#[derive(Clone)]
pub struct TakeawayStore {
    backend: Arc<dyn PersistenceBackend>,
}

impl TakeawayStore {
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self { backend }
    }

    /// Validate and insert a draft, returning the canonical row.
    ///
    /// Not idempotent: calling it twice stores two takeaways.
    pub async fn create(&self, takeaway: NewTakeaway) -> Result<Takeaway> {
        takeaway.validate()?;
        let row = encode_row(&takeaway)?;
        let stored = self.backend.insert(TAKEAWAYS_TABLE, row).await?;
        let created: Takeaway = decode_row(stored)?;

        tracing::info!(
            id = %created.id,
            observations = created.observation_ids.as_ref().map_or(0, Vec::len),
            resources = created.resource_ids.as_ref().map_or(0, Vec::len),
            "Created takeaway"
        );
        Ok(created)
    }

    /// All takeaways, newest first
    pub async fn list_all(&self) -> Result<Vec<Takeaway>> {
        let rows = self
            .backend
            .select_all(TAKEAWAYS_TABLE, &Order::desc(CREATED_AT_COLUMN))
            .await?;
        decode_rows(rows)
    }

    /// Fetch one takeaway, `None` when no row has this id
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Takeaway>> {
        let rows = self
            .backend
            .select_eq(TAKEAWAYS_TABLE, ID_COLUMN, id, None)
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }
}
