//! Store for learning resources
//!
//! Wraps the `learning_resources` table. Records are ordered by `added_at`.

use super::backend::{
    decode_row, decode_rows, encode_row, Order, PersistenceBackend, ID_COLUMN, RESOURCES_TABLE,
};
use super::types::{LearningResource, NewResource};
use crate::error::Result;
use std::sync::Arc;

const TAGS_COLUMN: &str = "tags";
const ADDED_AT_COLUMN: &str = "added_at";

/// Table-backed store for `LearningResource` records
#[derive(Clone)]
pub struct ResourceStore {
    backend: Arc<dyn PersistenceBackend>,
}

impl ResourceStore {
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self { backend }
    }

    /// Validate and insert a draft, returning the canonical row.
    ///
    /// Not idempotent: calling it twice stores two resources.
    pub async fn create(&self, resource: NewResource) -> Result<LearningResource> {
        resource.validate()?;
        let row = encode_row(&resource)?;
        let stored = self.backend.insert(RESOURCES_TABLE, row).await?;
        let created: LearningResource = decode_row(stored)?;

        tracing::info!(
            id = %created.id,
            resource_type = %created.resource_type,
            "Created learning resource '{}'",
            created.title
        );
        Ok(created)
    }

    /// All resources, most recently added first
    pub async fn list_all(&self) -> Result<Vec<LearningResource>> {
        let rows = self
            .backend
            .select_all(RESOURCES_TABLE, &Order::desc(ADDED_AT_COLUMN))
            .await?;
        decode_rows(rows)
    }

    /// Fetch one resource, `None` when no row has this id
    pub async fn get_by_id(&self, id: &str) -> Result<Option<LearningResource>> {
        let rows = self
            .backend
            .select_eq(RESOURCES_TABLE, ID_COLUMN, id, None)
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }

    /// Resources carrying at least one of the given tags
    pub async fn get_by_tags(&self, tags: &[String]) -> Result<Vec<LearningResource>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(?tags, backend = self.backend.name(), "Looking up resources by tag");
        let rows = self
            .backend
            .select_tag_contains(RESOURCES_TABLE, TAGS_COLUMN, tags)
            .await?;
        decode_rows(rows)
    }
}
