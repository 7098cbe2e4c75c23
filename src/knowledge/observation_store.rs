//! Store for observations

use super::backend::{
    decode_row, decode_rows, encode_row, Order, PersistenceBackend, ID_COLUMN, OBSERVATIONS_TABLE,
};
use super::types::{NewObservation, Observation};
use crate::error::Result;
use std::sync::Arc;

const EXPERIMENT_COLUMN: &str = "experiment_id";
const CREATED_AT_COLUMN: &str = "created_at";

/// Table-backed store for `Observation` records
#[derive(Clone)]
pub struct ObservationStore {
    backend: Arc<dyn PersistenceBackend>,
}

impl ObservationStore {
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self { backend }
    }

    /// Validate and insert a draft, returning the canonical row.
    ///
    /// Not idempotent: calling it twice stores two observations.
    pub async fn create(&self, observation: NewObservation) -> Result<Observation> {
        observation.validate()?;
        let row = encode_row(&observation)?;
        let stored = self.backend.insert(OBSERVATIONS_TABLE, row).await?;
        let created: Observation = decode_row(stored)?;

        tracing::info!(
            id = %created.id,
            experiment_id = created.experiment_id.as_deref().unwrap_or("-"),
            "Created observation"
        );
        Ok(created)
    }

    /// All observations, newest first
    pub async fn list_all(&self) -> Result<Vec<Observation>> {
        let rows = self
            .backend
            .select_all(OBSERVATIONS_TABLE, &Order::desc(CREATED_AT_COLUMN))
            .await?;
        decode_rows(rows)
    }

    /// Fetch one observation, `None` when no row has this id
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Observation>> {
        let rows = self
            .backend
            .select_eq(OBSERVATIONS_TABLE, ID_COLUMN, id, None)
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }

    /// Observations recorded under one experiment, newest first
    pub async fn get_by_experiment(&self, experiment_id: &str) -> Result<Vec<Observation>> {
        let rows = self
            .backend
            .select_eq(
                OBSERVATIONS_TABLE,
                EXPERIMENT_COLUMN,
                experiment_id,
                Some(&Order::desc(CREATED_AT_COLUMN)),
            )
            .await?;
        decode_rows(rows)
    }
}
