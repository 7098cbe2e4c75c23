//! Persistence capability contract
//!
//! Defines the `PersistenceBackend` trait: the five table operations every
//! durable store must offer. Rows travel as JSON objects; the entity stores
//! own the mapping to typed records.
//!
//! ## Implementations
//!
//! - [`RestBackend`](super::rest::RestBackend): hosted PostgREST tables
//! - [`MemoryBackend`](super::memory::MemoryBackend): in-process tables

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A single table row, column name to value
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Table holding learning resources
pub const RESOURCES_TABLE: &str = "learning_resources";

/// Table holding observations
pub const OBSERVATIONS_TABLE: &str = "observations";

/// Table holding takeaways
pub const TAKEAWAYS_TABLE: &str = "takeaways";

/// Column every table uses for the server-assigned identifier
pub const ID_COLUMN: &str = "id";

/// Server-assigned timestamp column for a table.
pub fn timestamp_column(table: &str) -> &'static str {
    match table {
        RESOURCES_TABLE => "added_at",
        _ => "created_at",
    }
}

/// Sort order for a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    /// Most recent / largest first
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    /// Oldest / smallest first
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }
}

/// Table-style storage interface.
///
/// Failures of any kind surface as `Error::Persistence` (or `Error::Http`
/// for transport problems). Reads are safe to retry; `insert` is not, since
/// a retried insert creates a second row with a new id.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Human-readable name for this backend (used in logs).
    fn name(&self) -> &str;

    /// Insert one row and return it with `id` and the timestamp populated.
    async fn insert(&self, table: &str, row: Row) -> Result<Row>;

    /// Every row of the table in the given order.
    async fn select_all(&self, table: &str, order: &Order) -> Result<Vec<Row>>;

    /// Rows whose `column` equals `value`.
    async fn select_eq(
        &self,
        table: &str,
        column: &str,
        value: &str,
        order: Option<&Order>,
    ) -> Result<Vec<Row>>;

    /// Rows whose array `column` shares at least one element with `tags`.
    async fn select_tag_contains(
        &self,
        table: &str,
        column: &str,
        tags: &[String],
    ) -> Result<Vec<Row>>;

    /// Rows whose `column` value is one of `values`, in no particular order.
    async fn select_in(&self, table: &str, column: &str, values: &[String]) -> Result<Vec<Row>>;
}

/// Serialize a draft into a write payload.
pub(crate) fn encode_row<T: Serialize>(value: &T) -> Result<Row> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(row) => Ok(row),
        other => Err(Error::Internal(format!(
            "expected a JSON object for a row, got {}",
            other
        ))),
    }
}

/// Decode one backend row into a typed record.
pub(crate) fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(row))?)
}

/// Decode backend rows into typed records, keeping their order.
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter().map(decode_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    #[test]
    fn test_timestamp_columns() {
        assert_eq!(timestamp_column(RESOURCES_TABLE), "added_at");
        assert_eq!(timestamp_column(OBSERVATIONS_TABLE), "created_at");
        assert_eq!(timestamp_column(TAKEAWAYS_TABLE), "created_at");
    }

    #[test]
    fn test_order_constructors() {
        assert!(Order::desc("added_at").descending);
        assert!(!Order::asc("added_at").descending);
        assert_eq!(Order::desc("created_at").column, "created_at");
    }

    #[test]
    fn test_encode_row_skips_unset() {
        let row = encode_row(&Sample {
            name: "a".to_string(),
            note: None,
        })
        .unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row["name"], json!("a"));
    }

    #[test]
    fn test_encode_row_rejects_non_object() {
        assert!(matches!(encode_row(&42), Err(Error::Internal(_))));
    }

    #[test]
    fn test_decode_rows_reports_bad_shape() {
        let mut row = Row::new();
        row.insert("note".to_string(), json!("no name"));
        let result: Result<Vec<Sample>> = decode_rows(vec![row]);
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
