//! In-memory table backend
//!
//! Keeps every table as a `Vec<Row>` behind a `tokio::sync::RwLock` and
//! assigns ids and timestamps the way the hosted backend does. Timestamps
//! are strictly increasing so insertion order and time order agree.

use super::backend::{timestamp_column, Order, PersistenceBackend, Row, ID_COLUMN};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Row>>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

/// In-process table storage
#[derive(Clone, Default)]
pub struct MemoryBackend {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryBackend {
    /// Create a new backend with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored in a table
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .rows
            .get(table)
            .map_or(0, |rows| rows.len())
    }

    async fn filter_rows<F>(&self, table: &str, predicate: F) -> Vec<Row>
    where
        F: Fn(&Row) -> bool,
    {
        self.tables
            .read()
            .await
            .rows
            .get(table)
            .map(|rows| rows.iter().filter(|r| predicate(*r)).cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row> {
        let stamp_column = timestamp_column(table);
        for column in [ID_COLUMN, stamp_column] {
            if row.contains_key(column) {
                return Err(Error::Persistence(format!(
                    "column {} of {} is assigned by the server",
                    column, table
                )));
            }
        }

        let mut tables = self.tables.write().await;
        let stamp = tables.next_stamp();
        row.insert(
            ID_COLUMN.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
        row.insert(
            stamp_column.to_string(),
            Value::String(stamp.to_rfc3339_opts(SecondsFormat::Micros, false)),
        );

        tables
            .rows
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn select_all(&self, table: &str, order: &Order) -> Result<Vec<Row>> {
        let mut rows = self.filter_rows(table, |_| true).await;
        sort_rows(&mut rows, order);
        Ok(rows)
    }

    async fn select_eq(
        &self,
        table: &str,
        column: &str,
        value: &str,
        order: Option<&Order>,
    ) -> Result<Vec<Row>> {
        let mut rows = self
            .filter_rows(table, |row| {
                row.get(column).and_then(value_text).as_deref() == Some(value)
            })
            .await;
        if let Some(order) = order {
            sort_rows(&mut rows, order);
        }
        Ok(rows)
    }

    async fn select_tag_contains(
        &self,
        table: &str,
        column: &str,
        tags: &[String],
    ) -> Result<Vec<Row>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .filter_rows(table, |row| match row.get(column) {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|item| tags.iter().any(|t| t == item)),
                _ => false,
            })
            .await)
    }

    async fn select_in(&self, table: &str, column: &str, values: &[String]) -> Result<Vec<Row>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .filter_rows(table, |row| {
                row.get(column)
                    .and_then(value_text)
                    .map_or(false, |text| values.iter().any(|v| *v == text))
            })
            .await)
    }
}

/// Scalar value as text, for equality and membership filters
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn sort_rows(rows: &mut [Row], order: &Order) {
    rows.sort_by(|a, b| {
        let ordering = compare_values(a.get(&order.column), b.get(&order.column));
        if order.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Missing and null values sort after everything else in ascending order.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
