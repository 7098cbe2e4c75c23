//! PostgREST table backend
//!
//! Talks to a hosted PostgREST endpoint (`{base_url}/rest/v1/{table}`) with
//! the project key sent both as `apikey` and as a bearer token. Construction
//! does no I/O; connection problems show up on the first call.
//!
//! Filter encoding:
//!
//! | operation             | query parameter          |
//! |-----------------------|--------------------------|
//! | `select_eq`           | `col=eq.value`           |
//! | `select_tag_contains` | `col=ov.{a,b}`           |
//! | `select_in`           | `col=in.(a,b)`           |
//! | ordering              | `order=col.desc`         |

use super::backend::{Order, PersistenceBackend, Row};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Hosted table backend
pub struct RestBackend {
    base_url: String,
    key: String,
    client: reqwest::Client,
}

impl RestBackend {
    /// Create a backend for the given project URL and access key
    pub fn new(base_url: impl Into<String>, key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("backend url is empty".to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            key: key.into(),
            client,
        })
    }

    /// Create a backend from configuration, resolving the key from the environment
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let key = config.resolve_key()?;
        Self::new(
            config.url.clone(),
            key,
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
            .header("Accept", "application/json")
    }

    async fn select(&self, table: &str, filters: Vec<(String, String)>) -> Result<Vec<Row>> {
        let mut query = vec![("select".to_string(), "*".to_string())];
        query.extend(filters);

        tracing::debug!(backend = "rest", table, ?query, "Selecting rows");

        let response = self
            .request(reqwest::Method::GET, table)
            .query(&query)
            .send()
            .await?;

        read_rows(table, response).await
    }
}

#[async_trait]
impl PersistenceBackend for RestBackend {
    fn name(&self) -> &str {
        "rest"
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row> {
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        read_rows(table, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Persistence(format!("insert into {} returned no rows", table)))
    }

    async fn select_all(&self, table: &str, order: &Order) -> Result<Vec<Row>> {
        self.select(table, vec![order_param(order)]).await
    }

    async fn select_eq(
        &self,
        table: &str,
        column: &str,
        value: &str,
        order: Option<&Order>,
    ) -> Result<Vec<Row>> {
        let mut filters = vec![(column.to_string(), format!("eq.{}", value))];
        filters.extend(order.map(order_param));
        self.select(table, filters).await
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
        self.select(table, vec![(column.to_string(), overlap_filter(tags))])
            .await
    }

    async fn select_in(&self, table: &str, column: &str, values: &[String]) -> Result<Vec<Row>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        self.select(table, vec![(column.to_string(), in_filter(values))])
            .await
    }
}

/// PostgREST error body
#[derive(Debug, Deserialize)]
struct RestErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

async fn read_rows(table: &str, response: reqwest::Response) -> Result<Vec<Row>> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let detail = describe_error(&body);
        tracing::warn!(table, %status, "Backend rejected request: {}", detail);
        return Err(Error::Persistence(format!(
            "{} request failed ({}): {}",
            table, status, detail
        )));
    }

    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&body)?)
}

fn describe_error(body: &str) -> String {
    match serde_json::from_str::<RestErrorBody>(body) {
        Ok(parsed) => {
            let mut parts: Vec<String> = Vec::new();
            parts.extend(parsed.message);
            parts.extend(parsed.details);
            parts.extend(parsed.hint.map(|h| format!("hint: {}", h)));
            if parts.is_empty() {
                body.to_string()
            } else {
                parts.join("; ")
            }
        }
        Err(_) => body.to_string(),
    }
}

fn order_param(order: &Order) -> (String, String) {
    let direction = if order.descending { "desc" } else { "asc" };
    ("order".to_string(), format!("{}.{}", order.column, direction))
}

fn in_filter(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| quote_item(v)).collect();
    format!("in.({})", items.join(","))
}

fn overlap_filter(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| quote_item(v)).collect();
    format!("ov.{{{}}}", items.join(","))
}

/// Quote a list element when it contains characters PostgREST reserves.
fn quote_item(value: &str) -> String {
    let reserved = value.is_empty()
        || value
            .chars()
            .any(|c| matches!(c, ',' | '(' | ')' | '{' | '}' | '"' | '\\' | '.' | ':') || c.is_whitespace());
    if !reserved {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
