//! Entity types for the knowledge store
//!
//! Each entity comes in two shapes. A draft (`NewResource`, `NewObservation`,
//! `NewTakeaway`) is an unsaved value: it has no id and no creation timestamp,
//! and every optional field that is `None` is left out of the write payload.
//! A record (`LearningResource`, `Observation`, `Takeaway`) is the canonical
//! row handed back by the backend, with the server-assigned id and timestamp.
//!
//! Takeaways reference observations and resources by id only. Nothing checks
//! that the ids exist, and removing a referenced entity leaves the takeaway
//! untouched.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of learning material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Paper,
    Blog,
    Documentation,
    Other,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paper => write!(f, "paper"),
            Self::Blog => write!(f, "blog"),
            Self::Documentation => write!(f, "documentation"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "paper" => Ok(Self::Paper),
            "blog" => Ok(Self::Blog),
            "documentation" => Ok(Self::Documentation),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown resource type: {}", other)),
        }
    }
}

// =============================================================================
// Persisted records
// =============================================================================

/// A persisted reference to external or pasted material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    /// Server-assigned identifier
    pub id: String,
    pub title: String,
    pub resource_type: ResourceType,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub content_text: Option<String>,
    /// Display order is preserved; duplicates are allowed
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Server-assigned insertion time
    pub added_at: DateTime<Utc>,
}

/// A persisted raw fact or measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Server-assigned identifier
    pub id: String,
    pub content: String,
    /// Free-text grouping key, not checked against anything
    #[serde(default)]
    pub experiment_id: Option<String>,
    #[serde(default)]
    pub context: Option<HashMap<String, serde_json::Value>>,
    /// Server-assigned insertion time
    pub created_at: DateTime<Utc>,
}

/// A persisted insight linking observations and resources by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Takeaway {
    /// Server-assigned identifier
    pub id: String,
    pub insight: String,
    #[serde(default)]
    pub assumption_before: Option<String>,
    #[serde(default)]
    pub assumption_after: Option<String>,
    #[serde(default)]
    pub observation_ids: Option<Vec<String>>,
    #[serde(default)]
    pub resource_ids: Option<Vec<String>>,
    /// Server-assigned insertion time
    pub created_at: DateTime<Utc>,
}

/// A takeaway with its referenced observations and resources attached.
///
/// The attached sequences follow backend order, not the order of the id
/// lists, and silently skip ids that no longer resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeawayWithRelations {
    #[serde(flatten)]
    pub takeaway: Takeaway,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub resources: Vec<LearningResource>,
}

// =============================================================================
// Drafts
// =============================================================================

/// Unsaved learning resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResource {
    #[serde(default)]
    pub title: String,
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NewResource {
    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)
    }
}

/// Unsaved observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObservation {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl NewObservation {
    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        require_text("content", &self.content)
    }
}

/// Unsaved takeaway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTakeaway {
    #[serde(default)]
    pub insight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumption_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumption_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_ids: Option<Vec<String>>,
}

impl NewTakeaway {
    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        require_text("insight", &self.insight)
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}

// =============================================================================
// Builders
// =============================================================================

/// Builder for constructing `NewResource` drafts
pub struct ResourceBuilder {
    title: Option<String>,
    resource_type: ResourceType,
    source_url: Option<String>,
    content_text: Option<String>,
    tags: Option<Vec<String>>,
}

impl ResourceBuilder {
    /// Create a new builder with the required resource type
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            title: None,
            resource_type,
            source_url: None,
            content_text: None,
            tags: None,
        }
    }

    /// Set the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the source URL
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Set the pasted content
    pub fn content_text(mut self, text: impl Into<String>) -> Self {
        self.content_text = Some(text.into());
        self
    }

    /// Append a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    /// Set the tag list. An empty iterator still sends an empty list.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Build the draft, returning an error if the title is missing
    pub fn build(self) -> Result<NewResource> {
        let draft = NewResource {
            title: self.title.unwrap_or_default(),
            resource_type: self.resource_type,
            source_url: self.source_url,
            content_text: self.content_text,
            tags: self.tags,
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// Builder for constructing `NewObservation` drafts
#[derive(Default)]
pub struct ObservationBuilder {
    content: Option<String>,
    experiment_id: Option<String>,
    context: Option<HashMap<String, serde_json::Value>>,
}

impl ObservationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the observed content
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the experiment grouping key
    pub fn experiment_id(mut self, experiment_id: impl Into<String>) -> Self {
        self.experiment_id = Some(experiment_id.into());
        self
    }

    /// Add a context entry
    pub fn context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Build the draft, returning an error if content is missing
    pub fn build(self) -> Result<NewObservation> {
        let draft = NewObservation {
            content: self.content.unwrap_or_default(),
            experiment_id: self.experiment_id,
            context: self.context,
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// Builder for constructing `NewTakeaway` drafts
#[derive(Default)]
pub struct TakeawayBuilder {
    insight: Option<String>,
    assumption_before: Option<String>,
    assumption_after: Option<String>,
    observation_ids: Option<Vec<String>>,
    resource_ids: Option<Vec<String>>,
}

impl TakeawayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the synthesized insight
    pub fn insight(mut self, insight: impl Into<String>) -> Self {
        self.insight = Some(insight.into());
        self
    }

    /// Set the assumption held before the evidence
    pub fn assumption_before(mut self, text: impl Into<String>) -> Self {
        self.assumption_before = Some(text.into());
        self
    }

    /// Set the assumption held after the evidence
    pub fn assumption_after(mut self, text: impl Into<String>) -> Self {
        self.assumption_after = Some(text.into());
        self
    }

    /// Link a single observation id
    pub fn observation(mut self, id: impl Into<String>) -> Self {
        self.observation_ids
            .get_or_insert_with(Vec::new)
            .push(id.into());
        self
    }

    /// Link several observation ids at once
    pub fn observations(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.observation_ids
            .get_or_insert_with(Vec::new)
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Link a single resource id
    pub fn resource(mut self, id: impl Into<String>) -> Self {
        self.resource_ids.get_or_insert_with(Vec::new).push(id.into());
        self
    }

    /// Link several resource ids at once
    pub fn resources(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.resource_ids
            .get_or_insert_with(Vec::new)
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Build the draft, returning an error if the insight is missing
    pub fn build(self) -> Result<NewTakeaway> {
        let draft = NewTakeaway {
            insight: self.insight.unwrap_or_default(),
            assumption_before: self.assumption_before,
            assumption_after: self.assumption_after,
            observation_ids: self.observation_ids,
            resource_ids: self.resource_ids,
        };
        draft.validate()?;
        Ok(draft)
    }
}
