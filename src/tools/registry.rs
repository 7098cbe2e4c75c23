//! Knowledge tools
//!
//! Named operations taking JSON arguments and returning a `ToolResponse`.
//! A call never fails at the Rust level: bad arguments, validation errors,
//! backend failures and diary failures all come back as error envelopes.

use super::types::{ErrorKind, ToolDefinition, ToolResponse};
use crate::diary::DiaryStore;
use crate::error::Error;
use crate::knowledge::{KnowledgeSystem, NewObservation, NewResource, NewTakeaway};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Section title used by `update_note` when the caller gives none
pub const DEFAULT_NOTE_SECTION: &str = "LLM Update";

/// Prefix marking diary blocks written through the tool boundary
pub const NOTE_SECTION_PREFIX: &str = "AI-update ";

const TOOLS: &[ToolDefinition] = &[
    ToolDefinition {
        name: "create_resource",
        description: "Record a learning resource (title, resource_type, optional source_url, content_text, tags).",
        read_only: false,
    },
    ToolDefinition {
        name: "list_resources",
        description: "List every learning resource, most recently added first.",
        read_only: true,
    },
    ToolDefinition {
        name: "get_resource",
        description: "Fetch one learning resource by id.",
        read_only: true,
    },
    ToolDefinition {
        name: "find_resources_by_tags",
        description: "List resources carrying at least one of the given tags.",
        read_only: true,
    },
    ToolDefinition {
        name: "create_observation",
        description: "Record an observation (content, optional experiment_id and context).",
        read_only: false,
    },
    ToolDefinition {
        name: "list_observations",
        description: "List every observation, most recent first.",
        read_only: true,
    },
    ToolDefinition {
        name: "get_observation",
        description: "Fetch one observation by id.",
        read_only: true,
    },
    ToolDefinition {
        name: "list_observations_by_experiment",
        description: "List observations of one experiment, most recent first.",
        read_only: true,
    },
    ToolDefinition {
        name: "create_takeaway",
        description: "Record a takeaway (insight, optional assumptions and linked observation/resource ids).",
        read_only: false,
    },
    ToolDefinition {
        name: "list_takeaways",
        description: "List every takeaway, most recent first.",
        read_only: true,
    },
    ToolDefinition {
        name: "get_takeaway",
        description: "Fetch one takeaway by id.",
        read_only: true,
    },
    ToolDefinition {
        name: "get_takeaway_with_relations",
        description: "Fetch one takeaway with its linked observations and resources attached.",
        read_only: true,
    },
    ToolDefinition {
        name: "load_recent_diaries",
        description: "Load the n most recent diaries to understand the user's context.",
        read_only: true,
    },
    ToolDefinition {
        name: "update_note",
        description: "Append a titled note to today's diary. llm_input is the text to record, section its title.",
        read_only: false,
    },
];

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

#[derive(Deserialize)]
struct TagsArgs {
    tags: Vec<String>,
}

#[derive(Deserialize)]
struct ExperimentArgs {
    experiment_id: String,
}

#[derive(Deserialize)]
struct RecentArgs {
    #[serde(default)]
    n: Option<usize>,
}

#[derive(Deserialize)]
struct NoteArgs {
    #[serde(default)]
    llm_input: String,
    #[serde(default)]
    section: Option<String>,
}

enum CallError {
    Arguments(serde_json::Error),
    Failed(Error),
}

impl From<Error> for CallError {
    fn from(e: Error) -> Self {
        Self::Failed(e)
    }
}

fn parse<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, CallError> {
    serde_json::from_value(args).map_err(CallError::Arguments)
}

/// Dispatcher for the knowledge and diary tools
pub struct KnowledgeTools {
    system: Arc<KnowledgeSystem>,
    diary: Arc<DiaryStore>,
    recent_default: usize,
}

impl KnowledgeTools {
    pub fn new(system: Arc<KnowledgeSystem>, diary: Arc<DiaryStore>) -> Self {
        Self {
            system,
            diary,
            recent_default: 7,
        }
    }

    /// Diary count used by `load_recent_diaries` when `n` is absent
    pub fn with_recent_default(mut self, n: usize) -> Self {
        self.recent_default = n;
        self
    }

    /// All tool definitions in a stable order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        TOOLS.to_vec()
    }

    /// Run the named tool. A `null` argument value counts as `{}`.
    pub async fn call(&self, name: &str, args: Value) -> ToolResponse {
        let Some(definition) = TOOLS.iter().find(|t| t.name == name) else {
            tracing::warn!(tool = name, "Unknown tool requested");
            return ToolResponse::error(
                ErrorKind::UnknownTool,
                format!("Unknown tool: {}", name),
                format!("no tool named {}", name),
            );
        };

        let args = if args.is_null() {
            Value::Object(Map::new())
        } else {
            args
        };

        tracing::debug!(tool = name, "Tool call");
        match self.dispatch(name, args).await {
            Ok(response) => response,
            Err(CallError::Arguments(e)) => ToolResponse::error(
                ErrorKind::InvalidArguments,
                format!("Invalid arguments for {}", name),
                e.to_string(),
            ),
            Err(CallError::Failed(e)) => {
                let kind = ErrorKind::from_error(&e);
                tracing::warn!(tool = name, kind = e.kind(), error = %e, "Tool call failed");
                let response = ToolResponse::error(kind, failure_message(name, kind), e.to_string());
                if e.is_persistence() && definition.read_only {
                    response.retryable()
                } else {
                    response
                }
            }
        }
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<ToolResponse, CallError> {
        let system = &self.system;
        match name {
            "create_resource" => {
                let draft: NewResource = parse(args)?;
                one("resource", &system.resources.create(draft).await?)
            }
            "list_resources" => many("resources", &system.resources.list_all().await?),
            "get_resource" => {
                let IdArgs { id } = parse(args)?;
                found("resource", &id, system.resources.get_by_id(&id).await?)
            }
            "find_resources_by_tags" => {
                let TagsArgs { tags } = parse(args)?;
                many("resources", &system.resources.get_by_tags(&tags).await?)
            }
            "create_observation" => {
                let draft: NewObservation = parse(args)?;
                one("observation", &system.observations.create(draft).await?)
            }
            "list_observations" => many("observations", &system.observations.list_all().await?),
            "get_observation" => {
                let IdArgs { id } = parse(args)?;
                found("observation", &id, system.observations.get_by_id(&id).await?)
            }
            "list_observations_by_experiment" => {
                let ExperimentArgs { experiment_id } = parse(args)?;
                many(
                    "observations",
                    &system.observations.get_by_experiment(&experiment_id).await?,
                )
            }
            "create_takeaway" => {
                let draft: NewTakeaway = parse(args)?;
                one("takeaway", &system.takeaways.create(draft).await?)
            }
            "list_takeaways" => many("takeaways", &system.takeaways.list_all().await?),
            "get_takeaway" => {
                let IdArgs { id } = parse(args)?;
                found("takeaway", &id, system.takeaways.get_by_id(&id).await?)
            }
            "get_takeaway_with_relations" => {
                let IdArgs { id } = parse(args)?;
                found("takeaway", &id, system.resolver.resolve(&id).await?)
            }
            "load_recent_diaries" => {
                let RecentArgs { n } = parse(args)?;
                let diaries = self.diary.recent(n.unwrap_or(self.recent_default)).await?;
                many("diaries", &diaries)
            }
            "update_note" => {
                let NoteArgs { llm_input, section } = parse(args)?;
                if llm_input.trim().is_empty() {
                    return Err(Error::Validation("llm_input is required".to_string()).into());
                }
                let section = section.unwrap_or_else(|| DEFAULT_NOTE_SECTION.to_string());
                let title = format!("{}{}", NOTE_SECTION_PREFIX, section);
                let file = self.diary.append(&llm_input, &title).await?;

                let mut payload = Map::new();
                payload.insert("file".to_string(), Value::String(file));
                Ok(ToolResponse::success(payload))
            }
            other => Err(Error::Internal(format!("No handler registered for {}", other)).into()),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, CallError> {
    serde_json::to_value(value).map_err(|e| CallError::Failed(Error::Serialization(e)))
}

fn one<T: Serialize>(key: &str, value: &T) -> Result<ToolResponse, CallError> {
    let mut payload = Map::new();
    payload.insert(key.to_string(), to_json(value)?);
    Ok(ToolResponse::success(payload))
}

fn many<T: Serialize>(key: &str, items: &[T]) -> Result<ToolResponse, CallError> {
    let mut payload = Map::new();
    payload.insert("count".to_string(), Value::from(items.len()));
    payload.insert(key.to_string(), to_json(&items)?);
    Ok(ToolResponse::success(payload))
}

fn found<T: Serialize>(entity: &str, id: &str, value: Option<T>) -> Result<ToolResponse, CallError> {
    match value {
        Some(value) => {
            let mut response = one(entity, &value)?;
            response.payload.insert("found".to_string(), Value::Bool(true));
            Ok(response)
        }
        None => Ok(ToolResponse::not_found(entity, id)),
    }
}

fn failure_message(tool: &str, kind: ErrorKind) -> String {
    match kind {
        ErrorKind::Validation => format!("Invalid input for {}", tool),
        ErrorKind::Persistence => "Backend request failed".to_string(),
        ErrorKind::Diary => "Diary operation failed".to_string(),
        _ => format!("{} failed", tool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::knowledge::{MemoryBackend, Order, PersistenceBackend, Row};
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    fn make_tools(backend: Arc<dyn PersistenceBackend>, dir: &TempDir) -> KnowledgeTools {
        KnowledgeTools::new(
            Arc::new(KnowledgeSystem::new(backend)),
            Arc::new(DiaryStore::new(dir.path()).unwrap()),
        )
    }

    fn memory_tools(dir: &TempDir) -> KnowledgeTools {
        make_tools(Arc::new(MemoryBackend::new()), dir)
    }

    fn id_of(resp: &ToolResponse, key: &str) -> String {
        resp.get(key).unwrap()["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_get_resource() {
        let dir = TempDir::new().unwrap();
        let tools = memory_tools(&dir);

        let created = tools
            .call(
                "create_resource",
                json!({"title": "Attention Is All You Need", "resource_type": "paper", "tags": ["nlp"]}),
            )
            .await;
        assert!(created.is_success());
        let id = id_of(&created, "resource");

        let fetched = tools.call("get_resource", json!({"id": id})).await;
        assert!(fetched.is_success());
        assert_eq!(fetched.get("found"), Some(&json!(true)));
        assert_eq!(fetched.get("resource").unwrap()["tags"], json!(["nlp"]));
    }

    #[tokio::test]
    async fn test_create_resource_blank_title() {
        let dir = TempDir::new().unwrap();
        let tools = memory_tools(&dir);

        let resp = tools
            .call("create_resource", json!({"title": "  ", "resource_type": "blog"}))
            .await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::Validation));

        let listed = tools.call("list_resources", Value::Null).await;
        assert_eq!(listed.get("count"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_bad_arguments() {
        let dir = TempDir::new().unwrap();
        let tools = memory_tools(&dir);

        let missing_type = tools.call("create_resource", json!({"title": "x"})).await;
        assert_eq!(missing_type.error_kind(), Some(ErrorKind::InvalidArguments));

        let bad_type = tools
            .call("create_resource", json!({"title": "x", "resource_type": "video"}))
            .await;
        assert_eq!(bad_type.error_kind(), Some(ErrorKind::InvalidArguments));

        let missing_id = tools.call("get_observation", json!({})).await;
        assert_eq!(missing_id.error_kind(), Some(ErrorKind::InvalidArguments));

        let negative = tools.call("load_recent_diaries", json!({"n": -1})).await;
        assert_eq!(negative.error_kind(), Some(ErrorKind::InvalidArguments));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let dir = TempDir::new().unwrap();
        let resp = memory_tools(&dir).call("drop_tables", json!({})).await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::UnknownTool));
    }

    #[tokio::test]
    async fn test_not_found_lookups() {
        let dir = TempDir::new().unwrap();
        let tools = memory_tools(&dir);

        for tool in ["get_resource", "get_observation", "get_takeaway", "get_takeaway_with_relations"] {
            let resp = tools.call(tool, json!({"id": "missing"})).await;
            assert!(resp.is_success(), "{} should succeed", tool);
            assert_eq!(resp.get("found"), Some(&json!(false)));
        }
    }

    #[tokio::test]
    async fn test_find_by_tags_and_experiment() {
        let dir = TempDir::new().unwrap();
        let tools = memory_tools(&dir);

        tools
            .call("create_resource", json!({"title": "a", "resource_type": "paper", "tags": ["x", "y"]}))
            .await;
        tools
            .call("create_resource", json!({"title": "b", "resource_type": "paper", "tags": ["y"]}))
            .await;
        let tagged = tools.call("find_resources_by_tags", json!({"tags": ["x"]})).await;
        assert_eq!(tagged.get("count"), Some(&json!(1)));
        assert_eq!(tagged.get("resources").unwrap()[0]["title"], "a");

        tools
            .call("create_observation", json!({"content": "first", "experiment_id": "E"}))
            .await;
        tools
            .call("create_observation", json!({"content": "other", "experiment_id": "F"}))
            .await;
        tools
            .call("create_observation", json!({"content": "second", "experiment_id": "E"}))
            .await;
        let by_exp = tools
            .call("list_observations_by_experiment", json!({"experiment_id": "E"}))
            .await;
        assert_eq!(by_exp.get("count"), Some(&json!(2)));
        assert_eq!(by_exp.get("observations").unwrap()[0]["content"], "second");
    }

    #[tokio::test]
    async fn test_takeaway_with_relations() {
        let dir = TempDir::new().unwrap();
        let tools = memory_tools(&dir);

        let obs = tools
            .call("create_observation", json!({"content": "BLEU up 15%", "context": {"dataset": "WMT14"}}))
            .await;
        let obs_id = id_of(&obs, "observation");
        let res = tools
            .call("create_resource", json!({"title": "paper", "resource_type": "paper"}))
            .await;
        let res_id = id_of(&res, "resource");

        let takeaway = tools
            .call(
                "create_takeaway",
                json!({"insight": "multi-head helps", "observation_ids": [obs_id], "resource_ids": [res_id, "gone"]}),
            )
            .await;
        let takeaway_id = id_of(&takeaway, "takeaway");

        let enriched = tools
            .call("get_takeaway_with_relations", json!({"id": takeaway_id}))
            .await;
        let body = enriched.get("takeaway").unwrap();
        assert_eq!(body["insight"], "multi-head helps");
        assert_eq!(body["observations"][0]["context"]["dataset"], "WMT14");
        assert_eq!(body["resources"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_note_and_load_recent() {
        let dir = TempDir::new().unwrap();
        let tools = memory_tools(&dir).with_recent_default(1);
        std::fs::write(dir.path().join("2000-01-01.md"), "# 2000-01-01.md\n").unwrap();

        let resp = tools
            .call("update_note", json!({"llm_input": "learned about rope", "section": "Positional"}))
            .await;
        assert!(resp.is_success());
        let file = resp.get("file").unwrap().as_str().unwrap().to_string();

        let content = std::fs::read_to_string(dir.path().join(&file)).unwrap();
        assert!(content.starts_with(&format!("# {}\n\n", file)));
        assert!(content.contains("### AI-update Positional — "));
        assert!(content.contains("learned about rope\n"));

        let recent = tools.call("load_recent_diaries", Value::Null).await;
        assert_eq!(recent.get("count"), Some(&json!(1)));
        assert_eq!(recent.get("diaries").unwrap()[0]["file_name"], json!(file));
    }

    #[tokio::test]
    async fn test_update_note_default_section() {
        let dir = TempDir::new().unwrap();
        let tools = memory_tools(&dir);

        let resp = tools.call("update_note", json!({"llm_input": "x"})).await;
        let file = resp.get("file").unwrap().as_str().unwrap().to_string();
        let content = std::fs::read_to_string(dir.path().join(file)).unwrap();
        assert!(content.contains("### AI-update LLM Update — "));

        let empty = tools.call("update_note", json!({"llm_input": " "})).await;
        assert_eq!(empty.error_kind(), Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_diary_missing_dir() {
        let dir = TempDir::new().unwrap();
        let tools = KnowledgeTools::new(
            Arc::new(KnowledgeSystem::new(Arc::new(MemoryBackend::new()))),
            Arc::new(DiaryStore::new(dir.path().join("gone")).unwrap()),
        );

        let resp = tools.call("load_recent_diaries", json!({"n": 3})).await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::Diary));
        assert!(resp.get("error").unwrap().as_str().unwrap().contains("Diary folder not found"));
    }

    struct Unreachable;

    #[async_trait]
    impl PersistenceBackend for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }
        async fn insert(&self, _table: &str, _row: Row) -> Result<Row> {
            Err(Error::Persistence("connection refused".to_string()))
        }
        async fn select_all(&self, _table: &str, _order: &Order) -> Result<Vec<Row>> {
            Err(Error::Persistence("connection refused".to_string()))
        }
        async fn select_eq(
            &self,
            _table: &str,
            _column: &str,
            _value: &str,
            _order: Option<&Order>,
        ) -> Result<Vec<Row>> {
            Err(Error::Persistence("connection refused".to_string()))
        }
        async fn select_tag_contains(
            &self,
            _table: &str,
            _column: &str,
            _tags: &[String],
        ) -> Result<Vec<Row>> {
            Err(Error::Persistence("connection refused".to_string()))
        }
        async fn select_in(&self, _table: &str, _column: &str, _values: &[String]) -> Result<Vec<Row>> {
            Err(Error::Persistence("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_backend_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let tools = make_tools(Arc::new(Unreachable), &dir);

        let read = tools.call("list_takeaways", json!({})).await;
        assert_eq!(read.error_kind(), Some(ErrorKind::Persistence));
        assert_eq!(read.get("retryable"), Some(&json!(true)));

        let write = tools.call("create_takeaway", json!({"insight": "x"})).await;
        assert_eq!(write.error_kind(), Some(ErrorKind::Persistence));
        assert!(write.get("retryable").is_none());
    }

    #[test]
    fn test_definitions_are_unique() {
        let dir = TempDir::new().unwrap();
        let defs = memory_tools(&dir).definitions();
        assert_eq!(defs.len(), 14);
        let mut names: Vec<_> = defs.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 14);
    }
}
