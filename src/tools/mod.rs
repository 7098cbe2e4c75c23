//! Tool boundary
//!
//! Exposes the knowledge stores and the diary as named JSON tools, callable
//! in-process through `KnowledgeTools::call` or over HTTP through
//! `tools_router`.

pub mod handler;
pub mod registry;
pub mod types;

pub use handler::{tools_router, ToolsState};
pub use registry::{KnowledgeTools, DEFAULT_NOTE_SECTION, NOTE_SECTION_PREFIX};
pub use types::{ErrorKind, ToolDefinition, ToolResponse, ToolStatus};
