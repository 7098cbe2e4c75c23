//! Learnlog - Personal Learning Knowledge Store
//!
//! Learnlog records what you read, what you measured and what you concluded,
//! and keeps a plain-text diary next to it. Everything is reachable as JSON
//! tools, in-process or over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Tool Boundary (api / tools)                 │
//! │   GET /api/v1/tools        POST /api/v1/tools/:name           │
//! └───────────────┬───────────────────────────────┬──────────────┘
//!                 │                               │
//! ┌───────────────▼──────────────────┐  ┌─────────▼──────────────┐
//! │         KnowledgeSystem           │  │       DiaryStore        │
//! │  ┌───────────┐ ┌──────────────┐  │  │  YYYY-MM-DD.md files    │
//! │  │ Resources │ │ Observations │  │  │  recent(n) / append     │
//! │  └─────┬─────┘ └──────┬───────┘  │  └─────────────────────────┘
//! │  ┌─────┴──────────────┴───────┐  │
//! │  │ Takeaways + RelationResolver│  │
//! │  └─────────────┬──────────────┘  │
//! └────────────────┼─────────────────┘
//!                  │ PersistenceBackend
//!        ┌─────────┴──────────┐
//!  ┌─────▼──────┐      ┌──────▼──────┐
//!  │ RestBackend │      │MemoryBackend│
//!  │ (PostgREST) │      │ (in-process)│
//!  └─────────────┘      └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`knowledge`]: Entity types, stores, backends and the relation resolver
//! - [`diary`]: Day-per-file plain-text diary
//! - [`tools`]: Named JSON tools and their HTTP router
//! - [`api`]: Complete HTTP application
//! - [`config`]: Configuration management

pub mod api;
pub mod config;
pub mod diary;
pub mod error;
pub mod knowledge;
pub mod tools;

pub use config::LearnlogConfig;
pub use error::{Error, Result};
pub use knowledge::KnowledgeSystem;
