//! Diary of day-per-file plain-text notes
//!
//! Provides recency reads and append-only writes over a directory of
//! `YYYY-MM-DD.md` files. The directory comes from configuration.

pub mod store;

pub use store::{DiaryEntry, DiaryStore};
