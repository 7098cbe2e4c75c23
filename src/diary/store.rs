//! Plain-text diary store
//!
//! Directory layout:
//! ```text
//! <diary dir>/
//! ├── 2025-03-01.md
//! ├── 2025-03-02.md
//! └── ...
//! ```
//!
//! Each file starts with a `# <file name>` header and grows by appended
//! `### <title> — HH:MM` blocks. Files are never rewritten.

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const DIARY_NAME_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}\.md$";

/// One diary file and its full text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiaryEntry {
    pub file_name: String,
    pub content: String,
}

/// Day-per-file diary under a single directory
pub struct DiaryStore {
    dir: PathBuf,
    name_pattern: Regex,
}

impl DiaryStore {
    /// Create a store over an existing directory. The directory is not created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let name_pattern = Regex::new(DIARY_NAME_PATTERN)
            .map_err(|e| Error::Internal(format!("Invalid diary name pattern: {}", e)))?;
        Ok(Self {
            dir: dir.into(),
            name_pattern,
        })
    }

    /// Diary directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the `n` most recent diaries, newest first
    pub async fn recent(&self, n: usize) -> Result<Vec<DiaryEntry>> {
        let mut names = self.diary_names().await?;
        names.sort_unstable_by(|a, b| b.cmp(a));
        names.truncate(n);

        let mut entries = Vec::with_capacity(names.len());
        for file_name in names {
            let content = tokio::fs::read_to_string(self.dir.join(&file_name)).await?;
            entries.push(DiaryEntry { file_name, content });
        }

        tracing::debug!(count = entries.len(), dir = %self.dir.display(), "Loaded recent diaries");
        Ok(entries)
    }

    /// Append a titled block to today's diary, returning the file name
    pub async fn append(&self, text: &str, section_title: &str) -> Result<String> {
        self.append_at(Local::now(), text, section_title).await
    }

    /// Append a titled block to the diary of `now`'s date
    pub async fn append_at(
        &self,
        now: DateTime<Local>,
        text: &str,
        section_title: &str,
    ) -> Result<String> {
        self.ensure_dir().await?;

        let file_name = format!("{}.md", now.format("%Y-%m-%d"));
        let path = self.dir.join(&file_name);

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        if file.metadata().await?.len() == 0 {
            file.write_all(format!("# {}\n\n", file_name).as_bytes())
                .await?;
        }

        let block = format!(
            "\n### {} — {}\n{}\n",
            section_title,
            now.format("%H:%M"),
            text.trim()
        );
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(file = %file_name, section = section_title, "Appended diary block");
        Ok(file_name)
    }

    async fn ensure_dir(&self) -> Result<()> {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(Error::Diary(format!(
                "Diary path is not a directory: {}",
                self.dir.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(self.not_found()),
            Err(e) => Err(e.into()),
        }
    }

    async fn diary_names(&self) -> Result<Vec<String>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(self.not_found()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if self.name_pattern.is_match(&name) && entry.file_type().await?.is_file() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn not_found(&self) -> Error {
        Error::Diary(format!("Diary folder not found: {}", self.dir.display()))
    }
}
