//! "Rate this game" prompt memory
//!
//! The prompt is shown once. After the player answers RateIt or Never it
//! must never come back, so the answer is persisted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

pub trait FeedbackStore: std::fmt::Debug {
    fn has_answered(&self) -> bool;
    fn record_answer(&mut self) -> Result<()>;
}

/// Forgets everything when dropped
#[derive(Debug, Default)]
pub struct MemoryFeedbackStore {
    answered: bool,
}

impl MemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackStore for MemoryFeedbackStore {
    fn has_answered(&self) -> bool {
        self.answered
    }

    fn record_answer(&mut self) -> Result<()> {
        self.answered = true;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FeedbackFile {
    #[serde(default)]
    asked: bool,
}

/// JSON flag file, `{"asked": true}` once the player answered
#[derive(Debug)]
pub struct FileFeedbackStore {
    path: PathBuf,
    answered: bool,
}

impl FileFeedbackStore {
    pub fn open(path: &Path) -> Self {
        let answered = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<FeedbackFile>(&text) {
                Ok(f) => f.asked,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable feedback flag {}: {}", path.display(), e);
                    false
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!("Could not read feedback flag {}: {}", path.display(), e);
                false
            }
        };
        Self { path: path.to_path_buf(), answered }
    }
}

impl FeedbackStore for FileFeedbackStore {
    fn has_answered(&self) -> bool {
        self.answered
    }

    fn record_answer(&mut self) -> Result<()> {
        self.answered = true;
        let json = serde_json::to_string(&FeedbackFile { asked: true }).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, json)?;
        tracing::info!("Saved feedback flag to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_remembers_until_dropped() {
        let mut store = MemoryFeedbackStore::new();
        assert!(!store.has_answered());
        store.record_answer().unwrap();
        assert!(store.has_answered());
    }

    #[test]
    fn file_store_persists_the_answer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.json");
        let mut store = FileFeedbackStore::open(&path);
        assert!(!store.has_answered());
        store.record_answer().unwrap();

        let reopened = FileFeedbackStore::open(&path);
        assert!(reopened.has_answered());
    }

    #[test]
    fn garbage_flag_means_not_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.json");
        std::fs::write(&path, "1").unwrap();
        assert!(!FileFeedbackStore::open(&path).has_answered());
    }
}
