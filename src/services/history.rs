// History Store
// JSON-file persistence of finished scans. Recording is fire-and-forget
// from the engine's perspective: failures are logged and reported as a
// bool, never surfaced mid-pipeline.

use crate::models::{HistoryEntry, HistoryItem};
use crate::services::detection::pipeline::HistoryRecorder;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

const HISTORY_FILE: &str = "history.json";
pub const DEFAULT_HISTORY_CAP: usize = 200;

pub struct HistoryStore {
    data_dir: PathBuf,
    history_file: PathBuf,
    cap: usize,
}

impl HistoryStore {
    pub fn new(data_dir: PathBuf, cap: usize) -> Self {
        let history_file = data_dir.join(HISTORY_FILE);
        Self {
            data_dir,
            history_file,
            cap: cap.max(1),
        }
    }

    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("veridect"))
    }

    fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| format!("Failed to create history dir: {}", e))
    }

    /// Newest first.
    pub fn list(&self) -> Result<Vec<HistoryItem>, String> {
        if !self.history_file.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.history_file)
            .map_err(|e| format!("Failed to read history: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse history: {}", e))
    }

    pub fn clear(&self) -> Result<(), String> {
        if self.history_file.exists() {
            fs::remove_file(&self.history_file)
                .map_err(|e| format!("Failed to clear history: {}", e))?;
        }
        Ok(())
    }

    fn append(&self, item: HistoryItem) -> Result<(), String> {
        self.ensure_dir()?;
        let mut items = self.list()?;
        items.insert(0, item);
        items.truncate(self.cap);
        let content = serde_json::to_string_pretty(&items)
            .map_err(|e| format!("Failed to serialize history: {}", e))?;
        fs::write(&self.history_file, content)
            .map_err(|e| format!("Failed to write history: {}", e))
    }
}

impl HistoryRecorder for HistoryStore {
    fn record(&self, entry: HistoryEntry) -> bool {
        match self.append(HistoryItem::new(entry)) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "history record failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use uuid::Uuid;

    fn temp_store(cap: usize) -> HistoryStore {
        let dir = std::env::temp_dir().join(format!("veridect-test-{}", Uuid::new_v4()));
        HistoryStore::new(dir, cap)
    }

    fn entry(filename: &str, confidence: f64) -> HistoryEntry {
        HistoryEntry {
            content_type: ContentType::Image,
            filename: Some(filename.to_string()),
            text_snippet: None,
            manipulated: confidence > 50.0,
            confidence_score: confidence,
        }
    }

    #[test]
    fn test_record_and_list_newest_first() {
        let store = temp_store(10);
        assert!(store.record(entry("first.jpg", 30.0)));
        assert!(store.record(entry("second.jpg", 80.0)));

        let items = store.list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].filename.as_deref(), Some("second.jpg"));
        assert!(items[0].manipulated);
        assert_eq!(items[1].filename.as_deref(), Some("first.jpg"));
    }

    #[test]
    fn test_cap_drops_oldest() {
        let store = temp_store(2);
        assert!(store.record(entry("a.jpg", 10.0)));
        assert!(store.record(entry("b.jpg", 20.0)));
        assert!(store.record(entry("c.jpg", 30.0)));

        let items = store.list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].filename.as_deref(), Some("c.jpg"));
        assert_eq!(items[1].filename.as_deref(), Some("b.jpg"));
    }

    #[test]
    fn test_clear() {
        let store = temp_store(10);
        assert!(store.record(entry("a.jpg", 10.0)));
        store.clear().unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
