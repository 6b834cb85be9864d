// Configuration Storage Service
// Handles config file read/write and version backup

use crate::models::ContentType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub version: String,
    pub detection: DetectionConfig,
    /// Per content type, per method name. The recognized configuration
    /// surface: weight changes alter aggregation, nothing else.
    #[serde(default)]
    pub weight_overrides: HashMap<String, HashMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    #[serde(default = "default_method_duration")]
    pub method_duration_ms: u64,
    #[serde(default = "default_fast_duration")]
    pub fast_method_duration_ms: u64,
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            method_duration_ms: default_method_duration(),
            fast_method_duration_ms: default_fast_duration(),
            history_cap: default_history_cap(),
        }
    }
}

fn default_method_duration() -> u64 { 1800 }
fn default_fast_duration() -> u64 { 120 }
fn default_history_cap() -> usize { 200 }

impl AppConfig {
    /// Valid overrides for one content type; weights outside (0, 1] are
    /// dropped here so the catalog never sees them.
    pub fn overrides_for(&self, content_type: ContentType) -> HashMap<String, f64> {
        self.weight_overrides
            .get(content_type.as_str())
            .map(|m| {
                m.iter()
                    .filter(|(_, &w)| w > 0.0 && w <= 1.0)
                    .map(|(k, &w)| (k.clone(), w))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("veridect"))
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        // Create backup if file exists
        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Create a backup of current config
    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        // Keep only last 10 backups
        self.cleanup_old_backups(&backup_dir, 10)?;

        Ok(())
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &PathBuf, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Sort by modification time (oldest first)
        entries.sort_by_key(|e| {
            e.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        });

        // Remove oldest entries
        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.method_duration_ms, 1800);
        assert!(config.detection.fast_method_duration_ms < config.detection.method_duration_ms);
        assert!(config.weight_overrides.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = AppConfig {
            version: "1.0.0".to_string(),
            detection: DetectionConfig::default(),
            weight_overrides: HashMap::new(),
        };
        config
            .weight_overrides
            .entry("image".to_string())
            .or_default()
            .insert("Facial Landmark Consistency".to_string(), 0.4);

        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, "1.0.0");
        assert_eq!(
            parsed.overrides_for(ContentType::Image)["Facial Landmark Consistency"],
            0.4
        );
    }

    #[test]
    fn test_overrides_for_filters_invalid_weights() {
        let mut config = AppConfig::default();
        let image = config.weight_overrides.entry("image".to_string()).or_default();
        image.insert("a".to_string(), 0.5);
        image.insert("b".to_string(), 0.0);
        image.insert("c".to_string(), 1.2);

        let overrides = config.overrides_for(ContentType::Image);
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides["a"], 0.5);
        assert!(config.overrides_for(ContentType::Audio).is_empty());
    }
}
