// Model State Store
// Per-content-type model profiles persisted as JSON, mutated only by the
// training / testing / download operations. The detection engine reads
// these profiles; it never writes them.

use crate::models::{ContentType, ModelState, ModelTestReport, TrainingRecord};
use crate::services::detection::sampler::ScoreSampler;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

const MODELS_FILE: &str = "models.json";
const DEFAULT_TRAINING_DELAY_MS: u64 = 800;
const ACCURACY_CAP: f64 = 0.98;

/// Vendor catalog for the sentinel model family.
const VENDOR_MODELS: [(&str, f64); 2] = [("sentinel-pro", 0.93), ("sentinel-ultra", 0.96)];

#[derive(Error, Debug)]
pub enum ModelOpError {
    #[error("operation requires the admin role")]
    NotAuthorized,
    #[error("training already in progress for {0}")]
    AlreadyTraining(String),
    #[error("no training datasets supplied")]
    EmptyDatasets,
    #[error("unknown vendor model version: {0}")]
    UnknownVendorVersion(String),
    #[error("model store I/O failed: {0}")]
    Io(String),
    #[error("model store serialization failed: {0}")]
    Serde(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Analyst,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ModelStoreFile {
    #[serde(default)]
    models: HashMap<ContentType, ModelState>,
    #[serde(default)]
    training_log: Vec<TrainingRecord>,
}

fn custom_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^custom-v(\d+)$").expect("custom version regex"))
}

/// `custom-vN` increments; anything else restarts the custom line.
fn bump_version(current: &str) -> String {
    if let Some(caps) = custom_version_re().captures(current) {
        if let Ok(n) = caps[1].parse::<u32>() {
            return format!("custom-v{}", n + 1);
        }
    }
    "custom-v1".to_string()
}

pub struct ModelStore {
    data_dir: PathBuf,
    store_file: PathBuf,
    training_delay_ms: u64,
}

impl ModelStore {
    pub fn new(data_dir: PathBuf) -> Self {
        let store_file = data_dir.join(MODELS_FILE);
        Self {
            data_dir,
            store_file,
            training_delay_ms: DEFAULT_TRAINING_DELAY_MS,
        }
    }

    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("veridect"))
    }

    /// Shorten the simulated training run (tests, fast mode).
    pub fn with_training_delay(mut self, delay_ms: u64) -> Self {
        self.training_delay_ms = delay_ms;
        self
    }

    fn ensure_dir(&self) -> Result<(), ModelOpError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| ModelOpError::Io(e.to_string()))
    }

    fn load(&self) -> Result<ModelStoreFile, ModelOpError> {
        if !self.store_file.exists() {
            return Ok(ModelStoreFile::default());
        }
        let content =
            fs::read_to_string(&self.store_file).map_err(|e| ModelOpError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ModelOpError::Serde(e.to_string()))
    }

    fn save(&self, file: &ModelStoreFile) -> Result<(), ModelOpError> {
        self.ensure_dir()?;
        let content =
            serde_json::to_string_pretty(file).map_err(|e| ModelOpError::Serde(e.to_string()))?;
        fs::write(&self.store_file, content).map_err(|e| ModelOpError::Io(e.to_string()))
    }

    /// Current profile for a content type; stock profile if none stored.
    pub fn state(&self, content_type: ContentType) -> Result<ModelState, ModelOpError> {
        let file = self.load()?;
        Ok(file.models.get(&content_type).cloned().unwrap_or_default())
    }

    pub fn training_log(&self) -> Result<Vec<TrainingRecord>, ModelOpError> {
        Ok(self.load()?.training_log)
    }

    /// Simulated training run. Admin-gated, rejects empty dataset lists
    /// and concurrent runs; bumps the custom version line and nudges
    /// accuracy toward the cap.
    pub async fn train(
        &self,
        content_type: ContentType,
        datasets: &[String],
        role: UserRole,
    ) -> Result<TrainingRecord, ModelOpError> {
        if role != UserRole::Admin {
            return Err(ModelOpError::NotAuthorized);
        }
        if datasets.is_empty() {
            return Err(ModelOpError::EmptyDatasets);
        }

        let mut file = self.load()?;
        {
            let state = file.models.entry(content_type).or_default();
            if state.is_training {
                return Err(ModelOpError::AlreadyTraining(
                    content_type.as_str().to_string(),
                ));
            }
            state.is_training = true;
        }
        self.save(&file)?;

        info!(
            content_type = content_type.as_str(),
            datasets = datasets.len(),
            "training started"
        );
        tokio::time::sleep(Duration::from_millis(self.training_delay_ms)).await;

        let record = {
            let now = chrono::Utc::now();
            let state = file.models.entry(content_type).or_default();
            state.is_training = false;
            state.is_custom_trained = true;
            state.accuracy =
                (state.accuracy + 0.05 + 0.01 * datasets.len() as f64).min(ACCURACY_CAP);
            state.model_version = bump_version(&state.model_version);
            for ds in datasets {
                if !state.datasets.contains(ds) {
                    state.datasets.push(ds.clone());
                }
            }
            state.last_trained_at = Some(now);

            TrainingRecord {
                content_type,
                datasets_added: datasets.to_vec(),
                accuracy_after: state.accuracy,
                model_version: state.model_version.clone(),
                trained_at: now,
            }
        };

        file.training_log.push(record.clone());
        self.save(&file)?;

        info!(
            content_type = content_type.as_str(),
            version = %record.model_version,
            accuracy = record.accuracy_after,
            "training finished"
        );
        Ok(record)
    }

    /// Simulated evaluation around the stored accuracy.
    pub fn test_model(
        &self,
        content_type: ContentType,
        sampler: &mut dyn ScoreSampler,
    ) -> Result<ModelTestReport, ModelOpError> {
        let state = self.state(content_type)?;
        let jitter = sampler.in_range(-0.03, 0.03);
        let accuracy = (state.accuracy + jitter).clamp(0.5, 0.99);
        Ok(ModelTestReport {
            content_type,
            accuracy,
            precision: (accuracy - 0.02).clamp(0.5, 0.99),
            recall: (accuracy - 0.04).clamp(0.5, 0.99),
            sample_count: 200 + 40 * state.datasets.len() as u32,
            evaluated_at: chrono::Utc::now(),
        })
    }

    /// Install a vendor model from the sentinel family.
    pub fn download(
        &self,
        content_type: ContentType,
        version: &str,
        role: UserRole,
    ) -> Result<ModelState, ModelOpError> {
        if role != UserRole::Admin {
            return Err(ModelOpError::NotAuthorized);
        }
        let accuracy = VENDOR_MODELS
            .iter()
            .find(|(v, _)| *v == version)
            .map(|(_, a)| *a)
            .ok_or_else(|| ModelOpError::UnknownVendorVersion(version.to_string()))?;

        let mut file = self.load()?;
        let state = file.models.entry(content_type).or_default();
        state.model_version = version.to_string();
        state.accuracy = accuracy;
        state.is_custom_trained = true;
        let installed = state.clone();
        self.save(&file)?;

        info!(
            content_type = content_type.as_str(),
            version = version,
            "vendor model installed"
        );
        Ok(installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::detection::sampler::SequenceSampler;
    use uuid::Uuid;

    fn temp_store() -> ModelStore {
        let dir = std::env::temp_dir().join(format!("veridect-test-{}", Uuid::new_v4()));
        ModelStore::new(dir).with_training_delay(10)
    }

    #[test]
    fn test_version_bump_rule() {
        assert_eq!(bump_version("default-v1"), "custom-v1");
        assert_eq!(bump_version("custom-v1"), "custom-v2");
        assert_eq!(bump_version("custom-v7"), "custom-v8");
        assert_eq!(bump_version("sentinel-pro"), "custom-v1");
    }

    #[tokio::test]
    async fn test_training_upgrades_profile() {
        let store = temp_store();
        let datasets = vec!["celeb-forgeries".to_string(), "newsroom-set".to_string()];

        let record = store
            .train(ContentType::Image, &datasets, UserRole::Admin)
            .await
            .expect("training");

        assert_eq!(record.model_version, "custom-v1");
        let state = store.state(ContentType::Image).unwrap();
        assert!(state.is_custom_trained);
        assert!(!state.is_training);
        assert_eq!(state.datasets, datasets);
        assert!(state.last_trained_at.is_some());
        assert!(state.accuracy > ModelState::default().accuracy);

        // A second run on the already-custom model increments N once.
        let record = store
            .train(ContentType::Image, &datasets[..1].to_vec(), UserRole::Admin)
            .await
            .unwrap();
        assert_eq!(record.model_version, "custom-v2");
        // Dataset list holds unique identifiers only.
        assert_eq!(store.state(ContentType::Image).unwrap().datasets.len(), 2);

        assert_eq!(store.training_log().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_training_authorization_and_validation() {
        let store = temp_store();
        let datasets = vec!["set-a".to_string()];

        let denied = store
            .train(ContentType::Audio, &datasets, UserRole::Analyst)
            .await;
        assert!(matches!(denied, Err(ModelOpError::NotAuthorized)));

        let empty = store.train(ContentType::Audio, &[], UserRole::Admin).await;
        assert!(matches!(empty, Err(ModelOpError::EmptyDatasets)));

        // Nothing was persisted by the failed attempts.
        let state = store.state(ContentType::Audio).unwrap();
        assert!(!state.is_custom_trained);
    }

    #[test]
    fn test_vendor_download() {
        let store = temp_store();

        let state = store
            .download(ContentType::Audio, "sentinel-ultra", UserRole::Admin)
            .expect("download");
        assert_eq!(state.model_version, "sentinel-ultra");
        assert_eq!(state.accuracy, 0.96);
        assert!(state.is_custom_trained);

        let unknown = store.download(ContentType::Audio, "sentinel-lite", UserRole::Admin);
        assert!(matches!(unknown, Err(ModelOpError::UnknownVendorVersion(_))));
    }

    #[test]
    fn test_model_evaluation_report() {
        let store = temp_store();
        let mut sampler = SequenceSampler::new(vec![0.5]); // zero jitter

        let report = store
            .test_model(ContentType::Text, &mut sampler)
            .expect("report");
        let stock = ModelState::default();
        assert!((report.accuracy - stock.accuracy).abs() < 1e-9);
        assert!(report.precision <= report.accuracy);
        assert!(report.recall <= report.precision);
        assert_eq!(report.sample_count, 200);
    }
}
