// Command Surface
// The operations the application shell invokes. Wires the stores to the
// detection engine and maps errors to strings at the boundary.

use crate::models::{
    ContentType, DetectionResult, HistoryItem, ModelState, ModelTestReport, ScanRequest,
    TrainingRecord,
};
use crate::services::config_store::{AppConfig, ConfigStore};
use crate::services::detection::pipeline::{run_submission, CancelFlag};
use crate::services::detection::sampler::RngSampler;
use crate::services::detection::with_weight_overrides;
use crate::services::history::{HistoryStore, DEFAULT_HISTORY_CAP};
use crate::services::media_probe::{describe_text, probe_path, DeclaredFacts};
use crate::services::model_store::{ModelStore, UserRole};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct AppStores {
    pub config: ConfigStore,
    pub models: ModelStore,
    pub history: HistoryStore,
}

impl AppStores {
    /// Stores rooted at the platform config/data directories.
    pub fn open_default() -> Result<Self, String> {
        let config_dir = ConfigStore::default_config_dir()
            .ok_or_else(|| "No config directory available".to_string())?;
        let data_dir = ModelStore::default_data_dir()
            .ok_or_else(|| "No data directory available".to_string())?;
        Ok(Self::open_at(&config_dir, &data_dir))
    }

    /// Stores rooted at explicit directories (tests, `--data-dir`).
    pub fn open_at(config_dir: &Path, data_dir: &Path) -> Self {
        let config = ConfigStore::new(config_dir.to_path_buf());
        let cap = config
            .load()
            .map(|c| c.detection.history_cap)
            .unwrap_or(DEFAULT_HISTORY_CAP);
        Self {
            config,
            models: ModelStore::new(data_dir.to_path_buf()),
            history: HistoryStore::new(data_dir.to_path_buf(), cap),
        }
    }
}

fn build_descriptor(request: &ScanRequest) -> Result<crate::models::MediaDescriptor, String> {
    if let Some(text) = request.text.as_deref() {
        return Ok(describe_text(text));
    }

    let path = request
        .path
        .as_deref()
        .ok_or_else(|| "Scan request needs a path or a text snippet".to_string())?;
    let path = PathBuf::from(path);

    if request.content_type == ContentType::Text {
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read text file: {}", e))?;
        let mut descriptor = describe_text(&text);
        descriptor.filename = path.file_name().map(|s| s.to_string_lossy().to_string());
        return Ok(descriptor);
    }

    Ok(probe_path(
        &path,
        DeclaredFacts {
            width: request.declared_width,
            height: request.declared_height,
            duration_secs: request.declared_duration_secs,
        },
    ))
}

/// Run one scan end to end: descriptor, catalog with configured weights,
/// current model profile, pipeline, history.
pub async fn run_scan(
    stores: &AppStores,
    request: &ScanRequest,
    on_progress: impl Fn(f64) + Send + Sync + 'static,
    cancel: &CancelFlag,
) -> Result<DetectionResult, String> {
    let config = stores.config.load()?;
    let descriptor = build_descriptor(request)?;
    let content_type = request.content_type;

    let catalog = with_weight_overrides(content_type, &config.overrides_for(content_type));
    let model = stores
        .models
        .state(content_type)
        .map_err(|e| e.to_string())?;

    let duration_ms = if request.fast {
        config.detection.fast_method_duration_ms
    } else {
        config.detection.method_duration_ms
    };

    info!(
        content_type = content_type.as_str(),
        fast = request.fast,
        "scan requested"
    );

    let mut sampler = RngSampler;
    run_submission(
        content_type,
        &catalog,
        &model,
        &descriptor,
        duration_ms,
        &mut sampler,
        Some(&stores.history),
        on_progress,
        cancel,
    )
    .await
    .ok_or_else(|| "Scan cancelled".to_string())
}

pub async fn train_model(
    stores: &AppStores,
    content_type: ContentType,
    datasets: &[String],
    role: UserRole,
) -> Result<TrainingRecord, String> {
    stores
        .models
        .train(content_type, datasets, role)
        .await
        .map_err(|e| e.to_string())
}

pub fn test_model(
    stores: &AppStores,
    content_type: ContentType,
) -> Result<ModelTestReport, String> {
    let mut sampler = RngSampler;
    stores
        .models
        .test_model(content_type, &mut sampler)
        .map_err(|e| e.to_string())
}

pub fn download_model(
    stores: &AppStores,
    content_type: ContentType,
    version: &str,
    role: UserRole,
) -> Result<ModelState, String> {
    stores
        .models
        .download(content_type, version, role)
        .map_err(|e| e.to_string())
}

pub fn model_state(stores: &AppStores, content_type: ContentType) -> Result<ModelState, String> {
    stores.models.state(content_type).map_err(|e| e.to_string())
}

pub fn list_history(stores: &AppStores) -> Result<Vec<HistoryItem>, String> {
    stores.history.list()
}

pub fn clear_history(stores: &AppStores) -> Result<(), String> {
    stores.history.clear()
}

pub fn get_config(stores: &AppStores) -> Result<AppConfig, String> {
    stores.config.load()
}

pub fn save_config(stores: &AppStores, config: &AppConfig) -> Result<(), String> {
    stores.config.save(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_stores() -> AppStores {
        let root = std::env::temp_dir().join(format!("veridect-test-{}", Uuid::new_v4()));
        AppStores::open_at(&root.join("config"), &root.join("data"))
    }

    #[tokio::test]
    async fn test_text_scan_end_to_end() {
        let stores = temp_stores();
        let request = ScanRequest {
            content_type: ContentType::Text,
            path: None,
            text: Some(
                "The committee reviewed the draft on Tuesday and asked for a shorter \
                 introduction. Two members disagreed about the framing of the third \
                 section, which led to a long discussion about scope."
                    .to_string(),
            ),
            declared_width: None,
            declared_height: None,
            declared_duration_secs: None,
            fast: true,
        };

        let result = run_scan(&stores, &request, |_| {}, &CancelFlag::new())
            .await
            .expect("scan");

        assert!(result.human_score.is_some());
        assert!((0.0..=100.0).contains(&result.confidence_score));

        let history = list_history(&stores).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content_type, ContentType::Text);
        assert!(history[0].text_snippet.is_some());
    }

    #[tokio::test]
    async fn test_scan_request_requires_input() {
        let stores = temp_stores();
        let request = ScanRequest {
            content_type: ContentType::Image,
            path: None,
            text: None,
            declared_width: None,
            declared_height: None,
            declared_duration_secs: None,
            fast: true,
        };

        let err = run_scan(&stores, &request, |_| {}, &CancelFlag::new()).await;
        assert!(err.is_err());
    }
}
