// Veridect Data Models
// Shared between the detection engine, the stores and the CLI surface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============ Content Types ============

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Video,
    Audio,
    Text,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Image,
        ContentType::Video,
        ContentType::Audio,
        ContentType::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Video => "video",
            ContentType::Audio => "audio",
            ContentType::Text => "text",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_lowercase().as_str() {
            "image" => Some(ContentType::Image),
            "video" => Some(ContentType::Video),
            "audio" => Some(ContentType::Audio),
            "text" => Some(ContentType::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodCategory {
    Artifact,
    Spectral,
    Semantic,
    Stylometric,
    Provenance,
}

// ============ Method Catalog ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionMethod {
    pub name: String,
    /// Relative contribution in (0, 1]; catalogs need not sum to 1.
    pub weight: f64,
    pub description: String,
    pub category: MethodCategory,
}

// ============ Method Run State ============

/// Per-submission mutable state of one method. Created fresh for every
/// submission, discarded once the result is finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodRunState {
    pub progress: f64,
    pub complete: bool,
    pub manipulation_score: Option<f64>,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl Default for MethodRunState {
    fn default() -> Self {
        Self {
            progress: 0.0,
            complete: false,
            manipulation_score: None,
            issues: Vec::new(),
        }
    }
}

/// What a single method run resolves to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodOutcome {
    pub manipulation_score: f64,
    pub issues: Vec<String>,
}

// ============ Input Descriptor ============

/// Superficial facts about the submitted content. No codec parsing
/// happens here; dimensions and duration are caller-declared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    pub filename: Option<String>,
    pub size_bytes: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
    pub text: Option<String>,
}

impl MediaDescriptor {
    /// Portrait-framed content gets the higher simulated base band:
    /// face swaps dominate real-world manipulation reports.
    pub fn portrait_like(&self) -> bool {
        if let (Some(w), Some(h)) = (self.width, self.height) {
            if w > 0 {
                let ratio = h as f64 / w as f64;
                if (1.2..=1.5).contains(&ratio) {
                    return true;
                }
            }
        }
        self.filename
            .as_deref()
            .map(|f| {
                let f = f.to_lowercase();
                ["face", "portrait", "selfie", "headshot"]
                    .iter()
                    .any(|t| f.contains(t))
            })
            .unwrap_or(false)
    }
}

// ============ Model State ============

pub const DEFAULT_MODEL_VERSION: &str = "default-v1";

/// Long-lived per-content-type model profile. Mutated only by the
/// training / testing / download operations, read by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelState {
    pub is_custom_trained: bool,
    pub accuracy: f64,
    pub model_version: String,
    #[serde(default)]
    pub is_training: bool,
    #[serde(default)]
    pub datasets: Vec<String>,
    pub last_trained_at: Option<DateTime<Utc>>,
}

impl Default for ModelState {
    fn default() -> Self {
        Self {
            is_custom_trained: false,
            accuracy: default_accuracy(),
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            is_training: false,
            datasets: Vec::new(),
            last_trained_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelTestReport {
    pub content_type: ContentType,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub sample_count: u32,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRecord {
    pub content_type: ContentType,
    pub datasets_added: Vec<String>,
    pub accuracy_after: f64,
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
}

// ============ Detection Result ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub is_manipulated: bool,
    /// Final score when manipulated, its complement otherwise.
    pub confidence_score: f64,
    pub details_text: String,
    #[serde(default)]
    pub issues: Vec<String>,
    /// Human-written likelihood; text submissions only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_score: Option<f64>,
}

// ============ History ============

/// What the engine hands to the recorder once per completed submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub content_type: ContentType,
    pub filename: Option<String>,
    pub text_snippet: Option<String>,
    pub manipulated: bool,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    pub content_type: ContentType,
    pub filename: Option<String>,
    pub text_snippet: Option<String>,
    pub manipulated: bool,
    pub confidence_score: f64,
    pub date: DateTime<Utc>,
}

impl HistoryItem {
    pub fn new(entry: HistoryEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_type: entry.content_type,
            filename: entry.filename,
            text_snippet: entry.text_snippet,
            manipulated: entry.manipulated,
            confidence_score: entry.confidence_score,
            date: Utc::now(),
        }
    }
}

// ============ Scan Request ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub content_type: ContentType,
    pub path: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub declared_width: Option<u32>,
    #[serde(default)]
    pub declared_height: Option<u32>,
    #[serde(default)]
    pub declared_duration_secs: Option<f64>,
    #[serde(default)]
    pub fast: bool,
}

// ============ Default Value Functions ============

fn default_accuracy() -> f64 { 0.72 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse_roundtrip() {
        for ct in ContentType::ALL {
            assert_eq!(ContentType::parse(ct.as_str()), Some(ct));
        }
        assert_eq!(ContentType::parse("gif"), None);
    }

    #[test]
    fn test_default_model_state_invariant() {
        let state = ModelState::default();
        assert!(!state.is_custom_trained);
        assert!(state.datasets.is_empty());
        assert_eq!(state.model_version, DEFAULT_MODEL_VERSION);
    }

    #[test]
    fn test_portrait_like_by_aspect_and_name() {
        let by_aspect = MediaDescriptor {
            width: Some(1080),
            height: Some(1440),
            ..Default::default()
        };
        assert!(by_aspect.portrait_like());

        let by_name = MediaDescriptor {
            filename: Some("holiday_selfie.jpg".to_string()),
            ..Default::default()
        };
        assert!(by_name.portrait_like());

        let neither = MediaDescriptor {
            filename: Some("landscape.jpg".to_string()),
            width: Some(1920),
            height: Some(1080),
            ..Default::default()
        };
        assert!(!neither.portrait_like());
    }
}
