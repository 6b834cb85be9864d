// Method Catalog
// Static per-content-type method definitions. Pure enumeration: catalog
// order drives animation sequencing only, never the final score.

use crate::models::{ContentType, DetectionMethod, MethodCategory};
use std::collections::HashMap;
use std::sync::OnceLock;

fn entry(
    name: &str,
    weight: f64,
    description: &str,
    category: MethodCategory,
) -> DetectionMethod {
    DetectionMethod {
        name: name.to_string(),
        weight,
        description: description.to_string(),
        category,
    }
}

static CATALOGS: OnceLock<HashMap<ContentType, Vec<DetectionMethod>>> = OnceLock::new();

fn catalogs() -> &'static HashMap<ContentType, Vec<DetectionMethod>> {
    CATALOGS.get_or_init(|| {
        let mut map = HashMap::new();

        map.insert(
            ContentType::Image,
            vec![
                entry(
                    "Facial Landmark Consistency",
                    0.35,
                    "Checks geometric consistency of facial landmarks across the frame",
                    MethodCategory::Artifact,
                ),
                entry(
                    "Frequency Spectrum Analysis",
                    0.35,
                    "Searches the spatial frequency spectrum for generator fingerprints",
                    MethodCategory::Spectral,
                ),
                entry(
                    "Lighting and Shadow Coherence",
                    0.25,
                    "Verifies that illumination direction and cast shadows agree",
                    MethodCategory::Semantic,
                ),
                entry(
                    "Compression History Trace",
                    0.30,
                    "Detects recompression and splicing traces in the encoding history",
                    MethodCategory::Provenance,
                ),
            ],
        );

        map.insert(
            ContentType::Video,
            vec![
                entry(
                    "Temporal Flicker Detection",
                    0.35,
                    "Measures frame-to-frame luminance flicker typical of frame synthesis",
                    MethodCategory::Spectral,
                ),
                entry(
                    "Frame Blending Analysis",
                    0.30,
                    "Finds blended or interpolated frames around edited regions",
                    MethodCategory::Artifact,
                ),
                entry(
                    "Lip-Sync Alignment",
                    0.25,
                    "Scores alignment between mouth motion and the audio track",
                    MethodCategory::Semantic,
                ),
                entry(
                    "Codec Fingerprint Check",
                    0.20,
                    "Compares container and codec fingerprints against the declared source",
                    MethodCategory::Provenance,
                ),
            ],
        );

        map.insert(
            ContentType::Audio,
            vec![
                entry(
                    "Spectral Continuity Analysis",
                    0.35,
                    "Inspects the spectrogram for synthesis seams and band gaps",
                    MethodCategory::Spectral,
                ),
                entry(
                    "Voiceprint Naturalness",
                    0.30,
                    "Rates the naturalness of the speaker embedding against human baselines",
                    MethodCategory::Semantic,
                ),
                entry(
                    "Waveform Splice Detection",
                    0.25,
                    "Locates abrupt phase discontinuities left by waveform splicing",
                    MethodCategory::Artifact,
                ),
                entry(
                    "Breath and Pause Cadence",
                    0.20,
                    "Checks breathing and pause rhythm for cloned-voice regularity",
                    MethodCategory::Stylometric,
                ),
            ],
        );

        map.insert(
            ContentType::Text,
            vec![
                entry(
                    "Token Predictability Profile",
                    0.35,
                    "Profiles how predictable the token stream is for a language model",
                    MethodCategory::Stylometric,
                ),
                entry(
                    "Phrase Repetition and Burstiness",
                    0.30,
                    "Measures phrase reuse and sentence-length burstiness",
                    MethodCategory::Stylometric,
                ),
                entry(
                    "Semantic Coherence Drift",
                    0.25,
                    "Tracks topic drift and unsupported logical leaps between paragraphs",
                    MethodCategory::Semantic,
                ),
                entry(
                    "Formatting Provenance Check",
                    0.15,
                    "Looks for editor and template artifacts inconsistent with the claimed origin",
                    MethodCategory::Provenance,
                ),
            ],
        );

        map
    })
}

/// Canonical ordered method list for one content type.
pub fn methods_for(content_type: ContentType) -> &'static [DetectionMethod] {
    catalogs()
        .get(&content_type)
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Catalog with per-method weight overrides applied — the recognized
/// configuration surface. Unknown names and weights outside (0, 1] are
/// ignored.
pub fn with_weight_overrides(
    content_type: ContentType,
    overrides: &HashMap<String, f64>,
) -> Vec<DetectionMethod> {
    methods_for(content_type)
        .iter()
        .map(|m| {
            let mut m = m.clone();
            if let Some(&w) = overrides.get(&m.name) {
                if w > 0.0 && w <= 1.0 {
                    m.weight = w;
                }
            }
            m
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_has_a_catalog() {
        for ct in ContentType::ALL {
            let methods = methods_for(ct);
            assert!(!methods.is_empty(), "{} catalog empty", ct.as_str());
            for m in methods {
                assert!(m.weight > 0.0 && m.weight <= 1.0);
            }
        }
    }

    #[test]
    fn test_names_unique_within_catalog() {
        for ct in ContentType::ALL {
            let methods = methods_for(ct);
            let mut names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), methods.len());
        }
    }

    #[test]
    fn test_weight_overrides_applied_and_validated() {
        let mut overrides = HashMap::new();
        overrides.insert("Facial Landmark Consistency".to_string(), 0.5);
        overrides.insert("Frequency Spectrum Analysis".to_string(), 1.7); // out of range
        overrides.insert("No Such Method".to_string(), 0.4);

        let methods = with_weight_overrides(ContentType::Image, &overrides);
        let landmark = methods
            .iter()
            .find(|m| m.name == "Facial Landmark Consistency")
            .unwrap();
        let spectrum = methods
            .iter()
            .find(|m| m.name == "Frequency Spectrum Analysis")
            .unwrap();
        assert_eq!(landmark.weight, 0.5);
        assert_eq!(spectrum.weight, 0.35);
        assert_eq!(methods.len(), methods_for(ContentType::Image).len());
    }
}
