// Per-Type Calibration
// One profile record per content type replaces the four near-duplicate
// aggregation variants of the reference behavior. Model accuracy moves
// thresholds and band boosts; raw method scores are the runner's business.

use crate::models::{ContentType, ModelState};

pub const STRONG_EVIDENCE_BOUND: f64 = 80.0;
pub const NEUTRAL_SCORE: f64 = 50.0;
pub const FILENAME_TERM_BONUS: f64 = 10.0;

/// Vendor model versions treated as specialized by the runner bias rule.
pub const SPECIALIZED_VERSIONS: [&str; 2] = ["sentinel-pro", "sentinel-ultra"];

/// Shape of the high-band accuracy adjustment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BoostMode {
    /// score + gain * (accuracy - 0.5) * 2
    Additive { gain: f64 },
    /// score * (1 + gain * (accuracy - 0.5) * 2)
    Multiplicative { gain: f64 },
}

#[derive(Debug, Clone)]
pub struct TypeProfile {
    pub content_type: ContentType,
    /// Decision threshold with the stock model.
    pub threshold_default: f64,
    /// Lowered threshold once a custom model clears `trained_bar`.
    pub threshold_trained: f64,
    pub trained_bar: f64,
    /// Base scores above this enter the high band.
    pub boost_cutoff: f64,
    pub boost: BoostMode,
    /// Flat increment for borderline scores once accuracy clears `mid_bar`.
    pub mid_floor: f64,
    pub mid_bonus: f64,
    pub mid_bar: f64,
    /// Decrement for low base scores under an accurate model (image only:
    /// fewer false positives on confidently authentic calls).
    pub low_cutoff: f64,
    pub low_relief: f64,
    /// Whether the sentinel vendor family earns version-specific extras.
    pub vendor_family_boost: bool,
}

pub fn type_profile(content_type: ContentType) -> TypeProfile {
    match content_type {
        ContentType::Image => TypeProfile {
            content_type,
            threshold_default: 48.0,
            threshold_trained: 45.0,
            trained_bar: 0.85,
            boost_cutoff: 65.0,
            boost: BoostMode::Additive { gain: 12.0 },
            mid_floor: 40.0,
            mid_bonus: 6.0,
            mid_bar: 0.85,
            low_cutoff: 35.0,
            low_relief: 4.0,
            vendor_family_boost: false,
        },
        ContentType::Video => TypeProfile {
            content_type,
            threshold_default: 60.0,
            threshold_trained: 57.0,
            trained_bar: 0.88,
            boost_cutoff: 68.0,
            boost: BoostMode::Multiplicative { gain: 0.18 },
            mid_floor: 45.0,
            mid_bonus: 6.0,
            mid_bar: 0.85,
            low_cutoff: 0.0,
            low_relief: 0.0,
            vendor_family_boost: false,
        },
        ContentType::Audio => TypeProfile {
            content_type,
            threshold_default: 58.0,
            threshold_trained: 56.0,
            trained_bar: 0.90,
            boost_cutoff: 70.0,
            boost: BoostMode::Additive { gain: 10.0 },
            mid_floor: 45.0,
            mid_bonus: 6.0,
            mid_bar: 0.85,
            low_cutoff: 0.0,
            low_relief: 0.0,
            vendor_family_boost: true,
        },
        ContentType::Text => TypeProfile {
            content_type,
            threshold_default: 55.0,
            threshold_trained: 52.0,
            trained_bar: 0.85,
            boost_cutoff: 66.0,
            boost: BoostMode::Additive { gain: 9.0 },
            mid_floor: 40.0,
            mid_bonus: 6.0,
            mid_bar: 0.85,
            low_cutoff: 0.0,
            low_relief: 0.0,
            vendor_family_boost: false,
        },
    }
}

impl TypeProfile {
    /// Threshold in force for this model profile.
    pub fn active_threshold(&self, model: &ModelState) -> f64 {
        if model.is_custom_trained && model.accuracy > self.trained_bar {
            self.threshold_trained
        } else {
            self.threshold_default
        }
    }
}

/// Accuracy mapped onto [0, 1] with 0.5 as the floor of usefulness.
pub fn accuracy_factor(accuracy: f64) -> f64 {
    ((accuracy - 0.5) * 2.0).clamp(0.0, 1.0)
}

pub fn specialized_version(version: &str) -> bool {
    SPECIALIZED_VERSIONS.contains(&version)
}

/// Version-specific extras for the sentinel vendor family.
pub fn sentinel_family_extra(version: &str) -> f64 {
    match version {
        "sentinel-pro" => 3.0,
        "sentinel-ultra" => 5.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trained_threshold_is_lower_everywhere() {
        for ct in ContentType::ALL {
            let profile = type_profile(ct);
            assert!(profile.threshold_trained < profile.threshold_default);
            assert!(profile.boost_cutoff > profile.threshold_default);
        }
    }

    #[test]
    fn test_active_threshold_switches_on_trained_accuracy() {
        let profile = type_profile(ContentType::Image);

        let stock = ModelState::default();
        assert_eq!(profile.active_threshold(&stock), 48.0);

        let trained = ModelState {
            is_custom_trained: true,
            accuracy: 0.95,
            ..Default::default()
        };
        assert_eq!(profile.active_threshold(&trained), 45.0);

        // Custom but below the bar keeps the default threshold.
        let weak = ModelState {
            is_custom_trained: true,
            accuracy: 0.80,
            ..Default::default()
        };
        assert_eq!(profile.active_threshold(&weak), 48.0);
    }

    #[test]
    fn test_specialized_versions() {
        assert!(specialized_version("sentinel-pro"));
        assert!(specialized_version("sentinel-ultra"));
        assert!(!specialized_version("custom-v2"));
        assert_eq!(sentinel_family_extra("sentinel-ultra"), 5.0);
        assert_eq!(sentinel_family_extra("default-v1"), 0.0);
    }

    #[test]
    fn test_accuracy_factor_clamps() {
        assert_eq!(accuracy_factor(0.4), 0.0);
        assert!((accuracy_factor(0.95) - 0.9).abs() < 1e-9);
        assert_eq!(accuracy_factor(1.2), 1.0);
    }
}
