// Aggregation Logic
// Folds completed method runs into one DetectionResult: weighted mean,
// model-accuracy band adjustment, superficial filename bonus, decision
// rule with overrides, narrative text.

use crate::models::{
    ContentType, DetectionMethod, DetectionResult, MediaDescriptor, MethodRunState, ModelState,
};
use super::calibration::{
    accuracy_factor, sentinel_family_extra, BoostMode, TypeProfile, FILENAME_TERM_BONUS,
    NEUTRAL_SCORE, STRONG_EVIDENCE_BOUND,
};
use super::signals::filename_has_ai_terms;

/// Accuracy bar for the image low-band relief.
const LOW_RELIEF_ACCURACY_BAR: f64 = 0.90;

/// Hedging vocabulary: issues carrying it never count as significant.
const HEDGE_TERMS: [&str; 3] = ["might", "possible", "could be"];

/// Combine per-method run states into the final verdict. Incomplete
/// methods contribute the neutral score at full weight rather than being
/// excluded, so partial completion cannot skew the mean.
pub fn aggregate(
    results: &[MethodRunState],
    catalog: &[DetectionMethod],
    model: &ModelState,
    descriptor: &MediaDescriptor,
    profile: &TypeProfile,
) -> DetectionResult {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut has_strong_evidence = false;
    let mut issues: Vec<String> = Vec::new();

    for (state, method) in results.iter().zip(catalog.iter()) {
        let score = state.manipulation_score.unwrap_or(NEUTRAL_SCORE);
        weighted_sum += score * method.weight;
        total_weight += method.weight;

        if state.complete && score > STRONG_EVIDENCE_BOUND {
            has_strong_evidence = true;
        }
        for issue in &state.issues {
            issues.push(issue.clone());
        }
    }

    let base_score = if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        NEUTRAL_SCORE
    };

    let mut final_score = adjust_for_model(base_score, model, profile);

    if descriptor
        .filename
        .as_deref()
        .map(filename_has_ai_terms)
        .unwrap_or(false)
    {
        final_score += FILENAME_TERM_BONUS;
    }

    let final_score = final_score.clamp(0.0, 100.0);

    dedup_preserving_order(&mut issues);
    let significant_count = issues.iter().filter(|i| !is_hedged(i)).count();

    let threshold = profile.active_threshold(model);
    let is_manipulated = decide(
        final_score,
        threshold,
        has_strong_evidence,
        significant_count,
    );

    let details_text = render_details(
        is_manipulated,
        final_score,
        threshold,
        significant_count,
        model,
    );

    let confidence_score = if is_manipulated {
        final_score
    } else {
        100.0 - final_score
    };

    let human_score = if profile.content_type == ContentType::Text {
        Some(100.0 - final_score)
    } else {
        None
    };

    DetectionResult {
        is_manipulated,
        confidence_score,
        details_text,
        issues,
        human_score,
    }
}

/// The decision rule proper. A score exactly on the threshold stays
/// authentic; strong evidence or two significant issues override.
pub fn decide(
    final_score: f64,
    threshold: f64,
    has_strong_evidence: bool,
    significant_count: usize,
) -> bool {
    final_score > threshold || has_strong_evidence || significant_count >= 2
}

/// Non-linear score adjustment by band, gated on a custom-trained model.
fn adjust_for_model(base_score: f64, model: &ModelState, profile: &TypeProfile) -> f64 {
    if !model.is_custom_trained {
        return base_score;
    }

    let factor = accuracy_factor(model.accuracy);

    if base_score > profile.boost_cutoff {
        let mut boosted = match profile.boost {
            BoostMode::Additive { gain } => base_score + gain * factor,
            BoostMode::Multiplicative { gain } => base_score * (1.0 + gain * factor),
        };
        if profile.vendor_family_boost {
            boosted += sentinel_family_extra(&model.model_version);
        }
        return boosted.min(100.0);
    }

    if base_score >= profile.mid_floor && model.accuracy > profile.mid_bar {
        return base_score + profile.mid_bonus;
    }

    if profile.low_relief > 0.0
        && base_score < profile.low_cutoff
        && model.accuracy >= LOW_RELIEF_ACCURACY_BAR
    {
        return (base_score - profile.low_relief).max(0.0);
    }

    base_score
}

fn is_hedged(issue: &str) -> bool {
    let lower = issue.to_lowercase();
    HEDGE_TERMS.iter().any(|t| lower.contains(t))
}

fn dedup_preserving_order(issues: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    issues.retain(|i| seen.insert(i.clone()));
}

/// Narrative text rendered from the SAME post-override decision and
/// clamped score that the structured result carries.
fn render_details(
    is_manipulated: bool,
    final_score: f64,
    threshold: f64,
    significant_count: usize,
    model: &ModelState,
) -> String {
    let model_note = if model.is_custom_trained && model.accuracy > 0.9 {
        " using a high-accuracy custom model"
    } else if model.is_custom_trained {
        " using an improved custom model"
    } else {
        ""
    };

    if is_manipulated {
        if final_score > threshold {
            format!(
                "Analysis{} indicates manipulation with a {:.1}% likelihood. \
                 Review the listed findings before trusting this content.",
                model_note, final_score
            )
        } else {
            format!(
                "Analysis{} flagged this content as manipulated on {} corroborating \
                 findings despite a moderate score of {:.1}%.",
                model_note, significant_count, final_score
            )
        }
    } else {
        format!(
            "Analysis{} found no reliable signs of manipulation; the content \
             appears authentic with {:.1}% confidence.",
            model_note,
            100.0 - final_score
        )
    }
}
