// Method Runner
// Drives one method's simulated analysis: 100 ms progress ticks over the
// requested duration, score synthesis on completion, issue generation and
// the superficial-signal boost pass. A runner never fails; downstream
// treats a missing score as neutral.

use crate::models::{
    ContentType, DetectionMethod, MediaDescriptor, MethodCategory, MethodOutcome,
    MethodRunState, ModelState,
};
use super::calibration::specialized_version;
use super::sampler::ScoreSampler;
use super::signals::collect_signals;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

pub const TICK_MS: u64 = 100;

/// Base score bands: content flagged as bias-prone (portrait-framed,
/// voice-labelled, very short text) draws from the upper band.
const BIASED_BAND: (f64, f64) = (50.0, 85.0);
const NORMAL_BAND: (f64, f64) = (15.0, 50.0);

/// Accuracy bar above which a custom model narrows the band and earns
/// the version bonus.
const HIGH_ACCURACY_BAR: f64 = 0.90;
/// Higher bar gating the probabilistic extra issue.
const EXTRA_ISSUE_BAR: f64 = 0.93;
const EXTRA_ISSUE_CHANCE: f64 = 0.5;

const SPECIALIZED_VERSION_BONUS: f64 = 8.0;
const CUSTOM_VERSION_BONUS: f64 = 4.0;
const LOW_ACCURACY_CUSTOM_BONUS: f64 = 3.0;

const SIGNAL_BOOST: f64 = 12.0;

/// Everything a method run reads; the runner mutates nothing but its own
/// `MethodRunState`.
pub struct RunContext<'a> {
    pub content_type: ContentType,
    pub model: &'a ModelState,
    pub descriptor: &'a MediaDescriptor,
}

/// Run one method to completion. Returns `None` only when cancelled;
/// there is no error path by design.
pub async fn run_method(
    method: &DetectionMethod,
    duration_ms: u64,
    ctx: &RunContext<'_>,
    state: &Mutex<MethodRunState>,
    cancel: &AtomicBool,
    sampler: &mut dyn ScoreSampler,
) -> Option<MethodOutcome> {
    let ticks = (duration_ms / TICK_MS).max(1);
    let step = 100.0 / ticks as f64;

    for _ in 0..ticks {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(TICK_MS)).await;
        let mut s = state.lock().expect("run state lock");
        s.progress = (s.progress + step).min(100.0);
    }

    if cancel.load(Ordering::Relaxed) {
        return None;
    }

    let (score, issues) = synthesize(method, ctx, sampler);

    // Score and issues land atomically with the completion flag.
    {
        let mut s = state.lock().expect("run state lock");
        s.progress = 100.0;
        s.manipulation_score = Some(score);
        s.issues = issues.clone();
        s.complete = true;
    }

    debug!(
        method = %method.name,
        score = score,
        issues = issues.len(),
        "method complete"
    );

    Some(MethodOutcome {
        manipulation_score: score,
        issues,
    })
}

/// Compute the manipulation score and issue list for one method.
fn synthesize(
    method: &DetectionMethod,
    ctx: &RunContext<'_>,
    sampler: &mut dyn ScoreSampler,
) -> (f64, Vec<String>) {
    let model = ctx.model;
    let (mut lo, mut hi) = if biased_content(ctx.content_type, ctx.descriptor) {
        BIASED_BAND
    } else {
        NORMAL_BAND
    };

    let mut bonus = 0.0;
    if model.is_custom_trained && model.accuracy > HIGH_ACCURACY_BAR {
        // Narrower, higher-floor band: an accurate custom model is less
        // noisy and less forgiving.
        lo += 12.0;
        hi -= 4.0;
        bonus += if specialized_version(&model.model_version) {
            SPECIALIZED_VERSION_BONUS
        } else {
            CUSTOM_VERSION_BONUS
        };
    } else if model.is_custom_trained {
        bonus += LOW_ACCURACY_CUSTOM_BONUS;
    }

    let draw = sampler.in_range(lo, hi.max(lo));
    let mut score = (draw + category_bias(method.category) + bonus).clamp(0.0, 100.0);

    let mut threshold = issue_threshold(method.category);
    if model.is_custom_trained && model.accuracy > HIGH_ACCURACY_BAR {
        threshold -= 10.0;
    }

    let mut issues: Vec<String> = Vec::new();
    if score > threshold {
        let (primary, secondary, extra) = issue_texts(&method.name);
        issues.push(primary.to_string());
        if score > threshold + 10.0 {
            issues.push(secondary.to_string());
        }
        if let Some(extra) = extra {
            if model.is_custom_trained
                && model.accuracy > EXTRA_ISSUE_BAR
                && sampler.chance(EXTRA_ISSUE_CHANCE)
            {
                issues.push(extra.to_string());
            }
        }
    }

    // Secondary pass: superficial signals only count in coincidence.
    let signals = collect_signals(ctx.content_type, ctx.descriptor);
    if signals.len() >= 2 {
        let ceiling = category_ceiling(method.category);
        score = score.max((score + SIGNAL_BOOST).min(ceiling));
        for signal in signals {
            issues.push(signal.issue);
        }
    }

    (score, issues)
}

fn biased_content(content_type: ContentType, descriptor: &MediaDescriptor) -> bool {
    match content_type {
        ContentType::Image | ContentType::Video => descriptor.portrait_like(),
        ContentType::Audio => descriptor
            .filename
            .as_deref()
            .map(|f| {
                let f = f.to_lowercase();
                ["voice", "speech", "vocal", "narration"]
                    .iter()
                    .any(|t| f.contains(t))
            })
            .unwrap_or(false),
        ContentType::Text => descriptor
            .text
            .as_deref()
            .map(|t| {
                let len = t.chars().count();
                len > 0 && len < 240
            })
            .unwrap_or(false),
    }
}

fn category_bias(category: MethodCategory) -> f64 {
    match category {
        MethodCategory::Artifact => 4.0,
        MethodCategory::Spectral => 2.0,
        MethodCategory::Semantic => 0.0,
        MethodCategory::Stylometric => 1.0,
        MethodCategory::Provenance => -2.0,
    }
}

fn issue_threshold(category: MethodCategory) -> f64 {
    match category {
        MethodCategory::Artifact => 62.0,
        MethodCategory::Spectral => 65.0,
        MethodCategory::Semantic => 68.0,
        MethodCategory::Stylometric => 64.0,
        MethodCategory::Provenance => 70.0,
    }
}

fn category_ceiling(category: MethodCategory) -> f64 {
    match category {
        MethodCategory::Artifact => 96.0,
        MethodCategory::Spectral => 94.0,
        MethodCategory::Semantic => 90.0,
        MethodCategory::Stylometric => 88.0,
        MethodCategory::Provenance => 98.0,
    }
}

/// Fixed issue wording per method: (primary, secondary, optional extra).
/// Primaries state findings plainly; extras hedge.
fn issue_texts(method_name: &str) -> (&'static str, &'static str, Option<&'static str>) {
    match method_name {
        "Facial Landmark Consistency" => (
            "Facial landmark positions drift between regions of the face",
            "Eye reflection geometry is inconsistent across the face",
            Some("Skin texture might be artificially smoothed"),
        ),
        "Frequency Spectrum Analysis" => (
            "Spectral energy shows a periodic pattern typical of upsampling",
            "High-frequency detail is missing where the sensor would record it",
            Some("Noise residue could be the trace of a denoising generator pass"),
        ),
        "Lighting and Shadow Coherence" => (
            "Cast shadows disagree with the dominant light direction",
            "Specular highlights imply two distinct light sources",
            None,
        ),
        "Compression History Trace" => (
            "Block artifacts indicate recompression after local edits",
            "Quantization tables differ between image regions",
            Some("Metadata chain might have been rewritten after export"),
        ),
        "Temporal Flicker Detection" => (
            "Frame luminance flickers at the cadence of frame synthesis",
            "Static background regions shimmer between consecutive frames",
            Some("Interframe noise could be residue of temporal smoothing"),
        ),
        "Frame Blending Analysis" => (
            "Blended frames appear around the subject's face",
            "Motion trails show duplicated edges near edited regions",
            None,
        ),
        "Lip-Sync Alignment" => (
            "Mouth motion lags the audio track beyond natural tolerance",
            "Phoneme shapes fail to match the spoken syllables",
            Some("Jaw articulation might be driven by a reenactment model"),
        ),
        "Codec Fingerprint Check" => (
            "Codec fingerprint does not match the declared recording device",
            "Container timestamps are misordered for a single-pass recording",
            None,
        ),
        "Spectral Continuity Analysis" => (
            "Spectrogram shows hard seams where segments were joined",
            "Frequency band energy drops at unnatural cut points",
            Some("Upper harmonics could be the signature of a neural vocoder"),
        ),
        "Voiceprint Naturalness" => (
            "Speaker embedding sits outside the human voiceprint cluster",
            "Formant transitions are smoother than natural articulation",
            None,
        ),
        "Waveform Splice Detection" => (
            "Phase discontinuities mark splice points in the waveform",
            "Room tone changes abruptly mid-utterance",
            Some("Background ambience might have been regenerated around edits"),
        ),
        "Breath and Pause Cadence" => (
            "Breathing intervals repeat with mechanical regularity",
            "Pauses are missing where natural speech would breathe",
            None,
        ),
        "Token Predictability Profile" => (
            "Token stream is far more predictable than human writing",
            "Perplexity stays flat across topic changes",
            Some("Phrasing could be the output of a heavily aligned model"),
        ),
        "Phrase Repetition and Burstiness" => (
            "Recurring phrase templates appear across paragraphs",
            "Sentence length variance is well below human baselines",
            None,
        ),
        "Semantic Coherence Drift" => (
            "Argument drifts without the connective tissue of human drafting",
            "Claims are introduced without antecedent support",
            Some("Transitions might be stitched from independently generated passages"),
        ),
        "Formatting Provenance Check" => (
            "Formatting artifacts match machine export rather than manual editing",
            "Punctuation style switches conventions mid-document",
            None,
        ),
        _ => (
            "Analysis flagged characteristics consistent with manipulation",
            "Secondary markers corroborate the primary finding",
            None,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::detection::catalog::methods_for;
    use crate::services::detection::sampler::SequenceSampler;

    fn image_method(idx: usize) -> DetectionMethod {
        methods_for(ContentType::Image)[idx].clone()
    }

    fn ctx<'a>(
        model: &'a ModelState,
        descriptor: &'a MediaDescriptor,
    ) -> RunContext<'a> {
        RunContext {
            content_type: ContentType::Image,
            model,
            descriptor,
        }
    }

    #[tokio::test]
    async fn test_progress_reaches_100_before_complete() {
        let model = ModelState::default();
        let descriptor = MediaDescriptor::default();
        let state = Mutex::new(MethodRunState::default());
        let cancel = AtomicBool::new(false);
        let mut sampler = SequenceSampler::new(vec![0.5]);

        let outcome = run_method(
            &image_method(0),
            200,
            &ctx(&model, &descriptor),
            &state,
            &cancel,
            &mut sampler,
        )
        .await
        .expect("not cancelled");

        let s = state.lock().unwrap();
        assert_eq!(s.progress, 100.0);
        assert!(s.complete);
        assert_eq!(s.manipulation_score, Some(outcome.manipulation_score));
    }

    #[tokio::test]
    async fn test_deterministic_score_from_sequence() {
        // Normal band (15, 50), midpoint draw 32.5, artifact bias +4.
        let model = ModelState::default();
        let descriptor = MediaDescriptor::default();
        let state = Mutex::new(MethodRunState::default());
        let cancel = AtomicBool::new(false);
        let mut sampler = SequenceSampler::new(vec![0.5]);

        let outcome = run_method(
            &image_method(0),
            100,
            &ctx(&model, &descriptor),
            &state,
            &cancel,
            &mut sampler,
        )
        .await
        .unwrap();

        assert!((outcome.manipulation_score - 36.5).abs() < 1e-9);
        assert!(outcome.issues.is_empty());
    }

    #[tokio::test]
    async fn test_issues_appear_past_threshold() {
        // Portrait band (50, 85), top draw 85, artifact bias +4 = 89:
        // past threshold 62 and past threshold+10, so both primaries.
        let model = ModelState::default();
        let descriptor = MediaDescriptor {
            filename: Some("portrait_shot.png".to_string()),
            ..Default::default()
        };
        let state = Mutex::new(MethodRunState::default());
        let cancel = AtomicBool::new(false);
        let mut sampler = SequenceSampler::new(vec![1.0]);

        let outcome = run_method(
            &image_method(0),
            100,
            &ctx(&model, &descriptor),
            &state,
            &cancel,
            &mut sampler,
        )
        .await
        .unwrap();

        assert!((outcome.manipulation_score - 89.0).abs() < 1e-9);
        assert_eq!(outcome.issues.len(), 2);
        assert!(outcome.issues[0].contains("landmark"));
    }

    #[tokio::test]
    async fn test_high_accuracy_custom_model_bias() {
        // Band narrows to (27, 46); draw 0.5 -> 36.5, +4 artifact,
        // +4 custom (non-specialized version) = 44.5.
        let model = ModelState {
            is_custom_trained: true,
            accuracy: 0.92,
            model_version: "custom-v2".to_string(),
            ..Default::default()
        };
        let descriptor = MediaDescriptor::default();
        let state = Mutex::new(MethodRunState::default());
        let cancel = AtomicBool::new(false);
        let mut sampler = SequenceSampler::new(vec![0.5]);

        let outcome = run_method(
            &image_method(0),
            100,
            &ctx(&model, &descriptor),
            &state,
            &cancel,
            &mut sampler,
        )
        .await
        .unwrap();

        assert!((outcome.manipulation_score - 44.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_two_signals_boost_and_corroborate() {
        // Tiny AI-named square image: three coinciding weak signals.
        let model = ModelState::default();
        let descriptor = MediaDescriptor {
            filename: Some("midjourney_face.png".to_string()),
            size_bytes: Some(9_000),
            width: Some(1024),
            height: Some(1024),
            ..Default::default()
        };
        let state = Mutex::new(MethodRunState::default());
        let cancel = AtomicBool::new(false);
        // Portrait-named file draws from the biased band: 0.0 -> 50, +4.
        let mut sampler = SequenceSampler::new(vec![0.0]);

        let outcome = run_method(
            &image_method(0),
            100,
            &ctx(&model, &descriptor),
            &state,
            &cancel,
            &mut sampler,
        )
        .await
        .unwrap();

        assert!((outcome.manipulation_score - 66.0).abs() < 1e-9);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.contains("generative tooling")));
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.contains("generator output sizes")));
    }

    #[tokio::test]
    async fn test_signal_boost_respects_ceiling() {
        let model = ModelState::default();
        let descriptor = MediaDescriptor {
            filename: Some("deepfake_face_demo.png".to_string()),
            size_bytes: Some(9_000),
            ..Default::default()
        };
        let state = Mutex::new(MethodRunState::default());
        let cancel = AtomicBool::new(false);
        // Top of biased band: 85 + 4 = 89; boost would give 101 but the
        // artifact ceiling is 96.
        let mut sampler = SequenceSampler::new(vec![1.0]);

        let outcome = run_method(
            &image_method(0),
            100,
            &ctx(&model, &descriptor),
            &state,
            &cancel,
            &mut sampler,
        )
        .await
        .unwrap();

        assert!((outcome.manipulation_score - 96.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_cancel_leaves_state_incomplete() {
        let model = ModelState::default();
        let descriptor = MediaDescriptor::default();
        let state = Mutex::new(MethodRunState::default());
        let cancel = AtomicBool::new(true);
        let mut sampler = SequenceSampler::new(vec![0.5]);

        let outcome = run_method(
            &image_method(0),
            100,
            &ctx(&model, &descriptor),
            &state,
            &cancel,
            &mut sampler,
        )
        .await;

        assert!(outcome.is_none());
        let s = state.lock().unwrap();
        assert!(!s.complete);
        assert!(s.manipulation_score.is_none());
    }
}
