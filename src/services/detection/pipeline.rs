// Progress Coordinator
// Orchestrates one submission: fresh run-state arena, each catalog method
// awaited in sequence, an overall progress sampler for the caller, then
// aggregation and a single history record. Submissions are isolated —
// each owns its id, its arena and its cancel flag.

use crate::models::{
    ContentType, DetectionMethod, DetectionResult, HistoryEntry, MediaDescriptor,
    MethodRunState, ModelState,
};
use super::aggregation::aggregate;
use super::calibration::type_profile;
use super::runner::{run_method, RunContext};
use super::sampler::ScoreSampler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

pub const OVERALL_SAMPLE_MS: u64 = 150;
const SNIPPET_MAX_CHARS: usize = 80;

/// Where finished submissions are recorded. Failure is reported as a
/// bool and never interrupts the pipeline.
pub trait HistoryRecorder {
    fn record(&self, entry: HistoryEntry) -> bool;
}

/// Cooperative cancellation, checked at every suspension point.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn atomic(&self) -> &AtomicBool {
        &self.0
    }
}

/// Run one full submission. Returns `None` when cancelled — nothing is
/// aggregated or recorded in that case. Completed runs always aggregate
/// whatever state exists; there is no failure path out of the pipeline.
#[allow(clippy::too_many_arguments)]
pub async fn run_submission(
    content_type: ContentType,
    catalog: &[DetectionMethod],
    model: &ModelState,
    descriptor: &MediaDescriptor,
    method_duration_ms: u64,
    sampler: &mut dyn ScoreSampler,
    recorder: Option<&dyn HistoryRecorder>,
    on_progress: impl Fn(f64) + Send + Sync + 'static,
    cancel: &CancelFlag,
) -> Option<DetectionResult> {
    let submission_id = Uuid::new_v4();
    info!(
        submission = %submission_id,
        content_type = content_type.as_str(),
        methods = catalog.len(),
        "[SCAN] starting submission"
    );

    // Fresh arena per submission; every slot starts at {0, incomplete}.
    let states: Arc<Vec<Mutex<MethodRunState>>> = Arc::new(
        catalog
            .iter()
            .map(|_| Mutex::new(MethodRunState::default()))
            .collect(),
    );

    let on_progress: Arc<dyn Fn(f64) + Send + Sync> = Arc::new(on_progress);
    let done = Arc::new(AtomicBool::new(false));
    let sampler_task = spawn_overall_sampler(
        Arc::clone(&states),
        Arc::clone(&on_progress),
        Arc::clone(&done),
        cancel.clone(),
    );

    let ctx = RunContext {
        content_type,
        model,
        descriptor,
    };

    let mut cancelled = false;
    for (idx, method) in catalog.iter().enumerate() {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        let outcome = run_method(
            method,
            method_duration_ms,
            &ctx,
            &states[idx],
            cancel.atomic(),
            sampler,
        )
        .await;
        if outcome.is_none() {
            cancelled = true;
            break;
        }
    }

    done.store(true, Ordering::Relaxed);
    let _ = sampler_task.await;

    if cancelled {
        info!(submission = %submission_id, "[SCAN] submission cancelled");
        return None;
    }

    (*on_progress)(100.0);

    let snapshot: Vec<MethodRunState> = states
        .iter()
        .map(|s| s.lock().expect("run state lock").clone())
        .collect();

    let profile = type_profile(content_type);
    let result = aggregate(&snapshot, catalog, model, descriptor, &profile);

    info!(
        submission = %submission_id,
        manipulated = result.is_manipulated,
        confidence = result.confidence_score,
        issues = result.issues.len(),
        "[SCAN] submission finalized"
    );

    if let Some(recorder) = recorder {
        let entry = HistoryEntry {
            content_type,
            filename: descriptor.filename.clone(),
            text_snippet: descriptor
                .text
                .as_deref()
                .map(|t| t.chars().take(SNIPPET_MAX_CHARS).collect()),
            manipulated: result.is_manipulated,
            confidence_score: result.confidence_score,
        };
        if !recorder.record(entry) {
            // Recorder faults never surface mid-pipeline.
            warn!(submission = %submission_id, "[SCAN] history record failed");
        }
    }

    Some(result)
}

/// Overall percent shown to the caller: mean of per-method progress,
/// capped at 99 until the pipeline truly finishes.
fn spawn_overall_sampler(
    states: Arc<Vec<Mutex<MethodRunState>>>,
    on_progress: Arc<dyn Fn(f64) + Send + Sync>,
    done: Arc<AtomicBool>,
    cancel: CancelFlag,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if done.load(Ordering::Relaxed) || cancel.is_cancelled() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(OVERALL_SAMPLE_MS)).await;
            let count = states.len().max(1) as f64;
            let sum: f64 = states
                .iter()
                .map(|s| s.lock().expect("run state lock").progress)
                .sum();
            (*on_progress)((sum / count).min(99.0));
        }
    })
}
