// Detection Module
// Content authenticity scoring core organized into specialized submodules:
// - catalog: static per-content-type method definitions
// - sampler: injectable randomness strategy
// - signals: superficial descriptor signal checks
// - calibration: per-type thresholds and boost profiles
// - runner: one method's simulated analysis
// - aggregation: weighted scoring and the final verdict
// - pipeline: per-submission orchestration and history recording

pub mod catalog;
pub mod sampler;
pub mod signals;
pub mod calibration;
pub mod runner;
pub mod aggregation;
pub mod pipeline;

// Re-export commonly used items
pub use catalog::{methods_for, with_weight_overrides};
pub use sampler::{RngSampler, ScoreSampler, SequenceSampler};
pub use signals::{collect_signals, filename_has_ai_terms, SignalKind, SuperficialSignal};
pub use calibration::{
    accuracy_factor, sentinel_family_extra, specialized_version, type_profile, BoostMode,
    TypeProfile, SPECIALIZED_VERSIONS,
};
pub use runner::{run_method, RunContext};
pub use aggregation::{aggregate, decide};
pub use pipeline::{run_submission, CancelFlag, HistoryRecorder};
