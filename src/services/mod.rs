// Veridect Core Services

pub mod config_store;
pub mod detection;
pub mod history;
pub mod media_probe;
pub mod model_store;

pub use config_store::*;
pub use history::*;
pub use media_probe::*;
pub use model_store::*;

// Re-export detection module items
pub use detection::{
    aggregate,
    decide,
    methods_for,
    run_method,
    run_submission,
    type_profile,
    with_weight_overrides,
    CancelFlag,
    HistoryRecorder,
    RngSampler,
    ScoreSampler,
    SequenceSampler,
    TypeProfile,
};
