//! Training module: the epoch loop, early stopping and the per-epoch history
//!
//! [`Trainer::fit`] drives a run and emits [`TrainingEvent`]s;
//! [`TrainingHistory`] collects them for the loss plots.

pub mod early_stopping;
pub mod history;
pub mod trainer;

pub use early_stopping::EarlyStopping;
pub use history::{
    EpochMetrics, NoopObserver, TrainingEvent, TrainingHistory, TrainingObserver, TrainingStatus,
};
pub use trainer::{Trainer, TrainingOutcome};
