//! # catdog
//!
//! Binary image classification of cats and dogs with a small convolutional
//! network built on the Burn framework.
//!
//! ## Modules
//!
//! - `dataset`: Directory indexing, filename labels, image decoding and Burn batching
//! - `model`: The CNN architecture and its hyperparameters
//! - `training`: RMSprop training loop with holdout validation and early stopping
//! - `inference`: Batched prediction, confidence statements and diagnostic plots
//! - `pipeline`: The end-to-end experiment
//! - `utils`: Errors, logging and SVG charts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catdog::{run_experiment, ExperimentConfig};
//!
//! let mut config = ExperimentConfig::default();
//! config.training.epochs = 5;
//! let summary = run_experiment(&config)?;
//! println!("{} predictions", summary.predictions.len());
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod pipeline;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{DataConfig, ExperimentConfig, ImageConfig};
pub use dataset::{CatDogBatch, CatDogBatcher, ImageDataset, ImageShape, LabelRule};
pub use inference::{Prediction, Predictor, ReportConfig};
pub use model::{CatDogNet, CatDogNetConfig, ModelConfig, TrainingConfig};
pub use pipeline::{run_experiment, run_experiment_on, ExperimentSummary};
pub use training::{Trainer, TrainingHistory, TrainingStatus};
pub use utils::error::{CatDogError, Result};

/// Default edge length of the square network input
pub const IMAGE_SIZE: usize = 64;

/// Default number of color channels (RGB)
pub const CHANNELS: usize = 3;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
