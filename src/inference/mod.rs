//! Inference module: test-set predictions and run reporting
//!
//! - [`predictor`] runs the trained model and yields one probability per image
//! - [`report`] prints confidence statements and writes the diagnostic plots

pub mod predictor;
pub mod report;

pub use predictor::{Prediction, Predictor, DECISION_THRESHOLD};
pub use report::{print_predictions, ReportConfig, Reporter};
