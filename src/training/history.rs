//! Training lifecycle events and the per-epoch history
//!
//! The trainer reports progress as [`TrainingEvent`]s to a
//! [`TrainingObserver`]. [`TrainingHistory`] is the observer the pipeline
//! uses: a plain accumulator of per-epoch metrics.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

/// Lifecycle state of a training run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingStatus {
    NotStarted,
    Running,
    StoppedEarly,
    Completed,
}

impl TrainingStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TrainingStatus::StoppedEarly | TrainingStatus::Completed)
    }
}

impl std::fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrainingStatus::NotStarted => "not started",
            TrainingStatus::Running => "running",
            TrainingStatus::StoppedEarly => "stopped early",
            TrainingStatus::Completed => "completed",
        };
        write!(f, "{}", name)
    }
}

/// Metrics of one finished epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    TrainBegin {
        epochs: usize,
        train_samples: usize,
        val_samples: usize,
    },
    EpochStart {
        epoch: usize,
    },
    EpochEnd {
        epoch: usize,
        metrics: EpochMetrics,
    },
    TrainEnd {
        status: TrainingStatus,
        epochs_run: usize,
    },
}

pub trait TrainingObserver {
    fn on_event(&mut self, event: &TrainingEvent);
}

/// Observer that ignores every event
pub struct NoopObserver;

impl TrainingObserver for NoopObserver {
    fn on_event(&mut self, _event: &TrainingEvent) {}
}

/// One value per completed epoch for each tracked metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub loss: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub accuracy: Vec<f64>,
    pub val_accuracy: Vec<f64>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loss.is_empty()
    }

    pub fn push(&mut self, metrics: &EpochMetrics) {
        self.loss.push(metrics.loss);
        self.val_loss.push(metrics.val_loss);
        self.accuracy.push(metrics.accuracy);
        self.val_accuracy.push(metrics.val_accuracy);
    }

    /// Lowest validation loss and its epoch (0-based)
    pub fn best_val_loss(&self) -> Option<(usize, f64)> {
        self.val_loss
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl TrainingObserver for TrainingHistory {
    fn on_event(&mut self, event: &TrainingEvent) {
        match event {
            TrainingEvent::TrainBegin { .. } => {
                self.loss.clear();
                self.val_loss.clear();
                self.accuracy.clear();
                self.val_accuracy.clear();
            }
            TrainingEvent::EpochEnd { metrics, .. } => self.push(metrics),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metrics(loss: f64, val_loss: f64) -> EpochMetrics {
        EpochMetrics {
            loss,
            accuracy: 0.5,
            val_loss,
            val_accuracy: 0.5,
        }
    }

    #[test]
    fn test_history_accumulates_epoch_ends() {
        let mut history = TrainingHistory::new();
        history.on_event(&TrainingEvent::TrainBegin {
            epochs: 2,
            train_samples: 6,
            val_samples: 2,
        });
        history.on_event(&TrainingEvent::EpochStart { epoch: 0 });
        history.on_event(&TrainingEvent::EpochEnd {
            epoch: 0,
            metrics: metrics(0.7, 0.69),
        });
        history.on_event(&TrainingEvent::EpochEnd {
            epoch: 1,
            metrics: metrics(0.6, 0.71),
        });
        history.on_event(&TrainingEvent::TrainEnd {
            status: TrainingStatus::Completed,
            epochs_run: 2,
        });

        assert_eq!(history.epochs(), 2);
        assert_eq!(history.loss, vec![0.7, 0.6]);
        assert_eq!(history.val_loss, vec![0.69, 0.71]);
        assert_eq!(history.best_val_loss(), Some((0, 0.69)));
    }

    #[test]
    fn test_train_begin_resets() {
        let mut history = TrainingHistory::new();
        history.push(&metrics(1.0, 1.0));
        history.on_event(&TrainingEvent::TrainBegin {
            epochs: 1,
            train_samples: 1,
            val_samples: 1,
        });
        assert!(history.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let mut history = TrainingHistory::new();
        history.push(&metrics(0.5, 0.4));
        history.save_json(&path).unwrap();

        assert_eq!(TrainingHistory::load_json(&path).unwrap(), history);
    }

    #[test]
    fn test_status_finished() {
        assert!(!TrainingStatus::NotStarted.is_finished());
        assert!(!TrainingStatus::Running.is_finished());
        assert!(TrainingStatus::StoppedEarly.is_finished());
        assert_eq!(TrainingStatus::Completed.to_string(), "completed");
    }
}
