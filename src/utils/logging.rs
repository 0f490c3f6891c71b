//! Logging Module
//!
//! Structured logging via `tracing`, plus the two console progress helpers
//! the pipeline uses: image loading progress and per-epoch training lines.

use std::time::Instant;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::utils::error::{CatDogError, Result};

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset
    pub level: Level,
    /// Print the module path of each event
    pub with_target: bool,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_target: false,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Debug level with module paths (per-batch losses)
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            with_target: true,
            ..Self::default()
        }
    }
}

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CatDogError::Config(format!("logging already initialized: {}", e)))
}

/// Prints `Processed i of total` every `interval` items
pub struct ProgressLogger {
    total: usize,
    interval: usize,
    start_time: Instant,
}

impl ProgressLogger {
    pub fn new(total: usize, interval: usize) -> Self {
        Self {
            total,
            interval: interval.max(1),
            start_time: Instant::now(),
        }
    }

    /// Whether item `index` gets a progress line
    pub fn should_report(&self, index: usize) -> bool {
        index % self.interval == 0
    }

    /// Report before processing item `index` (0-based)
    pub fn update(&self, index: usize) {
        if self.should_report(index) {
            println!("Processed {} of {}", index, self.total);
        }
    }

    /// Log completion
    pub fn finish(&self, operation: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let per_sec = if elapsed > 0.0 {
            self.total as f64 / elapsed
        } else {
            0.0
        };

        tracing::info!(
            "{}: {} items in {:.2}s ({:.1} items/s)",
            operation,
            self.total,
            elapsed,
            per_sec
        );
    }
}

/// Per-epoch training logger
pub struct TrainingLogger {
    epoch: usize,
    total_epochs: usize,
    epoch_start: Instant,
    training_start: Instant,
}

impl TrainingLogger {
    pub fn new(total_epochs: usize) -> Self {
        Self {
            epoch: 0,
            total_epochs,
            epoch_start: Instant::now(),
            training_start: Instant::now(),
        }
    }

    /// Log start of an epoch
    pub fn start_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
        self.epoch_start = Instant::now();

        tracing::info!("Epoch {}/{} started", epoch + 1, self.total_epochs);
    }

    /// Log end of an epoch with its losses
    pub fn end_epoch(&self, loss: f64, val_loss: f64, val_accuracy: f64) {
        let epoch_time = self.epoch_start.elapsed();

        tracing::info!(
            "Epoch {}/{} completed in {:.1}s | loss: {:.4} | val_loss: {:.4} | val_acc: {:.2}%",
            self.epoch + 1,
            self.total_epochs,
            epoch_time.as_secs_f64(),
            loss,
            val_loss,
            val_accuracy * 100.0
        );
    }

    /// Log early stopping
    pub fn log_early_stop(&self, patience: usize) {
        tracing::warn!(
            "Early stopping triggered after {} epochs without val_loss improvement",
            patience
        );
    }

    /// Log training completion
    pub fn log_complete(&self, epochs_run: usize, best_val_loss: f64) {
        tracing::info!(
            "Training finished: {} epochs in {:.1}s | best val_loss: {:.4}",
            epochs_run,
            self.training_start.elapsed().as_secs_f64(),
            best_val_loss
        );
    }
}
