//! Early stopping on validation loss

use tracing::debug;

/// Tracks the best validation loss and how long it has not improved
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    best_loss: f64,
    best_epoch: Option<usize>,
    patience_counter: usize,
    stopped: bool,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta,
            best_loss: f64::INFINITY,
            best_epoch: None,
            patience_counter: 0,
            stopped: false,
        }
    }

    /// Record the validation loss of `epoch`; returns whether it improved
    ///
    /// An epoch improves when its loss is below `best - min_delta`. After
    /// `patience` consecutive epochs without improvement the monitor trips.
    pub fn update(&mut self, epoch: usize, val_loss: f64) -> bool {
        if val_loss < self.best_loss - self.min_delta {
            self.best_loss = val_loss;
            self.best_epoch = Some(epoch);
            self.patience_counter = 0;
            debug!("val_loss improved to {:.4} at epoch {}", val_loss, epoch + 1);
            return true;
        }

        self.patience_counter += 1;
        debug!(
            "No val_loss improvement. Patience: {}/{}",
            self.patience_counter, self.patience
        );
        if self.patience_counter >= self.patience {
            self.stopped = true;
        }
        false
    }

    pub fn should_stop(&self) -> bool {
        self.stopped
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    pub fn patience(&self) -> usize {
        self.patience
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improving_loss_never_stops() {
        let mut stopper = EarlyStopping::new(1, 0.0);
        for (epoch, loss) in [0.9, 0.8, 0.7, 0.6].into_iter().enumerate() {
            assert!(stopper.update(epoch, loss));
            assert!(!stopper.should_stop());
        }
        assert_eq!(stopper.best_epoch(), Some(3));
    }

    #[test]
    fn test_stops_after_patience_epochs() {
        let mut stopper = EarlyStopping::new(3, 0.0);
        assert!(stopper.update(0, 0.5));
        assert!(!stopper.update(1, 0.6));
        assert!(!stopper.update(2, 0.5));
        assert!(!stopper.should_stop());
        assert!(!stopper.update(3, 0.7));
        assert!(stopper.should_stop());
        assert_eq!(stopper.best_loss(), 0.5);
    }

    #[test]
    fn test_improvement_resets_counter() {
        let mut stopper = EarlyStopping::new(2, 0.0);
        stopper.update(0, 1.0);
        stopper.update(1, 1.1);
        stopper.update(2, 0.9);
        stopper.update(3, 0.95);
        assert!(!stopper.should_stop());
        stopper.update(4, 0.95);
        assert!(stopper.should_stop());
    }

    #[test]
    fn test_min_delta() {
        let mut stopper = EarlyStopping::new(1, 0.1);
        stopper.update(0, 1.0);
        assert!(!stopper.update(1, 0.95));
        assert!(stopper.should_stop());
    }

    #[test]
    fn test_zero_patience_stops_on_first_plateau() {
        let mut stopper = EarlyStopping::new(0, 0.0);
        stopper.update(0, 1.0);
        assert!(!stopper.should_stop());
        stopper.update(1, 1.0);
        assert!(stopper.should_stop());
    }

    #[test]
    fn test_plateau_is_not_a_warning() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Capture(Arc<Mutex<Vec<u8>>>);

        impl Write for Capture {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut stopper = EarlyStopping::new(5, 0.0);
            stopper.update(0, 1.0);
            stopper.update(1, 1.2);
            stopper.update(2, 1.3);
        });

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Patience: 2/5"));
        assert!(!output.contains("WARN"));
    }
}
