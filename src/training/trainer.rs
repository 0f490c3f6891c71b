//! Training Loop Driver
//!
//! Fits a [`CatDogNet`] on a labeled [`ImageDataset`]:
//! - the trailing `validation_split` fraction is held out for validation
//! - each epoch runs mini-batches of binary cross-entropy + RMSprop updates
//! - validation runs on the inner backend, so dropout is disabled
//! - early stopping watches the validation loss
//!
//! The run moves through `NotStarted -> Running -> (StoppedEarly | Completed)`
//! and reports every transition to a [`TrainingObserver`].

use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    nn::loss::{BinaryCrossEntropyLoss, BinaryCrossEntropyLossConfig},
    optim::{GradientsParams, Optimizer, RmsPropConfig},
    tensor::{
        activation::sigmoid,
        backend::{AutodiffBackend, Backend},
        ElementConversion, Tensor,
    },
};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::dataset::burn_dataset::{CatDogBatch, CatDogBatcher, CatDogBurnDataset};
use crate::dataset::index::make_rng;
use crate::dataset::loader::ImageDataset;
use crate::model::cnn::CatDogNet;
use crate::model::config::TrainingConfig;
use crate::training::early_stopping::EarlyStopping;
use crate::training::history::{EpochMetrics, TrainingEvent, TrainingObserver, TrainingStatus};
use crate::utils::error::{CatDogError, Result};
use crate::utils::logging::TrainingLogger;

/// Result of a finished run
#[derive(Debug)]
pub struct TrainingOutcome<B: AutodiffBackend> {
    pub model: CatDogNet<B>,
    pub status: TrainingStatus,
    pub epochs_run: usize,
    pub best_val_loss: f64,
}

/// Sample-weighted loss and accuracy of one pass
#[derive(Debug, Clone, Copy, Default)]
struct PassStats {
    loss_sum: f64,
    correct: usize,
    samples: usize,
}

impl PassStats {
    fn record(&mut self, batch_loss: f64, batch_correct: usize, batch_size: usize) {
        self.loss_sum += batch_loss * batch_size as f64;
        self.correct += batch_correct;
        self.samples += batch_size;
    }

    fn loss(&self) -> f64 {
        self.loss_sum / self.samples.max(1) as f64
    }

    fn accuracy(&self) -> f64 {
        self.correct as f64 / self.samples.max(1) as f64
    }
}

pub struct Trainer<B: AutodiffBackend> {
    config: TrainingConfig,
    device: B::Device,
    status: TrainingStatus,
    rng: ChaCha8Rng,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(config: TrainingConfig, device: B::Device) -> Result<Self> {
        config.validate()?;
        let rng = make_rng(config.seed);
        Ok(Self {
            config,
            device,
            status: TrainingStatus::NotStarted,
            rng,
        })
    }

    pub fn status(&self) -> TrainingStatus {
        self.status
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit `model` on `dataset`, reporting progress to `observer`
    ///
    /// A trainer fits exactly once. Any invalid input, as well as a
    /// non-finite loss, aborts the run with an error.
    pub fn fit<O>(
        &mut self,
        mut model: CatDogNet<B>,
        dataset: &ImageDataset,
        observer: &mut O,
    ) -> Result<TrainingOutcome<B>>
    where
        O: TrainingObserver + ?Sized,
    {
        if self.status != TrainingStatus::NotStarted {
            return Err(CatDogError::Training(format!(
                "trainer already used (status: {})",
                self.status
            )));
        }
        if dataset.is_empty() {
            return Err(CatDogError::Dataset("training data is empty".to_string()));
        }

        let items = CatDogBurnDataset::from_dataset(dataset)?;
        let batcher = CatDogBatcher::new(dataset.shape());

        let total = dataset.len();
        let train_count = self.config.train_count(total);
        if train_count == 0 || train_count == total {
            return Err(CatDogError::Training(format!(
                "validation_split {} of {} samples leaves {} for training and {} for validation",
                self.config.validation_split,
                total,
                train_count,
                total - train_count
            )));
        }

        let epochs = self.config.epochs;
        let loss_fn = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init::<B>(&self.device);
        let valid_loss_fn = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init::<B::InnerBackend>(&self.device);
        let mut optim = RmsPropConfig::new()
            .with_alpha(self.config.rmsprop_alpha)
            .with_epsilon(self.config.rmsprop_epsilon)
            .init::<B, CatDogNet<B>>();

        let mut stopper = EarlyStopping::new(self.config.patience, self.config.min_delta);
        let mut logger = TrainingLogger::new(epochs);
        let mut order: Vec<usize> = (0..total).collect();
        let mut epochs_run = 0;

        info!(
            "Training on {} samples, validating on {} ({} epochs, batch size {})",
            train_count,
            total - train_count,
            epochs,
            self.config.batch_size
        );

        self.status = TrainingStatus::Running;
        observer.on_event(&TrainingEvent::TrainBegin {
            epochs,
            train_samples: train_count,
            val_samples: total - train_count,
        });

        for epoch in 0..epochs {
            let (train_indices, val_indices) = self.epoch_split(&mut order, train_count);

            logger.start_epoch(epoch);
            observer.on_event(&TrainingEvent::EpochStart { epoch });

            let (trained, train_stats) = self.train_epoch(
                model,
                &mut optim,
                &loss_fn,
                &items,
                &batcher,
                &train_indices,
                epoch,
            )?;
            model = trained;

            let val_stats = self.evaluate(
                &model.valid(),
                &valid_loss_fn,
                &items,
                &batcher,
                &val_indices,
                epoch,
            )?;

            let metrics = EpochMetrics {
                loss: train_stats.loss(),
                accuracy: train_stats.accuracy(),
                val_loss: val_stats.loss(),
                val_accuracy: val_stats.accuracy(),
            };
            logger.end_epoch(metrics.loss, metrics.val_loss, metrics.val_accuracy);
            observer.on_event(&TrainingEvent::EpochEnd { epoch, metrics });
            epochs_run = epoch + 1;

            stopper.update(epoch, metrics.val_loss);
            if stopper.should_stop() {
                if epochs_run < epochs {
                    self.status = TrainingStatus::StoppedEarly;
                    logger.log_early_stop(stopper.patience());
                }
                break;
            }
        }

        if self.status == TrainingStatus::Running {
            self.status = TrainingStatus::Completed;
        }

        logger.log_complete(epochs_run, stopper.best_loss());
        observer.on_event(&TrainingEvent::TrainEnd {
            status: self.status,
            epochs_run,
        });

        Ok(TrainingOutcome {
            model,
            status: self.status,
            epochs_run,
            best_val_loss: stopper.best_loss(),
        })
    }

    /// Training and validation indices for one epoch
    ///
    /// Validation is the tail of `order` after `train_count`. `order` is only
    /// reshuffled when `resplit_each_epoch` is set, so by default the same
    /// samples validate every epoch.
    fn epoch_split(
        &mut self,
        order: &mut [usize],
        train_count: usize,
    ) -> (Vec<usize>, Vec<usize>) {
        if self.config.resplit_each_epoch {
            order.shuffle(&mut self.rng);
        }
        let (train_part, val_part) = order.split_at(train_count);
        let mut train_indices = train_part.to_vec();
        if self.config.shuffle {
            train_indices.shuffle(&mut self.rng);
        }
        (train_indices, val_part.to_vec())
    }

    #[allow(clippy::too_many_arguments)]
    fn train_epoch<Opt>(
        &self,
        mut model: CatDogNet<B>,
        optim: &mut Opt,
        loss_fn: &BinaryCrossEntropyLoss<B>,
        items: &CatDogBurnDataset,
        batcher: &CatDogBatcher,
        indices: &[usize],
        epoch: usize,
    ) -> Result<(CatDogNet<B>, PassStats)>
    where
        Opt: Optimizer<CatDogNet<B>, B>,
    {
        let mut stats = PassStats::default();
        let num_batches = indices.len().div_ceil(self.config.batch_size);

        for (batch_idx, chunk) in indices.chunks(self.config.batch_size).enumerate() {
            let batch: CatDogBatch<B> = batcher.batch(items.select(chunk), &self.device);

            let logits = model.forward_logits(batch.images);
            let loss = loss_fn.forward(logits.clone(), batch.targets);

            let loss_value: f64 = loss.clone().into_scalar().elem();
            if !loss_value.is_finite() {
                return Err(CatDogError::NonFiniteLoss {
                    epoch: epoch + 1,
                    batch: batch_idx + 1,
                    value: loss_value,
                });
            }

            let correct = count_correct(sigmoid(logits.detach()), &batch.labels)?;
            stats.record(loss_value, correct, batch.labels.len());

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(self.config.learning_rate, model, grads);

            debug!(
                "  Batch {:>4}/{}: loss = {:.4}",
                batch_idx + 1,
                num_batches,
                loss_value
            );
        }

        Ok((model, stats))
    }

    fn evaluate(
        &self,
        model: &CatDogNet<B::InnerBackend>,
        loss_fn: &BinaryCrossEntropyLoss<B::InnerBackend>,
        items: &CatDogBurnDataset,
        batcher: &CatDogBatcher,
        indices: &[usize],
        epoch: usize,
    ) -> Result<PassStats> {
        let mut stats = PassStats::default();

        for (batch_idx, chunk) in indices.chunks(self.config.batch_size).enumerate() {
            let batch: CatDogBatch<B::InnerBackend> =
                batcher.batch(items.select(chunk), &self.device);

            let logits = model.forward_logits(batch.images);
            let loss_value: f64 = loss_fn
                .forward(logits.clone(), batch.targets)
                .into_scalar()
                .elem();
            if !loss_value.is_finite() {
                return Err(CatDogError::NonFiniteLoss {
                    epoch: epoch + 1,
                    batch: batch_idx + 1,
                    value: loss_value,
                });
            }

            let correct = count_correct(sigmoid(logits), &batch.labels)?;
            stats.record(loss_value, correct, batch.labels.len());
        }

        Ok(stats)
    }
}

/// Predictions at or above 0.5 count as the positive class
fn count_correct<Bk: Backend>(probs: Tensor<Bk, 2>, labels: &[u8]) -> Result<usize> {
    let probs = probs
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| CatDogError::Training(format!("Failed to read predictions: {:?}", e)))?;

    Ok(probs
        .iter()
        .zip(labels)
        .filter(|&(&p, &label)| (p >= 0.5) == (label == 1))
        .count())
}
