//! End-to-end experiment
//!
//! index -> load -> label -> build -> train -> predict -> report, run once.

use std::path::PathBuf;

use burn::module::{AutodiffModule, Module};
use burn::tensor::backend::AutodiffBackend;
use colored::Colorize;
use tracing::info;

use crate::backend::{backend_name, default_device, TrainingBackend};
use crate::config::ExperimentConfig;
use crate::dataset::index::{index_test_dir, index_training_dir, make_rng, IndexStats};
use crate::dataset::loader::load_images;
use crate::inference::predictor::{Prediction, Predictor};
use crate::inference::report::{print_predictions, Reporter};
use crate::model::cnn::CatDogNet;
use crate::training::history::{TrainingHistory, TrainingStatus};
use crate::training::trainer::Trainer;
use crate::utils::error::Result;

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct ExperimentSummary {
    pub index_stats: IndexStats,
    pub train_shape: (usize, usize, usize, usize),
    pub test_shape: (usize, usize, usize, usize),
    pub status: TrainingStatus,
    pub epochs_run: usize,
    pub history: TrainingHistory,
    pub predictions: Vec<Prediction>,
    pub plots: Vec<PathBuf>,
}

/// Run the full experiment on the selected backend
pub fn run_experiment(config: &ExperimentConfig) -> Result<ExperimentSummary> {
    info!("Backend: {}", backend_name());
    run_experiment_on::<TrainingBackend>(config, default_device())
}

/// Run the full experiment on backend `B`
pub fn run_experiment_on<B: AutodiffBackend>(
    config: &ExperimentConfig,
    device: B::Device,
) -> Result<ExperimentSummary> {
    config.validate()?;
    let rule = config.data.label_rule();
    let shape = config.image.shape();
    let mut rng = make_rng(config.data.seed);

    println!("{}", "Indexing Images...".cyan().bold());
    let index = index_training_dir(
        &config.data.train_dir,
        &rule,
        config.data.max_per_class,
        &mut rng,
    )?;
    index.stats.print(&rule);
    let test_paths = index_test_dir(&config.data.test_dir, config.data.test_limit, &mut rng)?;

    println!("{}", "Loading Training Images...".cyan().bold());
    let mut train = load_images(&index.paths, shape, config.data.progress_interval)?;
    train.assign_labels(&rule.labels(&index.paths))?;

    println!("{}", "Loading Test Images...".cyan().bold());
    let test = load_images(&test_paths, shape, config.data.progress_interval)?;

    train.print_shape("Train");
    test.print_shape("Test");

    println!("{}", "Creating Model...".cyan().bold());
    let net_config = config.model.to_net_config(shape);
    let model = CatDogNet::<B>::new(&net_config, &device)?;
    info!(
        "CatDogNet: {} conv blocks, {} dense blocks, {} parameters",
        net_config.conv_filters.len(),
        net_config.dense_layers,
        model.num_params()
    );

    println!("{}", "Training...".green().bold());
    let mut history = TrainingHistory::new();
    let mut trainer = Trainer::<B>::new(config.training.clone(), device.clone())?;
    let outcome = trainer.fit(model, &train, &mut history)?;

    println!("{}", "Predicting...".cyan().bold());
    let predictor = Predictor::<B::InnerBackend>::new(
        outcome.model.valid(),
        device,
        config.training.batch_size,
    );
    let predictions = predictor.predict(&test)?;
    print_predictions(&predictions, &rule);

    let plots =
        Reporter::new(&config.report, &rule).write_all(&train, &history, &test, &predictions);

    Ok(ExperimentSummary {
        index_stats: index.stats,
        train_shape: train.stacked_shape(),
        test_shape: test.stacked_shape(),
        status: outcome.status,
        epochs_run: outcome.epochs_run,
        history,
        predictions,
        plots,
    })
}

/// Index the training directory only and report the class balance
pub fn run_stats(config: &ExperimentConfig) -> Result<IndexStats> {
    config.data.validate()?;
    let rule = config.data.label_rule();
    let index = index_training_dir(
        &config.data.train_dir,
        &rule,
        config.data.max_per_class,
        &mut make_rng(config.data.seed),
    )?;
    index.stats.print(&rule);
    Ok(index.stats)
}
