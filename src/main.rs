//! catdog CLI
//!
//! Entry point of the cat/dog classification experiment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use catdog::backend::backend_name;
use catdog::config::ExperimentConfig;
use catdog::pipeline::{run_experiment, run_stats, ExperimentSummary};
use catdog::utils::{format_duration, format_percent};
use catdog::utils::logging::{init_logging, LogConfig};

/// Binary cat/dog image classification with a small CNN
#[derive(Parser, Debug)]
#[command(name = "catdog")]
#[command(version)]
#[command(about = "Train a cat/dog CNN with Burn and report test predictions", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index, load, train, predict and plot
    Run(RunArgs),

    /// Index the training directory and show the class balance
    Stats(RunArgs),
}

/// Overrides applied on top of the configuration file
#[derive(Args, Debug, Default)]
struct RunArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of labeled training images
    #[arg(long)]
    train_dir: Option<PathBuf>,

    /// Directory of unlabeled test images
    #[arg(long)]
    test_dir: Option<PathBuf>,

    /// Number of training epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Batch size for training and inference
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// RMSprop learning rate
    #[arg(short, long)]
    learning_rate: Option<f64>,

    /// Maximum images per class
    #[arg(long)]
    max_per_class: Option<usize>,

    /// Seed for indexing and epoch shuffling
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory for plots
    #[arg(long)]
    plots_dir: Option<PathBuf>,

    /// Skip writing plots
    #[arg(long, default_value = "false")]
    no_plots: bool,
}

impl RunArgs {
    fn resolve(self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ExperimentConfig::default(),
        };

        if let Some(dir) = self.train_dir {
            config.data.train_dir = dir;
        }
        if let Some(dir) = self.test_dir {
            config.data.test_dir = dir;
        }
        if let Some(epochs) = self.epochs {
            config.training.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.training.batch_size = batch_size;
        }
        if let Some(lr) = self.learning_rate {
            config.training.learning_rate = lr;
        }
        if let Some(max) = self.max_per_class {
            config.data.max_per_class = max;
        }
        if let Some(seed) = self.seed {
            config.data.seed = Some(seed);
            config.training.seed = Some(seed);
        }
        if let Some(dir) = self.plots_dir {
            config.report.plots_dir = dir;
        }
        if self.no_plots {
            config.report.enabled = false;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Run(args) => {
            let config = args.resolve()?;
            let start = std::time::Instant::now();
            let summary = run_experiment(&config)?;
            print_summary(&summary, start.elapsed().as_secs_f64());
        }
        Commands::Stats(args) => {
            let config = args.resolve()?;
            let stats = run_stats(&config)?;
            println!(
                "{} {} images would be used for training",
                "→".cyan(),
                stats.total_kept()
            );
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ==========================================
   catdog: cat vs. dog CNN with Burn + Rust
 ==========================================
  "#
        .green()
    );
    println!("  Backend: {}", backend_name());
    println!();
}

fn print_summary(summary: &ExperimentSummary, seconds: f64) {
    println!();
    println!("{}", "Run Complete!".green().bold());
    println!("  Training status: {}", summary.status);
    println!("  Epochs run:      {}", summary.epochs_run);
    if let Some((epoch, loss)) = summary.history.best_val_loss() {
        println!("  Best val_loss:   {:.4} (epoch {})", loss, epoch + 1);
    }
    if let Some(accuracy) = summary.history.val_accuracy.last() {
        println!("  Final val acc:   {}", format_percent(*accuracy));
    }
    println!("  Predictions:     {}", summary.predictions.len());
    println!("  Plot files:      {}", summary.plots.len());
    println!("  Elapsed:         {}", format_duration(seconds));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "catdog",
            "--verbose",
            "run",
            "--train-dir",
            "data/train",
            "--epochs",
            "5",
            "--seed",
            "7",
            "--no-plots",
        ])
        .unwrap();
        assert!(cli.verbose);

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.data.train_dir, PathBuf::from("data/train"));
        assert_eq!(config.training.epochs, 5);
        assert_eq!(config.training.seed, Some(7));
        assert_eq!(config.data.seed, Some(7));
        assert!(!config.report.enabled);
        assert_eq!(config.training.batch_size, 16);
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = RunArgs::default().resolve().unwrap();
        assert_eq!(config, ExperimentConfig::default());
    }

    #[test]
    fn test_stats_subcommand() {
        let cli = Cli::try_parse_from(["catdog", "stats", "--max-per-class", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Stats(_)));
    }
}
