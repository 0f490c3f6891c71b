//! Reporting: confidence statements and diagnostic plots
//!
//! Plots are presentation side effects. Each one is attempted independently
//! and a failure is logged as a warning without affecting the run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::image::{concat_horizontal, mean_image, PixelArray};
use crate::dataset::label::{LabelRule, NEGATIVE_LABEL, POSITIVE_LABEL};
use crate::dataset::loader::ImageDataset;
use crate::inference::predictor::Prediction;
use crate::training::history::TrainingHistory;
use crate::utils::charts::{
    generate_bar_chart, generate_line_chart, BarData, DataSeries, COLOR_BLUE, COLOR_GREEN,
    COLOR_RED,
};
use crate::utils::error::{CatDogError, Result};

/// Output settings for plots and previews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Write plots at all
    pub enabled: bool,
    /// Directory receiving SVG charts and PNG images
    pub plots_dir: PathBuf,
    /// Number of test images saved with their verdict
    pub preview_count: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            plots_dir: PathBuf::from("output/plots"),
            preview_count: 1,
        }
    }
}

/// Print one confidence statement per prediction
pub fn print_predictions(predictions: &[Prediction], rule: &LabelRule) {
    for prediction in predictions {
        println!("{}", prediction.statement(rule));
    }
}

/// Writes the plots of one run into `plots_dir`
pub struct Reporter<'a> {
    config: &'a ReportConfig,
    rule: &'a LabelRule,
}

impl<'a> Reporter<'a> {
    pub fn new(config: &'a ReportConfig, rule: &'a LabelRule) -> Self {
        Self { config, rule }
    }

    fn output(&self, name: &str) -> PathBuf {
        self.config.plots_dir.join(name)
    }

    /// Bar chart of training label counts
    pub fn plot_class_balance(&self, train: &ImageDataset) -> Result<PathBuf> {
        let [negatives, positives] = train.class_counts();
        let bars = [
            BarData {
                label: format!("{} ({})", NEGATIVE_LABEL, self.rule.negative_pattern),
                value: negatives as f64,
                color: COLOR_BLUE.to_string(),
            },
            BarData {
                label: format!("{} ({})", POSITIVE_LABEL, self.rule.positive_pattern),
                value: positives as f64,
                color: COLOR_RED.to_string(),
            },
        ];

        let path = self.output("class_balance.svg");
        generate_bar_chart(
            "Labels for Cats and Dogs",
            "label",
            "count",
            &bars,
            &path,
        )?;
        Ok(path)
    }

    /// First negative and first positive training image side by side
    pub fn plot_class_examples(&self, train: &ImageDataset) -> Result<PathBuf> {
        let negative = self.first_pixels(train, NEGATIVE_LABEL)?;
        let positive = self.first_pixels(train, POSITIVE_LABEL)?;

        let path = self.output("class_examples.png");
        save_png(&concat_horizontal(negative, positive)?, &path)?;
        Ok(path)
    }

    /// Per-pixel mean image of each class
    pub fn plot_average_images(&self, train: &ImageDataset) -> Result<Vec<PathBuf>> {
        let means = [NEGATIVE_LABEL, POSITIVE_LABEL]
            .into_iter()
            .map(|label| {
                let arrays = train
                    .samples()
                    .iter()
                    .filter(|s| s.label == Some(label))
                    .map(|s| &s.pixels);
                mean_image(arrays).map(|mean| (label, mean))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut written = Vec::new();
        for (label, mean) in means {
            let path = self.output(&format!("average_{}.png", self.rule.class_name(label)));
            save_png(&mean, &path)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Training and validation loss per epoch, plus the raw history as JSON
    pub fn plot_loss(&self, history: &TrainingHistory) -> Result<Vec<PathBuf>> {
        if history.is_empty() {
            return Err(CatDogError::Report("training history is empty".to_string()));
        }

        let series = [
            DataSeries::from_values("Training Loss", &history.loss, COLOR_BLUE),
            DataSeries::from_values("Validation Loss", &history.val_loss, COLOR_GREEN),
        ];
        let chart = self.output("loss_trend.svg");
        generate_line_chart("Loss Trend", "Epochs", "Loss", &series, &chart)?;

        let json = self.output("history.json");
        history.save_json(&json)?;
        Ok(vec![chart, json])
    }

    /// The first `preview_count` test images, named after their verdict
    pub fn save_previews(
        &self,
        test: &ImageDataset,
        predictions: &[Prediction],
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (i, (sample, prediction)) in test
            .samples()
            .iter()
            .zip(predictions)
            .take(self.config.preview_count)
            .enumerate()
        {
            let path = self.output(&format!(
                "preview_{:02}_{}.png",
                i,
                self.rule.class_name(prediction.label())
            ));
            save_png(&sample.pixels, &path)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Write every plot; returns the files that were written
    pub fn write_all(
        &self,
        train: &ImageDataset,
        history: &TrainingHistory,
        test: &ImageDataset,
        predictions: &[Prediction],
    ) -> Vec<PathBuf> {
        if !self.config.enabled {
            info!("Plots disabled");
            return Vec::new();
        }
        if let Err(e) = std::fs::create_dir_all(&self.config.plots_dir) {
            warn!(
                "Cannot create plots directory {:?}: {}",
                self.config.plots_dir, e
            );
            return Vec::new();
        }

        let mut written = Vec::new();
        collect("class balance", self.plot_class_balance(train).map(|p| vec![p]), &mut written);
        collect("class examples", self.plot_class_examples(train).map(|p| vec![p]), &mut written);
        collect("average images", self.plot_average_images(train), &mut written);
        collect("loss trend", self.plot_loss(history), &mut written);
        collect("test previews", self.save_previews(test, predictions), &mut written);

        info!(
            "Wrote {} plot files to {:?}",
            written.len(),
            self.config.plots_dir
        );
        written
    }

    fn first_pixels<'d>(&self, dataset: &'d ImageDataset, label: u8) -> Result<&'d PixelArray> {
        dataset
            .first_with_label(label)
            .map(|s| &s.pixels)
            .ok_or_else(|| {
                CatDogError::Report(format!(
                    "no '{}' image in the training set",
                    self.rule.class_name(label)
                ))
            })
    }
}

fn collect(what: &str, result: Result<Vec<PathBuf>>, written: &mut Vec<PathBuf>) {
    match result {
        Ok(paths) => written.extend(paths),
        Err(e) => warn!("Skipping {} plot: {}", what, e),
    }
}

fn save_png(pixels: &PixelArray, path: &Path) -> Result<()> {
    pixels.to_rgb_image().save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::image::ImageShape;
    use crate::dataset::loader::ImageSample;
    use crate::training::history::EpochMetrics;
    use tempfile::TempDir;

    fn dataset(labels: &[Option<u8>]) -> ImageDataset {
        let shape = ImageShape::new(3, 4, 4);
        let samples = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| ImageSample {
                path: PathBuf::from(format!("{}.png", i)),
                pixels: PixelArray::from_raw(shape, vec![(i * 40) as u8; shape.len()]).unwrap(),
                label,
            })
            .collect();
        ImageDataset::from_samples(shape, samples).unwrap()
    }

    fn history() -> TrainingHistory {
        let mut history = TrainingHistory::new();
        for (loss, val_loss) in [(0.69, 0.68), (0.6, 0.65)] {
            history.push(&EpochMetrics {
                loss,
                accuracy: 0.5,
                val_loss,
                val_accuracy: 0.5,
            });
        }
        history
    }

    #[test]
    fn test_write_all_plots() {
        let dir = TempDir::new().unwrap();
        let config = ReportConfig {
            plots_dir: dir.path().join("plots"),
            preview_count: 2,
            ..Default::default()
        };
        let rule = LabelRule::default();
        let reporter = Reporter::new(&config, &rule);

        let train = dataset(&[Some(0), Some(1), Some(1), Some(0)]);
        let test = dataset(&[None, None, None]);
        let predictions = vec![
            Prediction {
                image_path: PathBuf::from("0.png"),
                probability: 0.9,
            },
            Prediction {
                image_path: PathBuf::from("1.png"),
                probability: 0.1,
            },
        ];

        let written = reporter.write_all(&train, &history(), &test, &predictions);
        let plots = dir.path().join("plots");
        for name in [
            "class_balance.svg",
            "class_examples.png",
            "average_cat.png",
            "average_dog.png",
            "loss_trend.svg",
            "history.json",
            "preview_00_dog.png",
            "preview_01_cat.png",
        ] {
            assert!(plots.join(name).exists(), "{name} missing");
        }
        assert_eq!(written.len(), 8);

        let examples = image::open(plots.join("class_examples.png")).unwrap();
        assert_eq!((examples.width(), examples.height()), (8, 4));
    }

    #[test]
    fn test_missing_class_only_skips_that_plot() {
        let dir = TempDir::new().unwrap();
        let config = ReportConfig {
            plots_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let rule = LabelRule::default();
        let reporter = Reporter::new(&config, &rule);

        let train = dataset(&[Some(0), Some(0)]);
        assert!(reporter.plot_class_examples(&train).is_err());

        let written = reporter.write_all(&train, &history(), &dataset(&[None]), &[]);
        assert!(dir.path().join("class_balance.svg").exists());
        assert!(dir.path().join("loss_trend.svg").exists());
        assert!(!dir.path().join("class_examples.png").exists());
        assert!(!written.is_empty());
    }

    #[test]
    fn test_disabled_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = ReportConfig {
            enabled: false,
            plots_dir: dir.path().join("plots"),
            ..Default::default()
        };
        let rule = LabelRule::default();
        let written = Reporter::new(&config, &rule).write_all(
            &dataset(&[Some(0)]),
            &history(),
            &dataset(&[None]),
            &[],
        );
        assert!(written.is_empty());
        assert!(!dir.path().join("plots").exists());
    }
}
