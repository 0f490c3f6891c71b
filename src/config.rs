//! Experiment configuration
//!
//! Every constant of a run lives here, grouped by the component that reads
//! it. The compiled-in defaults reproduce the reference experiment; a TOML
//! file may override any subset of fields.
//!
//! ```toml
//! [data]
//! train_dir = "input/train"
//! max_per_class = 500
//!
//! [training]
//! epochs = 10
//! seed = 42
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dataset::image::ImageShape;
use crate::dataset::label::LabelRule;
use crate::inference::report::ReportConfig;
use crate::model::config::{ModelConfig, TrainingConfig};
use crate::utils::error::{CatDogError, Result};

/// Input directories and indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub train_dir: PathBuf,
    pub test_dir: PathBuf,
    /// File-name substring of the positive class (label 1)
    pub positive_pattern: String,
    /// File-name substring of the negative class (label 0)
    pub negative_pattern: String,
    /// Cap per class in the training directory
    pub max_per_class: usize,
    /// Cap on test images
    pub test_limit: usize,
    /// Seed for index shuffling; entropy when absent
    pub seed: Option<u64>,
    /// Print a progress line every this many decoded images
    pub progress_interval: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            train_dir: PathBuf::from("input/train"),
            test_dir: PathBuf::from("input/test"),
            positive_pattern: "dog".to_string(),
            negative_pattern: "cat".to_string(),
            max_per_class: 1000,
            test_limit: 25,
            seed: None,
            progress_interval: 250,
        }
    }
}

impl DataConfig {
    pub fn label_rule(&self) -> LabelRule {
        LabelRule::new(&self.positive_pattern, &self.negative_pattern)
    }

    pub fn validate(&self) -> Result<()> {
        if self.positive_pattern.is_empty() || self.negative_pattern.is_empty() {
            return Err(CatDogError::Config(
                "class patterns must be non-empty".to_string(),
            ));
        }
        if self.positive_pattern == self.negative_pattern {
            return Err(CatDogError::Config(format!(
                "positive and negative patterns are both '{}'",
                self.positive_pattern
            )));
        }
        if self.max_per_class == 0 {
            return Err(CatDogError::Config("max_per_class must be at least 1".to_string()));
        }
        if self.test_limit == 0 {
            return Err(CatDogError::Config("test_limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Target size of every decoded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub width: usize,
    pub height: usize,
    /// 3 for RGB, 1 for grayscale
    pub channels: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: crate::IMAGE_SIZE,
            height: crate::IMAGE_SIZE,
            channels: crate::CHANNELS,
        }
    }
}

impl ImageConfig {
    pub fn shape(&self) -> ImageShape {
        ImageShape::new(self.channels, self.height, self.width)
    }
}

/// Complete configuration of one experiment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub data: DataConfig,
    pub image: ImageConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub report: ReportConfig,
}

impl ExperimentConfig {
    /// Load from a TOML file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        load_toml_config(path)
    }

    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        self.image.shape().validate()?;
        self.model.to_net_config(self.image.shape()).validate()?;
        self.training.validate()?;
        Ok(())
    }
}

pub fn load_toml_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = fs::read_to_string(path).map_err(|e| {
        CatDogError::Config(format!("Failed to read config {}: {e}", path.display()))
    })?;

    toml::from_str(&content).map_err(|e| {
        CatDogError::Config(format!("Failed to parse config {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_reference_experiment() {
        let config = ExperimentConfig::default();
        assert_eq!(config.image.shape(), ImageShape::new(3, 64, 64));
        assert_eq!(config.image.width, crate::IMAGE_SIZE);
        assert_eq!(config.image.channels, crate::CHANNELS);
        assert_eq!(config.data.max_per_class, 1000);
        assert_eq!(config.data.test_limit, 25);
        assert_eq!(config.data.progress_interval, 250);
        assert_eq!(config.training.epochs, 2);
        assert_eq!(config.report.plots_dir, PathBuf::from("output/plots"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            "[data]\nmax_per_class = 10\n\n[training]\nepochs = 4\nseed = 9\n\n[report]\nenabled = false\n",
        )
        .unwrap();

        let config = ExperimentConfig::load(&path).unwrap();
        assert_eq!(config.data.max_per_class, 10);
        assert_eq!(config.data.positive_pattern, "dog");
        assert_eq!(config.training.epochs, 4);
        assert_eq!(config.training.seed, Some(9));
        assert!(!config.report.enabled);
        assert_eq!(config.image.width, 64);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[training\nepochs = ").unwrap();
        assert!(matches!(
            ExperimentConfig::load(&path),
            Err(CatDogError::Config(_))
        ));
        assert!(matches!(
            ExperimentConfig::load(&dir.path().join("missing.toml")),
            Err(CatDogError::Config(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = ExperimentConfig::default();
        config.data.negative_pattern = "dog".to_string();
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.image.width = 8;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.image.channels = 4;
        assert!(config.validate().is_err());
    }
}
