//! Model Configuration Module
//!
//! Serde-facing configuration for the network architecture and for the
//! training run (optimizer, loss, epochs, validation holdout, early stopping).

use serde::{Deserialize, Serialize};

use crate::dataset::image::ImageShape;
use crate::model::cnn::CatDogNetConfig;
use crate::utils::error::{CatDogError, Result};

/// Configuration for the CNN model architecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Output channels of each convolutional block
    pub conv_filters: Vec<usize>,

    /// Convolutions per block
    pub convs_per_block: usize,

    /// Width of each dense layer
    pub dense_units: usize,

    /// Number of dense + dropout blocks
    pub dense_layers: usize,

    /// Dropout rate for regularization (0.0 to 1.0)
    pub dropout_rate: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            conv_filters: vec![32, 64, 128, 256],
            convs_per_block: 2,
            dense_units: 256,
            dense_layers: 2,
            dropout_rate: 0.5,
        }
    }
}

impl ModelConfig {
    /// Network config for inputs of `shape`
    pub fn to_net_config(&self, shape: ImageShape) -> CatDogNetConfig {
        CatDogNetConfig::new()
            .with_input_height(shape.height)
            .with_input_width(shape.width)
            .with_in_channels(shape.channels)
            .with_conv_filters(self.conv_filters.clone())
            .with_convs_per_block(self.convs_per_block)
            .with_dense_units(self.dense_units)
            .with_dense_layers(self.dense_layers)
            .with_dropout_rate(self.dropout_rate)
    }
}

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Epoch budget
    pub epochs: usize,

    /// Mini-batch size
    pub batch_size: usize,

    /// Fixed RMSprop learning rate
    pub learning_rate: f64,

    /// RMSprop decay of the squared-gradient average (rho)
    pub rmsprop_alpha: f32,

    /// RMSprop numerical stability term
    pub rmsprop_epsilon: f32,

    /// Fraction of the training data held out for validation
    pub validation_split: f64,

    /// Reshuffle the training portion every epoch
    pub shuffle: bool,

    /// Draw a fresh random holdout every epoch instead of the fixed tail
    pub resplit_each_epoch: bool,

    /// Epochs without validation loss improvement before stopping
    pub patience: usize,

    /// Minimum decrease of validation loss that counts as improvement
    pub min_delta: f64,

    /// Seed for epoch shuffling; entropy when absent
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 2,
            batch_size: 16,
            learning_rate: 1e-4,
            rmsprop_alpha: 0.9,
            rmsprop_epsilon: 1e-7,
            validation_split: 0.25,
            shuffle: true,
            resplit_each_epoch: false,
            patience: 3,
            min_delta: 0.0,
            seed: None,
        }
    }
}

impl TrainingConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(CatDogError::Config("epochs must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(CatDogError::Config("batch_size must be at least 1".to_string()));
        }
        if !(self.learning_rate >= 0.0 && self.learning_rate.is_finite()) {
            return Err(CatDogError::Config(format!(
                "learning_rate must be a finite non-negative number, got {}",
                self.learning_rate
            )));
        }
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(CatDogError::Config(format!(
                "validation_split must be in (0, 1), got {}",
                self.validation_split
            )));
        }
        if self.min_delta < 0.0 {
            return Err(CatDogError::Config("min_delta must be non-negative".to_string()));
        }
        Ok(())
    }

    /// Number of samples used for training when `total` are available
    ///
    /// The holdout is the trailing `validation_split` fraction; the training
    /// portion is rounded down.
    pub fn train_count(&self, total: usize) -> usize {
        (total as f64 * (1.0 - self.validation_split)).floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, 2);
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.learning_rate, 1e-4);
        assert_eq!(config.validation_split, 0.25);
        assert_eq!(config.patience, 3);
        assert!(config.shuffle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_train_count() {
        let config = TrainingConfig::default();
        assert_eq!(config.train_count(2000), 1500);
        assert_eq!(config.train_count(4), 3);
        assert_eq!(config.train_count(1), 0);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = TrainingConfig::default();
        config.validation_split = 1.0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.learning_rate = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_model_to_net_config() {
        let net = ModelConfig::default().to_net_config(ImageShape::new(3, 64, 64));
        assert_eq!(net.input_height, 64);
        assert_eq!(net.in_channels, 3);
        assert_eq!(net.dense_units, 256);
        assert_eq!(net.dropout_rate, 0.5);
    }

    #[test]
    fn test_partial_toml() {
        let config: TrainingConfig = toml::from_str("epochs = 5\nseed = 42").unwrap();
        assert_eq!(config.epochs, 5);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.batch_size, 16);
    }
}
