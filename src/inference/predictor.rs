//! Inference Predictor Module
//!
//! Runs a trained [`CatDogNet`] over a dataset in batches, without gradient
//! tracking, and turns each output into a [`Prediction`].

use std::path::PathBuf;

use burn::tensor::{backend::Backend, Tensor};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::burn_dataset::CatDogBatcher;
use crate::dataset::label::{LabelRule, NEGATIVE_LABEL, POSITIVE_LABEL};
use crate::dataset::loader::ImageDataset;
use crate::model::cnn::CatDogNet;
use crate::utils::error::{CatDogError, Result};

/// Probabilities at or above this value are classified positive
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Positive-class probability for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub image_path: PathBuf,
    pub probability: f32,
}

impl Prediction {
    pub fn label(&self) -> u8 {
        if self.probability >= DECISION_THRESHOLD {
            POSITIVE_LABEL
        } else {
            NEGATIVE_LABEL
        }
    }

    /// Probability of the predicted class
    pub fn confidence(&self) -> f32 {
        if self.label() == POSITIVE_LABEL {
            self.probability
        } else {
            1.0 - self.probability
        }
    }

    /// ` 87.34% sure this is a dog`
    pub fn statement(&self, rule: &LabelRule) -> String {
        format!(
            " {:.2}% sure this is a {}",
            self.confidence() as f64 * 100.0,
            rule.class_name(self.label())
        )
    }
}

/// Predictor for running inference with a trained model
pub struct Predictor<B: Backend> {
    model: CatDogNet<B>,
    device: B::Device,
    batch_size: usize,
}

impl<B: Backend> Predictor<B> {
    /// `model` should live on a non-autodiff backend so dropout is inactive
    pub fn new(model: CatDogNet<B>, device: B::Device, batch_size: usize) -> Self {
        Self {
            model,
            device,
            batch_size: batch_size.max(1),
        }
    }

    /// One prediction per sample, in dataset order
    pub fn predict(&self, dataset: &ImageDataset) -> Result<Vec<Prediction>> {
        let batcher = CatDogBatcher::new(dataset.shape());
        let mut predictions = Vec::with_capacity(dataset.len());

        for chunk in dataset.samples().chunks(self.batch_size) {
            let images: Tensor<B, 4> =
                batcher.images(chunk.iter().map(|s| &s.pixels), &self.device);
            let probabilities = self
                .model
                .forward(images)
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| CatDogError::Inference(format!("Failed to read outputs: {:?}", e)))?;

            for (sample, probability) in chunk.iter().zip(probabilities) {
                if !probability.is_finite() {
                    return Err(CatDogError::Inference(format!(
                        "non-finite probability for {}",
                        sample.path.display()
                    )));
                }
                predictions.push(Prediction {
                    image_path: sample.path.clone(),
                    probability: probability.clamp(0.0, 1.0),
                });
            }
        }

        info!("Predicted {} test images", predictions.len());
        Ok(predictions)
    }
}
