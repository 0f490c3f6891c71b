//! In-memory image datasets
//!
//! Decodes every indexed file up front into an [`ImageDataset`] whose arrays
//! all share one [`ImageShape`].

use std::path::{Path, PathBuf};

use tracing::info;

use crate::dataset::image::{load_image, ImageShape, PixelArray};
use crate::utils::error::{CatDogError, Result};
use crate::utils::logging::ProgressLogger;

/// One decoded image, labeled for training and unlabeled for test
#[derive(Debug, Clone)]
pub struct ImageSample {
    pub path: PathBuf,
    pub pixels: PixelArray,
    pub label: Option<u8>,
}

/// Ordered samples with a fixed shape
#[derive(Debug, Clone)]
pub struct ImageDataset {
    shape: ImageShape,
    samples: Vec<ImageSample>,
}

impl ImageDataset {
    pub fn new(shape: ImageShape) -> Self {
        Self {
            shape,
            samples: Vec::new(),
        }
    }

    /// Build from samples, rejecting any array whose shape differs
    pub fn from_samples(shape: ImageShape, samples: Vec<ImageSample>) -> Result<Self> {
        let mut dataset = Self::new(shape);
        for sample in samples {
            dataset.push(sample)?;
        }
        Ok(dataset)
    }

    pub fn push(&mut self, sample: ImageSample) -> Result<()> {
        if sample.pixels.shape() != self.shape {
            return Err(CatDogError::ShapeMismatch {
                index: self.samples.len(),
                expected: self.shape.to_string(),
                found: sample.pixels.shape().to_string(),
            });
        }
        if let Some(label) = sample.label {
            if label > 1 {
                return Err(CatDogError::InvalidLabel {
                    index: self.samples.len(),
                    label,
                });
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[ImageSample] {
        &self.samples
    }

    pub fn get(&self, index: usize) -> Option<&ImageSample> {
        self.samples.get(index)
    }

    /// Shape of all arrays stacked: (N, C, H, W)
    pub fn stacked_shape(&self) -> (usize, usize, usize, usize) {
        (
            self.samples.len(),
            self.shape.channels,
            self.shape.height,
            self.shape.width,
        )
    }

    /// Attach one label per sample, in order
    pub fn assign_labels(&mut self, labels: &[u8]) -> Result<()> {
        if labels.len() != self.samples.len() {
            return Err(CatDogError::LabelCountMismatch {
                images: self.samples.len(),
                labels: labels.len(),
            });
        }
        if let Some((index, &label)) = labels.iter().enumerate().find(|(_, &l)| l > 1) {
            return Err(CatDogError::InvalidLabel { index, label });
        }
        for (sample, &label) in self.samples.iter_mut().zip(labels) {
            sample.label = Some(label);
        }
        Ok(())
    }

    /// Labels of every sample; fails if any sample is unlabeled
    pub fn labels(&self) -> Result<Vec<u8>> {
        let labels: Vec<u8> = self.samples.iter().filter_map(|s| s.label).collect();
        if labels.len() != self.samples.len() {
            return Err(CatDogError::LabelCountMismatch {
                images: self.samples.len(),
                labels: labels.len(),
            });
        }
        Ok(labels)
    }

    /// Number of samples per label, `[negative, positive]`
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for label in self.samples.iter().filter_map(|s| s.label) {
            counts[label as usize] += 1;
        }
        counts
    }

    /// First sample carrying `label`
    pub fn first_with_label(&self, label: u8) -> Option<&ImageSample> {
        self.samples.iter().find(|s| s.label == Some(label))
    }

    /// Print `{name} shape: (N, C, H, W)`
    pub fn print_shape(&self, name: &str) {
        let (n, c, h, w) = self.stacked_shape();
        println!("{} shape: ({}, {}, {}, {})", name, n, c, h, w);
    }
}

/// Decode `paths` in order into a dataset of `shape`
///
/// Prints `Processed i of N` every `progress_interval` images. The first
/// failing file aborts the whole load.
pub fn load_images<P: AsRef<Path>>(
    paths: &[P],
    shape: ImageShape,
    progress_interval: usize,
) -> Result<ImageDataset> {
    shape.validate()?;

    let progress = ProgressLogger::new(paths.len(), progress_interval);
    let mut dataset = ImageDataset::new(shape);

    for (i, path) in paths.iter().enumerate() {
        progress.update(i);
        let path = path.as_ref();
        let pixels = load_image(path, shape)?;
        dataset.push(ImageSample {
            path: path.to_path_buf(),
            pixels,
            label: None,
        })?;
    }

    progress.finish("Loaded images");
    info!("Dataset shape: {:?}", dataset.stacked_shape());
    Ok(dataset)
}
