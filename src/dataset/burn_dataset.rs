//! Burn Dataset Integration
//!
//! Bridges [`ImageDataset`] to Burn's `Dataset` and `Batcher` traits. Pixels
//! stay `u8` in memory and are scaled to [0, 1] when a batch is built.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;

use crate::dataset::image::{ImageShape, PixelArray};
use crate::dataset::loader::ImageDataset;
use crate::utils::error::Result;

/// A labeled image ready for batching
#[derive(Clone, Debug)]
pub struct CatDogItem {
    pub pixels: PixelArray,
    pub label: u8,
}

/// Labeled items in dataset order
#[derive(Clone, Debug)]
pub struct CatDogBurnDataset {
    items: Vec<CatDogItem>,
}

impl CatDogBurnDataset {
    /// Requires every sample to carry a label
    pub fn from_dataset(dataset: &ImageDataset) -> Result<Self> {
        let labels = dataset.labels()?;
        let items = dataset
            .samples()
            .iter()
            .zip(labels)
            .map(|(sample, label)| CatDogItem {
                pixels: sample.pixels.clone(),
                label,
            })
            .collect();
        Ok(Self { items })
    }

    /// Items at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Vec<CatDogItem> {
        indices
            .iter()
            .filter_map(|&i| self.items.get(i).cloned())
            .collect()
    }
}

impl Dataset<CatDogItem> for CatDogBurnDataset {
    fn get(&self, index: usize) -> Option<CatDogItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of images and binary targets
#[derive(Clone, Debug)]
pub struct CatDogBatch<B: Backend> {
    /// [batch_size, channels, height, width], values in [0, 1]
    pub images: Tensor<B, 4>,
    /// [batch_size, 1], values in {0, 1}
    pub targets: Tensor<B, 2, Int>,
    /// The same targets, kept on the host for accuracy
    pub labels: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct CatDogBatcher {
    shape: ImageShape,
}

impl CatDogBatcher {
    pub fn new(shape: ImageShape) -> Self {
        Self { shape }
    }

    /// Stack arrays into a [N, C, H, W] float tensor scaled to [0, 1]
    pub fn images<'a, B, I>(&self, arrays: I, device: &B::Device) -> Tensor<B, 4>
    where
        B: Backend,
        I: IntoIterator<Item = &'a PixelArray>,
    {
        let data: Vec<f32> = arrays
            .into_iter()
            .flat_map(|a| a.as_slice().iter().map(|&v| v as f32 / 255.0))
            .collect();
        let batch_size = data.len() / self.shape.len().max(1);

        Tensor::<B, 4>::from_floats(
            TensorData::new(
                data,
                [
                    batch_size,
                    self.shape.channels,
                    self.shape.height,
                    self.shape.width,
                ],
            ),
            device,
        )
    }
}

impl<B: Backend> Batcher<B, CatDogItem, CatDogBatch<B>> for CatDogBatcher {
    fn batch(&self, items: Vec<CatDogItem>, device: &B::Device) -> CatDogBatch<B> {
        let images: Tensor<B, 4> = self.images(items.iter().map(|item| &item.pixels), device);

        let labels: Vec<u8> = items.iter().map(|item| item.label).collect();
        let targets_data: Vec<i64> = labels.iter().map(|&l| l as i64).collect();
        let targets = Tensor::<B, 2, Int>::from_data(
            TensorData::new(targets_data, [labels.len(), 1]),
            device,
        );

        CatDogBatch {
            images,
            targets,
            labels,
        }
    }
}
