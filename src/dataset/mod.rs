//! Dataset module: indexing, decoding, labeling and Burn batching
//!
//! Flow: [`index`] lists and shuffles the files, [`loader`] decodes them via
//! [`image`] into an [`ImageDataset`], [`label`] derives the binary targets
//! and [`burn_dataset`] turns labeled samples into tensors.

pub mod burn_dataset;
pub mod image;
pub mod index;
pub mod label;
pub mod loader;

pub use burn_dataset::{CatDogBatch, CatDogBatcher, CatDogBurnDataset, CatDogItem};
pub use image::{load_image, ImageShape, PixelArray};
pub use index::{index_test_dir, index_training_dir, make_rng, DatasetIndex, IndexStats};
pub use label::{extract_label, LabelRule, NEGATIVE_LABEL, POSITIVE_LABEL};
pub use loader::{load_images, ImageDataset, ImageSample};
