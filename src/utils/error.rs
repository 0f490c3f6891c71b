//! Error Handling Module
//!
//! Defines the error type for the cat/dog classification pipeline.
//! Input, data-shape and divergence failures all abort the run, so every
//! variant carries enough context to name the offending file or index.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for catdog operations
#[derive(Error, Debug)]
pub enum CatDogError {
    /// An image could not be opened or decoded
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Input directory does not exist or is not a directory
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// Input directory has no usable entries
    #[error("Directory is empty: {0}")]
    EmptyDirectory(PathBuf),

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// A decoded array does not match the dataset shape
    #[error("Shape mismatch at index {index}: expected {expected}, found {found}")]
    ShapeMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// Images and labels are not aligned
    #[error("Label count mismatch: {images} images but {labels} labels")]
    LabelCountMismatch { images: usize, labels: usize },

    /// A label outside {0, 1}
    #[error("Invalid label {label} at index {index}: expected 0 or 1")]
    InvalidLabel { index: usize, label: u8 },

    /// The loss objective produced NaN or infinity
    #[error("Non-finite loss {value} at epoch {epoch}, batch {batch}")]
    NonFiniteLoss { epoch: usize, batch: usize, value: f64 },

    /// Error with training
    #[error("Training error: {0}")]
    Training(String),

    /// Error with inference
    #[error("Inference error: {0}")]
    Inference(String),

    /// Error while rendering plots or previews
    #[error("Report error: {0}")]
    Report(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error outside of dataset loading
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CatDogError {
    fn from(err: serde_json::Error) -> Self {
        CatDogError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for CatDogError {
    fn from(err: toml::de::Error) -> Self {
        CatDogError::Config(err.to_string())
    }
}

/// Convenience Result type for catdog operations
pub type Result<T> = std::result::Result<T, CatDogError>;

/// Extension trait for attaching a file path to image errors
pub trait ResultExt<T> {
    /// Turn any error into an `ImageLoad` error for `path`
    fn image_context(self, path: &std::path::Path) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn image_context(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| CatDogError::ImageLoad(path.to_path_buf(), e.to_string()))
    }
}
