//! Model module: the CatDogNet architecture and its configuration
//!
//! The network is a fixed sequential stack; only weight initialisation varies
//! between runs built from the same configuration.

pub mod cnn;
pub mod config;

pub use cnn::{CatDogNet, CatDogNetConfig};
pub use config::{ModelConfig, TrainingConfig};
