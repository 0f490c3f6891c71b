//! CNN Model Architecture for Cat/Dog Classification
//!
//! A strictly sequential VGG-style stack:
//! - convolutional blocks (two 3x3 "same" convolutions + ReLU, then 2x2 max pooling)
//! - flatten
//! - dense + ReLU + dropout blocks
//! - a single output unit; `forward` applies the sigmoid

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{activation::sigmoid, backend::Backend, Tensor},
};

use crate::utils::error::{self, CatDogError};

/// Configuration for the CatDogNet CNN model
#[derive(Config, Debug)]
pub struct CatDogNetConfig {
    /// Input image height
    #[config(default = "64")]
    pub input_height: usize,

    /// Input image width
    #[config(default = "64")]
    pub input_width: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Output channels of each convolutional block
    #[config(default = "vec![32, 64, 128, 256]")]
    pub conv_filters: Vec<usize>,

    /// Convolutions per block
    #[config(default = "2")]
    pub convs_per_block: usize,

    /// Width of each dense layer
    #[config(default = "256")]
    pub dense_units: usize,

    /// Number of dense + dropout blocks
    #[config(default = "2")]
    pub dense_layers: usize,

    /// Dropout rate after each dense layer
    #[config(default = "0.5")]
    pub dropout_rate: f64,
}

impl CatDogNetConfig {
    /// Spatial size after all pooling layers: (height, width)
    pub fn pooled_size(&self) -> (usize, usize) {
        self.conv_filters
            .iter()
            .fold((self.input_height, self.input_width), |(h, w), _| {
                (h / 2, w / 2)
            })
    }

    /// Width of the flattened feature vector fed to the first dense layer
    pub fn flattened_features(&self) -> usize {
        let (h, w) = self.pooled_size();
        let channels = self.conv_filters.last().copied().unwrap_or(self.in_channels);
        channels * h * w
    }

    pub fn validate(&self) -> error::Result<()> {
        if self.input_height == 0 || self.input_width == 0 || self.in_channels == 0 {
            return Err(CatDogError::Config(
                "input size and channels must be non-zero".to_string(),
            ));
        }
        if self.conv_filters.is_empty() || self.conv_filters.contains(&0) {
            return Err(CatDogError::Config(
                "conv_filters needs at least one non-zero block".to_string(),
            ));
        }
        if self.convs_per_block == 0 {
            return Err(CatDogError::Config(
                "convs_per_block must be at least 1".to_string(),
            ));
        }
        let (h, w) = self.pooled_size();
        if h == 0 || w == 0 {
            return Err(CatDogError::Config(format!(
                "{}x{} input collapses to zero after {} pooling layers",
                self.input_width,
                self.input_height,
                self.conv_filters.len()
            )));
        }
        if self.dense_units == 0 {
            return Err(CatDogError::Config("dense_units must be non-zero".to_string()));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(CatDogError::Config(
                "dropout_rate must be in range [0.0, 1.0)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Convolutions with ReLU, followed by 2x2 max pooling
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub convs: Vec<Conv2d<B>>,
    pub relu: Relu,
    pub pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        num_convs: usize,
        device: &B::Device,
    ) -> Self {
        let convs = (0..num_convs)
            .map(|i| {
                let input = if i == 0 { in_channels } else { out_channels };
                Conv2dConfig::new([input, out_channels], [3, 3])
                    .with_padding(PaddingConfig2d::Same)
                    .init(device)
            })
            .collect();

        Self {
            convs,
            relu: Relu::new(),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self
            .convs
            .iter()
            .fold(x, |x, conv| self.relu.forward(conv.forward(x)));
        self.pool.forward(x)
    }
}

/// Dense layer with ReLU and dropout
#[derive(Module, Debug)]
pub struct DenseBlock<B: Backend> {
    pub linear: Linear<B>,
    pub relu: Relu,
    pub dropout: Dropout,
}

impl<B: Backend> DenseBlock<B> {
    pub fn new(input: usize, output: usize, dropout_rate: f64, device: &B::Device) -> Self {
        Self {
            linear: LinearConfig::new(input, output).init(device),
            relu: Relu::new(),
            dropout: DropoutConfig::new(dropout_rate).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.dropout.forward(self.relu.forward(self.linear.forward(x)))
    }
}

/// Binary cat/dog classifier
#[derive(Module, Debug)]
pub struct CatDogNet<B: Backend> {
    pub blocks: Vec<ConvBlock<B>>,
    pub dense: Vec<DenseBlock<B>>,
    pub output: Linear<B>,
}

impl<B: Backend> CatDogNet<B> {
    /// Build the network; the config is validated first
    pub fn new(config: &CatDogNetConfig, device: &B::Device) -> error::Result<Self> {
        config.validate()?;

        let mut in_channels = config.in_channels;
        let blocks = config
            .conv_filters
            .iter()
            .map(|&filters| {
                let block = ConvBlock::new(in_channels, filters, config.convs_per_block, device);
                in_channels = filters;
                block
            })
            .collect();

        let mut features = config.flattened_features();
        let dense = (0..config.dense_layers)
            .map(|_| {
                let block = DenseBlock::new(features, config.dense_units, config.dropout_rate, device);
                features = config.dense_units;
                block
            })
            .collect();

        Ok(Self {
            blocks,
            dense,
            output: LinearConfig::new(features, 1).init(device),
        })
    }

    /// Pre-sigmoid scores, shape [batch_size, 1]
    pub fn forward_logits(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.blocks.iter().fold(x, |x, block| block.forward(x));

        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        let x = self.dense.iter().fold(x, |x, block| block.forward(x));
        self.output.forward(x)
    }

    /// Probabilities of the positive class, shape [batch_size, 1]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        sigmoid(self.forward_logits(x))
    }
}
