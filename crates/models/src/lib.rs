//! Burn segmentation network used for Monte-Carlo-dropout evaluation.
//!
//! `SegmentationNet` is a compact DeepLab-style model:
//! - three stride-2 conv stages (output stride 8),
//! - two dilated residual blocks,
//! - an ASPP head (1x1, two dilated 3x3 branches, image pooling),
//! - a dropout layer that stays active at inference time, then a 1x1 classifier.
//!
//! The model only produces downsampled logits. Upsampling, softmax and averaging over
//! stochastic passes live in the `inference` crate.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig};
use burn::nn::PaddingConfig2d;
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelConfigError {
    #[error("dropout_prob must be in [0, 1), got {0}")]
    InvalidDropout(f64),
    #[error("num_classes must be at least 1")]
    NoClasses,
    #[error("channel widths must be non-zero")]
    ZeroChannels,
}

#[derive(Debug, Clone)]
pub struct SegmentationNetConfig {
    pub num_classes: usize,
    pub base_channels: usize,
    pub aspp_channels: usize,
    pub dropout_prob: f64,
}

impl Default for SegmentationNetConfig {
    fn default() -> Self {
        Self {
            num_classes: 19,
            base_channels: 32,
            aspp_channels: 64,
            dropout_prob: 0.5,
        }
    }
}

impl SegmentationNetConfig {
    pub fn validate(&self) -> Result<(), ModelConfigError> {
        if !(0.0..1.0).contains(&self.dropout_prob) {
            return Err(ModelConfigError::InvalidDropout(self.dropout_prob));
        }
        if self.num_classes == 0 {
            return Err(ModelConfigError::NoClasses);
        }
        if self.base_channels == 0 || self.aspp_channels == 0 {
            return Err(ModelConfigError::ZeroChannels);
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> SegmentationNet<B> {
        SegmentationNet::new(self.clone(), device)
    }
}

/// Total downsampling of the encoder (three stride-2 stages).
pub const OUTPUT_STRIDE: usize = 8;
/// Largest dilation used by the ASPP head.
pub const MAX_ASPP_DILATION: usize = 12;

/// Dropout that is applied on every call, independent of autodiff/eval mode.
///
/// Kept elements are scaled by `1 / (1 - prob)`.
pub fn mc_dropout<B: Backend, const D: usize>(input: Tensor<B, D>, prob: f64) -> Tensor<B, D> {
    if prob <= 0.0 {
        return input;
    }
    let keep = 1.0 - prob;
    let mask = input.random_like(Distribution::Bernoulli(keep));
    input.mul(mask).div_scalar(keep)
}

fn conv3x3<B: Backend>(
    channels: [usize; 2],
    stride: usize,
    dilation: usize,
    device: &B::Device,
) -> Conv2d<B> {
    Conv2dConfig::new(channels, [3, 3])
        .with_stride([stride, stride])
        .with_dilation([dilation, dilation])
        .with_padding(PaddingConfig2d::Explicit(dilation, dilation))
        .init(device)
}

fn conv1x1<B: Backend>(channels: [usize; 2], device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new(channels, [1, 1]).init(device)
}

#[derive(Debug, Module)]
pub struct SegmentationNet<B: Backend> {
    stage1: Conv2d<B>,
    stage2: Conv2d<B>,
    stage3: Conv2d<B>,
    res_dil2: Conv2d<B>,
    res_dil4: Conv2d<B>,
    aspp_1x1: Conv2d<B>,
    aspp_dil6: Conv2d<B>,
    aspp_dil12: Conv2d<B>,
    aspp_pool: AdaptiveAvgPool2d,
    aspp_pool_proj: Conv2d<B>,
    project: Conv2d<B>,
    classifier: Conv2d<B>,
    dropout_prob: f64,
    num_classes: usize,
}

impl<B: Backend> SegmentationNet<B> {
    pub fn new(cfg: SegmentationNetConfig, device: &B::Device) -> Self {
        let c = cfg.base_channels.max(1);
        let a = cfg.aspp_channels.max(1);
        let deep = c * 4;
        Self {
            stage1: conv3x3([3, c], 2, 1, device),
            stage2: conv3x3([c, c * 2], 2, 1, device),
            stage3: conv3x3([c * 2, deep], 2, 1, device),
            res_dil2: conv3x3([deep, deep], 1, 2, device),
            res_dil4: conv3x3([deep, deep], 1, 4, device),
            aspp_1x1: conv1x1([deep, a], device),
            aspp_dil6: conv3x3([deep, a], 1, MAX_ASPP_DILATION / 2, device),
            aspp_dil12: conv3x3([deep, a], 1, MAX_ASPP_DILATION, device),
            aspp_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            aspp_pool_proj: conv1x1([deep, a], device),
            project: conv1x1([a * 4, a], device),
            classifier: conv1x1([a, cfg.num_classes.max(1)], device),
            dropout_prob: cfg.dropout_prob,
            num_classes: cfg.num_classes.max(1),
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn dropout_prob(&self) -> f64 {
        self.dropout_prob
    }

    /// Smallest input side whose feature map is wider than [`MAX_ASPP_DILATION`].
    ///
    /// Below this the dilated ASPP taps only ever read padding, which the ndarray
    /// conv kernel does not handle.
    pub fn min_input_size(&self) -> usize {
        OUTPUT_STRIDE * MAX_ASPP_DILATION + 1
    }

    /// Downsampled logits: `[batch, 3, h, w]` -> `[batch, num_classes, ~h/8, ~w/8]`.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.stage1.forward(images));
        let x = relu(self.stage2.forward(x));
        let x = relu(self.stage3.forward(x));
        let x = relu(x.clone() + self.res_dil2.forward(x));
        let x = relu(x.clone() + self.res_dil4.forward(x));

        let [_, _, h, w] = x.dims();
        let pooled = relu(self.aspp_pool_proj.forward(self.aspp_pool.forward(x.clone())))
            .repeat_dim(2, h)
            .repeat_dim(3, w);
        let branches = vec![
            relu(self.aspp_1x1.forward(x.clone())),
            relu(self.aspp_dil6.forward(x.clone())),
            relu(self.aspp_dil12.forward(x)),
            pooled,
        ];
        let x = relu(self.project.forward(Tensor::cat(branches, 1)));
        let x = mc_dropout(x, self.dropout_prob);
        self.classifier.forward(x)
    }
}

pub mod prelude {
    pub use super::{
        mc_dropout, ModelConfigError, SegmentationNet, SegmentationNetConfig, MAX_ASPP_DILATION,
        OUTPUT_STRIDE,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation_rejects_bad_values() {
        assert!(SegmentationNetConfig::default().validate().is_ok());
        let cfg = SegmentationNetConfig {
            dropout_prob: 1.0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ModelConfigError::InvalidDropout(1.0)));
        let cfg = SegmentationNetConfig {
            num_classes: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ModelConfigError::NoClasses));
    }

    #[test]
    fn min_input_keeps_feature_map_wider_than_dilation() {
        type B = burn_ndarray::NdArray<f32>;
        let net = SegmentationNetConfig::default().init::<B>(&Default::default());
        let min = net.min_input_size();
        assert_eq!(min, 97);
        // Three stride-2 stages with padding 1 produce ceil(n / 8).
        assert!(min.div_ceil(OUTPUT_STRIDE) > MAX_ASPP_DILATION);
        assert!((min - 1).div_ceil(OUTPUT_STRIDE) <= MAX_ASPP_DILATION);
    }
}
