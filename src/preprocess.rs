//! Image preprocessing pipeline.
//!
//! Maps raw uploaded bytes to the fixed-shape input tensor the classifier
//! expects: decode, convert to 3-channel RGB, resize to 224x224 with
//! bilinear resampling, scale to [0,1], then normalize per channel with the
//! ImageNet statistics the model was trained with.

use candle_core::{DType, Device, Tensor};
use image::imageops::FilterType;

use crate::error::{DermascanError, Result};

/// Spatial resolution expected by the classifier.
pub const INPUT_SIZE: usize = 224;

/// Per-channel normalization mean (RGB).
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel normalization standard deviation (RGB).
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode image bytes into a normalized batch tensor of shape (1, 3, 224, 224).
///
/// Accepts any format the `image` crate can decode; alpha, palette and
/// grayscale inputs are converted to RGB. The returned tensor lives on the
/// CPU; callers move it to the model device.
///
/// # Errors
///
/// Returns [`DermascanError::InvalidImage`] when the bytes cannot be decoded,
/// carrying the decoder's message.
pub fn image_to_tensor(bytes: &[u8]) -> Result<Tensor> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| DermascanError::invalid_image(e.to_string()))?;

    let image = image
        .resize_exact(INPUT_SIZE as u32, INPUT_SIZE as u32, FilterType::Triangle)
        .to_rgb8();
    let data = image.into_raw();

    // (H, W, C) u8 -> (C, H, W) f32 in [0,1]
    let tensor = Tensor::from_vec(data, (INPUT_SIZE, INPUT_SIZE, 3), &Device::Cpu)
        .and_then(|t| t.permute((2, 0, 1)))
        .and_then(|t| t.to_dtype(DType::F32))
        .and_then(|t| t / 255.0)
        .map_err(|e| DermascanError::tensor(e.to_string()))?;

    let mean = Tensor::new(&IMAGENET_MEAN, &Device::Cpu)
        .and_then(|t| t.reshape((3, 1, 1)))
        .map_err(|e| DermascanError::tensor(e.to_string()))?;
    let std = Tensor::new(&IMAGENET_STD, &Device::Cpu)
        .and_then(|t| t.reshape((3, 1, 1)))
        .map_err(|e| DermascanError::tensor(e.to_string()))?;

    tensor
        .broadcast_sub(&mean)
        .and_then(|t| t.broadcast_div(&std))
        .and_then(|t| t.unsqueeze(0))
        .map_err(|e| DermascanError::tensor(e.to_string()))
}
