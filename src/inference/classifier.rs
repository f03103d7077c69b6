//! Classifier construction, weight loading and prediction.
//!
//! The network itself comes from `candle-transformers`; this module binds a
//! chosen EfficientNet variant to a label set, loads safetensors weights
//! into it, and wraps the forward pass with softmax/argmax postprocessing.

use candle_core::{DType, Device as CandleDevice, Module, Tensor, D};
use candle_nn::ops::softmax;
use candle_nn::VarBuilder;
use candle_transformers::models::efficientnet::{EfficientNet, MBConvConfig};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{DermascanError, Result};
use crate::labels::ClassLabels;

/// Device specification for model inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
    /// CPU device.
    Cpu,
    /// CUDA device with index.
    Cuda(usize),
}

impl Device {
    /// Create a CPU device.
    pub fn cpu() -> Self {
        Self::Cpu
    }

    /// Create a CUDA device with the given index.
    pub fn cuda(index: usize) -> Self {
        Self::Cuda(index)
    }

    /// Open the corresponding candle device.
    ///
    /// Fails for CUDA devices when the toolkit is absent or the index is out
    /// of range.
    pub fn to_candle(&self) -> Result<CandleDevice> {
        match self {
            Self::Cpu => Ok(CandleDevice::Cpu),
            Self::Cuda(index) => CandleDevice::new_cuda(*index).map_err(|e| {
                DermascanError::config(format!("cannot open cuda:{}: {}", index, e))
            }),
        }
    }
}

impl FromStr for Device {
    type Err = DermascanError;

    /// Parse a device string like "cpu", "cuda", "cuda:0", "cuda:1".
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        if s == "cpu" {
            Ok(Self::Cpu)
        } else if s == "cuda" {
            Ok(Self::Cuda(0))
        } else if let Some(idx) = s.strip_prefix("cuda:") {
            let index: usize = idx
                .parse()
                .map_err(|_| DermascanError::config(format!("Invalid CUDA index: {}", idx)))?;
            Ok(Self::Cuda(index))
        } else {
            Err(DermascanError::config(format!("Invalid device: {}", s)))
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(idx) => write!(f, "cuda:{}", idx),
        }
    }
}

/// EfficientNet architecture variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    B0,
    B1,
    B2,
    B3,
    B4,
    B5,
    B6,
    B7,
}

impl Variant {
    /// Block configuration for this variant.
    fn block_configs(&self) -> Vec<MBConvConfig> {
        match self {
            Self::B0 => MBConvConfig::b0(),
            Self::B1 => MBConvConfig::b1(),
            Self::B2 => MBConvConfig::b2(),
            Self::B3 => MBConvConfig::b3(),
            Self::B4 => MBConvConfig::b4(),
            Self::B5 => MBConvConfig::b5(),
            Self::B6 => MBConvConfig::b6(),
            Self::B7 => MBConvConfig::b7(),
        }
    }
}

impl FromStr for Variant {
    type Err = DermascanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "b0" => Ok(Self::B0),
            "b1" => Ok(Self::B1),
            "b2" => Ok(Self::B2),
            "b3" => Ok(Self::B3),
            "b4" => Ok(Self::B4),
            "b5" => Ok(Self::B5),
            "b6" => Ok(Self::B6),
            "b7" => Ok(Self::B7),
            other => Err(DermascanError::config(format!(
                "Invalid EfficientNet variant: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::B0 => "b0",
            Self::B1 => "b1",
            Self::B2 => "b2",
            Self::B3 => "b3",
            Self::B4 => "b4",
            Self::B5 => "b5",
            Self::B6 => "b6",
            Self::B7 => "b7",
        };
        write!(f, "{}", name)
    }
}

/// A single prediction result.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Argmax position in the model output.
    pub index: usize,
    /// Human-readable class label at that position.
    pub label: String,
    /// Probability mass assigned to the predicted class, in [0,1].
    pub confidence: f32,
}

/// A pretrained image classifier bound to a label set and a device.
///
/// Parameters are never mutated after load, so the classifier is safe to
/// share across concurrent requests without locking.
pub struct Classifier {
    model: EfficientNet,
    device: CandleDevice,
    labels: ClassLabels,
}

impl Classifier {
    /// Load a classifier from a safetensors weights file.
    ///
    /// The classifier head is sized from `labels`, so weights trained with a
    /// different output dimensionality fail here with a shape mismatch
    /// rather than silently mislabeling.
    ///
    /// # Errors
    ///
    /// Returns [`DermascanError::FileNotFound`] when the weights file is
    /// missing and [`DermascanError::ModelLoad`] on deserialization or
    /// key/shape mismatches.
    pub fn load(
        path: impl AsRef<Path>,
        variant: Variant,
        device: &Device,
        labels: ClassLabels,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DermascanError::FileNotFound(path.to_path_buf()));
        }

        let device = device.to_candle()?;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, &device) }
            .map_err(|e| DermascanError::model_load(e.to_string()))?;

        Self::from_var_builder(vb, variant, device, labels)
    }

    /// Build a classifier from an arbitrary weight source.
    ///
    /// Used by [`Classifier::load`] and by callers that supply weights
    /// through other `VarBuilder` backends (e.g. synthetic weights).
    pub fn from_var_builder(
        vb: VarBuilder,
        variant: Variant,
        device: CandleDevice,
        labels: ClassLabels,
    ) -> Result<Self> {
        let model = EfficientNet::new(vb, variant.block_configs(), labels.len())
            .map_err(|e| DermascanError::model_load(e.to_string()))?;
        Ok(Self {
            model,
            device,
            labels,
        })
    }

    /// The device this classifier runs on.
    pub fn device(&self) -> &CandleDevice {
        &self.device
    }

    /// The label set this classifier maps outputs onto.
    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    /// Run a forward pass on a preprocessed batch tensor of shape
    /// (1, 3, 224, 224) and return the top class with its confidence.
    pub fn predict(&self, input: &Tensor) -> Result<Prediction> {
        let input = input
            .to_device(&self.device)
            .map_err(|e| DermascanError::tensor(e.to_string()))?;

        let logits = self
            .model
            .forward(&input)
            .map_err(|e| DermascanError::inference(e.to_string()))?;
        let probabilities =
            softmax(&logits, D::Minus1).map_err(|e| DermascanError::inference(e.to_string()))?;

        let (index, confidence) = top_prediction(&probabilities)?;
        let label = self
            .labels
            .get(index)
            .ok_or_else(|| {
                DermascanError::tensor(format!("output index {} outside label set", index))
            })?
            .to_string();

        Ok(Prediction {
            index,
            label,
            confidence,
        })
    }
}

/// Argmax over a (1, N) probability tensor.
///
/// When several classes share the maximum, the first index in label order
/// wins.
fn top_prediction(probabilities: &Tensor) -> Result<(usize, f32)> {
    let probabilities: Vec<f32> = probabilities
        .squeeze(0)
        .and_then(|t| t.to_vec1())
        .map_err(|e| DermascanError::tensor(e.to_string()))?;

    if probabilities.is_empty() {
        return Err(DermascanError::tensor("empty probability vector"));
    }

    let mut best_index = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (index, &value) in probabilities.iter().enumerate() {
        if value > best_value {
            best_index = index;
            best_value = value;
        }
    }
    Ok((best_index, best_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_device_from_str() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda(0));
        assert_eq!("cuda:1".parse::<Device>().unwrap(), Device::Cuda(1));
        assert_eq!(" CUDA:2 ".parse::<Device>().unwrap(), Device::Cuda(2));
        assert!("tpu".parse::<Device>().is_err());
        assert!("cuda:x".parse::<Device>().is_err());
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("b0".parse::<Variant>().unwrap(), Variant::B0);
        assert_eq!("B3".parse::<Variant>().unwrap(), Variant::B3);
        assert!("v2_s".parse::<Variant>().is_err());
    }

    #[test]
    fn test_top_prediction_argmax() {
        let probs = Tensor::new(&[[0.1f32, 0.6, 0.2, 0.1]], &CandleDevice::Cpu).unwrap();
        let (index, confidence) = top_prediction(&probs).unwrap();
        assert_eq!(index, 1);
        assert_abs_diff_eq!(confidence, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_top_prediction_tie_breaks_to_first_index() {
        let probs = Tensor::new(&[[0.25f32, 0.25, 0.25, 0.25]], &CandleDevice::Cpu).unwrap();
        let (index, _) = top_prediction(&probs).unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn test_load_missing_weights_file() {
        let result = Classifier::load(
            "/no/such/weights.safetensors",
            Variant::B0,
            &Device::cpu(),
            crate::labels::ClassLabels::default(),
        );
        match result {
            Err(DermascanError::FileNotFound(_)) => {}
            Err(other) => panic!("expected FileNotFound, got {}", other),
            Ok(_) => panic!("load should fail for a missing weights file"),
        }
    }
}
