//! dermascan: single-endpoint HTTP service for skin-disease image classification.
//!
//! This crate loads a pretrained EfficientNet classifier once at startup,
//! accepts image uploads over HTTP, runs a fixed preprocessing pipeline
//! (decode, RGB, 224x224 bilinear resize, ImageNet normalization), performs
//! a forward pass and returns the top predicted disease label with its
//! confidence. The numeric kernels are delegated to `candle`.
//!
//! The service has exactly two operational states: if the startup load
//! succeeds it is Ready and `/predict` serves predictions; if it fails the
//! process stays alive in a Degraded state where `/predict` reports the
//! model unavailable and the liveness endpoint keeps answering.
//!
//! # Example
//!
//! ```ignore
//! use dermascan::inference::{Classifier, Device, Variant};
//! use dermascan::labels::ClassLabels;
//! use dermascan::preprocess;
//!
//! // Load the model
//! let classifier = Classifier::load(
//!     "weights.safetensors",
//!     Variant::B0,
//!     &Device::cpu(),
//!     ClassLabels::default(),
//! )?;
//!
//! // Classify an image
//! let tensor = preprocess::image_to_tensor(&std::fs::read("lesion.jpg")?)?;
//! let prediction = classifier.predict(&tensor)?;
//! println!("{} ({:.4})", prediction.label, prediction.confidence);
//! ```
//!
//! # Serving
//!
//! ```bash
//! # Serve with defaults (weights.safetensors, cpu, 127.0.0.1:8000)
//! dermascan
//!
//! # Explicit weights and device
//! dermascan --weights /data/skin.safetensors --device cuda:0 --port 9000
//!
//! # Verify a weights file without serving
//! dermascan --weights /data/skin.safetensors --check
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod labels;
pub mod preprocess;
pub mod server;

// Re-export commonly used types
pub use error::{DermascanError, Result};
pub use inference::{Classifier, Device, Prediction, Variant};
pub use labels::ClassLabels;
pub use server::{AppState, ModelState};
