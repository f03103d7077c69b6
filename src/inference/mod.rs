//! Model inference module.
//!
//! Construction of the classifier architecture, weight loading from
//! safetensors, and the forward-pass/postprocessing path.

mod classifier;

pub use classifier::{Classifier, Device, Prediction, Variant};
