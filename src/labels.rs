//! Class label set for the skin-disease classifier.
//!
//! The label order must match the output order of the trained model; the
//! classifier head is sized from this set at load time so the two cannot
//! drift apart.

use crate::error::{DermascanError, Result};

/// Disease classes the bundled model was trained on, in output order.
pub const CLASS_NAMES: [&str; 7] = [
    "Urticaria",
    "Fungal skin infection",
    "Scabies and bacterial infection",
    "Herpes zoster",
    "Psoriasis",
    "HPV and sexually transmitted disease",
    "Lupus and connective tissue disease",
];

/// An ordered, immutable set of class labels.
///
/// Index position corresponds to the model's output index.
#[derive(Debug, Clone)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    /// Create a label set from an ordered list of names.
    ///
    /// Fails on an empty list, which would produce a zero-output classifier.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(DermascanError::config("class label set must not be empty"));
        }
        Ok(Self { names })
    }

    /// Label at the given model output index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set is empty (never true for a constructed set).
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over labels in output order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self {
            names: CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
