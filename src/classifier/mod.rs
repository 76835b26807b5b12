//! State classification
//!
//! The stream processor depends only on [`Classifier`]; the concrete model
//! is chosen at start-up. [`LogisticModel`] reads the linear model exported
//! by the training notebook.

mod logistic;

pub use logistic::LogisticModel;

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ClassLabel, FeatureVector};

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to read model {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Malformed model file: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Model schema mismatch: {0}")]
    Schema(String),

    #[error("Predicted label {0} has no entry in the state table")]
    UnknownLabel(ClassLabel),

    #[error("Feature vector or decision score is non-finite")]
    NonFinite,
}

/// Maps one feature vector to a state label.
///
/// Implementations are pure; an error aborts the analysis session.
pub trait Classifier: Send {
    fn classify(&self, features: &FeatureVector) -> Result<ClassLabel, ClassifierError>;

    /// Short description for logs.
    fn describe(&self) -> String {
        "classifier".to_string()
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&self, features: &FeatureVector) -> Result<ClassLabel, ClassifierError> {
        (**self).classify(features)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
