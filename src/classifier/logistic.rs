//! Multinomial / binary logistic regression loaded from JSON
//!
//! File layout:
//!
//! ```json
//! {
//!   "feature_names": ["max_x", "std_x", "rms_x", "max_y", "std_y", "rms_y", "max_z", "std_z", "rms_z"],
//!   "classes": [0, 1, 2, 3],
//!   "coefficients": [[...9 values...], ...],
//!   "intercepts": [...]
//! }
//! ```
//!
//! Multiclass models carry one coefficient row per class; binary models
//! carry a single row whose positive score selects `classes[1]`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Classifier, ClassifierError};
use crate::types::{ClassLabel, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    feature_names: Vec<String>,
    classes: Vec<ClassLabel>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl LogisticModel {
    /// Build and validate a model from its parts.
    pub fn new(
        classes: Vec<ClassLabel>,
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    ) -> Result<Self, ClassifierError> {
        let model = Self {
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            classes,
            coefficients,
            intercepts,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ClassifierError::Io(path.to_path_buf(), e))?;
        let model = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            classes = model.classes.len(),
            "Loaded logistic model"
        );
        Ok(model)
    }

    pub fn from_json(raw: &str) -> Result<Self, ClassifierError> {
        let model: Self = serde_json::from_str(raw)?;
        model.validate()?;
        Ok(model)
    }

    pub fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coefficients.len() == 1
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        if self.feature_names.len() != FEATURE_COUNT
            || self.feature_names.iter().zip(FEATURE_NAMES).any(|(a, b)| a != b)
        {
            return Err(ClassifierError::Schema(format!(
                "feature_names must be {FEATURE_NAMES:?}, got {:?}",
                self.feature_names
            )));
        }
        if self.classes.len() < 2 {
            return Err(ClassifierError::Schema(format!(
                "need at least 2 classes, got {}",
                self.classes.len()
            )));
        }

        let rows = if self.is_binary() { 1 } else { self.classes.len() };
        if self.coefficients.len() != rows || self.intercepts.len() != rows {
            return Err(ClassifierError::Schema(format!(
                "{} classes need {rows} coefficient rows and intercepts, got {} and {}",
                self.classes.len(),
                self.coefficients.len(),
                self.intercepts.len()
            )));
        }
        if let Some(row) = self.coefficients.iter().find(|r| r.len() != FEATURE_COUNT) {
            return Err(ClassifierError::Schema(format!(
                "coefficient row has {} values, expected {FEATURE_COUNT}",
                row.len()
            )));
        }
        let all_finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(&self.intercepts)
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ClassifierError::Schema("non-finite parameter".to_string()));
        }
        Ok(())
    }

    fn score(row: &[f64], intercept: f64, x: &[f64; FEATURE_COUNT]) -> f64 {
        row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + intercept
    }
}

impl Classifier for LogisticModel {
    fn classify(&self, features: &FeatureVector) -> Result<ClassLabel, ClassifierError> {
        if !features.is_finite() {
            return Err(ClassifierError::NonFinite);
        }
        let x = features.to_array();

        if self.is_binary() {
            let score = Self::score(&self.coefficients[0], self.intercepts[0], &x);
            if !score.is_finite() {
                return Err(ClassifierError::NonFinite);
            }
            return Ok(if score > 0.0 { self.classes[1] } else { self.classes[0] });
        }

        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (i, (row, b)) in self.coefficients.iter().zip(&self.intercepts).enumerate() {
            let score = Self::score(row, *b, &x);
            if !score.is_finite() {
                return Err(ClassifierError::NonFinite);
            }
            // strict comparison keeps the first index on ties
            if score > best_score {
                best = i;
                best_score = score;
            }
        }
        Ok(self.classes[best])
    }

    fn describe(&self) -> String {
        let kind = if self.is_binary() { "binary" } else { "multiclass" };
        format!("logistic ({kind}, {} classes)", self.classes.len())
    }
}
