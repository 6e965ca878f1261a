//! Learned-model scoring for `specific` patients.
//!
//! The models themselves are trained elsewhere; this module only builds the
//! feature vector, calls two independent regressors and enforces the
//! urgency bound on their output.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vitalroute_core::{HealthTask, Patient, PriorityScore, VitalError};

use super::urgency::MAX_URGENCY;

/// Feature vector dimensionality.
pub const FEATURE_DIM: usize = 7;

/// `[heart_rate, blood_pressure, glucose_level, age, height, weight, sex]`,
/// sex encoded as 1.0 for male and 0.0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_DIM]);

impl FeatureVector {
    pub fn from_task(task: &HealthTask, patient: &Patient) -> Self {
        Self([
            f64::from(task.heart_rate),
            f64::from(task.blood_pressure),
            task.glucose_level,
            f64::from(patient.age),
            patient.height,
            patient.weight,
            patient.sex.indicator(),
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model not trained")]
    NotTrained,
    #[error("model produced a non-finite prediction: {0}")]
    NonFinite(f64),
    #[error("expected {expected} coefficients, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("prediction failed: {0}")]
    Failed(String),
}

/// A trained scalar regressor.
///
/// Implementations must be safe for concurrent read-only inference.
pub trait RegressionModel: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

/// The two regressors behind the learned scorer.
#[derive(Clone)]
pub struct ModelProvider {
    urgency: Arc<dyn RegressionModel>,
    weight: Arc<dyn RegressionModel>,
}

impl ModelProvider {
    pub fn new(urgency: Arc<dyn RegressionModel>, weight: Arc<dyn RegressionModel>) -> Self {
        Self { urgency, weight }
    }

    /// Load a pair of linear models from a JSON artifact:
    /// `{"urgency": {...}, "weight": {...}}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, VitalError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let artifact: ModelArtifact = serde_json::from_str(&content)?;
        artifact.urgency.check_dim()?;
        artifact.weight.check_dim()?;
        debug!(path = %path.display(), "loaded model artifact");
        Ok(Self::new(Arc::new(artifact.urgency), Arc::new(artifact.weight)))
    }

    fn predict(
        model: &dyn RegressionModel,
        features: &FeatureVector,
    ) -> Result<f64, ModelError> {
        let value = model.predict(features)?;
        if !value.is_finite() {
            return Err(ModelError::NonFinite(value));
        }
        Ok(value)
    }
}

impl std::fmt::Debug for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelProvider")
            .field("urgency", &self.urgency.name())
            .field("weight", &self.weight.name())
            .finish()
    }
}

/// Scorer for `specific` patients. Without a provider every call fails
/// with `ScorerUnavailable`.
#[derive(Debug, Clone, Default)]
pub struct LearnedScorer {
    provider: Option<ModelProvider>,
}

impl LearnedScorer {
    pub fn new(provider: ModelProvider) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn untrained() -> Self {
        Self { provider: None }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Urgency is clamped to `[0, 2]`; the weight passes through unclamped.
    pub fn score(&self, task: &HealthTask, patient: &Patient) -> Result<PriorityScore, VitalError> {
        let provider = self.provider.as_ref().ok_or_else(|| unavailable(ModelError::NotTrained))?;
        let features = FeatureVector::from_task(task, patient);

        let urgency = ModelProvider::predict(provider.urgency.as_ref(), &features)
            .map_err(unavailable)?;
        let weight = ModelProvider::predict(provider.weight.as_ref(), &features)
            .map_err(unavailable)?;

        Ok(PriorityScore {
            urgency: urgency.clamp(0.0, MAX_URGENCY),
            weight,
        })
    }
}

fn unavailable(e: ModelError) -> VitalError {
    VitalError::ScorerUnavailable(e.to_string())
}

// ── Linear model artifacts ──────────────────────────────────────────

/// `intercept + sum(coefficients[i] * features[i])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default = "default_model_name")]
    pub name: String,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

fn default_model_name() -> String {
    "linear".to_string()
}

impl LinearModel {
    pub fn new(name: impl Into<String>, coefficients: [f64; FEATURE_DIM], intercept: f64) -> Self {
        Self {
            name: name.into(),
            coefficients: coefficients.to_vec(),
            intercept,
        }
    }

    fn check_dim(&self) -> Result<(), VitalError> {
        if self.coefficients.len() != FEATURE_DIM {
            return Err(VitalError::Parse(
                ModelError::DimensionMismatch {
                    expected: FEATURE_DIM,
                    actual: self.coefficients.len(),
                }
                .to_string(),
            ));
        }
        Ok(())
    }
}

impl RegressionModel for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        if self.coefficients.len() != FEATURE_DIM {
            return Err(ModelError::DimensionMismatch {
                expected: FEATURE_DIM,
                actual: self.coefficients.len(),
            });
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.as_slice())
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    urgency: LinearModel,
    weight: LinearModel,
}
