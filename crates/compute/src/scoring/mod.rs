//! Urgency scoring: the per-parameter formula, the rule-based and learned
//! scorers, and the engine that picks between them by patient category.

pub mod engine;
pub mod learned;
pub mod rule_based;
pub mod urgency;

pub use engine::PriorityEngine;
pub use learned::{
    FeatureVector, LearnedScorer, LinearModel, ModelError, ModelProvider, RegressionModel,
    FEATURE_DIM,
};
pub use rule_based::RuleBasedScorer;
pub use urgency::{range_urgency, urgency, MAX_URGENCY};
