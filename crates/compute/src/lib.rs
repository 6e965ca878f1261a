pub mod dispatch;
pub mod intake;
pub mod report;
pub mod scoring;
pub mod source;

pub use dispatch::{
    DispatchPolicy, FixedJitter, Infrastructure, JitterSource, PlacementDecision, Target, Tier,
    UniformJitter,
};
pub use intake::{IntakeSummary, TaskIntakeLoop, UnavailablePolicy};
pub use report::{ReportingSink, SimulationReport};
pub use scoring::{
    LearnedScorer, LinearModel, ModelError, ModelProvider, PriorityEngine, RegressionModel,
    RuleBasedScorer,
};
