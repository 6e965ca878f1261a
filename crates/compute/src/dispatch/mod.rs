//! Placement of scored tasks on the edge or cloud tier, with a simulated
//! processing-time estimate.

pub mod jitter;
pub mod policy;
pub mod types;

pub use jitter::{FixedJitter, JitterSource, UniformJitter};
pub use policy::DispatchPolicy;
pub use types::{Infrastructure, PlacementDecision, Target, Tier};
