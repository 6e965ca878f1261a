pub mod config;
pub mod error;
pub mod patient;
pub mod task;
pub mod vitals;

pub use config::Config;
pub use error::*;
pub use patient::*;
pub use task::*;
pub use vitals::*;
