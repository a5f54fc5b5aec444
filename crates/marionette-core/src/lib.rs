// marionette-core: Configuration and error types for the Marionette IK rig.

pub mod config;
pub mod error;

pub use config::{RigConfig, SolverSettings};
pub use error::{ConfigError, GraphError, MarionetteError};
