//! Application configuration module
//!
//! Environment-driven settings plus the fixed constants of the
//! hierarchy and recovery-key engine.

mod constants;
mod settings;

pub use constants::*;
pub use settings::Config;
