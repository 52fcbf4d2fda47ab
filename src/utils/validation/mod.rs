//! Consolidated validation utilities
//!
//! Parameter checks shared by the configuration builder, the component
//! entry points and the CLI.

pub mod config;
pub mod numeric;

pub use config::ConfigValidator;
pub use numeric::NumericValidator;
