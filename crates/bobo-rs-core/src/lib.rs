//! # bobo-rs-core
//!
//! Core types, settings, and error types for the bobo-rs framework.
//! This crate has no HTTP dependencies and provides the foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`utils`] - Utility types (`MultiValueDict`, HTML escaping)
//! - [`settings`] - Application settings
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{BoboError, BoboResult};
pub use settings::Settings;
