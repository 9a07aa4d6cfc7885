//! # bobo-rs-app
//!
//! Application layer for the bobo-rs framework. Ties the route table to
//! settings and error handlers, turns handler results into responses, and
//! adapts the result to axum.
//!
//! ## Modules
//!
//! - [`application`] - `Application` and its builder
//! - [`coerce`] - Handler result to response conversion
//! - [`errors`] - Error pages and error handler overrides
//! - [`reload`] - Atomically replaceable applications and the settings watcher
//! - [`server`] - The axum router and `serve`

pub mod application;
pub mod coerce;
pub mod errors;
pub mod reload;
pub mod server;

pub use application::{Application, ApplicationBuilder, IntoRoute};
pub use errors::{ErrorContext, ErrorHandler, Failure};
pub use reload::{AppFactory, ReloadWatcher, SharedApplication};
