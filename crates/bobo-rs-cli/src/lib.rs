//! # bobo-rs-cli
//!
//! Command-line entry point for bobo-rs applications.
//!
//! An application binary hands [`run`] a factory that builds its
//! [`Application`](bobo_rs_app::Application) from settings; the CLI takes
//! care of loading settings, installing logging, and dispatching to one of
//! the built-in commands:
//!
//! - `serve [--config FILE] [--host HOST] [--port PORT] [--reload]`
//! - `routes [--config FILE]`
//! - `check [--config FILE]`
//!
//! ## Quick Start
//!
//! ```rust
//! use bobo_rs_cli::command::CommandRegistry;
//! use bobo_rs_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! assert_eq!(registry.list_commands(), vec!["check", "routes", "serve"]);
//! ```

pub mod command;
pub mod commands;

use std::ffi::OsString;

use bobo_rs_app::AppFactory;
use bobo_rs_core::{BoboError, BoboResult};

pub use command::{CommandContext, CommandRegistry, ManagementCommand};
pub use commands::{CheckCommand, RoutesCommand, ServeCommand};

/// Returns a registry holding the built-in commands.
pub fn builtin_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    commands::register_builtin_commands(&mut registry);
    registry
}

/// Parses the process arguments and runs the chosen command.
///
/// Help and usage errors are printed by clap, which then exits the process.
///
/// # Errors
///
/// Returns the command's error.
pub async fn run(factory: AppFactory) -> BoboResult<()> {
    let registry = builtin_registry();
    let matches = registry.build_cli().get_matches();
    registry.execute(&matches, factory).await
}

/// Like [`run`], with explicit arguments (the first one is the binary name).
///
/// # Errors
///
/// Returns [`BoboError::ConfigurationError`] for invalid arguments, and the
/// command's error otherwise.
pub async fn run_from<I, T>(args: I, factory: AppFactory) -> BoboResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let registry = builtin_registry();
    let matches = registry
        .build_cli()
        .try_get_matches_from(args)
        .map_err(|e| BoboError::ConfigurationError(e.to_string()))?;
    registry.execute(&matches, factory).await
}
