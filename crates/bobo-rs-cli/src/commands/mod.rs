//! Built-in commands.
//!
//! Each command implements the
//! [`ManagementCommand`](crate::command::ManagementCommand) trait.

pub mod check;
pub mod routes;
pub mod serve;

pub use check::CheckCommand;
pub use routes::RoutesCommand;
pub use serve::ServeCommand;

use crate::command::CommandRegistry;

/// Registers all built-in commands into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(ServeCommand));
    registry.register(Box::new(RoutesCommand));
    registry.register(Box::new(CheckCommand));
}
