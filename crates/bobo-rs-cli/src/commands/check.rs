//! The `check` command.
//!
//! Builds the application from the current settings and reports problems
//! without serving anything.

use async_trait::async_trait;

use bobo_rs_app::Application;
use bobo_rs_core::{BoboError, BoboResult};

use crate::command::{CommandContext, ManagementCommand};

/// Validates that the application can be built.
pub struct CheckCommand;

/// Something `check` found worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckMessage {
    /// A human-readable description of the issue.
    pub msg: String,
    /// A stable identifier, e.g. `routes.W001`.
    pub id: String,
}

/// Inspects a built application.
///
/// Reports routes that can never be reached because an earlier route with
/// the same pattern, an identical method set, and no parameters always binds
/// first.
pub fn run_checks(app: &Application) -> Vec<CheckMessage> {
    let mut messages = Vec::new();
    let routes = app.routes();
    for (index, route) in routes.iter().enumerate() {
        if route.is_subroute() {
            continue;
        }
        let shadowed_by = routes[..index].iter().find(|earlier| {
            !earlier.is_subroute()
                && earlier.pattern().source() == route.pattern().source()
                && earlier.methods() == route.methods()
                && earlier.consumes() == route.consumes()
                && earlier.descriptor().params().is_empty()
                && earlier.pattern().capture_names().next().is_none()
        });
        if let Some(earlier) = shadowed_by {
            messages.push(CheckMessage {
                msg: format!(
                    "route '{}' for {} is unreachable behind '{}'",
                    route.name(),
                    route.pattern(),
                    earlier.name()
                ),
                id: "routes.W001".to_string(),
            });
        }
    }
    messages
}

#[async_trait]
impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Checks that the application builds"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, context: &CommandContext) -> BoboResult<()> {
        let app = context
            .build_application()
            .map_err(|e| BoboError::ImproperlyConfigured(format!("Application failed to build: {e}")))?;

        let messages = run_checks(&app);
        for message in &messages {
            println!("WARNING {}: {}", message.id, message.msg);
        }
        println!(
            "System check identified {} issue(s) across {} route(s).",
            messages.len(),
            app.routes().len()
        );
        Ok(())
    }
}
