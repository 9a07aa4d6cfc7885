//! The `routes` command.
//!
//! Prints the route table in resolution order.

use std::fmt::Write;

use async_trait::async_trait;

use bobo_rs_app::Application;
use bobo_rs_core::BoboResult;

use crate::command::{CommandContext, ManagementCommand};

/// Lists the application's routes.
pub struct RoutesCommand;

/// Formats one line per route: methods, pattern, handler, content type.
///
/// Subroutes show `subroute` in place of a content type, since their routes
/// are only built per request.
pub fn format_routes(app: &Application) -> String {
    let default_content_type = &app.settings().default_content_type;
    let mut out = String::new();
    for route in app.routes() {
        let methods = if route.methods().is_empty() {
            "*".to_string()
        } else {
            route
                .methods()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        let content_type = if route.is_subroute() {
            "subroute"
        } else {
            route.content_type().unwrap_or(default_content_type)
        };
        let _ = writeln!(
            out,
            "{methods:<20} {:<32} {:<20} {content_type}",
            route.pattern().to_string(),
            route.name()
        );
    }
    out
}

#[async_trait]
impl ManagementCommand for RoutesCommand {
    fn name(&self) -> &'static str {
        "routes"
    }

    fn help(&self) -> &'static str {
        "Lists the routes in resolution order"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, context: &CommandContext) -> BoboResult<()> {
        let app = context.build_application()?;
        print!("{}", format_routes(&app));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bobo_rs_http::routing::{any, get, handler, subroute, HandlerDescriptor, Route};

    #[test]
    fn test_format_routes() {
        let app = Application::builder()
            .route(get("/hello", HandlerDescriptor::new("hello"), handler(|_| Ok("hi"))))
            .route(
                Route::builder(HandlerDescriptor::new("add"), handler(|_| Ok("1")))
                    .content_type("application/json"),
            )
            .route(any("/misc", HandlerDescriptor::new("misc"), handler(|_| Ok("x"))))
            .route(subroute("/users/:id", "users", |_, _| None::<Vec<Route>>))
            .build()
            .unwrap();

        let listing = format_routes(&app);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("GET"));
        assert!(lines[0].contains("/hello"));
        assert!(lines[0].ends_with("text/html; charset=UTF-8"));
        assert!(lines[1].contains("/add.json"));
        assert!(lines[1].ends_with("application/json"));
        assert!(lines[2].starts_with('*'));
        assert!(lines[3].contains("/users/:id"));
        assert!(lines[3].ends_with("subroute"));
    }
}
