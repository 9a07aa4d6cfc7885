//! A calculator served by bobo-rs.
//!
//! The index page keeps a running value and posts it, together with the
//! number typed in, to `/add.json` or `/sub.json`, which answer
//! `{"value": <result>}`.

use bobo_rs::core::utils::html::escape;
use bobo_rs::prelude::*;

const INDEX: &str = include_str!("index.html");

/// The page title when the settings do not set `extra.title`.
pub const DEFAULT_TITLE: &str = "Bobo Calculator";

/// Builds the calculator application.
///
/// # Errors
///
/// Returns an error if a route fails to build.
pub fn app(settings: &Settings) -> BoboResult<Application> {
    let title = settings
        .extra("title")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_TITLE);
    let page = INDEX.replace("{title}", &escape(title));

    Application::builder()
        .settings(settings.clone())
        .route(get("/", HandlerDescriptor::new("index"), handler(move |_| Ok(page.clone()))))
        .route(arithmetic("add", i64::checked_add))
        .route(arithmetic("sub", i64::checked_sub))
        .build()
}

/// A JSON route named `name` applying `op` to `value` and `input`.
///
/// Without an explicit pattern the route is served at `/<name>.json`.
fn arithmetic(name: &'static str, op: fn(i64, i64) -> Option<i64>) -> RouteBuilder {
    Route::builder(
        HandlerDescriptor::new(name)
            .optional("value", 0)
            .optional("input", 0),
        handler(move |args| {
            let value = args.int("value").unwrap_or(0);
            let input = args.int("input").unwrap_or(0);
            let result = op(value, input)
                .ok_or_else(|| BoboError::BadRequest(format!("{name} overflowed")))?;
            tracing::debug!(op = name, value, input, result, "calculated");
            Ok(serde_json::json!({ "value": result }))
        }),
    )
    .methods([Method::GET, Method::POST, Method::HEAD])
    .content_type("application/json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routes() {
        let app = app(&Settings::default()).unwrap();
        let patterns: Vec<&str> = app.routes().iter().map(|r| r.pattern().source()).collect();
        assert_eq!(patterns, vec!["/", "/add.json", "/sub.json"]);
    }
}
