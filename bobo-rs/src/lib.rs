//! # bobo-rs
//!
//! A resource-routing layer for HTTP applications.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `bobo-rs` to get everything, or on the individual crates
//! for finer-grained control.
//!
//! ```
//! use bobo_rs::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> BoboResult<()> {
//! let app = Application::builder()
//!     .route(get(
//!         "/hello/:who",
//!         HandlerDescriptor::new("hello").required("who"),
//!         handler(|args| Ok(format!("Hello {}!", args.require_str("who")?))),
//!     ))
//!     .build()?;
//!
//! let request = HttpRequest::builder().path("/hello/world").build();
//! let response = app.respond(request).await;
//! assert_eq!(response.text(), "Hello world!");
//! # Ok(())
//! # }
//! ```

/// Settings, errors, logging, and HTML utilities.
pub use bobo_rs_core as core;

/// Requests, responses, and the routing engine.
pub use bobo_rs_http as http;

/// The application, error pages, reloading, and the axum adapter.
pub use bobo_rs_app as app;

/// The `bobo` command line runner.
#[cfg(feature = "cli")]
pub use bobo_rs_cli as cli;

/// Request factory, test clients, and a live server.
#[cfg(feature = "testing")]
pub use bobo_rs_test as test;

pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// The names most applications need.
pub mod prelude {
    pub use bobo_rs_app::{Application, ApplicationBuilder, ErrorContext, SharedApplication};
    pub use bobo_rs_core::{BoboError, BoboResult, Settings};
    pub use bobo_rs_http::routing::{
        any, async_handler, delete, get, handler, head, options, post, preroute, put, query,
        resource, subroute, BoundArgs, Captures, HandlerDescriptor, HandlerOutput, ParamSource,
        Route, RouteBuilder,
    };
    pub use bobo_rs_http::{redirect, HttpRequest, HttpResponse, JsonResponse};
    pub use http::{Method, StatusCode};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use bobo_rs_test::TestClient;

    #[tokio::test]
    async fn test_prelude_builds_an_application() {
        let app = Application::builder()
            .route(
                post(
                    "/double",
                    HandlerDescriptor::new("double").optional("n", 0),
                    handler(|args| Ok(serde_json::json!({"n": args.int("n").unwrap_or(0) * 2}))),
                )
                .content_type("application/json"),
            )
            .build()
            .unwrap();

        let client = TestClient::new(app);
        let response = client.post("/double", &[("n", "21")]).await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.text(), r#"{"n":42}"#);
    }
}
