//! The application: a route table, settings, and error handlers.
//!
//! Each request moves through `resolve -> bind & invoke -> coerce -> respond`
//! exactly once. Anything that fails along the way is answered with an error
//! page, except handler errors when `handle_exceptions` is off: those are
//! returned to the caller unchanged.
//!
//! # Examples
//!
//! ```
//! use bobo_rs_app::Application;
//! use bobo_rs_http::routing::{get, handler, HandlerDescriptor};
//! use bobo_rs_http::HttpRequest;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let app = Application::builder()
//!     .route(get(
//!         "/hello",
//!         HandlerDescriptor::new("hello").optional("who", "world"),
//!         handler(|args| Ok(format!("Hello, {}!", args.str("who").unwrap_or_default()))),
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let request = HttpRequest::builder().path("/hello?who=bob").build();
//! let response = app.handle(request).await.unwrap();
//! assert_eq!(response.text(), "Hello, bob!");
//! # }
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use http::{Method, StatusCode};
use tracing::{debug, error, Instrument};

use bobo_rs_core::logging::request_span;
use bobo_rs_core::{BoboError, BoboResult, Settings};
use bobo_rs_http::routing::{preroute, resolve, Resolved, Route, RouteBuilder};
use bobo_rs_http::{HttpRequest, HttpResponse};

use crate::coerce::coerce;
use crate::errors::{default_error_response, ErrorContext, ErrorHandler, Failure};

/// Anything that can be registered as a route.
pub trait IntoRoute {
    /// Finishes the route.
    fn into_route(self) -> BoboResult<Route>;
}

impl IntoRoute for Route {
    fn into_route(self) -> BoboResult<Route> {
        Ok(self)
    }
}

impl IntoRoute for RouteBuilder {
    fn into_route(self) -> BoboResult<Route> {
        self.build()
    }
}

impl IntoRoute for BoboResult<Route> {
    fn into_route(self) -> BoboResult<Route> {
        self
    }
}

/// An immutable, ready-to-serve route table.
///
/// `Application` is `Send + Sync`; requests may be handled concurrently
/// through a shared reference.
pub struct Application {
    routes: Vec<Route>,
    settings: Settings,
    error_handlers: HashMap<u16, ErrorHandler>,
}

impl Application {
    /// Starts building an application with default settings.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    /// The routes, in resolution order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The settings the application was built with.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handles one request.
    ///
    /// # Errors
    ///
    /// Only handler errors are returned, and only when
    /// `settings.handle_exceptions` is off. Every other failure is answered
    /// with an error page.
    pub async fn handle(&self, request: HttpRequest) -> BoboResult<HttpResponse> {
        let span = request_span(request.method().as_str(), request.path());
        self.dispatch(Arc::new(request)).instrument(span).await
    }

    /// Handles one request, turning an escaped handler error into a bare 500.
    pub async fn respond(&self, request: HttpRequest) -> HttpResponse {
        let url = request.url();
        match self.handle(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(url = %url, error = %e, "unhandled error");
                HttpResponse::server_error("Internal Server Error")
            }
        }
    }

    async fn dispatch(&self, request: Arc<HttpRequest>) -> BoboResult<HttpResponse> {
        let response = match resolve(&self.routes, &request) {
            Ok(resolved) => self.invoke(resolved, &request).await?,
            Err(failure) => {
                let status = failure.status_code(self.settings.strict_status_codes);
                debug!(%failure, status = status.as_u16(), "no route accepted the request");
                self.error_response(&ErrorContext {
                    request: &request,
                    status,
                    failure: Failure::Resolve(&failure),
                })
            }
        };
        Ok(finish(response, request.method()))
    }

    async fn invoke(
        &self,
        resolved: Resolved<'_>,
        request: &Arc<HttpRequest>,
    ) -> BoboResult<HttpResponse> {
        let route = &resolved.route;
        debug!(route = route.name(), pattern = %route.pattern(), "route resolved");

        if let Some(response) = route.check(request) {
            debug!(route = route.name(), "check hook answered the request");
            return Ok(response);
        }

        let content_type = route
            .content_type()
            .unwrap_or(&self.settings.default_content_type);
        let handler = resolved.handler;
        let args = resolved.args;
        let result = AssertUnwindSafe(async move { handler(args).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(BoboError::handler(format!(
                    "handler panicked: {}",
                    panic_message(panic.as_ref())
                )))
            })
            .and_then(|output| coerce(output, request.method(), content_type));

        match result {
            Ok(response) => Ok(response),
            Err(e) => self.handler_failure(e, request),
        }
    }

    /// Answers a failed handler. Framework errors raised from a handler, such
    /// as `NotFound`, always get their own status; genuine handler failures
    /// become a 500 or, with `handle_exceptions` off, go back to the caller.
    fn handler_failure(&self, err: BoboError, request: &HttpRequest) -> BoboResult<HttpResponse> {
        let status = if !err.is_handler_failure() {
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        } else if self.settings.handle_exceptions {
            error!(url = %request.url(), error = %err, "handler raised an error");
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            return Err(err);
        };
        Ok(self.error_response(&ErrorContext {
            request,
            status,
            failure: Failure::Handler(&err),
        }))
    }

    fn error_response(&self, context: &ErrorContext<'_>) -> HttpResponse {
        self.error_handlers
            .get(&context.status.as_u16())
            .map_or_else(|| default_error_response(context), |handler| handler(context))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// HEAD responses keep their status and headers but lose the body.
fn finish(mut response: HttpResponse, method: &Method) -> HttpResponse {
    if *method == Method::HEAD {
        response.clear_body();
    }
    response
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut statuses: Vec<_> = self.error_handlers.keys().copied().collect();
        statuses.sort_unstable();
        f.debug_struct("Application")
            .field("routes", &self.routes)
            .field("error_handlers", &statuses)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builds an [`Application`].
///
/// Registration errors are remembered and the first one is reported by
/// [`build`](Self::build), so routes can be chained without `?` at every
/// step.
#[derive(Default)]
#[must_use]
pub struct ApplicationBuilder {
    settings: Settings,
    routes: Vec<Route>,
    error_handlers: HashMap<u16, ErrorHandler>,
    error: Option<BoboError>,
}

impl ApplicationBuilder {
    /// Replaces the settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Appends a route. Routes are tried in registration order.
    pub fn route(mut self, route: impl IntoRoute) -> Self {
        match route.into_route() {
            Ok(route) => self.routes.push(route),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Appends several routes.
    pub fn routes<R: IntoRoute>(self, routes: impl IntoIterator<Item = R>) -> Self {
        routes.into_iter().fold(self, Self::route)
    }

    /// Appends routes with `prefix` prepended to each pattern.
    pub fn mount<R: IntoRoute>(mut self, prefix: &str, routes: impl IntoIterator<Item = R>) -> Self {
        let built: BoboResult<Vec<Route>> = routes.into_iter().map(IntoRoute::into_route).collect();
        match built.and_then(|routes| preroute(prefix, routes)) {
            Ok(routes) => self.routes.extend(routes),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Registers the page renderer used for every response with `status`.
    pub fn error_handler<F>(mut self, status: StatusCode, handler: F) -> Self
    where
        F: Fn(&ErrorContext<'_>) -> HttpResponse + Send + Sync + 'static,
    {
        self.error_handlers.insert(status.as_u16(), Arc::new(handler));
        self
    }

    /// Finishes the application.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while registering routes.
    pub fn build(self) -> BoboResult<Application> {
        if let Some(e) = self.error {
            return Err(e);
        }
        debug!(routes = self.routes.len(), "application built");
        Ok(Application {
            routes: self.routes,
            settings: self.settings,
            error_handlers: self.error_handlers,
        })
    }

    fn fail(&mut self, error: BoboError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

impl fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("routes", &self.routes.len())
            .field("error_handlers", &self.error_handlers.len())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
