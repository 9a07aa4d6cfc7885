//! The axum adapter.
//!
//! Every path and method is sent to a single catch-all handler that converts
//! the axum request into an [`HttpRequest`], lets the current application
//! answer it, and converts the result back.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bobo_rs_app::server::serve;
//! use bobo_rs_app::{Application, SharedApplication};
//! use bobo_rs_http::routing::{get, handler, HandlerDescriptor};
//!
//! # async fn example() -> Result<(), bobo_rs_core::BoboError> {
//! let app = Application::builder()
//!     .route(get("/", HandlerDescriptor::new("index"), handler(|_| Ok("Hello!"))))
//!     .build()?;
//!
//! serve(Arc::new(SharedApplication::new(app)), "127.0.0.1:8080").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use http::StatusCode;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use bobo_rs_core::{BoboError, BoboResult};
use bobo_rs_http::{HttpRequest, HttpResponse};

use crate::application::Application;
use crate::reload::SharedApplication;

#[derive(Clone)]
struct ServerState {
    shared: Arc<SharedApplication>,
    max_body_size: usize,
}

/// Converts an application into an axum router.
pub fn router(app: Application) -> Router {
    shared_router(Arc::new(SharedApplication::new(app)))
}

/// Converts a replaceable application into an axum router.
///
/// The body limit is taken from the settings of the application current at
/// this call.
pub fn shared_router(shared: Arc<SharedApplication>) -> Router {
    let max_body_size = shared.current().settings().max_body_size;
    let state = ServerState {
        shared,
        max_body_size,
    };

    Router::new()
        .route("/{*path}", any(dispatch))
        .route("/", any(dispatch))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(State(state): State<ServerState>, req: Request<Body>) -> Response {
    let (parts, body) = req.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            tracing::warn!(error = %e, "request body rejected");
            return HttpResponse::new(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
                .into_response();
        }
    };

    let request = HttpRequest::from_axum(parts, body);
    state.shared.respond(request).await.into_response()
}

/// Serves `shared` on `addr` until the server stops.
///
/// # Errors
///
/// Returns [`BoboError::ImproperlyConfigured`] when the address cannot be
/// bound, and [`BoboError::IoError`] when the server fails.
pub async fn serve(shared: Arc<SharedApplication>, addr: &str) -> BoboResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| BoboError::ImproperlyConfigured(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!(address = %addr, "serving on http://{addr}/");
    axum::serve(listener, shared_router(shared)).await?;
    Ok(())
}
