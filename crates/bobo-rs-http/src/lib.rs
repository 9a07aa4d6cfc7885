//! # bobo-rs-http
//!
//! HTTP layer for the bobo-rs framework. Provides the Request and Response
//! types, path patterns, parameter binding, and route resolution.
//!
//! ## Modules
//!
//! - [`request`] - `HttpRequest` and its builder
//! - [`querydict`] - Multi-valued query and form parameters
//! - [`response`] - `HttpResponse`, `JsonResponse`, and `redirect`
//! - [`routing`] - Patterns, handlers, binding, routes, and the resolver

pub mod querydict;
pub mod request;
pub mod response;
pub mod routing;

use std::future::Future;
use std::pin::Pin;

pub use querydict::QueryDict;
pub use request::{HttpRequest, HttpRequestBuilder};
pub use response::{redirect, HttpResponse, JsonResponse};

/// A boxed, sendable future, as returned by handlers.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
