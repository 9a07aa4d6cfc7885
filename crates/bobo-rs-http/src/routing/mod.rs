//! Route registration and request resolution.
//!
//! - [`pattern`]: path patterns with named captures
//! - [`handler`]: handler descriptors, bound arguments, and handler results
//! - [`binder`]: filling handler parameters from a request
//! - [`route`]: routes and the method-set helpers that build them
//! - [`resolver`]: ordered, backtracking resolution over a route table
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use bobo_rs_http::routing::handler::{handler, HandlerDescriptor};
//! use bobo_rs_http::routing::resolver::resolve;
//! use bobo_rs_http::routing::route::query;
//! use bobo_rs_http::HttpRequest;
//!
//! let routes = vec![query(
//!     "/hello/:who",
//!     HandlerDescriptor::new("hello").required("who"),
//!     handler(|args| Ok(format!("Hello {}!", args.require_str("who")?))),
//! )
//! .build()
//! .unwrap()];
//!
//! let request = Arc::new(HttpRequest::builder().path("/hello/world").build());
//! let resolved = resolve(&routes, &request).unwrap();
//! assert_eq!(resolved.args.str("who"), Some("world"));
//! ```

pub mod binder;
pub mod handler;
pub mod pattern;
pub mod resolver;
pub mod route;

pub use binder::{bind, check_and_bind, BindingOutcome, BodyParams};
pub use handler::{
    async_handler, handler, ArgValue, BoundArgs, HandlerDescriptor, HandlerOutput, ParamDefault,
    ParamSpec, ResourceFn, REQUEST_PARAM,
};
pub use pattern::{Captures, PathPattern};
pub use resolver::{find_match, resolve, MatchResult, ResolveFailure, Resolved};
pub use route::{
    any, delete, get, head, options, post, preroute, put, query, resource, subroute, CheckFn,
    ParamSource, Route, RouteBuilder, RouteTarget, SubrouteFn,
};
