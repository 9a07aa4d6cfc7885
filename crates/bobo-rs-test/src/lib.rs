//! # bobo-rs-test
//!
//! Testing utilities for bobo-rs applications.
//!
//! ## Modules
//!
//! - [`request_factory`] - Builds [`HttpRequest`](bobo_rs_http::HttpRequest)s for direct handler tests
//! - [`client`] - Clients that drive an application in process, with or without the axum adapter
//! - [`live_server`] - A real server on a random local port

pub mod client;
pub mod live_server;
pub mod request_factory;

pub use client::{RouterClient, TestClient, TestResponse};
pub use live_server::LiveServer;
pub use request_factory::{encode_form_data, RequestFactory};
