//! Test clients.
//!
//! [`TestClient`] hands requests straight to an [`Application`], so tests see
//! exactly what the application returns, including handler errors when
//! exception handling is off. [`RouterClient`] goes through the axum adapter
//! instead, covering request conversion and the body limit as well.
//!
//! ## Usage
//!
//! ```rust
//! use bobo_rs_app::Application;
//! use bobo_rs_http::routing::{get, handler, HandlerDescriptor};
//! use bobo_rs_test::client::TestClient;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let app = Application::builder()
//!     .route(get("/hello", HandlerDescriptor::new("hello"), handler(|_| Ok("Hello, World!"))))
//!     .build()
//!     .unwrap();
//! let client = TestClient::new(app);
//!
//! let response = client.get("/hello").await;
//! assert_eq!(response.status_code(), 200);
//! assert_eq!(response.text(), "Hello, World!");
//! # }
//! ```

use std::sync::Arc;

use axum::Router;
use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use bobo_rs_app::server;
use bobo_rs_app::Application;
use bobo_rs_core::{BoboError, BoboResult};
use bobo_rs_http::{HttpRequest, HttpResponse};

use crate::request_factory::{encode_form_data, RequestFactory};

/// A client that drives an [`Application`] directly.
#[derive(Debug, Clone)]
pub struct TestClient {
    app: Arc<Application>,
    factory: RequestFactory,
}

impl TestClient {
    /// Creates a client for `app`.
    pub fn new(app: Application) -> Self {
        Self::from_shared(Arc::new(app))
    }

    /// Creates a client for an application that is shared with other code.
    pub fn from_shared(app: Arc<Application>) -> Self {
        Self {
            app,
            factory: RequestFactory::new(),
        }
    }

    /// Adds a header to every request.
    #[must_use]
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.factory = self.factory.with_default_header(name, value);
        self
    }

    /// Returns the request factory used by this client.
    pub const fn factory(&self) -> &RequestFactory {
        &self.factory
    }

    /// Sends a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(self.factory.get(path)).await
    }

    /// Sends a POST request with form data.
    pub async fn post(&self, path: &str, data: &[(&str, &str)]) -> TestResponse {
        self.request(self.factory.post(path, data)).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post_json(&self, path: &str, json: &serde_json::Value) -> TestResponse {
        self.request(self.factory.post_json(path, json)).await
    }

    /// Sends a PUT request with form data.
    pub async fn put(&self, path: &str, data: &[(&str, &str)]) -> TestResponse {
        self.request(self.factory.put(path, data)).await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(self.factory.delete(path)).await
    }

    /// Sends a HEAD request.
    pub async fn head(&self, path: &str) -> TestResponse {
        self.request(self.factory.head(path)).await
    }

    /// Sends `request`, answering escaped handler errors with a bare 500.
    pub async fn request(&self, request: HttpRequest) -> TestResponse {
        self.app.respond(request).await.into()
    }

    /// Sends `request`, returning escaped handler errors.
    ///
    /// # Errors
    ///
    /// Returns the handler's error when the application does not handle
    /// exceptions.
    pub async fn try_request(&self, request: HttpRequest) -> BoboResult<TestResponse> {
        self.app.handle(request).await.map(Into::into)
    }
}

/// A client that sends requests through the axum router.
#[derive(Debug, Clone)]
pub struct RouterClient {
    router: Router,
}

impl RouterClient {
    /// Creates a client for `app` behind the axum adapter.
    pub fn new(app: Application) -> Self {
        Self::from_router(server::router(app))
    }

    /// Creates a client for an existing router.
    pub const fn from_router(router: Router) -> Self {
        Self { router }
    }

    /// Sends a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None, Vec::new()).await
    }

    /// Sends a POST request with form data.
    pub async fn post(&self, path: &str, data: &[(&str, &str)]) -> TestResponse {
        let body = encode_form_data(data).into_bytes();
        self.send(
            Method::POST,
            path,
            Some("application/x-www-form-urlencoded"),
            body,
        )
        .await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post_json(&self, path: &str, json: &serde_json::Value) -> TestResponse {
        let body = json.to_string().into_bytes();
        self.send(Method::POST, path, Some("application/json"), body)
            .await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.send(Method::DELETE, path, None, Vec::new()).await
    }

    /// Sends a HEAD request.
    pub async fn head(&self, path: &str) -> TestResponse {
        self.send(Method::HEAD, path, None, Vec::new()).await
    }

    /// Sends a request with an optional content type.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid URI or the router fails, which only
    /// happens for malformed test input.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(ct) = content_type {
            builder = builder.header(http::header::CONTENT_TYPE, ct);
        }
        let req = builder
            .body(axum::body::Body::from(body))
            .expect("request builder should not fail");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("router should not error");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_or_else(|_| Bytes::new(), http_body_util::Collected::to_bytes);

        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }
}

/// A response received by a test client.
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// The status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body.
    pub body: Vec<u8>,
}

impl From<HttpResponse> for TestResponse {
    fn from(response: HttpResponse) -> Self {
        let (status, headers, body) = response.into_parts();
        Self {
            status,
            headers,
            body,
        }
    }
}

impl TestResponse {
    /// Returns the body as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BoboError::SerializationError`] if the body is not valid
    /// JSON for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, BoboError> {
        serde_json::from_slice(&self.body).map_err(|e| BoboError::SerializationError(e.to_string()))
    }

    /// Returns the numeric status code.
    pub const fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `true` if the response has the header.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// Returns `true` if the body contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.text().contains(text)
    }
}
