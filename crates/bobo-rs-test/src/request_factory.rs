//! Request factory for building [`HttpRequest`] objects in tests.
//!
//! [`RequestFactory`] builds requests directly, so handlers and applications
//! can be exercised without a server.
//!
//! ## Example
//!
//! ```rust
//! use bobo_rs_test::request_factory::RequestFactory;
//!
//! let factory = RequestFactory::new();
//! let request = factory.get("/articles/?page=2");
//! assert_eq!(request.method(), &http::Method::GET);
//! assert_eq!(request.path(), "/articles/");
//! assert_eq!(request.get().get("page"), Some("2"));
//! ```

use http::Method;

use bobo_rs_http::{HttpRequest, HttpRequestBuilder, QueryDict};

/// A factory for building [`HttpRequest`] objects.
///
/// Default headers are added to every request the factory builds.
#[derive(Debug, Clone, Default)]
pub struct RequestFactory {
    default_headers: Vec<(String, String)>,
}

impl RequestFactory {
    /// Creates a factory with no default headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header to every request.
    #[must_use]
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    /// Starts a request with the default headers applied. `path` may carry a
    /// query string.
    pub fn builder(&self, method: Method, path: &str) -> HttpRequestBuilder {
        self.default_headers.iter().fold(
            HttpRequest::builder().method(method).path(path),
            |builder, (name, value)| builder.header(name, value),
        )
    }

    /// Builds a GET request.
    pub fn get(&self, path: &str) -> HttpRequest {
        self.builder(Method::GET, path).build()
    }

    /// Builds a POST request with a urlencoded form body.
    pub fn post(&self, path: &str, data: &[(&str, &str)]) -> HttpRequest {
        self.builder(Method::POST, path)
            .form(&encode_form_data(data))
            .build()
    }

    /// Builds a POST request with a JSON body.
    pub fn post_json(&self, path: &str, json: &serde_json::Value) -> HttpRequest {
        self.builder(Method::POST, path).json(json).build()
    }

    /// Builds a PUT request with a urlencoded form body.
    pub fn put(&self, path: &str, data: &[(&str, &str)]) -> HttpRequest {
        self.builder(Method::PUT, path)
            .form(&encode_form_data(data))
            .build()
    }

    /// Builds a PUT request with a JSON body.
    pub fn put_json(&self, path: &str, json: &serde_json::Value) -> HttpRequest {
        self.builder(Method::PUT, path).json(json).build()
    }

    /// Builds a DELETE request.
    pub fn delete(&self, path: &str) -> HttpRequest {
        self.builder(Method::DELETE, path).build()
    }

    /// Builds a HEAD request.
    pub fn head(&self, path: &str) -> HttpRequest {
        self.builder(Method::HEAD, path).build()
    }

    /// Builds an OPTIONS request.
    pub fn options(&self, path: &str) -> HttpRequest {
        self.builder(Method::OPTIONS, path).build()
    }
}

/// Encodes `data` as `application/x-www-form-urlencoded`, keeping its order.
pub fn encode_form_data(data: &[(&str, &str)]) -> String {
    data.iter().copied().collect::<QueryDict>().urlencode()
}
