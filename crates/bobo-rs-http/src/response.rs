//! HTTP response types.
//!
//! [`HttpResponse`] is the uniform response representation: a status, an
//! ordered header list, and the body bytes. It converts into an Axum response
//! via [`IntoResponse`]. [`JsonResponse`] and [`redirect`] are convenience
//! constructors.

use axum::response::IntoResponse;
use bobo_rs_core::settings::DEFAULT_CONTENT_TYPE;
use bobo_rs_core::utils::html;
use http::header::{HeaderName, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderValue, StatusCode};

/// An HTTP response.
///
/// # Examples
///
/// ```
/// use bobo_rs_http::HttpResponse;
///
/// let response = HttpResponse::ok("Hello, World!");
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.content_type(), Some("text/html; charset=UTF-8"));
/// assert_eq!(response.text(), "Hello, World!");
/// ```
#[derive(Clone, PartialEq)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

impl HttpResponse {
    /// Creates a response with a text body and the default HTML content type.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        let mut response = Self::with_bytes(status, body.into().into_bytes());
        response.set_content_type(DEFAULT_CONTENT_TYPE);
        response
    }

    /// Creates a response with a byte body and no content type.
    pub fn with_bytes(status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Creates a response with no body and no headers.
    pub fn empty(status: StatusCode) -> Self {
        Self::with_bytes(status, Vec::new())
    }

    /// Creates a 200 OK response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(body: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, body)
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, body)
    }

    /// Creates a 500 Internal Server Error response.
    pub fn server_error(body: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets a header, replacing any existing value. Invalid values are ignored.
    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
    }

    /// Builder form of [`set_header`](Self::set_header).
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Returns the headers as an ordered list of name/value pairs.
    pub fn header_list(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }

    /// Returns the `Content-Type` header, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// Sets the `Content-Type` header.
    pub fn set_content_type(&mut self, content_type: &str) {
        self.set_header(CONTENT_TYPE, content_type);
    }

    /// Returns the body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Drops the body, keeping status and headers. Used for HEAD requests.
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    /// Splits the response into status, headers, and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(axum::body::Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// JSON response constructors.
pub struct JsonResponse;

impl JsonResponse {
    /// Creates a 200 response serializing `data` as `application/json`.
    ///
    /// Serialization failures produce a 500 response.
    pub fn new<T: serde::Serialize>(data: &T) -> HttpResponse {
        Self::with_status(StatusCode::OK, data)
    }

    /// Creates a JSON response with a custom status code.
    pub fn with_status<T: serde::Serialize>(status: StatusCode, data: &T) -> HttpResponse {
        match serde_json::to_vec(data) {
            Ok(json) => {
                let mut response = HttpResponse::with_bytes(status, json);
                response.set_content_type(mime::APPLICATION_JSON.essence_str());
                response
            }
            Err(e) => HttpResponse::server_error(format!("JSON serialization error: {e}")),
        }
    }
}

/// Creates a redirect to `url` with the given status (302 when `None`).
///
/// The body is a short HTML note pointing at the new location.
///
/// ```
/// use bobo_rs_http::redirect;
///
/// let response = redirect("/login?next=/a&b", None);
/// assert_eq!(response.status(), http::StatusCode::FOUND);
/// assert_eq!(response.header("location"), Some("/login?next=/a&b"));
/// assert_eq!(response.text(), "See /login?next=/a&amp;b");
/// ```
pub fn redirect(url: &str, status: Option<StatusCode>) -> HttpResponse {
    HttpResponse::new(
        status.unwrap_or(StatusCode::FOUND),
        format!("See {}", html::escape(url)),
    )
    .with_header(LOCATION, url)
}
