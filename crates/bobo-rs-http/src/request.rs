//! HTTP request type.
//!
//! [`HttpRequest`] is the read-only view of an incoming request that routes
//! are matched and bound against: method, path, query parameters, headers,
//! content type, and the buffered body with its decoded form fields.

use http::{HeaderMap, Method};

use crate::querydict::QueryDict;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An HTTP request as seen by an application.
///
/// Instances are created from an incoming Axum request via
/// [`HttpRequest::from_axum`], or with [`HttpRequest::builder`] in tests.
///
/// # Examples
///
/// ```
/// use bobo_rs_http::HttpRequest;
///
/// let request = HttpRequest::builder()
///     .method(http::Method::GET)
///     .path("/hello")
///     .query_string("who=world")
///     .build();
///
/// assert_eq!(request.method(), &http::Method::GET);
/// assert_eq!(request.path(), "/hello");
/// assert_eq!(request.get().get("who"), Some("world"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query_string: String,
    content_type: Option<String>,
    get: QueryDict,
    post: QueryDict,
    headers: HeaderMap,
    body: Vec<u8>,
    scheme: String,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`].
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Creates an `HttpRequest` from the parts of an Axum/hyper request and
    /// its collected body bytes.
    pub fn from_axum(parts: http::request::Parts, body: Vec<u8>) -> Self {
        let path = parts.uri.path().to_string();
        let query_string = parts.uri.query().unwrap_or("").to_string();
        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let scheme = if parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("https"))
        {
            "https"
        } else {
            parts.uri.scheme_str().unwrap_or("http")
        };

        Self::assemble(
            parts.method,
            path,
            query_string,
            content_type,
            parts.headers,
            body,
            scheme.to_string(),
        )
    }

    fn assemble(
        method: Method,
        path: String,
        query_string: String,
        content_type: Option<String>,
        headers: HeaderMap,
        body: Vec<u8>,
        scheme: String,
    ) -> Self {
        let get = QueryDict::parse(&query_string);
        let post = if content_type
            .as_deref()
            .and_then(essence_of)
            .is_some_and(|essence| essence == FORM_CONTENT_TYPE)
        {
            QueryDict::parse(&String::from_utf8_lossy(&body))
        } else {
            QueryDict::new()
        };

        Self {
            method,
            path,
            query_string,
            content_type,
            get,
            post,
            headers,
            body,
            scheme,
        }
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`).
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the full `Content-Type` header, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the media type of the body without parameters, lowercased.
    ///
    /// `"application/json; charset=utf-8"` yields `"application/json"`.
    pub fn content_type_essence(&self) -> Option<String> {
        self.content_type.as_deref().and_then(essence_of)
    }

    /// Returns `true` if the body is declared as JSON.
    pub fn is_json(&self) -> bool {
        self.content_type_essence()
            .is_some_and(|essence| essence == mime::APPLICATION_JSON.essence_str())
    }

    /// Returns the query parameters.
    pub const fn get(&self) -> &QueryDict {
        &self.get
    }

    /// Returns the decoded form fields of a urlencoded body.
    pub const fn post(&self) -> &QueryDict {
        &self.post
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw request body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the URL scheme (`"http"` or `"https"`).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the host from the `Host` header, or `"localhost"`.
    pub fn host(&self) -> &str {
        self.header(http::header::HOST.as_str())
            .unwrap_or("localhost")
    }

    /// Returns the path followed by the query string, if any.
    ///
    /// ```
    /// use bobo_rs_http::HttpRequest;
    ///
    /// let request = HttpRequest::builder().path("/docs/").query_string("page=2").build();
    /// assert_eq!(request.full_path(), "/docs/?page=2");
    /// ```
    pub fn full_path(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }

    /// Returns `scheme://host`, the root every route is mounted under.
    pub fn application_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host())
    }

    /// Returns the absolute URL of this request.
    pub fn url(&self) -> String {
        format!("{}{}", self.application_url(), self.full_path())
    }
}

/// Parses a `Content-Type` value down to its lowercase `type/subtype`.
pub(crate) fn essence_of(content_type: &str) -> Option<String> {
    content_type
        .parse::<mime::Mime>()
        .ok()
        .map(|m| m.essence_str().to_ascii_lowercase())
}

/// Builder for constructing [`HttpRequest`] instances without a live server.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    content_type: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
    scheme: String,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            content_type: None,
            headers: HeaderMap::new(),
            body: Vec::new(),
            scheme: "http".to_string(),
        }
    }
}

impl HttpRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request path. A `?query` suffix is split off into the query string.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        match path.split_once('?') {
            Some((path, query)) => {
                self.path = path.to_string();
                self.query_string = query.to_string();
            }
            None => self.path = path.to_string(),
        }
        self
    }

    /// Sets the query string (without leading `?`).
    #[must_use]
    pub fn query_string(mut self, qs: &str) -> Self {
        self.query_string = qs.to_string();
        self
    }

    /// Sets the content type. Also sets the `Content-Type` header.
    #[must_use]
    pub fn content_type(mut self, ct: &str) -> Self {
        self.content_type = Some(ct.to_string());
        self.header(http::header::CONTENT_TYPE.as_str(), ct)
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a urlencoded form body and its content type.
    #[must_use]
    pub fn form(self, body: &str) -> Self {
        self.content_type(FORM_CONTENT_TYPE).body(body)
    }

    /// Serializes `value` as the JSON body and sets the content type.
    #[must_use]
    pub fn json(self, value: &serde_json::Value) -> Self {
        self.content_type(mime::APPLICATION_JSON.essence_str())
            .body(value.to_string())
    }

    /// Sets the scheme (http or https).
    #[must_use]
    pub fn scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// Builds the [`HttpRequest`].
    pub fn build(self) -> HttpRequest {
        HttpRequest::assemble(
            self.method,
            self.path,
            self.query_string,
            self.content_type,
            self.headers,
            self.body,
            self.scheme,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let request = HttpRequest::builder().build();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.query_string(), "");
        assert!(request.content_type().is_none());
        assert!(request.body().is_empty());
        assert_eq!(request.scheme(), "http");
    }

    #[test]
    fn test_builder_path_splits_query() {
        let request = HttpRequest::builder().path("/search?q=rust&q=web").build();
        assert_eq!(request.path(), "/search");
        assert_eq!(request.query_string(), "q=rust&q=web");
        assert_eq!(request.get().get_list("q").map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_form_body_is_decoded() {
        let request = HttpRequest::builder()
            .method(Method::POST)
            .path("/submit")
            .form("name=Jane+Doe&age=30")
            .build();
        assert_eq!(request.post().get("name"), Some("Jane Doe"));
        assert_eq!(request.post().get("age"), Some("30"));
        assert!(!request.is_json());
    }

    #[test]
    fn test_form_content_type_with_charset() {
        let request = HttpRequest::builder()
            .content_type("application/x-www-form-urlencoded; charset=UTF-8")
            .body("a=1")
            .build();
        assert_eq!(request.post().get("a"), Some("1"));
    }

    #[test]
    fn test_non_form_body_has_no_post_fields() {
        let request = HttpRequest::builder()
            .content_type("text/plain")
            .body("a=1")
            .build();
        assert!(request.post().is_empty());
    }

    #[test]
    fn test_json_content_type() {
        let request = HttpRequest::builder()
            .json(&serde_json::json!({"a": 1}))
            .build();
        assert!(request.is_json());
        assert_eq!(request.content_type_essence().as_deref(), Some("application/json"));
        assert_eq!(request.body(), br#"{"a":1}"#);

        let request = HttpRequest::builder()
            .content_type("Application/JSON; charset=utf-8")
            .build();
        assert!(request.is_json());
    }

    #[test]
    fn test_header_lookup() {
        let request = HttpRequest::builder()
            .header("X-Custom", "value")
            .header("bad header", "ignored")
            .build();
        assert_eq!(request.header("x-custom"), Some("value"));
        assert_eq!(request.headers().len(), 1);
    }

    #[test]
    fn test_urls() {
        let request = HttpRequest::builder()
            .header("host", "example.com")
            .path("/a/b")
            .query_string("x=1")
            .build();
        assert_eq!(request.host(), "example.com");
        assert_eq!(request.full_path(), "/a/b?x=1");
        assert_eq!(request.application_url(), "http://example.com");
        assert_eq!(request.url(), "http://example.com/a/b?x=1");
    }

    #[test]
    fn test_from_axum() {
        let (parts, ()) = http::Request::builder()
            .method(Method::PUT)
            .uri("/items/7?verbose=1")
            .header("content-type", "application/x-www-form-urlencoded")
            .header("x-forwarded-proto", "https")
            .body(())
            .unwrap()
            .into_parts();
        let request = HttpRequest::from_axum(parts, b"name=widget".to_vec());
        assert_eq!(request.method(), &Method::PUT);
        assert_eq!(request.path(), "/items/7");
        assert_eq!(request.get().get("verbose"), Some("1"));
        assert_eq!(request.post().get("name"), Some("widget"));
        assert_eq!(request.scheme(), "https");
    }
}
