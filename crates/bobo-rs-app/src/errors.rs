//! Error pages.
//!
//! Every failure the application answers itself, whether a request that no
//! route accepts or a handler that raised, goes through an [`ErrorContext`].
//! The status is decided by the application; this module only renders the
//! page, either through a handler registered for that status or through
//! [`default_error_response`].

use std::fmt;
use std::sync::Arc;

use http::header::ALLOW;
use http::StatusCode;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use bobo_rs_core::utils::html::escape;
use bobo_rs_core::BoboError;
use bobo_rs_http::routing::ResolveFailure;
use bobo_rs_http::{HttpRequest, HttpResponse};

/// Characters left as-is when a request path is quoted into a page.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// A user-supplied page renderer for one status code.
pub type ErrorHandler = Arc<dyn Fn(&ErrorContext<'_>) -> HttpResponse + Send + Sync>;

/// What went wrong.
#[derive(Debug, Clone, Copy)]
pub enum Failure<'a> {
    /// No route accepted the request.
    Resolve(&'a ResolveFailure),
    /// The handler, or the coercion of its result, failed.
    Handler(&'a BoboError),
}

impl fmt::Display for Failure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(failure) => write!(f, "{failure}"),
            Self::Handler(error) => write!(f, "{error}"),
        }
    }
}

/// Everything an error page can be rendered from.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    /// The request being answered.
    pub request: &'a HttpRequest,
    /// The status the page will be sent with.
    pub status: StatusCode,
    /// The underlying failure.
    pub failure: Failure<'a>,
}

/// Builds a small HTML page.
///
/// Both `title` and `message` are inserted verbatim; callers escape any
/// request-derived text first.
pub fn error_page(status: StatusCode, title: &str, message: &str) -> HttpResponse {
    HttpResponse::new(
        status,
        format!(
            "<html>\n<head><title>{title}</title></head>\n<body>{message}</body>\n</html>\n"
        ),
    )
}

/// Renders the built-in page for `context`.
///
/// A 404 always quotes the request path, so markup in the path never reaches
/// the body. A 405 carries an `Allow` header listing the accepted methods.
///
/// # Examples
///
/// ```
/// use bobo_rs_app::errors::{default_error_response, ErrorContext, Failure};
/// use bobo_rs_http::routing::ResolveFailure;
/// use bobo_rs_http::HttpRequest;
/// use http::StatusCode;
///
/// let request = HttpRequest::builder().path("/<b>hi</b>").build();
/// let failure = ResolveFailure::NotFound;
/// let response = default_error_response(&ErrorContext {
///     request: &request,
///     status: StatusCode::NOT_FOUND,
///     failure: Failure::Resolve(&failure),
/// });
/// assert!(response.text().contains("Could not find: /%3Cb%3Ehi%3C/b%3E"));
/// ```
pub fn default_error_response(context: &ErrorContext<'_>) -> HttpResponse {
    let status = context.status;
    if status == StatusCode::NOT_FOUND {
        return not_found_page(context.request.path());
    }

    match context.failure {
        Failure::Resolve(ResolveFailure::MethodMismatch { allowed }) => {
            let message = format!(
                "Invalid request method: {}",
                escape(context.request.method().as_str())
            );
            let mut response = error_page(status, "Method Not Allowed", &message);
            if status == StatusCode::METHOD_NOT_ALLOWED {
                response.set_header(ALLOW, &allowed.join(", "));
            }
            response
        }
        Failure::Resolve(ResolveFailure::MissingRequired { name }) => error_page(
            status,
            "Missing parameter",
            &format!("Missing form variable {}", escape(name)),
        ),
        Failure::Resolve(ResolveFailure::TypeMismatch { name, expected, .. }) => error_page(
            status,
            "Invalid parameter",
            &format!("Form variable {} must be {expected}", escape(name)),
        ),
        Failure::Resolve(ResolveFailure::ContentTypeMismatch { actual, .. }) => error_page(
            status,
            "Unsupported Media Type",
            &format!(
                "Unsupported content type: {}",
                escape(actual.as_deref().unwrap_or("none"))
            ),
        ),
        Failure::Resolve(ResolveFailure::BadRequest(message))
        | Failure::Handler(BoboError::BadRequest(message)) => {
            error_page(status, "Bad Request", &escape(message))
        }
        Failure::Resolve(ResolveFailure::NotFound) | Failure::Handler(_) => {
            error_page(status, "Internal Server Error", "An error occurred.")
        }
    }
}

/// The 404 page for `path`.
///
/// The path is decoded and then re-quoted, so raw and already-encoded forms
/// of the same path produce the same page.
pub fn not_found_page(path: &str) -> HttpResponse {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let quoted = utf8_percent_encode(&decoded, PATH_SAFE).to_string();
    error_page(
        StatusCode::NOT_FOUND,
        "Not Found",
        &format!("Could not find: {}", escape(&quoted)),
    )
}
