//! Turning handler results into responses.
//!
//! Rules, in order:
//!
//! 1. a complete [`HttpResponse`] is passed through untouched;
//! 2. a `(status, body)` pair coerces the body and then applies the status;
//! 3. text and bytes become a 200 response with the route's content type;
//! 4. a JSON value is serialised, but only for routes with a JSON content type;
//! 5. no value is allowed for DELETE (204) and HEAD (200), and is an error
//!    for every other method.

use http::{Method, StatusCode};

use bobo_rs_core::{BoboError, BoboResult};
use bobo_rs_http::routing::HandlerOutput;
use bobo_rs_http::HttpResponse;

/// Coerces a handler result into a response.
///
/// `content_type` is the route's response content type, or the application
/// default when the route sets none.
///
/// # Errors
///
/// Returns [`BoboError::Response`] when the result cannot be represented:
/// a JSON value for a non-JSON route, or no value for a method that expects
/// a body.
///
/// # Examples
///
/// ```
/// use bobo_rs_app::coerce::coerce;
/// use bobo_rs_http::routing::HandlerOutput;
/// use http::{Method, StatusCode};
///
/// let response = coerce(HandlerOutput::from("hi"), &Method::GET, "text/plain").unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.content_type(), Some("text/plain"));
///
/// let deleted = coerce(HandlerOutput::None, &Method::DELETE, "text/plain").unwrap();
/// assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
/// ```
pub fn coerce(output: HandlerOutput, method: &Method, content_type: &str) -> BoboResult<HttpResponse> {
    match output {
        HandlerOutput::Response(response) => Ok(response),
        HandlerOutput::WithStatus(status, body) => {
            let mut response = match *body {
                HandlerOutput::None => HttpResponse::empty(status),
                body => coerce(body, method, content_type)?,
            };
            response.set_status(status);
            Ok(response)
        }
        HandlerOutput::Text(text) => Ok(with_body(text.into_bytes(), content_type)),
        HandlerOutput::Bytes(bytes) => Ok(with_body(bytes, content_type)),
        HandlerOutput::Json(value) => {
            if !is_json_content_type(content_type) {
                return Err(BoboError::Response(format!(
                    "handler returned a JSON value for a route with content type '{content_type}'"
                )));
            }
            let body = serde_json::to_vec(&value)
                .map_err(|e| BoboError::SerializationError(e.to_string()))?;
            Ok(with_body(body, content_type))
        }
        HandlerOutput::None => {
            if *method == Method::DELETE {
                Ok(HttpResponse::empty(StatusCode::NO_CONTENT))
            } else if *method == Method::HEAD {
                Ok(with_body(Vec::new(), content_type))
            } else {
                Err(BoboError::Response(format!(
                    "handler returned no value for a {method} request"
                )))
            }
        }
    }
}

fn with_body(body: Vec<u8>, content_type: &str) -> HttpResponse {
    let mut response = HttpResponse::with_bytes(StatusCode::OK, body);
    response.set_content_type(content_type);
    response
}

/// Returns `true` for `application/json` and `+json` media types.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
