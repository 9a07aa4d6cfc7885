//! Parameter binding.
//!
//! Each declared handler parameter is looked up in the request sources in
//! precedence order:
//!
//! 1. the request object itself, for `bobo_request`
//! 2. path captures
//! 3. body fields (form fields, or the members of a JSON object body)
//! 4. query parameters
//! 5. the parameter's default
//!
//! Supplied values are coerced to the type of the default, if the default is
//! a number or a boolean.

use std::sync::Arc;

use serde_json::{Map, Value};

use bobo_rs_core::{BoboError, BoboResult};

use super::handler::{ArgValue, BoundArgs, HandlerDescriptor, ParamDefault, REQUEST_PARAM};
use super::pattern::Captures;
use super::route::{ParamSource, Route};
use crate::querydict::QueryDict;
use crate::request::HttpRequest;

/// The decoded fields of a request body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyParams<'a> {
    /// The body carries no fields.
    None,
    /// Fields of a urlencoded form.
    Form(&'a QueryDict),
    /// Members of a JSON object body.
    Json(Map<String, Value>),
}

impl<'a> BodyParams<'a> {
    /// Decodes the body fields of `request`.
    ///
    /// JSON is only read when the content type is `application/json`. An empty
    /// JSON body has no fields.
    ///
    /// # Errors
    ///
    /// Returns [`BoboError::BadRequest`] if a JSON body is malformed or is not
    /// an object.
    pub fn from_request(request: &'a HttpRequest) -> BoboResult<Self> {
        if request.is_json() {
            if request.body().iter().all(u8::is_ascii_whitespace) {
                return Ok(Self::None);
            }
            return match serde_json::from_slice::<Value>(request.body()) {
                Ok(Value::Object(map)) => Ok(Self::Json(map)),
                Ok(_) => Err(BoboError::BadRequest(
                    "JSON request body must be an object".to_string(),
                )),
                Err(e) => Err(BoboError::BadRequest(format!("Malformed JSON body: {e}"))),
            };
        }
        if request.post().is_empty() {
            Ok(Self::None)
        } else {
            Ok(Self::Form(request.post()))
        }
    }

    fn lookup(&self, name: &str) -> Option<Supplied> {
        match self {
            Self::None => None,
            Self::Form(fields) => from_multi(fields, name),
            Self::Json(map) => map.get(name).cloned().map(Supplied::Json),
        }
    }
}

/// The result of binding one handler's parameters against a request.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingOutcome {
    /// Every parameter received a value.
    Bound(BoundArgs),
    /// A required parameter had no value.
    MissingRequired(String),
    /// A supplied value could not be coerced to the default's type.
    TypeMismatch {
        /// The parameter name.
        name: String,
        /// The type the value had to have.
        expected: &'static str,
        /// The supplied value.
        value: String,
    },
    /// The route does not accept the request method.
    MethodMismatch,
    /// The route does not accept the request content type.
    ContentTypeMismatch,
}

/// A raw value found in one of the request sources.
#[derive(Debug, Clone)]
enum Supplied {
    Text(String),
    List(Vec<String>),
    Json(Value),
}

impl Supplied {
    fn describe(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::List(values) => values.join(","),
            Self::Json(v) => v.to_string(),
        }
    }
}

fn from_multi(dict: &QueryDict, name: &str) -> Option<Supplied> {
    match dict.get_list(name)? {
        [] => None,
        [single] => Some(Supplied::Text(single.clone())),
        values => Some(Supplied::List(values.to_vec())),
    }
}

/// Checks that `route` accepts the request's method and content type, then
/// binds its parameters from the sources its [`ParamSource`] allows.
///
/// `body` is only called once the route has accepted the request, so bodies
/// are decoded lazily and at most once across candidate routes.
///
/// # Errors
///
/// Returns the error from `body` when the request body cannot be decoded.
pub fn check_and_bind<'c, 'q: 'c>(
    route: &Route,
    captures: &Captures,
    request: &Arc<HttpRequest>,
    body: impl FnOnce() -> BoboResult<&'c BodyParams<'q>>,
) -> BoboResult<BindingOutcome> {
    if !route.allows_method(request.method()) {
        return Ok(BindingOutcome::MethodMismatch);
    }
    if !route.accepts_content_type(request) {
        return Ok(BindingOutcome::ContentTypeMismatch);
    }

    let no_query = QueryDict::new();
    let outcome = match route.param_source() {
        ParamSource::Params => bind(route.descriptor(), captures, request.get(), body()?, request),
        ParamSource::Body => bind(route.descriptor(), captures, &no_query, body()?, request),
        ParamSource::Captures => bind(
            route.descriptor(),
            captures,
            &no_query,
            &BodyParams::None,
            request,
        ),
    };
    Ok(outcome)
}

/// Binds every parameter of `descriptor`.
///
/// `query` is usually `request.get()`; routes that only read the body pass an
/// empty dictionary. Returns the first failure in parameter order.
pub fn bind(
    descriptor: &HandlerDescriptor,
    captures: &Captures,
    query: &QueryDict,
    body: &BodyParams<'_>,
    request: &Arc<HttpRequest>,
) -> BindingOutcome {
    let mut args = BoundArgs::new();

    for param in descriptor.params() {
        let name = param.name();

        if name == REQUEST_PARAM && descriptor.accepts_request_object() {
            args.insert(name, ArgValue::Request(Arc::clone(request)));
            continue;
        }

        let supplied = captures
            .get(name)
            .map(|value| Supplied::Text(value.clone()))
            .or_else(|| body.lookup(name))
            .or_else(|| from_multi(query, name));

        let value = match (supplied, param.default()) {
            (Some(supplied), default) => match coerce(supplied, default) {
                Ok(value) => value,
                Err((expected, value)) => {
                    return BindingOutcome::TypeMismatch {
                        name: name.to_string(),
                        expected,
                        value,
                    }
                }
            },
            (None, Some(default)) => default.to_value(),
            (None, None) => return BindingOutcome::MissingRequired(name.to_string()),
        };
        args.insert(name, value);
    }

    BindingOutcome::Bound(args)
}

type CoerceFailure = (&'static str, String);

fn coerce(supplied: Supplied, default: Option<&ParamDefault>) -> Result<ArgValue, CoerceFailure> {
    let Some(default) = default else {
        return Ok(untyped(supplied));
    };
    let expected = default.type_name();
    let mismatch = |supplied: &Supplied| (expected, supplied.describe());

    match default {
        ParamDefault::Null | ParamDefault::Str(_) | ParamDefault::Json(_) => Ok(untyped(supplied)),
        ParamDefault::Int(_) => match &supplied {
            Supplied::Text(s) | Supplied::Json(Value::String(s)) => {
                s.trim().parse().map(ArgValue::Int).map_err(|_| mismatch(&supplied))
            }
            Supplied::Json(Value::Number(n)) => {
                n.as_i64().map(ArgValue::Int).ok_or_else(|| mismatch(&supplied))
            }
            _ => Err(mismatch(&supplied)),
        },
        ParamDefault::Float(_) => match &supplied {
            Supplied::Text(s) | Supplied::Json(Value::String(s)) => {
                s.trim().parse().map(ArgValue::Float).map_err(|_| mismatch(&supplied))
            }
            Supplied::Json(Value::Number(n)) => {
                n.as_f64().map(ArgValue::Float).ok_or_else(|| mismatch(&supplied))
            }
            _ => Err(mismatch(&supplied)),
        },
        ParamDefault::Bool(_) => match &supplied {
            Supplied::Text(s) | Supplied::Json(Value::String(s)) => {
                parse_bool_word(s).map(ArgValue::Bool).ok_or_else(|| mismatch(&supplied))
            }
            Supplied::Json(Value::Bool(b)) => Ok(ArgValue::Bool(*b)),
            _ => Err(mismatch(&supplied)),
        },
    }
}

fn untyped(supplied: Supplied) -> ArgValue {
    match supplied {
        Supplied::Text(s) | Supplied::Json(Value::String(s)) => ArgValue::Str(s),
        Supplied::List(values) => ArgValue::List(values),
        Supplied::Json(Value::Null) => ArgValue::Null,
        Supplied::Json(v) => ArgValue::Json(v),
    }
}

fn parse_bool_word(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(query: &str) -> Arc<HttpRequest> {
        Arc::new(HttpRequest::builder().path("/").query_string(query).build())
    }

    fn bind_query(descriptor: &HandlerDescriptor, query: &str) -> BindingOutcome {
        let req = request(query);
        bind(descriptor, &Captures::new(), req.get(), &BodyParams::None, &req)
    }

    fn bound(outcome: BindingOutcome) -> BoundArgs {
        match outcome {
            BindingOutcome::Bound(args) => args,
            other => panic!("expected Bound, got {other:?}"),
        }
    }

    #[test]
    fn test_binds_query_and_default() {
        let d = HandlerDescriptor::new("hello").optional("who", "world");
        assert_eq!(bound(bind_query(&d, "")).str("who"), Some("world"));
        assert_eq!(bound(bind_query(&d, "who=Ann")).str("who"), Some("Ann"));
    }

    #[test]
    fn test_missing_required() {
        let d = HandlerDescriptor::new("f").required("a").required("b");
        assert_eq!(
            bind_query(&d, "a=1"),
            BindingOutcome::MissingRequired("b".to_string())
        );
    }

    #[test]
    fn test_capture_beats_body_beats_query() {
        let d = HandlerDescriptor::new("f").required("x");
        let req = Arc::new(
            HttpRequest::builder()
                .path("/")
                .query_string("x=query")
                .form("x=form")
                .build(),
        );
        let body = BodyParams::from_request(&req).unwrap();

        let mut captures = Captures::new();
        captures.insert("x".into(), "path".into());
        let query = req.get();
        assert_eq!(bound(bind(&d, &captures, query, &body, &req)).str("x"), Some("path"));
        assert_eq!(
            bound(bind(&d, &Captures::new(), query, &body, &req)).str("x"),
            Some("form")
        );
        assert_eq!(
            bound(bind(&d, &Captures::new(), query, &BodyParams::None, &req)).str("x"),
            Some("query")
        );
        assert_eq!(
            bind(&d, &Captures::new(), &QueryDict::new(), &BodyParams::None, &req),
            BindingOutcome::MissingRequired("x".into())
        );
    }

    #[test]
    fn test_request_object() {
        let d = HandlerDescriptor::new("f").with_request();
        let req = request("bobo_request=spoofed");
        let args = bound(bind(&d, &Captures::new(), req.get(), &BodyParams::None, &req));
        assert!(Arc::ptr_eq(args.request().unwrap(), &req));
    }

    #[test]
    fn test_repeated_key_binds_list() {
        let d = HandlerDescriptor::new("f").required("tag");
        let args = bound(bind_query(&d, "tag=a&tag=b"));
        assert_eq!(
            args.get("tag"),
            Some(&ArgValue::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_typed_defaults() {
        let d = HandlerDescriptor::new("f")
            .optional("n", 0)
            .optional("ratio", 1.0)
            .optional("flag", false);
        let args = bound(bind_query(&d, "n=42&ratio=0.5&flag=ON"));
        assert_eq!(args.int("n"), Some(42));
        assert_eq!(args.float("ratio"), Some(0.5));
        assert_eq!(args.bool("flag"), Some(true));

        let args = bound(bind_query(&d, ""));
        assert_eq!(args.int("n"), Some(0));
        assert_eq!(args.bool("flag"), Some(false));
    }

    #[test]
    fn test_type_mismatch() {
        let d = HandlerDescriptor::new("f").optional("n", 0);
        assert_eq!(
            bind_query(&d, "n=abc"),
            BindingOutcome::TypeMismatch {
                name: "n".into(),
                expected: "integer",
                value: "abc".into(),
            }
        );
        assert!(matches!(
            bind_query(&d, "n=1&n=2"),
            BindingOutcome::TypeMismatch { .. }
        ));
        let d = HandlerDescriptor::new("f").optional("flag", true);
        assert!(matches!(
            bind_query(&d, "flag=maybe"),
            BindingOutcome::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_json_body() {
        let req = Arc::new(
            HttpRequest::builder()
                .json(&json!({"a": 2, "b": "3", "name": "x", "tags": [1, 2], "none": null}))
                .build(),
        );
        let body = BodyParams::from_request(&req).unwrap();
        let d = HandlerDescriptor::new("f")
            .optional("a", 0)
            .optional("b", 0)
            .required("name")
            .required("tags")
            .required("none");
        let args = bound(bind(&d, &Captures::new(), req.get(), &body, &req));
        assert_eq!(args.int("a"), Some(2));
        assert_eq!(args.int("b"), Some(3));
        assert_eq!(args.str("name"), Some("x"));
        assert_eq!(args.get("tags"), Some(&ArgValue::Json(json!([1, 2]))));
        assert_eq!(args.get("none"), Some(&ArgValue::Null));
    }

    #[test]
    fn test_body_params_rejects_bad_json() {
        let req = HttpRequest::builder()
            .content_type("application/json")
            .body("{not json")
            .build();
        assert!(matches!(
            BodyParams::from_request(&req),
            Err(BoboError::BadRequest(_))
        ));

        let req = HttpRequest::builder().json(&json!([1, 2])).build();
        assert!(matches!(
            BodyParams::from_request(&req),
            Err(BoboError::BadRequest(_))
        ));
    }

    #[test]
    fn test_body_params_sources() {
        let req = HttpRequest::builder().content_type("application/json").build();
        assert_eq!(BodyParams::from_request(&req).unwrap(), BodyParams::None);

        let req = HttpRequest::builder().content_type("text/plain").body("{}").build();
        assert_eq!(BodyParams::from_request(&req).unwrap(), BodyParams::None);

        let req = HttpRequest::builder().form("a=1").build();
        assert!(matches!(
            BodyParams::from_request(&req).unwrap(),
            BodyParams::Form(_)
        ));
    }

    #[test]
    fn test_check_and_bind_rejects_method_and_content_type() {
        use crate::routing::handler::handler;
        use crate::routing::route::post;
        use http::Method;

        let route = post("/save", HandlerDescriptor::new("save"), handler(|_| Ok("ok")))
            .consumes("application/json")
            .build()
            .unwrap();
        let none = BodyParams::None;
        let no_body = || Ok(&none);

        let get = Arc::new(HttpRequest::builder().path("/save").build());
        let outcome = check_and_bind(&route, &Captures::new(), &get, no_body).unwrap();
        assert_eq!(outcome, BindingOutcome::MethodMismatch);

        let form = Arc::new(
            HttpRequest::builder()
                .method(Method::POST)
                .path("/save")
                .form("a=1")
                .build(),
        );
        let outcome = check_and_bind(&route, &Captures::new(), &form, no_body).unwrap();
        assert_eq!(outcome, BindingOutcome::ContentTypeMismatch);
    }

    #[test]
    fn test_check_and_bind_resource_sees_only_captures() {
        use crate::routing::handler::handler;
        use crate::routing::route::{query, resource};
        use http::Method;

        let descriptor = HandlerDescriptor::new("item").required("id").optional("page", 1);
        let req = Arc::new(
            HttpRequest::builder()
                .method(Method::POST)
                .path("/items/9")
                .query_string("page=3")
                .form("id=5")
                .build(),
        );
        let captures = Captures::from([("id".to_string(), "9".to_string())]);

        let route = resource("/items/:id", descriptor.clone(), handler(|_| Ok("ok")))
            .build()
            .unwrap();
        let args = bound(
            check_and_bind(&route, &captures, &req, || panic!("resource routes never decode the body"))
                .unwrap(),
        );
        assert_eq!(args.str("id"), Some("9"));
        assert_eq!(args.int("page"), Some(1));

        let body = BodyParams::from_request(&req).unwrap();
        let route = query("/items/:id", descriptor, handler(|_| Ok("ok")))
            .build()
            .unwrap();
        let args = bound(check_and_bind(&route, &captures, &req, || Ok(&body)).unwrap());
        assert_eq!(args.str("id"), Some("9"));
        assert_eq!(args.int("page"), Some(3));
    }

    #[test]
    fn test_parse_bool_word() {
        for word in ["true", "1", "Yes", "on"] {
            assert_eq!(parse_bool_word(word), Some(true));
        }
        for word in ["false", "0", "NO", "off"] {
            assert_eq!(parse_bool_word(word), Some(false));
        }
        assert_eq!(parse_bool_word("maybe"), None);
    }
}
