//! Handler descriptors, bound arguments, and handler results.
//!
//! Rust closures cannot be introspected for parameter names, so every handler
//! is registered together with a [`HandlerDescriptor`] listing the parameters
//! it expects. The binder fills those parameters from the request and passes
//! them to the handler as [`BoundArgs`].

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use http::StatusCode;

use bobo_rs_core::{BoboError, BoboResult};

use crate::request::HttpRequest;
use crate::response::HttpResponse;
use crate::BoxFuture;

/// The reserved parameter name that receives the request object itself.
pub const REQUEST_PARAM: &str = "bobo_request";

/// The default value of an optional parameter.
///
/// The variant also fixes how supplied text is coerced: an `Int` default
/// makes `"42"` bind as `ArgValue::Int(42)`, while a `Str` default keeps it as
/// text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    /// No value; binds [`ArgValue::Null`].
    Null,
    /// A text default. Supplied values are kept as text.
    Str(String),
    /// An integer default. Supplied values must parse as `i64`.
    Int(i64),
    /// A float default. Supplied values must parse as `f64`.
    Float(f64),
    /// A boolean default. Supplied values must be a recognised boolean word.
    Bool(bool),
    /// A structured default. Supplied values are kept as provided.
    Json(serde_json::Value),
}

impl ParamDefault {
    /// Returns a short name for the type supplied values are coerced to.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null | Self::Str(_) | Self::Json(_) => "text",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
        }
    }

    /// Converts the default into the value bound when nothing is supplied.
    pub fn to_value(&self) -> ArgValue {
        match self {
            Self::Null => ArgValue::Null,
            Self::Str(s) => ArgValue::Str(s.clone()),
            Self::Int(i) => ArgValue::Int(*i),
            Self::Float(f) => ArgValue::Float(*f),
            Self::Bool(b) => ArgValue::Bool(*b),
            Self::Json(v) => ArgValue::Json(v.clone()),
        }
    }
}

impl From<&str> for ParamDefault {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamDefault {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ParamDefault {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamDefault {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParamDefault {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamDefault {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<serde_json::Value> for ParamDefault {
    fn from(value: serde_json::Value) -> Self {
        if value.is_null() {
            Self::Null
        } else {
            Self::Json(value)
        }
    }
}

impl<T: Into<Self>> From<Option<T>> for ParamDefault {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    default: Option<ParamDefault>,
}

impl ParamSpec {
    /// A parameter that must be supplied by the request.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A parameter that falls back to `default` when not supplied.
    pub fn optional(name: impl Into<String>, default: impl Into<ParamDefault>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the default, if the parameter is optional.
    pub const fn default(&self) -> Option<&ParamDefault> {
        self.default.as_ref()
    }
}

/// The declared signature of a handler: its name and parameters, in order.
///
/// # Examples
///
/// ```
/// use bobo_rs_http::routing::handler::HandlerDescriptor;
///
/// let descriptor = HandlerDescriptor::new("greet")
///     .required("who")
///     .optional("times", 1)
///     .with_request();
///
/// assert_eq!(descriptor.name(), "greet");
/// assert_eq!(descriptor.params().len(), 3);
/// assert!(descriptor.accepts_request_object());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerDescriptor {
    name: String,
    params: Vec<ParamSpec>,
    accepts_request_object: bool,
}

impl HandlerDescriptor {
    /// Creates a descriptor with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            accepts_request_object: false,
        }
    }

    /// Creates a descriptor from a parameter list. A parameter named
    /// [`REQUEST_PARAM`] marks the handler as accepting the request object.
    pub fn from_params(name: impl Into<String>, params: Vec<ParamSpec>) -> Self {
        let accepts_request_object = params.iter().any(|p| p.name == REQUEST_PARAM);
        Self {
            name: name.into(),
            params,
            accepts_request_object,
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        if spec.name == REQUEST_PARAM {
            self.accepts_request_object = true;
        }
        self.params.push(spec);
        self
    }

    /// Appends a required parameter.
    #[must_use]
    pub fn required(self, name: impl Into<String>) -> Self {
        self.param(ParamSpec::required(name))
    }

    /// Appends an optional parameter.
    #[must_use]
    pub fn optional(self, name: impl Into<String>, default: impl Into<ParamDefault>) -> Self {
        self.param(ParamSpec::optional(name, default))
    }

    /// Appends the `bobo_request` parameter, which receives the request itself.
    #[must_use]
    pub fn with_request(self) -> Self {
        self.param(ParamSpec::required(REQUEST_PARAM))
    }

    /// Returns the handler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared parameters, in order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Returns `true` if the handler receives the request as `bobo_request`.
    pub const fn accepts_request_object(&self) -> bool {
        self.accepts_request_object
    }

    /// Checks that the name is usable and that parameter names are unique.
    pub fn validate(&self) -> BoboResult<()> {
        if self.name.is_empty() {
            return Err(BoboError::ImproperlyConfigured(
                "handler name must not be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name.as_str()) {
                return Err(BoboError::ImproperlyConfigured(format!(
                    "handler '{}' declares parameter '{}' more than once",
                    self.name, param.name
                )));
            }
        }
        Ok(())
    }
}

/// A value bound to a handler parameter.
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// The request object, bound to `bobo_request`.
    Request(Arc<HttpRequest>),
    /// No value.
    Null,
    /// A text value.
    Str(String),
    /// Every value of a repeated query or form key, in order.
    List(Vec<String>),
    /// A coerced integer.
    Int(i64),
    /// A coerced float.
    Float(f64),
    /// A coerced boolean.
    Bool(bool),
    /// A non-text value from a JSON body.
    Json(serde_json::Value),
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Request(a), Self::Request(b)) => Arc::ptr_eq(a, b),
            (Self::Null, Self::Null) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            _ => false,
        }
    }
}

impl ArgValue {
    /// Returns the text value, if this is `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this is `Int`.
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value, if this is `Float` or `Int`.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is `Bool`.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the values as a list: a `List` as-is, a `Str` as one element.
    pub fn as_list(&self) -> Option<Vec<String>> {
        match self {
            Self::List(values) => Some(values.clone()),
            Self::Str(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }

    /// Returns `true` if this is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts the value to JSON. The request object becomes `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Request(_) | Self::Null => serde_json::Value::Null,
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::List(values) => serde_json::Value::from(values.clone()),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Json(v) => v.clone(),
        }
    }
}

/// The arguments bound for one handler invocation, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: Vec<(String, ArgValue)>,
}

impl BoundArgs {
    /// Creates an empty argument set.
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Records a value for a parameter, replacing any earlier one.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    /// Returns the text bound to `name`.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    /// Returns the integer bound to `name`.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgValue::as_i64)
    }

    /// Returns the number bound to `name`.
    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ArgValue::as_f64)
    }

    /// Returns the boolean bound to `name`.
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ArgValue::as_bool)
    }

    /// Returns the list bound to `name`, treating a single text value as one item.
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.get(name).and_then(ArgValue::as_list)
    }

    /// Returns the request object, if the handler asked for it.
    pub fn request(&self) -> Option<&Arc<HttpRequest>> {
        match self.get(REQUEST_PARAM) {
            Some(ArgValue::Request(request)) => Some(request),
            _ => None,
        }
    }

    /// Returns the text bound to `name`, or a handler error if there is none.
    pub fn require_str(&self, name: &str) -> BoboResult<&str> {
        self.str(name)
            .ok_or_else(|| BoboError::handler(format!("argument '{name}' is not text")))
    }

    /// Returns the parameter names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    /// Returns the name/value pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the number of bound parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What a handler produced, before it is turned into a response.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    /// A complete response, passed through untouched.
    Response(HttpResponse),
    /// Text, sent with the route's content type.
    Text(String),
    /// Bytes, sent with the route's content type.
    Bytes(Vec<u8>),
    /// A structured value, serialised for routes with a JSON content type.
    Json(serde_json::Value),
    /// A body paired with an explicit status.
    WithStatus(StatusCode, Box<HandlerOutput>),
    /// No value. Only meaningful for DELETE and HEAD.
    None,
}

impl HandlerOutput {
    /// Serialises `value` into a [`HandlerOutput::Json`].
    pub fn json<T: serde::Serialize>(value: &T) -> BoboResult<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| BoboError::SerializationError(e.to_string()))
    }

    /// Pairs a body with an explicit status.
    pub fn with_status(status: StatusCode, body: impl Into<Self>) -> Self {
        Self::WithStatus(status, Box::new(body.into()))
    }
}

impl From<HttpResponse> for HandlerOutput {
    fn from(response: HttpResponse) -> Self {
        Self::Response(response)
    }
}

impl From<String> for HandlerOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for HandlerOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for HandlerOutput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<serde_json::Value> for HandlerOutput {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<()> for HandlerOutput {
    fn from((): ()) -> Self {
        Self::None
    }
}

impl<T: Into<Self>> From<Option<T>> for HandlerOutput {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

impl<T: Into<Self>> From<(StatusCode, T)> for HandlerOutput {
    fn from((status, body): (StatusCode, T)) -> Self {
        Self::with_status(status, body)
    }
}

/// The future returned by a handler.
pub type HandlerFuture = BoxFuture<BoboResult<HandlerOutput>>;

/// A type-erased handler.
pub type ResourceFn = Arc<dyn Fn(BoundArgs) -> HandlerFuture + Send + Sync>;

/// Wraps a synchronous closure as a [`ResourceFn`].
///
/// ```
/// use bobo_rs_http::routing::handler::handler;
///
/// let hello = handler(|args| Ok(format!("Hello {}!", args.str("who").unwrap_or("world"))));
/// # let _ = hello;
/// ```
pub fn handler<F, O>(f: F) -> ResourceFn
where
    F: Fn(BoundArgs) -> BoboResult<O> + Send + Sync + 'static,
    O: Into<HandlerOutput>,
{
    Arc::new(move |args| {
        let result = f(args).map(Into::into);
        Box::pin(std::future::ready(result))
    })
}

/// Wraps an async closure as a [`ResourceFn`].
pub fn async_handler<F, Fut, O>(f: F) -> ResourceFn
where
    F: Fn(BoundArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BoboResult<O>> + Send + 'static,
    O: Into<HandlerOutput>,
{
    Arc::new(move |args| {
        let fut = f(args);
        Box::pin(async move { fut.await.map(Into::into) })
    })
}
