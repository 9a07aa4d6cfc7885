//! Routes: a pattern, the methods it answers, and the handler behind it.
//!
//! Routes are built with [`RouteBuilder`], usually through one of the
//! method-set helpers such as [`query`] or [`post`].

use std::fmt;
use std::sync::Arc;

use http::Method;

use bobo_rs_core::settings::DEFAULT_CONTENT_TYPE;
use bobo_rs_core::{BoboError, BoboResult};

use super::handler::{HandlerDescriptor, ResourceFn};
use super::pattern::{Captures, PathPattern};
use crate::request::{essence_of, HttpRequest};
use crate::response::HttpResponse;

/// A hook run before the handler. Returning a response skips the handler.
pub type CheckFn = Arc<dyn Fn(&HttpRequest) -> Option<HttpResponse> + Send + Sync>;

/// Produces the routes below a subroute, given the subroute's captures.
///
/// Returning `None` means nothing lives below this prefix for the request,
/// and resolution moves on to the next route.
pub type SubrouteFn = Arc<dyn Fn(&Captures, &HttpRequest) -> Option<Arc<[Route]>> + Send + Sync>;

/// Where a route reads parameters that are not path captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamSource {
    /// Body fields, then query parameters.
    #[default]
    Params,
    /// Body fields only. Used by POST and PUT routes.
    Body,
    /// Nothing beyond the captures and the request object. Used by
    /// [`resource`] routes.
    Captures,
}

/// What a matched route hands the request to.
#[derive(Clone)]
pub enum RouteTarget {
    /// A handler, invoked with the bound arguments.
    Handler(ResourceFn),
    /// A factory for routes that resolve the rest of the path.
    Subroute(SubrouteFn),
}

/// A registered route.
#[derive(Clone)]
pub struct Route {
    pattern: PathPattern,
    methods: Vec<Method>,
    param_source: ParamSource,
    consumes: Option<String>,
    content_type: Option<String>,
    descriptor: HandlerDescriptor,
    target: RouteTarget,
    check: Option<CheckFn>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.source())
            .field("methods", &self.methods)
            .field("param_source", &self.param_source)
            .field("consumes", &self.consumes)
            .field("content_type", &self.content_type)
            .field("handler", &self.descriptor.name())
            .field("subroute", &self.is_subroute())
            .finish_non_exhaustive()
    }
}

impl Route {
    /// Builds a route directly from its parts.
    ///
    /// An empty method list accepts every method.
    pub fn new(
        pattern: &str,
        methods: impl IntoIterator<Item = Method>,
        descriptor: HandlerDescriptor,
        handler: ResourceFn,
    ) -> BoboResult<Self> {
        Self::builder(descriptor, handler)
            .pattern(pattern)
            .methods(methods)
            .build()
    }

    /// Starts building a route.
    pub fn builder(descriptor: HandlerDescriptor, handler: ResourceFn) -> RouteBuilder {
        RouteBuilder {
            pattern: None,
            methods: Vec::new(),
            param_source: ParamSource::default(),
            consumes: None,
            content_type: None,
            descriptor,
            target: RouteTarget::Handler(handler),
            check: None,
        }
    }

    /// Returns the compiled path pattern.
    pub const fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the accepted methods. Empty means any method.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns `true` if the route answers `method`.
    pub fn allows_method(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }

    /// Returns where non-path parameters are read from.
    pub const fn param_source(&self) -> ParamSource {
        self.param_source
    }

    /// Returns the request media type the route requires, if any.
    pub fn consumes(&self) -> Option<&str> {
        self.consumes.as_deref()
    }

    /// Returns `true` if the request content type satisfies [`consumes`](Self::consumes).
    pub fn accepts_content_type(&self, request: &HttpRequest) -> bool {
        self.consumes.as_ref().map_or(true, |expected| {
            request.content_type_essence().as_ref() == Some(expected)
        })
    }

    /// Returns the response content type, if the route sets one.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the handler descriptor.
    pub const fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    /// Returns the handler name.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Returns what the route hands matched requests to.
    pub const fn target(&self) -> &RouteTarget {
        &self.target
    }

    /// Returns `true` if the route matches a path prefix and delegates the rest.
    pub const fn is_subroute(&self) -> bool {
        matches!(self.target, RouteTarget::Subroute(_))
    }

    /// Runs the check hook, if any.
    pub fn check(&self, request: &HttpRequest) -> Option<HttpResponse> {
        self.check.as_ref().and_then(|check| check(request))
    }

    /// Returns a copy of this route mounted under `prefix`.
    pub fn prefixed(&self, prefix: &str) -> BoboResult<Self> {
        Ok(Self {
            pattern: self.pattern.prefixed(prefix)?,
            ..self.clone()
        })
    }
}

/// Builder for [`Route`].
///
/// # Examples
///
/// ```
/// use bobo_rs_http::routing::handler::{handler, HandlerDescriptor};
/// use bobo_rs_http::routing::route::query;
///
/// let route = query(
///     "/add",
///     HandlerDescriptor::new("add").optional("a", 0).optional("b", 0),
///     handler(|args| Ok(serde_json::json!(args.int("a").unwrap_or(0) + args.int("b").unwrap_or(0)))),
/// )
/// .content_type("application/json")
/// .build()
/// .unwrap();
///
/// assert_eq!(route.pattern().source(), "/add");
/// assert_eq!(route.methods().len(), 3);
/// ```
#[must_use]
pub struct RouteBuilder {
    pattern: Option<String>,
    methods: Vec<Method>,
    param_source: ParamSource,
    consumes: Option<String>,
    content_type: Option<String>,
    descriptor: HandlerDescriptor,
    target: RouteTarget,
    check: Option<CheckFn>,
}

impl RouteBuilder {
    /// Sets the path pattern. Without one, the route is `/<handler name>.<subtype>`.
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    /// Replaces the accepted methods.
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Adds one accepted method.
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Sets where non-path parameters are read from.
    pub fn param_source(mut self, source: ParamSource) -> Self {
        self.param_source = source;
        self
    }

    /// Requires requests to carry this media type.
    pub fn consumes(mut self, media_type: &str) -> Self {
        self.consumes = Some(media_type.to_string());
        self
    }

    /// Sets the response content type for text, bytes, and JSON results.
    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Installs a check hook.
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&HttpRequest) -> Option<HttpResponse> + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }

    /// Validates everything and builds the route.
    ///
    /// # Errors
    ///
    /// Returns [`BoboError::Pattern`] for an invalid pattern and
    /// [`BoboError::ImproperlyConfigured`] for an invalid descriptor or
    /// media type.
    pub fn build(self) -> BoboResult<Route> {
        self.descriptor.validate()?;

        let source = match self.pattern {
            Some(pattern) => pattern,
            None => default_pattern(self.descriptor.name(), self.content_type.as_deref()),
        };
        let pattern = PathPattern::compile(&source)?;

        let consumes = self
            .consumes
            .map(|media_type| {
                essence_of(&media_type).ok_or_else(|| {
                    BoboError::ImproperlyConfigured(format!(
                        "route '{source}' consumes an invalid media type '{media_type}'"
                    ))
                })
            })
            .transpose()?;

        let mut methods: Vec<Method> = Vec::with_capacity(self.methods.len());
        for method in self.methods {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }

        Ok(Route {
            pattern,
            methods,
            param_source: self.param_source,
            consumes,
            content_type: self.content_type,
            descriptor: self.descriptor,
            target: self.target,
            check: self.check,
        })
    }
}

/// The pattern used when a route is built without one.
fn default_pattern(name: &str, content_type: Option<&str>) -> String {
    let content_type = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);
    let subtype = content_type
        .split(';')
        .next()
        .and_then(|media| media.split_once('/'))
        .map(|(_, subtype)| subtype.trim())
        .filter(|subtype| {
            !subtype.is_empty()
                && subtype
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    match subtype {
        Some(subtype) => format!("/{name}.{subtype}"),
        None => format!("/{name}"),
    }
}

fn with_methods<const N: usize>(
    methods: [Method; N],
    pattern: &str,
    descriptor: HandlerDescriptor,
    handler: ResourceFn,
) -> RouteBuilder {
    Route::builder(descriptor, handler)
        .pattern(pattern)
        .methods(methods)
}

/// A route for GET, POST and HEAD whose handler only sees the path captures
/// and, if it asks for it, the request object.
///
/// Query strings and bodies are left to the handler to read from the request.
pub fn resource(pattern: &str, descriptor: HandlerDescriptor, handler: ResourceFn) -> RouteBuilder {
    with_methods([Method::GET, Method::POST, Method::HEAD], pattern, descriptor, handler)
        .param_source(ParamSource::Captures)
}

/// A route for GET, POST and HEAD that binds captures, body fields, and
/// query parameters.
pub fn query(pattern: &str, descriptor: HandlerDescriptor, handler: ResourceFn) -> RouteBuilder {
    with_methods([Method::GET, Method::POST, Method::HEAD], pattern, descriptor, handler)
}

/// A route for POST only, binding from the body.
pub fn post(pattern: &str, descriptor: HandlerDescriptor, handler: ResourceFn) -> RouteBuilder {
    with_methods([Method::POST], pattern, descriptor, handler).param_source(ParamSource::Body)
}

/// A route for GET only.
pub fn get(pattern: &str, descriptor: HandlerDescriptor, handler: ResourceFn) -> RouteBuilder {
    with_methods([Method::GET], pattern, descriptor, handler)
}

/// A route for HEAD only.
pub fn head(pattern: &str, descriptor: HandlerDescriptor, handler: ResourceFn) -> RouteBuilder {
    with_methods([Method::HEAD], pattern, descriptor, handler)
}

/// A route for PUT only, binding from the body.
pub fn put(pattern: &str, descriptor: HandlerDescriptor, handler: ResourceFn) -> RouteBuilder {
    with_methods([Method::PUT], pattern, descriptor, handler).param_source(ParamSource::Body)
}

/// A route for DELETE only.
pub fn delete(pattern: &str, descriptor: HandlerDescriptor, handler: ResourceFn) -> RouteBuilder {
    with_methods([Method::DELETE], pattern, descriptor, handler)
}

/// A route for OPTIONS only.
pub fn options(pattern: &str, descriptor: HandlerDescriptor, handler: ResourceFn) -> RouteBuilder {
    with_methods([Method::OPTIONS], pattern, descriptor, handler)
}

/// A route for any method.
pub fn any(pattern: &str, descriptor: HandlerDescriptor, handler: ResourceFn) -> RouteBuilder {
    with_methods([], pattern, descriptor, handler)
}

/// A route that matches the leading part of a path and resolves the rest
/// against routes built for the request.
///
/// The factory receives the prefix's captures. The routes it returns are
/// matched against what is left of the path, so `/:id` below `/users`
/// matches `/users/7/42`. When the factory returns `None`, or none of its
/// routes accepts the request, resolution continues after the subroute.
/// Method and content-type restrictions belong on the inner routes.
///
/// ```
/// use bobo_rs_http::routing::handler::{handler, HandlerDescriptor};
/// use bobo_rs_http::routing::route::{get, subroute};
///
/// let users = subroute("/users/:user", "users", |captures, _request| {
///     let user = captures.get("user")?.clone();
///     let profile = get(
///         "/profile",
///         HandlerDescriptor::new("profile"),
///         handler(move |_| Ok(format!("profile of {user}"))),
///     )
///     .build()
///     .ok()?;
///     Some(vec![profile])
/// })
/// .build()
/// .unwrap();
/// assert!(users.is_subroute());
/// ```
pub fn subroute<F, R>(pattern: &str, name: &str, factory: F) -> RouteBuilder
where
    F: Fn(&Captures, &HttpRequest) -> Option<R> + Send + Sync + 'static,
    R: Into<Arc<[Route]>>,
{
    let factory: SubrouteFn = Arc::new(
        move |captures: &Captures, request: &HttpRequest| -> Option<Arc<[Route]>> {
            factory(captures, request).map(Into::into)
        },
    );
    RouteBuilder {
        pattern: Some(pattern.to_string()),
        methods: Vec::new(),
        param_source: ParamSource::Captures,
        consumes: None,
        content_type: None,
        descriptor: HandlerDescriptor::new(name),
        target: RouteTarget::Subroute(factory),
        check: None,
    }
}

/// Mounts every route under `prefix`, keeping their order.
///
/// ```
/// use bobo_rs_http::routing::handler::{handler, HandlerDescriptor};
/// use bobo_rs_http::routing::route::{get, preroute};
///
/// let users = get("/:id", HandlerDescriptor::new("user").required("id"), handler(|_| Ok("user")))
///     .build()
///     .unwrap();
/// let mounted = preroute("/users", vec![users]).unwrap();
/// assert_eq!(mounted[0].pattern().source(), "/users/:id");
/// ```
pub fn preroute(prefix: &str, routes: Vec<Route>) -> BoboResult<Vec<Route>> {
    routes.iter().map(|route| route.prefixed(prefix)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::handler;

    fn noop(name: &str) -> (HandlerDescriptor, ResourceFn) {
        (HandlerDescriptor::new(name), handler(|_| Ok("ok")))
    }

    #[test]
    fn test_route_new() {
        let (d, h) = noop("hello");
        let route = Route::new("/hello", [Method::GET, Method::GET], d, h).unwrap();
        assert_eq!(route.methods(), &[Method::GET]);
        assert!(route.allows_method(&Method::GET));
        assert!(!route.allows_method(&Method::POST));
        assert_eq!(route.name(), "hello");
    }

    #[test]
    fn test_empty_methods_accept_anything() {
        let (d, h) = noop("x");
        let route = any("/x", d, h).build().unwrap();
        assert!(route.allows_method(&Method::PATCH));
        assert!(route.allows_method(&Method::DELETE));
    }

    #[test]
    fn test_method_helpers() {
        let (d, h) = noop("r");
        assert_eq!(
            resource("/r", d.clone(), h.clone()).build().unwrap().methods(),
            &[Method::GET, Method::POST, Method::HEAD]
        );
        let route = resource("/r", d.clone(), h.clone()).build().unwrap();
        assert_eq!(route.param_source(), ParamSource::Captures);
        let route = query("/r", d.clone(), h.clone()).build().unwrap();
        assert_eq!(route.methods(), &[Method::GET, Method::POST, Method::HEAD]);
        assert_eq!(route.param_source(), ParamSource::Params);
        let route = post("/r", d.clone(), h.clone()).build().unwrap();
        assert_eq!(route.methods(), &[Method::POST]);
        assert_eq!(route.param_source(), ParamSource::Body);
        let route = get("/r", d.clone(), h.clone()).build().unwrap();
        assert_eq!(route.param_source(), ParamSource::Params);
        assert_eq!(put("/r", d.clone(), h.clone()).build().unwrap().methods(), &[Method::PUT]);
        assert_eq!(
            delete("/r", d.clone(), h.clone()).build().unwrap().methods(),
            &[Method::DELETE]
        );
        assert_eq!(head("/r", d.clone(), h.clone()).build().unwrap().methods(), &[Method::HEAD]);
        assert_eq!(options("/r", d, h).build().unwrap().methods(), &[Method::OPTIONS]);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let (d, h) = noop("bad");
        let err = Route::new("/:a/:a", [], d, h).unwrap_err();
        assert!(matches!(err, BoboError::Pattern(_)));
    }

    #[test]
    fn test_invalid_descriptor_is_rejected() {
        let d = HandlerDescriptor::new("f").required("a").required("a");
        let err = Route::new("/f", [], d, handler(|_| Ok("x"))).unwrap_err();
        assert!(matches!(err, BoboError::ImproperlyConfigured(_)));
    }

    #[test]
    fn test_default_pattern() {
        let (d, h) = noop("index");
        let route = Route::builder(d, h).build().unwrap();
        assert_eq!(route.pattern().source(), "/index.html");

        let (d, h) = noop("add");
        let route = Route::builder(d, h)
            .content_type("application/json")
            .build()
            .unwrap();
        assert_eq!(route.pattern().source(), "/add.json");

        assert_eq!(default_pattern("feed", Some("application/atom+xml")), "/feed");
    }

    #[test]
    fn test_consumes() {
        let (d, h) = noop("upload");
        let route = post("/upload", d, h)
            .consumes("Application/JSON")
            .build()
            .unwrap();
        assert_eq!(route.consumes(), Some("application/json"));

        let json = HttpRequest::builder()
            .content_type("application/json; charset=utf-8")
            .build();
        let form = HttpRequest::builder().form("a=1").build();
        let none = HttpRequest::builder().build();
        assert!(route.accepts_content_type(&json));
        assert!(!route.accepts_content_type(&form));
        assert!(!route.accepts_content_type(&none));

        let (d, h) = noop("bad");
        assert!(post("/bad", d, h).consumes("not a type").build().is_err());
    }

    #[test]
    fn test_check_hook() {
        let (d, h) = noop("secret");
        let route = get("/secret", d, h)
            .check(|req| {
                req.header("authorization")
                    .is_none()
                    .then(|| HttpResponse::new(http::StatusCode::UNAUTHORIZED, "no"))
            })
            .build()
            .unwrap();
        let anonymous = HttpRequest::builder().build();
        let authorized = HttpRequest::builder().header("authorization", "token").build();
        assert_eq!(
            route.check(&anonymous).map(|r| r.status()),
            Some(http::StatusCode::UNAUTHORIZED)
        );
        assert!(route.check(&authorized).is_none());
    }

    #[test]
    fn test_preroute() {
        let (d, h) = noop("a");
        let a = get("/a", d, h).build().unwrap();
        let (d, h) = noop("b");
        let b = get("/", d, h).build().unwrap();
        let mounted = preroute("/api", vec![a, b]).unwrap();
        assert_eq!(mounted[0].pattern().source(), "/api/a");
        assert_eq!(mounted[1].pattern().source(), "/api/");
        assert!(preroute("api", mounted).is_err());
    }

    #[test]
    fn test_subroute_builder() {
        let (d, h) = noop("inner");
        let inner: Arc<[Route]> = vec![get("/", d, h).build().unwrap()].into();
        let route = subroute("/users/:id", "users", move |_, _| Some(Arc::clone(&inner)))
            .build()
            .unwrap();
        assert!(route.is_subroute());
        assert_eq!(route.name(), "users");
        assert!(route.methods().is_empty());

        let mounted = route.prefixed("/api").unwrap();
        assert!(mounted.is_subroute());
        assert_eq!(mounted.pattern().source(), "/api/users/:id");

        let RouteTarget::Subroute(factory) = mounted.target() else {
            panic!("expected a subroute");
        };
        let request = HttpRequest::builder().build();
        assert_eq!(factory(&Captures::new(), &request).map(|r| r.len()), Some(1));

        let (d, h) = noop("plain");
        assert!(!get("/", d, h).build().unwrap().is_subroute());
    }
}
