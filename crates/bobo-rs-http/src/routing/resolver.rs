//! Route resolution.
//!
//! Routes are tried in declaration order. A route whose pattern matches but
//! whose method, content type, or parameters do not fit the request is
//! skipped, and the search continues with the routes after it. Only when
//! every candidate has been tried does resolution fail, reporting the most
//! useful reason seen along the way.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

use http::StatusCode;
use once_cell::unsync::OnceCell;
use tracing::debug;

use super::binder::{check_and_bind, BindingOutcome, BodyParams};
use super::handler::{BoundArgs, ResourceFn};
use super::pattern::{split_path, Captures};
use super::route::{Route, RouteTarget};
use crate::request::HttpRequest;

/// How deeply subroutes may nest before a path is treated as unmatched.
const MAX_SUBROUTE_DEPTH: usize = 32;

/// A route whose pattern matched, plus the routes left to try after it.
#[derive(Debug)]
pub struct MatchResult<'r> {
    /// The matching route.
    pub route: &'r Route,
    /// Values captured from the path.
    pub captures: Captures,
    /// How many path components the pattern consumed. Only a subroute
    /// consumes fewer than all of them.
    pub consumed: usize,
    /// The routes declared after `route`, for backtracking.
    pub remaining: &'r [Route],
}

/// Finds the first route in `routes` whose pattern matches `components`.
///
/// Subroutes only need to match a prefix of the path.
pub fn find_match<'r>(routes: &'r [Route], components: &[String]) -> Option<MatchResult<'r>> {
    routes.iter().enumerate().find_map(|(index, route)| {
        let (captures, consumed) = if route.is_subroute() {
            route.pattern().match_prefix(components)?
        } else {
            (route.pattern().match_components(components)?, components.len())
        };
        Some(MatchResult {
            route,
            captures,
            consumed,
            remaining: &routes[index + 1..],
        })
    })
}

/// A successfully resolved request: the route to invoke and its arguments.
pub struct Resolved<'r> {
    /// The route to invoke. Routes produced by a subroute are owned.
    pub route: Cow<'r, Route>,
    /// The route's handler.
    pub handler: ResourceFn,
    /// The bound handler arguments.
    pub args: BoundArgs,
    /// Values captured from the path by `route`.
    pub captures: Captures,
}

impl Resolved<'_> {
    fn into_owned(self) -> Resolved<'static> {
        Resolved {
            route: Cow::Owned(self.route.into_owned()),
            handler: self.handler,
            args: self.args,
            captures: self.captures,
        }
    }
}

impl std::fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("route", &*self.route)
            .field("args", &self.args)
            .field("captures", &self.captures)
            .finish_non_exhaustive()
    }
}

/// Why no route could serve a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveFailure {
    /// No pattern matched the path.
    #[error("no route matches the path")]
    NotFound,
    /// A pattern matched, but no matching route accepts the method.
    #[error("method not allowed, expected one of: {}", .allowed.join(", "))]
    MethodMismatch {
        /// The union of methods accepted by the matching routes, sorted.
        allowed: Vec<String>,
    },
    /// A pattern and method matched, but the request content type did not.
    #[error("unsupported content type {actual:?}, expected {expected}")]
    ContentTypeMismatch {
        /// The media type the route consumes.
        expected: String,
        /// The media type the request carried.
        actual: Option<String>,
    },
    /// A required parameter had no value.
    #[error("missing required parameter '{name}'")]
    MissingRequired {
        /// The parameter name.
        name: String,
    },
    /// A supplied value could not be coerced.
    #[error("parameter '{name}' expects {expected}, got '{value}'")]
    TypeMismatch {
        /// The parameter name.
        name: String,
        /// The expected type.
        expected: &'static str,
        /// The supplied value.
        value: String,
    },
    /// The request body could not be decoded.
    #[error("{0}")]
    BadRequest(String),
}

impl ResolveFailure {
    /// Returns the status used to report this failure.
    ///
    /// Every failure except a bad body is a 404 unless `strict` is set, in
    /// which case method, parameter, and content-type failures get their own
    /// statuses.
    pub const fn status_code(&self, strict: bool) -> StatusCode {
        match (self, strict) {
            (Self::BadRequest(_), _) => StatusCode::BAD_REQUEST,
            (Self::NotFound, _) | (_, false) => StatusCode::NOT_FOUND,
            (Self::MethodMismatch { .. }, true) => StatusCode::METHOD_NOT_ALLOWED,
            (Self::ContentTypeMismatch { .. }, true) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            (Self::MissingRequired { .. } | Self::TypeMismatch { .. }, true) => {
                StatusCode::FORBIDDEN
            }
        }
    }
}

/// Failure reasons collected while trying candidate routes.
#[derive(Debug, Default)]
struct Failures {
    allowed: BTreeSet<String>,
    content_type: Option<ResolveFailure>,
    binding: Option<ResolveFailure>,
}

impl Failures {
    fn into_failure(self) -> ResolveFailure {
        if !self.allowed.is_empty() {
            return ResolveFailure::MethodMismatch {
                allowed: self.allowed.into_iter().collect(),
            };
        }
        self.content_type
            .or(self.binding)
            .unwrap_or(ResolveFailure::NotFound)
    }
}

/// Resolves `request` against `routes`.
///
/// Failure precedence: a method mismatch on any matching route wins, then a
/// content-type mismatch, then the binding failure of the last route tried.
/// Routes reached through a subroute count the same as top-level ones.
pub fn resolve<'r>(
    routes: &'r [Route],
    request: &Arc<HttpRequest>,
) -> Result<Resolved<'r>, ResolveFailure> {
    let components = split_path(request.path());
    let body = OnceCell::new();
    let mut failures = Failures::default();

    match resolve_in(routes, &components, request, &body, &mut failures, 0)? {
        Some(resolved) => Ok(resolved),
        None => Err(failures.into_failure()),
    }
}

fn resolve_in<'r, 'q>(
    routes: &'r [Route],
    components: &[String],
    request: &'q Arc<HttpRequest>,
    body: &OnceCell<BodyParams<'q>>,
    failures: &mut Failures,
    depth: usize,
) -> Result<Option<Resolved<'r>>, ResolveFailure> {
    let method = request.method();
    let mut remaining = routes;

    while let Some(candidate) = find_match(remaining, components) {
        remaining = candidate.remaining;
        let route = candidate.route;

        let handler = match route.target() {
            RouteTarget::Handler(handler) => handler,
            RouteTarget::Subroute(factory) => {
                if depth >= MAX_SUBROUTE_DEPTH {
                    debug!(route = %route.pattern(), "subroutes nested too deeply, trying next route");
                    continue;
                }
                let Some(inner) = factory(&candidate.captures, request) else {
                    debug!(route = %route.pattern(), "subroute has nothing here, trying next route");
                    continue;
                };
                let rest = &components[candidate.consumed..];
                if let Some(resolved) = resolve_in(&inner, rest, request, body, failures, depth + 1)? {
                    return Ok(Some(resolved.into_owned()));
                }
                debug!(route = %route.pattern(), "no route below the subroute accepted, trying next route");
                continue;
            }
        };

        let outcome = check_and_bind(route, &candidate.captures, request, || {
            body.get_or_try_init(|| BodyParams::from_request(request))
        })
        .map_err(|e| ResolveFailure::BadRequest(e.to_string()))?;

        match outcome {
            BindingOutcome::Bound(args) => {
                debug!(route = %route.pattern(), handler = route.name(), "resolved");
                return Ok(Some(Resolved {
                    route: Cow::Borrowed(route),
                    handler: Arc::clone(handler),
                    args,
                    captures: candidate.captures,
                }));
            }
            BindingOutcome::MethodMismatch => {
                debug!(route = %route.pattern(), %method, "method not accepted, trying next route");
                failures
                    .allowed
                    .extend(route.methods().iter().map(ToString::to_string));
            }
            BindingOutcome::ContentTypeMismatch => {
                debug!(route = %route.pattern(), "content type not accepted, trying next route");
                failures
                    .content_type
                    .get_or_insert_with(|| ResolveFailure::ContentTypeMismatch {
                        expected: route.consumes().unwrap_or_default().to_string(),
                        actual: request.content_type_essence(),
                    });
            }
            BindingOutcome::MissingRequired(name) => {
                debug!(route = %route.pattern(), %name, "missing parameter, trying next route");
                failures.binding = Some(ResolveFailure::MissingRequired { name });
            }
            BindingOutcome::TypeMismatch {
                name,
                expected,
                value,
            } => {
                debug!(route = %route.pattern(), %name, "parameter type mismatch, trying next route");
                failures.binding = Some(ResolveFailure::TypeMismatch {
                    name,
                    expected,
                    value,
                });
            }
        }
    }

    Ok(None)
}
