//! Route path patterns.
//!
//! A pattern is a `/`-separated sequence of segments. Each segment is either a
//! literal or a named capture:
//!
//! | Syntax        | Matches                                                  |
//! |---------------|----------------------------------------------------------|
//! | `literal`     | exactly that component                                   |
//! | `:name`       | one non-empty component                                  |
//! | `:name?`      | one component, or nothing; only as the last segment      |
//! | `:name+`      | every remaining component, joined with `/`               |
//! | `:name.ext`   | a component ending in `.ext`, capturing what precedes it |
//!
//! A trailing slash is significant: `/docs/` ends in an empty literal segment
//! and does not match `/docs`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use bobo_rs_core::{BoboError, BoboResult};

/// Captured values keyed by capture name.
pub type Captures = HashMap<String, String>;

static CAPTURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^:([A-Za-z][A-Za-z0-9_]*)([?+])?(\.[^/]+)?$").expect("capture regex is valid")
});

/// A named capture within a pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// The capture name, later used to bind a handler parameter.
    pub name: String,
    /// Whether the capture may be absent.
    pub optional: bool,
    /// Whether the capture consumes the rest of the path.
    pub rest: bool,
    /// Literal text that must end the component, such as `.html`.
    pub suffix: Option<String>,
}

impl Capture {
    /// Strips the suffix from a component, if the capture has one.
    fn extract<'a>(&self, component: &'a str) -> Option<&'a str> {
        match &self.suffix {
            Some(suffix) => component.strip_suffix(suffix.as_str()),
            None => Some(component),
        }
    }
}

/// One `/`-delimited piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches a component verbatim.
    Literal(String),
    /// Matches a component (or several, for rest captures) and records it.
    Capture(Capture),
}

/// A compiled path pattern.
///
/// # Examples
///
/// ```
/// use bobo_rs_http::routing::pattern::PathPattern;
///
/// let pattern = PathPattern::compile("/docs/:page.html").unwrap();
/// let captures = pattern.match_path("/docs/intro.html").unwrap();
/// assert_eq!(captures["page"], "intro");
/// assert!(pattern.match_path("/docs/intro").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PathPattern {
    /// Compiles a pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`BoboError::Pattern`] if the pattern does not start with `/`,
    /// contains a malformed capture, repeats a capture name, or has a rest or
    /// optional capture anywhere but the last segment.
    pub fn compile(pattern: &str) -> BoboResult<Self> {
        if pattern.is_empty() {
            return Ok(Self {
                source: String::new(),
                segments: Vec::new(),
            });
        }

        let body = pattern.strip_prefix('/').ok_or_else(|| {
            BoboError::Pattern(format!("'{pattern}' must start with '/'"))
        })?;

        let segments = body
            .split('/')
            .map(|part| parse_segment(pattern, part))
            .collect::<BoboResult<Vec<_>>>()?;

        validate(pattern, &segments)?;

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// Returns the pattern string this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the capture names in pattern order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Capture(capture) => Some(capture.name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches a request path, returning the captures on success.
    pub fn match_path(&self, path: &str) -> Option<Captures> {
        self.match_components(&split_path(path))
    }

    /// Matches already-split, percent-decoded path components.
    ///
    /// Optional captures that matched nothing (or an empty component) are
    /// left out of the returned map.
    pub fn match_components(&self, components: &[String]) -> Option<Captures> {
        self.match_prefix(components)
            .and_then(|(captures, consumed)| (consumed == components.len()).then_some(captures))
    }

    /// Matches the leading components only, for subroutes.
    ///
    /// Returns the captures and how many components the pattern consumed; the
    /// rest of the path is left for the subroute's own routes.
    ///
    /// ```
    /// use bobo_rs_http::routing::pattern::{split_path, PathPattern};
    ///
    /// let pattern = PathPattern::compile("/users/:id").unwrap();
    /// let (captures, consumed) = pattern.match_prefix(&split_path("/users/7/posts")).unwrap();
    /// assert_eq!(captures["id"], "7");
    /// assert_eq!(consumed, 2);
    /// ```
    pub fn match_prefix(&self, components: &[String]) -> Option<(Captures, usize)> {
        let mut captures = Captures::new();
        let mut index = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => {
                    if components.get(index) != Some(text) {
                        return None;
                    }
                    index += 1;
                }
                Segment::Capture(capture) if capture.rest => {
                    let value = components.get(index..)?.join("/");
                    if value.is_empty() {
                        return None;
                    }
                    captures.insert(capture.name.clone(), value);
                    index = components.len();
                }
                Segment::Capture(capture) if capture.optional => {
                    let Some(component) = components.get(index) else {
                        continue;
                    };
                    index += 1;
                    if component.is_empty() {
                        continue;
                    }
                    let value = capture.extract(component)?;
                    if !value.is_empty() {
                        captures.insert(capture.name.clone(), value.to_string());
                    }
                }
                Segment::Capture(capture) => {
                    let value = capture.extract(components.get(index)?)?;
                    if value.is_empty() {
                        return None;
                    }
                    captures.insert(capture.name.clone(), value.to_string());
                    index += 1;
                }
            }
        }

        Some((captures, index))
    }

    /// Returns this pattern mounted under `prefix`.
    ///
    /// ```
    /// use bobo_rs_http::routing::pattern::PathPattern;
    ///
    /// let pattern = PathPattern::compile("/:id").unwrap().prefixed("/users").unwrap();
    /// assert_eq!(pattern.source(), "/users/:id");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`BoboError::Pattern`] if the prefix is empty, does not start
    /// with `/`, ends with `/`, or if the combined pattern is invalid.
    pub fn prefixed(&self, prefix: &str) -> BoboResult<Self> {
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            return Err(BoboError::Pattern(format!(
                "prefix '{prefix}' must start with '/' and not end with '/'"
            )));
        }
        Self::compile(&format!("{prefix}{}", self.source))
    }
}

/// Splits a request path into percent-decoded components.
///
/// ```
/// use bobo_rs_http::routing::pattern::split_path;
///
/// assert_eq!(split_path("/"), vec![""]);
/// assert_eq!(split_path("/a%20b/c/"), vec!["a b", "c", ""]);
/// assert!(split_path("").is_empty());
/// ```
pub fn split_path(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    path.strip_prefix('/')
        .unwrap_or(path)
        .split('/')
        .map(|component| {
            percent_encoding::percent_decode_str(component)
                .decode_utf8_lossy()
                .into_owned()
        })
        .collect()
}

fn parse_segment(pattern: &str, part: &str) -> BoboResult<Segment> {
    if !part.starts_with(':') {
        return Ok(Segment::Literal(part.to_string()));
    }

    let caps = CAPTURE_RE.captures(part).ok_or_else(|| {
        BoboError::Pattern(format!("'{pattern}' has a malformed capture '{part}'"))
    })?;

    let modifier = caps.get(2).map(|m| m.as_str());
    let suffix = caps.get(3).map(|m| m.as_str().to_string());
    let rest = modifier == Some("+");
    if rest && suffix.is_some() {
        return Err(BoboError::Pattern(format!(
            "'{pattern}': rest capture '{part}' cannot have a suffix"
        )));
    }

    Ok(Segment::Capture(Capture {
        name: caps[1].to_string(),
        optional: modifier == Some("?"),
        rest,
        suffix,
    }))
}

fn validate(pattern: &str, segments: &[Segment]) -> BoboResult<()> {
    let mut seen = HashSet::new();
    let last = segments.len().saturating_sub(1);

    for (position, segment) in segments.iter().enumerate() {
        let Segment::Capture(capture) = segment else {
            continue;
        };
        if !seen.insert(capture.name.as_str()) {
            return Err(BoboError::Pattern(format!(
                "'{pattern}' captures '{}' more than once",
                capture.name
            )));
        }
        if capture.rest && position != last {
            return Err(BoboError::Pattern(format!(
                "'{pattern}': rest capture '{}' must be the last segment",
                capture.name
            )));
        }
        if capture.optional && position != last {
            return Err(BoboError::Pattern(format!(
                "'{pattern}': optional capture '{}' must be the last segment",
                capture.name
            )));
        }
    }
    Ok(())
}
