//! Compiled route table and specificity-based lookup.
//!
//! [`RouteTable::build`] turns a loaded [`Config`] into ready-to-serve
//! routes: the pattern is split into an optional method and path
//! segments, headers and status are parsed once, and scripts are
//! compiled into the table's [`ScriptEngine`]. Building performs no I/O.
//!
//! Lookup scores every route whose segments match the percent-decoded
//! request path. A pattern ending in `/` is a subtree and also matches
//! any longer path below it. Among candidates an exact-length route beats
//! a subtree, a longer subtree beats a shorter one, then, compared left to
//! right, a literal segment beats a `{wildcard}` segment at the first
//! position where two candidates differ. Last, a route bound to the
//! request method beats a `GET` route answering `HEAD`, which beats a
//! method-less one.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use bytes::Bytes;
use chrono::NaiveDate;
use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use percent_encoding::percent_decode_str;

use super::wildcard;
use crate::config::model::{Config, Route};
use crate::error::MockError;
use crate::latency::Latency;
use crate::recorder::record_file_name;
use crate::render::{render_literal, RenderContext, RenderError, ScriptEngine};

pub type PathParams = HashMap<String, String>;

/// Split `"GET /a/b"` into `(Some("GET"), "/a/b")`; a bare path has no method.
#[must_use]
pub fn split_pattern(pattern: &str) -> (Option<&str>, &str) {
    let trimmed = pattern.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((method, path)) => (Some(method), path.trim()),
        None => (None, trimmed),
    }
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Percent-decoded request segments, or `None` when one is not UTF-8.
fn decode_segments(path: &str) -> Option<Vec<Cow<'_, str>>> {
    path_segments(path)
        .map(|raw| percent_decode_str(raw).decode_utf8().ok())
        .collect()
}

/// Preference among method matches: exact, then `GET` serving `HEAD`,
/// then a method-less route.
fn method_rank(route: Option<&Method>, request: &Method) -> Option<u8> {
    match route {
        None => Some(0),
        Some(m) if m == request => Some(2),
        Some(m) if *m == Method::GET && *request == Method::HEAD => Some(1),
        Some(_) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    Wildcard(String),
}

#[derive(Debug)]
pub struct CompiledRoute {
    definition: Route,
    method: Option<Method>,
    segments: Vec<Segment>,
    subtree: bool,
    status: StatusCode,
    headers: HeaderMap,
    script: Option<String>,
}

impl CompiledRoute {
    fn compile(index: usize, definition: &Route) -> Result<Self, MockError> {
        let invalid = |message: String| MockError::InvalidRoute {
            pattern: definition.path.clone(),
            message,
        };

        let (method, path) = split_pattern(&definition.path);
        let method = method
            .map(|m| Method::from_bytes(m.as_bytes()))
            .transpose()
            .map_err(|_| invalid("invalid method".into()))?;
        if !path.starts_with('/') {
            return Err(invalid("path must start with '/'".into()));
        }

        let mut bound = HashSet::new();
        let mut segments = Vec::new();
        for raw in path_segments(path) {
            if let Some(name) = wildcard::segment_name(raw) {
                if !bound.insert(name) {
                    return Err(invalid(format!("wildcard '{name}' is bound twice")));
                }
                segments.push(Segment::Wildcard(name.to_string()));
            } else if raw.contains('{') || raw.contains('}') {
                return Err(invalid(format!(
                    "segment '{raw}' must be a whole '{{name}}' wildcard or a literal"
                )));
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        let subtree = path.ends_with('/');

        let status = StatusCode::from_u16(definition.status)
            .map_err(|_| invalid(format!("invalid status {}", definition.status)))?;

        let mut headers = HeaderMap::new();
        let content_type = HeaderValue::from_str(&definition.content_type)
            .map_err(|_| invalid("invalid content_type".into()))?;
        headers.insert(CONTENT_TYPE, content_type);
        for (name, value) in &definition.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| invalid(format!("invalid header name '{name}'")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| invalid(format!("invalid value for header '{name}'")))?;
            headers.insert(name, value);
        }

        Ok(Self {
            definition: definition.clone(),
            method,
            segments,
            subtree,
            status,
            headers,
            script: definition
                .script
                .as_ref()
                .map(|_| format!("route-{index}")),
        })
    }

    /// Captured params when `request` matches this route's path shape.
    /// A subtree route only looks at its own leading segments.
    fn capture(&self, request: &[Cow<'_, str>]) -> Option<PathParams> {
        let fits = if self.subtree {
            request.len() >= self.segments.len()
        } else {
            request.len() == self.segments.len()
        };
        if !fits {
            return None;
        }
        let mut params = PathParams::new();
        for (segment, value) in self.segments.iter().zip(request) {
            match segment {
                Segment::Literal(lit) if lit.as_str() == &**value => {}
                Segment::Literal(_) => return None,
                Segment::Wildcard(name) => {
                    params.insert(name.clone(), value.to_string());
                }
            }
        }
        Some(params)
    }

    fn specificity(&self, method_rank: u8) -> Specificity {
        let literals = self
            .segments
            .iter()
            .map(|s| matches!(s, Segment::Literal(_)))
            .collect();
        (!self.subtree, self.segments.len(), literals, method_rank)
    }

    /// Identity used for duplicate detection; wildcard names do not count.
    fn shape(&self) -> (Option<&Method>, Vec<Option<&str>>, bool) {
        let segments = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Literal(lit) => Some(lit.as_str()),
                Segment::Wildcard(_) => None,
            })
            .collect();
        (self.method.as_ref(), segments, self.subtree)
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.definition.path
    }

    #[must_use]
    pub fn wildcards(&self) -> &[String] {
        &self.definition.wildcards
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Content type plus the configured extra headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub const fn latency(&self) -> Latency {
        self.definition.latency()
    }

    #[must_use]
    pub const fn records(&self) -> bool {
        self.definition.record
    }

    #[must_use]
    pub const fn is_scripted(&self) -> bool {
        self.script.is_some()
    }
}

/// Exact before subtree, longer subtree first, literal flags left to
/// right, then method rank.
type Specificity = (bool, usize, Vec<bool>, u8);

#[derive(Debug)]
pub enum Resolution<'a> {
    Matched(&'a CompiledRoute, PathParams),
    /// The path exists under other methods only.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
    scripts: ScriptEngine,
    record_dir: PathBuf,
}

impl RouteTable {
    pub fn build(config: &Config) -> Result<Self, MockError> {
        let mut routes: Vec<CompiledRoute> = Vec::with_capacity(config.routes.len());
        let mut scripts = ScriptEngine::new();

        for (index, definition) in config.routes.iter().enumerate() {
            let route = CompiledRoute::compile(index, definition)?;

            if let Some(existing) = routes.iter().find(|r| r.shape() == route.shape()) {
                return Err(MockError::DuplicateRoute {
                    pattern: definition.path.clone(),
                    existing: existing.pattern().to_string(),
                });
            }

            if let (Some(name), Some(source)) = (&route.script, &definition.script) {
                scripts
                    .register(name, source)
                    .map_err(|source| MockError::Script {
                        pattern: definition.path.clone(),
                        source,
                    })?;
            }

            routes.push(route);
        }

        Ok(Self {
            routes,
            scripts,
            record_dir: PathBuf::from(&config.record_dir),
        })
    }

    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_> {
        let Some(request) = decode_segments(path) else {
            return Resolution::NotFound;
        };

        let mut best: Option<(&CompiledRoute, PathParams, Specificity)> = None;
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(params) = route.capture(&request) else {
                continue;
            };
            let Some(rank) = method_rank(route.method.as_ref(), method) else {
                if let Some(m) = &route.method {
                    allow(&mut allowed, m.clone());
                    if *m == Method::GET {
                        allow(&mut allowed, Method::HEAD);
                    }
                }
                continue;
            };

            let specificity = route.specificity(rank);
            if best.as_ref().map_or(true, |(_, _, s)| specificity > *s) {
                best = Some((route, params, specificity));
            }
        }

        match best {
            Some((route, params, _)) => Resolution::Matched(route, params),
            None if !allowed.is_empty() => {
                allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                Resolution::MethodNotAllowed(allowed)
            }
            None => Resolution::NotFound,
        }
    }

    /// Render the response body of `route` for one request.
    pub fn render(&self, route: &CompiledRoute, ctx: &RenderContext) -> Result<Bytes, RenderError> {
        match &route.script {
            Some(name) => self.scripts.render(name, ctx),
            None => Ok(Bytes::from(render_literal(
                &route.definition.body,
                route.wildcards(),
                ctx,
            ))),
        }
    }

    /// Log file for `route` on `date`, under this table's record directory.
    #[must_use]
    pub fn record_path(&self, route: &CompiledRoute, date: NaiveDate) -> PathBuf {
        self.record_dir
            .join(record_file_name(route.pattern(), date))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.routes.iter()
    }
}

fn allow(allowed: &mut Vec<Method>, method: Method) {
    if !allowed.contains(&method) {
        allowed.push(method);
    }
}
