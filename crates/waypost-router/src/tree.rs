//! Route tree
//!
//! Index of route and middleware records answering the two questions both
//! the generator and the runtime ask: "in which order are routes tried?"
//! and "which middleware wraps this route?". The runtime additionally uses
//! [`RouteTree::match_request`] to resolve live requests.
//!
//! A tree is built by a single writer; once built it is only read.

use std::collections::HashMap;
use tracing::debug;

use crate::matcher::{CompiledMatcher, PatternError};
use crate::path::{normalize_path, normalize_scope, ScopeHierarchy};
use crate::record::{Method, MiddlewareRecord, ProxyDescriptor, RouteRecord};

/// Result of matching a request against the tree
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteRecord,
    /// Extracted parameters (wildcards keyed by their declared name)
    pub params: HashMap<String, String>,
    /// Middleware chain, outermost first
    pub middleware: Vec<&'a MiddlewareRecord>,
}

#[derive(Debug, Clone)]
struct RegisteredProxy {
    descriptor: ProxyDescriptor,
    matcher: CompiledMatcher,
}

/// Priority-ordered index of routes and scoped middleware
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    routes: Vec<RouteRecord>,
    middleware: Vec<MiddlewareRecord>,
    proxy: Option<RegisteredProxy>,
}

impl RouteTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route; order of insertion breaks priority ties
    pub fn insert_route(&mut self, route: RouteRecord) {
        self.routes.push(route);
    }

    /// Adds a middleware record
    pub fn insert_middleware(&mut self, middleware: MiddlewareRecord) {
        self.middleware.push(middleware);
    }

    /// Registers the proxy stage, compiling its matcher patterns
    ///
    /// A pattern that fails to compile is returned as an error; the tree
    /// keeps whatever proxy it had before.
    pub fn register_proxy(&mut self, descriptor: ProxyDescriptor) -> Result<(), PatternError> {
        let matcher = CompiledMatcher::compile(&descriptor.matcher_patterns)?;
        if let Some(previous) = &self.proxy {
            debug!(
                "Replacing proxy from {:?} with {:?}",
                previous.descriptor.source_file, descriptor.source_file
            );
        }
        self.proxy = Some(RegisteredProxy {
            descriptor,
            matcher,
        });
        Ok(())
    }

    /// Routes in insertion order
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Middleware in insertion order
    pub fn middleware(&self) -> &[MiddlewareRecord] {
        &self.middleware
    }

    pub fn proxy(&self) -> Option<&ProxyDescriptor> {
        self.proxy.as_ref().map(|p| &p.descriptor)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes sorted by descending priority, ties in insertion order
    ///
    /// # Examples
    ///
    /// ```
    /// use waypost_router::{translate_path, Method, RouteRecord, RouteTree};
    ///
    /// let mut tree = RouteTree::new();
    /// for dir in ["docs/[...rest]", "users/[id]", "api/health"] {
    ///     let t = translate_path(dir);
    ///     tree.insert_route(RouteRecord::new(Method::Get, &t, dir, "get"));
    /// }
    ///
    /// let order: Vec<&str> = tree
    ///     .routes_by_priority()
    ///     .iter()
    ///     .map(|r| r.pattern.as_str())
    ///     .collect();
    /// assert_eq!(order, vec!["/api/health", "/users/{id}", "/docs/*"]);
    /// ```
    pub fn routes_by_priority(&self) -> Vec<&RouteRecord> {
        let mut ordered: Vec<&RouteRecord> = self.routes.iter().collect();
        // sort_by is stable
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
        ordered
    }

    /// Middleware applying to `scope`, outermost first
    ///
    /// A middleware applies when its scope is an ancestor of `scope` on
    /// segment boundaries (or is the global empty scope). Route-group
    /// components are compared literally, so `(admin)` never reaches
    /// `(shop)/...` or plain `admin/...`.
    pub fn middleware_chain(&self, scope: &str) -> Vec<&MiddlewareRecord> {
        let mut levels: Vec<&str> = ScopeHierarchy::new(scope).collect();
        levels.reverse();

        levels
            .into_iter()
            .flat_map(|level| {
                self.middleware
                    .iter()
                    .filter(move |m| normalize_scope(&m.scope) == level)
            })
            .collect()
    }

    /// Middleware chain for a specific route
    pub fn chain_for(&self, route: &RouteRecord) -> Vec<&MiddlewareRecord> {
        self.middleware_chain(&route.scope)
    }

    /// Whether the proxy stage runs for `path` (false without a proxy)
    pub fn proxy_applies(&self, path: &str) -> bool {
        self.proxy
            .as_ref()
            .is_some_and(|p| p.descriptor.has_valid_signature && p.matcher.matches(path))
    }

    /// Resolves a live request to a route
    ///
    /// Routes are tried in priority order and the first one whose method and
    /// pattern match wins.
    pub fn match_request(&self, method: Method, path: &str) -> Option<RouteMatch<'_>> {
        let normalized = normalize_path(path);

        self.routes_by_priority()
            .into_iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                match_pattern(route, &normalized).map(|params| RouteMatch {
                    route,
                    params,
                    middleware: self.chain_for(route),
                })
            })
    }

    /// Every method registered for a path, in priority order
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let normalized = normalize_path(path);
        let mut methods: Vec<Method> = self
            .routes_by_priority()
            .into_iter()
            .filter(|route| match_pattern(route, &normalized).is_some())
            .map(|route| route.method)
            .collect();
        methods.sort();
        methods.dedup();
        methods
    }
}

/// Matches a normalized path against a route pattern
fn match_pattern(route: &RouteRecord, path: &str) -> Option<HashMap<String, String>> {
    let pattern_segments: Vec<&str> = route.pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    fn match_segments(
        pattern_segments: &[&str],
        path_segments: &[&str],
        names: &[String],
        optional_wildcard: bool,
        mut params: HashMap<String, String>,
    ) -> Option<HashMap<String, String>> {
        let Some((&pattern_seg, rest_pattern)) = pattern_segments.split_first() else {
            return path_segments.is_empty().then_some(params);
        };

        if pattern_seg == "*" {
            // a required catch-all needs at least one segment
            if path_segments.is_empty() && !optional_wildcard {
                return None;
            }
            let name = names.first().cloned().unwrap_or_else(|| "*".to_string());
            params.insert(name, path_segments.join("/"));
            return Some(params);
        }

        let (&path_seg, rest_path) = path_segments.split_first()?;

        if pattern_seg.starts_with('{') && pattern_seg.ends_with('}') {
            let name = pattern_seg[1..pattern_seg.len() - 1].to_string();
            params.insert(name, path_seg.to_string());
            let names = names.get(1..).unwrap_or_default();
            return match_segments(rest_pattern, rest_path, names, optional_wildcard, params);
        }

        if pattern_seg != path_seg {
            return None;
        }
        match_segments(rest_pattern, rest_path, names, optional_wildcard, params)
    }

    match_segments(
        &pattern_segments,
        &path_segments,
        &route.params,
        route.optional_wildcard,
        HashMap::new(),
    )
}
