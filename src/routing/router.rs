//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) template scan (acceptable for typical route counts)
//! - Explicit `RouteNotFound` rather than silent default

use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::admission::PUBLIC_PERMISSION;
use crate::errors::SequenceError;
use crate::handler::Handler;
use crate::params::{BodySpec, ParamSpec};
use crate::routing::matcher::{Matcher, MethodMatcher, PathTemplate};

/// Everything the pipeline needs to know about one endpoint.
pub struct RouteDescriptor {
    name: String,
    method: Method,
    template: PathTemplate,
    params: Vec<ParamSpec>,
    body: BodySpec,
    permissions: Vec<String>,
    handler: Arc<dyn Handler>,
}

impl RouteDescriptor {
    pub fn new(
        name: impl Into<String>,
        method: Method,
        path: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            template: PathTemplate::new(path),
            params: Vec::new(),
            body: BodySpec::None,
            permissions: Vec::new(),
            handler,
        }
    }

    /// Declare a parameter (path, query or header).
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Declare a JSON request body.
    pub fn json_body(mut self, required: bool) -> Self {
        self.body = BodySpec::Json { required };
        self
    }

    /// Permissions of which the principal must hold at least one.
    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the route as open to anonymous callers.
    pub fn public(mut self) -> Self {
        self.permissions = vec![PUBLIC_PERMISSION.to_string()];
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.template.as_str()
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn body(&self) -> &BodySpec {
        &self.body
    }

    pub fn required_permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn is_public(&self) -> bool {
        self.permissions.iter().any(|p| p == PUBLIC_PERMISSION)
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.template.as_str())
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

/// A resolved route plus the path parameters captured from the URL.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    route: Arc<RouteDescriptor>,
    path_params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn route(&self) -> &Arc<RouteDescriptor> {
        &self.route
    }

    pub fn path_params(&self) -> &[(String, String)] {
        &self.path_params
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// The compiled route table.
#[derive(Debug)]
pub struct Router {
    routes: Vec<(MethodMatcher, Arc<RouteDescriptor>)>,
}

impl Router {
    /// Compile the routes. Routes with more literal segments win over
    /// parameterized ones; ties keep declaration order.
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        let mut routes: Vec<_> = routes
            .into_iter()
            .map(|r| (MethodMatcher::new(r.method.clone()), Arc::new(r)))
            .collect();
        routes.sort_by_key(|(_, r)| std::cmp::Reverse(r.template.specificity()));

        for (_, route) in &routes {
            tracing::debug!(
                name = %route.name(),
                method = %route.method(),
                path = %route.path(),
                "Route registered"
            );
        }

        Self { routes }
    }

    /// Find the route for `method` and `path`.
    pub fn find(&self, method: &Method, path: &str) -> Result<RouteMatch, SequenceError> {
        self.routes
            .iter()
            .filter(|(m, _)| m.matches(method, path))
            .find_map(|(_, route)| {
                route.template.captures(path).map(|path_params| RouteMatch {
                    route: route.clone(),
                    path_params,
                })
            })
            .ok_or_else(|| SequenceError::RouteNotFound {
                method: method.clone(),
                path: path.to_string(),
            })
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteDescriptor>> {
        self.routes.iter().map(|(_, r)| r)
    }
}
