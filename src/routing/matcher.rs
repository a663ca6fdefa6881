//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request method (exact)
//! - Match the path against a template such as `/features/{key}`
//! - Capture template parameters
//!
//! # Design Decisions
//! - Path matching is case-sensitive, segment by segment
//! - A trailing slash is ignored (`/features/` matches `/features`)
//! - No regex to guarantee O(n) matching

use axum::http::Method;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, method: &Method, path: &str) -> bool;
}

/// Matches the request method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: Method,
}

impl MethodMatcher {
    pub fn new(method: Method) -> Self {
        Self { method }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, method: &Method, _path: &str) -> bool {
        *method == self.method
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    template: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template. `{name}` segments capture one path segment.
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let segments = split(&template)
            .map(|seg| {
                match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(name) => Segment::Param(name.to_string()),
                    None => Segment::Literal(seg.to_string()),
                }
            })
            .collect();
        Self { template, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Number of literal segments; more literal routes are tried first.
    pub fn specificity(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Match `path`, returning the captured parameters in template order.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let parts: Vec<&str> = split(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captured = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => captured.push((name.clone(), part.to_string())),
            }
        }
        Some(captured)
    }
}

impl Matcher for PathTemplate {
    fn matches(&self, _method: &Method, path: &str) -> bool {
        self.captures(path).is_some()
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
