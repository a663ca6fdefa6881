//! Authenticated identity.

use serde::Serialize;

/// Subject used for requests to public routes.
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

/// The identity and permission set resolved for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub permissions: Vec<String>,
}

impl Principal {
    pub fn new(subject: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            permissions,
        }
    }

    /// Principal for public routes: no credential, no permissions.
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_SUBJECT, Vec::new())
    }

    pub fn is_anonymous(&self) -> bool {
        self.subject == ANONYMOUS_SUBJECT && self.permissions.is_empty()
    }

    /// True if the principal holds at least one of `required`.
    pub fn has_any(&self, required: &[String]) -> bool {
        required.iter().any(|perm| self.permissions.contains(perm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_any() {
        let p = Principal::new("u1", vec!["ViewFeature".into(), "CreateFeature".into()]);
        assert!(p.has_any(&["DeleteFeature".into(), "ViewFeature".into()]));
        assert!(!p.has_any(&["DeleteFeature".into()]));
        assert!(!p.has_any(&[]));
    }

    #[test]
    fn test_anonymous() {
        assert!(Principal::anonymous().is_anonymous());
        assert!(!Principal::new("u1", vec![]).is_anonymous());
    }
}
