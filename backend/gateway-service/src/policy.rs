//! Route policy table
//!
//! Each route maps a path prefix to an upstream base URL and, optionally, a
//! required role per HTTP method. Lookup picks the longest matching prefix.
//! A method with no entry, or with an empty role, is not governed.
//!
//! ```json
//! [
//!   { "prefix": "/auth/", "upstream": "http://identity:5001" },
//!   {
//!     "prefix": "/products/",
//!     "upstream": "http://products:8081",
//!     "strip_prefix": "/products",
//!     "roles": { "POST": "admin", "DELETE": "admin" }
//!   }
//! ]
//! ```

use actix_web::http::Method;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRule {
    pub prefix: String,
    pub upstream: String,
    /// Removed from the path before forwarding
    #[serde(default)]
    pub strip_prefix: Option<String>,
    /// HTTP method (any case) -> required role
    #[serde(default)]
    pub roles: HashMap<String, String>,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, upstream: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            upstream: upstream.into(),
            strip_prefix: None,
            roles: HashMap::new(),
        }
    }

    pub fn strip(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    pub fn require(mut self, method: Method, role: impl Into<String>) -> Self {
        self.roles.insert(method.as_str().to_string(), role.into());
        self
    }

    /// Role required for `method`, `None` when the method is not governed
    pub fn required_role(&self, method: &Method) -> Option<&str> {
        self.roles
            .get(method.as_str())
            .map(String::as_str)
            .filter(|role| !role.is_empty())
    }

    fn matches(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        self.prefix.ends_with('/') || rest.is_empty() || rest.starts_with('/')
    }

    /// Upstream URL for `path_and_query`
    pub fn upstream_url(&self, path_and_query: &str) -> String {
        let forwarded = self
            .strip_prefix
            .as_deref()
            .and_then(|strip| path_and_query.strip_prefix(strip))
            .unwrap_or(path_and_query);

        let base = self.upstream.trim_end_matches('/');
        if forwarded.starts_with('/') {
            format!("{base}{forwarded}")
        } else {
            format!("{base}/{forwarded}")
        }
    }

    fn normalized(mut self) -> Self {
        self.roles = self
            .roles
            .into_iter()
            .map(|(method, role)| (method.to_ascii_uppercase(), role))
            .collect();
        self
    }
}

/// Immutable routing table built once at startup
#[derive(Debug, Clone, Default)]
pub struct RoutePolicy {
    routes: Vec<RouteRule>,
}

impl RoutePolicy {
    pub fn new(routes: Vec<RouteRule>) -> Self {
        let mut routes: Vec<RouteRule> = routes.into_iter().map(RouteRule::normalized).collect();
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { routes }
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let routes: Vec<RouteRule> = serde_json::from_str(raw)?;
        Ok(Self::new(routes))
    }

    pub fn routes(&self) -> &[RouteRule] {
        &self.routes
    }

    pub fn match_route(&self, path: &str) -> Option<&RouteRule> {
        self.routes.iter().find(|route| route.matches(path))
    }

    pub fn required_role(&self, method: &Method, path: &str) -> Option<&str> {
        self.match_route(path)
            .and_then(|route| route.required_role(method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RoutePolicy {
        RoutePolicy::new(vec![
            RouteRule::new("/auth/", "http://identity:5001"),
            RouteRule::new("/products/", "http://products:8081")
                .strip("/products")
                .require(Method::POST, "admin")
                .require(Method::GET, ""),
            RouteRule::new("/products/reviews", "http://reviews:8082")
                .require(Method::POST, "user"),
        ])
    }

    #[test]
    fn test_longest_prefix_wins() {
        let policy = policy();

        let route = policy.match_route("/products/reviews/42").unwrap();
        assert_eq!(route.upstream, "http://reviews:8082");

        let route = policy.match_route("/products/brands").unwrap();
        assert_eq!(route.upstream, "http://products:8081");

        assert!(policy.match_route("/blogs/1").is_none());
    }

    #[test]
    fn test_prefix_respects_segment_boundary() {
        let policy = policy();
        // "/products/reviewsX" is not under "/products/reviews"
        let route = policy.match_route("/products/reviewsX").unwrap();
        assert_eq!(route.upstream, "http://products:8081");
    }

    #[test]
    fn test_required_role_lookup() {
        let policy = policy();

        assert_eq!(
            policy.required_role(&Method::POST, "/products/brands"),
            Some("admin")
        );
        // empty role and missing method are both ungoverned
        assert_eq!(policy.required_role(&Method::GET, "/products/brands"), None);
        assert_eq!(policy.required_role(&Method::DELETE, "/products/brands"), None);
        assert_eq!(policy.required_role(&Method::POST, "/auth/login"), None);
        assert_eq!(policy.required_role(&Method::POST, "/unknown"), None);
    }

    #[test]
    fn test_upstream_url() {
        let policy = policy();

        let route = policy.match_route("/products/brands").unwrap();
        assert_eq!(
            route.upstream_url("/products/brands?page=2"),
            "http://products:8081/brands?page=2"
        );

        let route = policy.match_route("/auth/api/v1/login").unwrap();
        assert_eq!(
            route.upstream_url("/auth/api/v1/login"),
            "http://identity:5001/auth/api/v1/login"
        );
    }

    #[test]
    fn test_from_json_normalizes_methods() {
        let policy = RoutePolicy::from_json(
            r#"[{"prefix": "/admin/", "upstream": "http://admin/", "roles": {"delete": "admin"}}]"#,
        )
        .unwrap();

        assert_eq!(policy.required_role(&Method::DELETE, "/admin/x"), Some("admin"));
        let route = policy.match_route("/admin/x").unwrap();
        assert_eq!(route.upstream_url("/admin/x"), "http://admin/admin/x");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(RoutePolicy::from_json("{not json").is_err());
        assert!(RoutePolicy::from_json(r#"[{"prefix": "/x"}]"#).is_err());
    }
}
