//! Mount prefix matching.
//!
//! # Responsibilities
//! - Compile the mount route (plus root) once, at construction
//! - Strip that prefix from an inbound URL to get the upstream-relative path
//!
//! # Design Decisions
//! - Matching is per path segment, so `/gateway` never matches `/gatewayX`
//! - `:param` segments match any single segment
//! - Literal segments are case-sensitive
//! - The query string is carried over untouched
//! - No regex to guarantee O(n) matching

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// Precompiled mount prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountMatcher {
    segments: Vec<Segment>,
}

impl MountMatcher {
    /// Compile the prefix `mount_route` + `root`.
    pub fn new(mount_route: &str, root: &str) -> Self {
        let segments = mount_route
            .split('/')
            .chain(root.split('/'))
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with(':') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    /// Upstream-relative path for `original_url`, without a leading slash.
    ///
    /// A URL that does not start with the prefix is returned whole, minus its
    /// leading slashes.
    pub fn strip(&self, original_url: &str) -> String {
        let (path, query) = match original_url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (original_url, None),
        };

        let relative = self.strip_path(path).unwrap_or(path).trim_start_matches('/');
        match query {
            Some(query) => format!("{relative}?{query}"),
            None => relative.to_string(),
        }
    }

    fn strip_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        let mut rest = path.trim_start_matches('/');
        for segment in &self.segments {
            let (head, tail) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, ""),
            };
            let matched = match segment {
                Segment::Literal(literal) => head == literal,
                Segment::Param => !head.is_empty(),
            };
            if !matched {
                return None;
            }
            rest = tail.trim_start_matches('/');
        }
        Some(rest)
    }
}

/// Upstream-relative path of `original_url` under `mount_route` and `root`.
pub fn relative_path(original_url: &str, mount_route: &str, root: &str) -> String {
    MountMatcher::new(mount_route, root).strip(original_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_mount_route() {
        assert_eq!(relative_path("/my-gateway/my-path/one", "/my-gateway", ""), "my-path/one");
    }

    #[test]
    fn test_strips_root_and_keeps_query() {
        assert_eq!(
            relative_path("/my-gateway/my-root/my-path/one?x=1&y=2", "/my-gateway", "my-root"),
            "my-path/one?x=1&y=2"
        );
    }

    #[test]
    fn test_param_segments() {
        assert_eq!(relative_path("/gw/acme/users/7", "/gw/:tenant", ""), "users/7");
    }

    #[test]
    fn test_segment_boundaries() {
        assert_eq!(relative_path("/my-gatewayX/one", "/my-gateway", ""), "my-gatewayX/one");
    }

    #[test]
    fn test_root_mount() {
        assert_eq!(relative_path("/users?page=2", "/", ""), "users?page=2");
    }

    #[test]
    fn test_exact_prefix() {
        assert_eq!(relative_path("/my-gateway", "/my-gateway", ""), "");
        assert_eq!(relative_path("/my-gateway/?a=b", "/my-gateway", ""), "?a=b");
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(relative_path("/My-Gateway/one", "/my-gateway", ""), "My-Gateway/one");
    }
}
