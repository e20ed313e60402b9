/// Anchored, segment-aware glob matching for route path filters.
///
/// Syntax: `*` matches exactly one path segment, `**` matches any number of
/// segments including zero. Matches are anchored over the whole path, never
/// substring matches.
pub fn is_wildcard_match(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match_segments(&pattern_segments, &path_segments)
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => {
            // `**` absorbs zero or more segments.
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((&"*", rest)) => match path.split_first() {
            Some((_, path_rest)) => match_segments(rest, path_rest),
            None => false,
        },
        Some((literal, rest)) => match path.split_first() {
            Some((segment, path_rest)) => literal == segment && match_segments(rest, path_rest),
            None => false,
        },
    }
}

/// A path is included iff it matches at least one allow pattern and no deny
/// pattern.
pub fn is_allowed(path: &str, allowed: &[String], denied: &[String]) -> bool {
    let allowed_match = allowed.iter().any(|p| is_wildcard_match(p, path));
    let denied_match = denied.iter().any(|p| is_wildcard_match(p, path));
    allowed_match && !denied_match
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_star_crosses_segments() {
        assert!(is_wildcard_match("/api/foo/**", "/api/foo/bar/baz"));
        assert!(is_wildcard_match("/api/foo/**", "/api/foo"));
        assert!(is_wildcard_match("**", "/anything/at/all"));
        assert!(is_wildcard_match("**", "/"));
    }

    #[test]
    fn test_single_star_matches_one_segment_only() {
        assert!(is_wildcard_match("/api/foo/*", "/api/foo/bar"));
        assert!(!is_wildcard_match("/api/foo/*", "/api/foo/bar/baz"));
        assert!(!is_wildcard_match("/api/foo/*", "/api/foo"));
    }

    #[test]
    fn test_match_is_anchored() {
        assert!(!is_wildcard_match("/foo", "/api/foo"));
        assert!(!is_wildcard_match("/api", "/api/foo"));
        assert!(is_wildcard_match("/api/foo", "/api/foo"));
    }

    #[test]
    fn test_mixed_wildcards() {
        assert!(is_wildcard_match("/api/*/items/**", "/api/v1/items"));
        assert!(is_wildcard_match("/api/*/items/**", "/api/v1/items/1/tags"));
        assert!(!is_wildcard_match("/api/*/items/**", "/api/v1/v2/items"));
    }

    #[test]
    fn test_allow_deny_combination() {
        let allowed = vec!["/api/**".to_string()];
        let denied = vec!["/api/internal/**".to_string()];
        assert!(is_allowed("/api/todos", &allowed, &denied));
        assert!(!is_allowed("/api/internal/debug", &allowed, &denied));
        assert!(!is_allowed("/other", &allowed, &denied));
    }
}
