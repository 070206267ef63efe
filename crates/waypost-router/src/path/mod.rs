//! Path utilities for validation and normalization
//!
//! All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;

pub mod hierarchy;
pub use hierarchy::ScopeHierarchy;

/// Validates if a request path is in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not end with `/` (except root `/`)
/// - Must not be empty
///
/// # Examples
///
/// ```
/// use waypost_router::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/users/123"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("about"));
/// assert!(!is_valid_path("/about/"));
/// assert!(!is_valid_path("/about//page"));
/// assert!(!is_valid_path("/about\\page"));
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalize a request path to canonical form
///
/// Returns `Cow::Borrowed` when the input is already valid and a single
/// owned allocation otherwise.
///
/// - Trailing slashes: `/path/` → `/path`
/// - Double slashes: `/path//to` → `/path/to`
/// - Backslashes: `\path\to` → `/path/to`
///
/// # Examples
///
/// ```
/// use waypost_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/about"), Cow::Borrowed("/about")));
/// assert_eq!(normalize_path("/about/"), "/about");
/// assert_eq!(normalize_path("\\users\\123"), "/users/123");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}

/// Trims a scope string to its canonical form (no leading or trailing `/`)
pub fn normalize_scope(scope: &str) -> &str {
    scope.trim_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_double_slash() {
        assert_eq!(normalize_path("/about//page"), "/about/page");
        assert_eq!(normalize_path("/path///to////page"), "/path/to/page");
    }

    #[test]
    fn test_normalize_path_backslash() {
        assert_eq!(normalize_path("\\about"), "/about");
        assert_eq!(normalize_path("/about\\page"), "/about/page");
    }

    #[test]
    fn test_normalize_scope() {
        assert_eq!(normalize_scope("/(admin)/users/"), "(admin)/users");
        assert_eq!(normalize_scope("/"), "");
    }
}
