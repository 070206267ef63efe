/// Lazy iterator over the ancestors of a scope string
///
/// For scope `(admin)/users/{id}`, yields:
/// `(admin)/users/{id}` → `(admin)/users` → `(admin)` → `""`
///
/// The empty scope is the global root and is always yielded last. Only
/// borrows from the input; no allocations.
///
/// # Examples
///
/// ```
/// use waypost_router::path::ScopeHierarchy;
///
/// let scopes: Vec<&str> = ScopeHierarchy::new("a/b/c").collect();
/// assert_eq!(scopes, vec!["a/b/c", "a/b", "a", ""]);
///
/// let scopes: Vec<&str> = ScopeHierarchy::new("").collect();
/// assert_eq!(scopes, vec![""]);
/// ```
#[derive(Debug, Clone)]
pub struct ScopeHierarchy<'a> {
    current: Option<&'a str>,
}

impl<'a> ScopeHierarchy<'a> {
    /// Creates a hierarchy starting at `scope` (surrounding slashes ignored)
    pub fn new(scope: &'a str) -> Self {
        Self {
            current: Some(super::normalize_scope(scope)),
        }
    }
}

impl<'a> Iterator for ScopeHierarchy<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;

        self.current = if current.is_empty() {
            None
        } else if let Some(slash_pos) = current.rfind('/') {
            Some(&current[..slash_pos])
        } else {
            Some("")
        };

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_hierarchy_with_group() {
        let scopes: Vec<&str> = ScopeHierarchy::new("(dashboard)/apps").collect();
        assert_eq!(scopes, vec!["(dashboard)/apps", "(dashboard)", ""]);
    }

    #[test]
    fn test_scope_hierarchy_short_circuit() {
        let mut iter = ScopeHierarchy::new("a/b/c/d");
        let found = iter.find(|s| s.len() <= 3);
        assert_eq!(found, Some("a/b"));
        assert_eq!(iter.next(), Some("a"));
    }

    #[test]
    fn test_scope_hierarchy_ignores_slashes() {
        let scopes: Vec<&str> = ScopeHierarchy::new("/users/").collect();
        assert_eq!(scopes, vec!["users", ""]);
    }
}
