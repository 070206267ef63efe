//! Module alias allocation for the generated file
//!
//! Aliases live for a single generation run. Every distinct module path gets
//! exactly one alias; when two modules share a base alias the later ones get
//! an increasing numeric suffix (`id_route`, `id_route2`, `id_route3`).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct AliasAllocator {
    assigned: Vec<(PathBuf, String)>,
    by_module: HashMap<PathBuf, usize>,
    next_suffix: HashMap<String, u32>,
    taken: HashSet<String>,
}

impl AliasAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias for `module`, allocating one from `base` on first sight
    pub fn alias_for(&mut self, module: &Path, base: &str) -> &str {
        let index = match self.by_module.get(module) {
            Some(&index) => index,
            None => {
                let alias = self.unique(base);
                self.assigned.push((module.to_path_buf(), alias));
                self.by_module.insert(module.to_path_buf(), self.assigned.len() - 1);
                self.assigned.len() - 1
            }
        };
        &self.assigned[index].1
    }

    /// Previously allocated alias
    pub fn get(&self, module: &Path) -> Option<&str> {
        self.by_module
            .get(module)
            .map(|&index| self.assigned[index].1.as_str())
    }

    /// Modules with their aliases, in allocation order
    pub fn modules(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.assigned
            .iter()
            .map(|(module, alias)| (module.as_path(), alias.as_str()))
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    fn unique(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            self.next_suffix.insert(base.to_string(), 2);
            return base.to_string();
        }

        let next = self.next_suffix.entry(base.to_string()).or_insert(2);
        loop {
            let candidate = format!("{}{}", base, next);
            *next += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_same_module_same_alias() {
        let mut aliases = AliasAllocator::new();
        let first = aliases.alias_for(Path::new("app/users/route.rs"), "users_route").to_string();
        let again = aliases.alias_for(Path::new("app/users/route.rs"), "users_route").to_string();
        assert_eq!(first, again);
        assert_eq!(aliases.len(), 1);
    }

    #[test]
    fn test_collisions_get_increasing_suffixes() {
        let mut aliases = AliasAllocator::new();
        for module in ["app/a/[id]/route.rs", "app/b/[id]/route.rs", "app/c/[id]/route.rs"] {
            aliases.alias_for(Path::new(module), "id_route");
        }
        let names: Vec<&str> = aliases.modules().map(|(_, alias)| alias).collect();
        assert_eq!(names, vec!["id_route", "id_route2", "id_route3"]);
    }

    #[test]
    fn test_suffix_skips_names_already_taken() {
        let mut aliases = AliasAllocator::new();
        aliases.alias_for(Path::new("x"), "page2");
        aliases.alias_for(Path::new("y"), "page");
        aliases.alias_for(Path::new("z"), "page");
        assert_eq!(aliases.get(Path::new("z")), Some("page3"));
    }

    #[test]
    fn test_runs_are_independent() {
        let mut first = AliasAllocator::new();
        first.alias_for(Path::new("a"), "root_route");
        first.alias_for(Path::new("b"), "root_route");

        let mut second = AliasAllocator::new();
        assert_eq!(second.alias_for(Path::new("b"), "root_route"), "root_route");
    }
}
