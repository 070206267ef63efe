//! Import-path sanitizer
//!
//! Directory names such as `[id]` or `(admin)` cannot be spelled as Rust
//! module paths. Every directory holding such a segment gets a legal alias
//! path (`users/param_id`), and when materializing is enabled the files the
//! generated module needs are linked under that alias inside a staging
//! directory. Directories made only of legal segments are left alone and
//! imported from where they are.
//!
//! Staging is idempotent: existing correct links are kept, stale ones the
//! sanitizer created earlier are repaired or removed, and anything it did not
//! create is never touched. The set of created entries is tracked in a
//! manifest inside the staging directory.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use waypost_parser::STAGING_MANIFEST;
use waypost_router::{classify_segment, Segment};

use crate::alias::AliasAllocator;
use crate::error::{GenerateError, Result};

/// Whether `segment` is usable as a Rust module name as written
///
/// ```
/// use waypost_codegen::sanitize::is_legal_segment;
///
/// assert!(is_legal_segment("users"));
/// assert!(!is_legal_segment("[id]"));
/// assert!(!is_legal_segment("user-settings"));
/// assert!(!is_legal_segment("type"));
/// ```
pub fn is_legal_segment(segment: &str) -> bool {
    syn::parse_str::<syn::Ident>(segment).is_ok()
}

/// Legal module name for a directory segment
///
/// ```
/// use waypost_codegen::sanitize::sanitize_segment;
///
/// assert_eq!(sanitize_segment("users"), "users");
/// assert_eq!(sanitize_segment("[id]"), "param_id");
/// assert_eq!(sanitize_segment("[...slug]"), "catchall_slug");
/// assert_eq!(sanitize_segment("[[...slug]]"), "opt_catchall_slug");
/// assert_eq!(sanitize_segment("(admin)"), "group_admin");
/// assert_eq!(sanitize_segment("2024"), "_2024");
/// assert_eq!(sanitize_segment("type"), "type_");
/// ```
pub fn sanitize_segment(segment: &str) -> Cow<'_, str> {
    if is_legal_segment(segment) {
        return Cow::Borrowed(segment);
    }

    let prefixed = match classify_segment(segment) {
        Segment::Param(name) => format!("param_{}", name),
        Segment::Wildcard {
            name,
            optional: true,
        } => format!("opt_catchall_{}", name),
        Segment::Wildcard { name, .. } => format!("catchall_{}", name),
        Segment::GroupStripped(name) => format!("group_{}", name),
        Segment::Literal(_) | Segment::Skip => segment.to_string(),
    };

    let mut ident: String = prefixed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if !is_legal_segment(&ident) {
        ident.push('_');
    }
    Cow::Owned(ident)
}

/// One directory whose path needed an alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportMapping {
    /// Directory relative to the app root, as on disk
    pub original_dir: PathBuf,
    /// The same directory with every segment made legal
    pub alias_dir: PathBuf,
    /// Where the files are linked, when materializing
    pub materialized_dir: Option<PathBuf>,
    /// File names linked into the alias directory
    pub files: BTreeSet<String>,
}

/// Mappings for the modules of one generation run
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    app_dir: PathBuf,
    mappings: BTreeMap<PathBuf, ImportMapping>,
}

impl ImportPlan {
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Mappings ordered by original directory
    pub fn mappings(&self) -> impl Iterator<Item = &ImportMapping> {
        self.mappings.values()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn mapping_for(&self, file: &Path) -> Option<&ImportMapping> {
        let dir = file.parent()?.strip_prefix(&self.app_dir).ok()?;
        self.mappings.get(dir)
    }

    /// Path the generated module should import `file` from
    pub fn resolve(&self, file: &Path) -> PathBuf {
        let staged = self.mapping_for(file).and_then(|mapping| {
            let dir = mapping.materialized_dir.as_ref()?;
            Some(dir.join(file.file_name()?))
        });
        staged.unwrap_or_else(|| file.to_path_buf())
    }
}

/// What a staging pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StagingReport {
    pub created: usize,
    pub repaired: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl StagingReport {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.repaired == 0 && self.removed == 0
    }
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Manifest {
    /// Links (or copies) relative to the staging directory
    entries: BTreeSet<PathBuf>,
    /// Directories created for them, relative to the staging directory
    dirs: BTreeSet<PathBuf>,
    /// The staging directory itself was created by us
    owns_root: bool,
}

#[derive(Debug, Clone)]
pub struct ImportSanitizer {
    app_dir: PathBuf,
    staging_dir: PathBuf,
    materialize: bool,
}

impl ImportSanitizer {
    pub fn new(app_dir: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
            staging_dir: staging_dir.into(),
            materialize: true,
        }
    }

    pub fn materialize(mut self, materialize: bool) -> Self {
        self.materialize = materialize;
        self
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Computes mappings for the files the generated module imports
    ///
    /// Aliases are allocated in directory order, so two directories that
    /// sanitize to the same alias (`a-b`, `a.b`) get `a_b` and `a_b2`
    /// regardless of the order files are passed in.
    pub fn plan<'a, I>(&self, files: I) -> ImportPlan
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut irregular: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();

        for file in files {
            let (Some(dir), Some(name)) = (file.parent(), file.file_name()) else {
                continue;
            };
            let Ok(rel_dir) = dir.strip_prefix(&self.app_dir) else {
                continue;
            };
            if rel_dir.iter().all(|s| is_legal_segment(&s.to_string_lossy())) {
                continue;
            }

            irregular
                .entry(rel_dir.to_path_buf())
                .or_default()
                .insert(name.to_string_lossy().into_owned());
        }

        let mut aliases = AliasAllocator::new();
        let mappings = irregular
            .into_iter()
            .map(|(original_dir, files)| {
                let base = original_dir
                    .iter()
                    .map(|s| sanitize_segment(&s.to_string_lossy()).into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                let alias_dir = PathBuf::from(aliases.alias_for(&original_dir, &base));
                let mapping = ImportMapping {
                    original_dir: original_dir.clone(),
                    materialized_dir: self
                        .materialize
                        .then(|| self.staging_dir.join(&alias_dir)),
                    alias_dir,
                    files,
                };
                (original_dir, mapping)
            })
            .collect();

        ImportPlan {
            app_dir: self.app_dir.clone(),
            mappings,
        }
    }

    /// Brings the staging directory in line with `plan`
    pub fn stage(&self, plan: &ImportPlan) -> Result<StagingReport> {
        let manifest_path = self.staging_dir.join(STAGING_MANIFEST);
        let previous = self.load_manifest(&manifest_path)?;

        let mut report = StagingReport::default();
        let mut next = Manifest {
            entries: BTreeSet::new(),
            dirs: previous.dirs.clone(),
            owns_root: previous.owns_root,
        };

        let wanted: Vec<(PathBuf, PathBuf)> = plan
            .mappings()
            .filter(|mapping| mapping.materialized_dir.is_some())
            .flat_map(|mapping| {
                mapping.files.iter().map(move |file| {
                    (
                        mapping.alias_dir.join(file),
                        self.app_dir.join(&mapping.original_dir).join(file),
                    )
                })
            })
            .collect();

        if !wanted.is_empty() && !self.staging_dir.exists() {
            create_dir(&self.staging_dir)?;
            next.owns_root = true;
        }

        for (rel_link, target) in &wanted {
            let link = self.staging_dir.join(rel_link);
            let owned = previous.entries.contains(rel_link);

            self.ensure_parent(rel_link, &mut next)?;
            match place(&link, target, owned)? {
                Placement::Created => report.created += 1,
                Placement::Repaired => report.repaired += 1,
                Placement::Unchanged => report.unchanged += 1,
            }
            next.entries.insert(rel_link.clone());
        }

        for stale in previous.entries.difference(&next.entries) {
            let path = self.staging_dir.join(stale);
            if fs::symlink_metadata(&path).is_ok() {
                fs::remove_file(&path).map_err(|e| GenerateError::io("remove", &path, e))?;
                debug!("Removed stale staging entry {:?}", path);
                report.removed += 1;
            }
        }

        self.prune_dirs(&mut next);

        if next.entries.is_empty() {
            if manifest_path.exists() {
                fs::remove_file(&manifest_path)
                    .map_err(|e| GenerateError::io("remove", &manifest_path, e))?;
            }
            if next.owns_root && fs::remove_dir(&self.staging_dir).is_ok() {
                debug!("Removed empty staging directory {:?}", self.staging_dir);
            }
        } else if next != previous {
            let json = serde_json::to_string_pretty(&next).map_err(|source| {
                GenerateError::Manifest {
                    path: manifest_path.clone(),
                    source,
                }
            })?;
            fs::write(&manifest_path, json + "\n")
                .map_err(|e| GenerateError::io("write", &manifest_path, e))?;
        }

        if !report.is_noop() {
            info!(
                "Staged imports in {:?}: {} created, {} repaired, {} removed",
                self.staging_dir, report.created, report.repaired, report.removed
            );
        }
        Ok(report)
    }

    fn load_manifest(&self, path: &Path) -> Result<Manifest> {
        match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| GenerateError::Manifest {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Manifest::default()),
            Err(e) => Err(GenerateError::io("read", path, e)),
        }
    }

    /// Creates the directories above `rel_link`, remembering the new ones
    fn ensure_parent(&self, rel_link: &Path, manifest: &mut Manifest) -> Result<()> {
        let Some(parent) = rel_link.parent() else {
            return Ok(());
        };

        let mut missing: Vec<&Path> = parent
            .ancestors()
            .filter(|dir| !dir.as_os_str().is_empty())
            .filter(|dir| !self.staging_dir.join(dir).exists())
            .collect();
        missing.reverse();

        for dir in missing {
            create_dir(&self.staging_dir.join(dir))?;
            manifest.dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }

    /// Removes directories we created that are now empty, deepest first
    fn prune_dirs(&self, manifest: &mut Manifest) {
        let mut dirs: Vec<PathBuf> = manifest.dirs.iter().cloned().collect();
        dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));

        for dir in dirs {
            let path = self.staging_dir.join(&dir);
            let still_needed = manifest.entries.iter().any(|entry| entry.starts_with(&dir));
            if still_needed {
                continue;
            }
            // fails when something we did not create lives there
            if !path.exists() || fs::remove_dir(&path).is_ok() {
                manifest.dirs.remove(&dir);
            }
        }
    }
}

enum Placement {
    Created,
    Repaired,
    Unchanged,
}

/// Check, then repair, then create
fn place(link: &Path, target: &Path, owned: bool) -> Result<Placement> {
    let link_dir = link.parent().unwrap_or_else(|| Path::new(""));
    let relative = pathdiff::diff_paths(target, link_dir).unwrap_or_else(|| target.to_path_buf());

    match fs::symlink_metadata(link) {
        Ok(meta) => {
            let current = if meta.file_type().is_symlink() {
                fs::read_link(link).ok().is_some_and(|dest| dest == relative)
            } else {
                same_contents(link, target)
            };

            if current {
                return Ok(Placement::Unchanged);
            }
            if !owned {
                return Err(GenerateError::StagingConflict {
                    path: link.to_path_buf(),
                });
            }

            fs::remove_file(link).map_err(|e| GenerateError::io("remove", link, e))?;
            link_or_copy(&relative, target, link)?;
            Ok(Placement::Repaired)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            link_or_copy(&relative, target, link)?;
            Ok(Placement::Created)
        }
        Err(e) => Err(GenerateError::io("inspect", link, e)),
    }
}

fn same_contents(a: &Path, b: &Path) -> bool {
    match (fs::read(a), fs::read(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| GenerateError::io("create directory", path, e))
}

/// Symlink `link` to `relative`, copying `target` where links are unavailable
fn link_or_copy(relative: &Path, target: &Path, link: &Path) -> Result<()> {
    if let Err(e) = create_symlink(relative, link) {
        debug!("Symlink {:?} failed ({}), copying instead", link, e);
        fs::copy(target, link).map_err(|e| GenerateError::io("copy", link, e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks unavailable"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_plan_skips_legal_directories() {
        let sanitizer = ImportSanitizer::new("app", ".waypost/imports");
        let files = [
            Path::new("app/users/route.rs"),
            Path::new("app/route.rs"),
            Path::new("app/users/[id]/route.rs"),
            Path::new("app/users/[id]/page.rs"),
        ];
        let plan = sanitizer.plan(files);

        let mappings: Vec<&ImportMapping> = plan.mappings().collect();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].original_dir, PathBuf::from("users/[id]"));
        assert_eq!(mappings[0].alias_dir, PathBuf::from("users/param_id"));
        assert_eq!(mappings[0].files.len(), 2);

        assert_eq!(
            plan.resolve(Path::new("app/users/[id]/page.rs")),
            PathBuf::from(".waypost/imports/users/param_id/page.rs")
        );
        assert_eq!(
            plan.resolve(Path::new("app/users/route.rs")),
            PathBuf::from("app/users/route.rs")
        );
    }

    #[test]
    fn test_plan_without_materializing_keeps_original_paths() {
        let sanitizer = ImportSanitizer::new("app", ".waypost/imports").materialize(false);
        let plan = sanitizer.plan([Path::new("app/(admin)/route.rs")]);

        let mapping = plan.mappings().next().unwrap();
        assert_eq!(mapping.alias_dir, PathBuf::from("group_admin"));
        assert_eq!(mapping.materialized_dir, None);
        assert_eq!(
            plan.resolve(Path::new("app/(admin)/route.rs")),
            PathBuf::from("app/(admin)/route.rs")
        );
    }

    #[test]
    fn test_colliding_aliases_are_suffixed_in_directory_order() {
        let sanitizer = ImportSanitizer::new("app", ".waypost/imports");
        let forward = sanitizer.plan([
            Path::new("app/a-b/route.rs"),
            Path::new("app/a.b/route.rs"),
        ]);
        let backward = sanitizer.plan([
            Path::new("app/a.b/route.rs"),
            Path::new("app/a-b/route.rs"),
        ]);

        for plan in [&forward, &backward] {
            let aliases: Vec<(&Path, &Path)> = plan
                .mappings()
                .map(|m| (m.original_dir.as_path(), m.alias_dir.as_path()))
                .collect();
            assert_eq!(
                aliases,
                vec![
                    (Path::new("a-b"), Path::new("a_b")),
                    (Path::new("a.b"), Path::new("a_b2")),
                ]
            );
        }
    }

    #[rstest]
    #[case("user-settings", "user_settings")]
    #[case("[post-id]", "param_post_id")]
    #[case("v1.2", "v1_2")]
    #[case("(marketing-site)", "group_marketing_site")]
    #[case("[[...path]]", "opt_catchall_path")]
    #[case("3d", "_3d")]
    #[case("mod", "mod_")]
    fn test_sanitize_segment(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_segment(input), expected);
    }
}
