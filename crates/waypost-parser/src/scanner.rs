// File: src/scanner.rs
// Purpose: Walks an application directory and builds registration records
//
// Route, middleware and proxy files are parsed structurally with `syn`, so
// one that does not parse aborts the scan. Declarations with the wrong shape
// are skipped and reported as diagnostics instead.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use syn::punctuated::Punctuated;
use syn::{Expr, ExprLit, Item, ItemFn, Lit, Member, Token, Visibility};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use waypost_router::{
    classify_segment, translate_segments, LayoutRecord, Method, MiddlewareRecord, PageParam,
    PageRecord, ProxyDescriptor, RouteRecord, Segment, Translation,
};

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::signature::{check_handler, check_middleware, check_proxy};
use crate::template::{scan_layout, scan_page, DeclaredParam, CHILDREN_MARKER};

/// File the import sanitizer leaves in its staging directory
pub const STAGING_MANIFEST: &str = "waypost-manifest.json";

/// Entry point names inside the recognized files
const MIDDLEWARE_FN: &str = "middleware";
const PROXY_FN: &str = "proxy";
const PROXY_CONFIG: &str = "PROXY_CONFIG";
const MATCHER_FIELD: &str = "matcher";

/// Role of a recognized file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Route,
    Middleware,
    Proxy,
    Page,
    Layout,
}

impl FileKind {
    pub const ALL: [FileKind; 5] = [
        FileKind::Route,
        FileKind::Middleware,
        FileKind::Proxy,
        FileKind::Page,
        FileKind::Layout,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            FileKind::Route => "route.rs",
            FileKind::Middleware => "middleware.rs",
            FileKind::Proxy => "proxy.rs",
            FileKind::Page => "page.rs",
            FileKind::Layout => "layout.rs",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.file_name() == name)
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },
}

/// Everything discovered in one pass over the application directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    pub routes: Vec<RouteRecord>,
    pub middleware: Vec<MiddlewareRecord>,
    pub proxy: Option<ProxyDescriptor>,
    pub pages: Vec<PageRecord>,
    pub layouts: Vec<LayoutRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanResult {
    /// Nothing to register
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
            && self.middleware.is_empty()
            && self.proxy.is_none()
            && self.pages.is_empty()
            && self.layouts.is_empty()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::SkippedDeclaration)
    }
}

/// Directory scanner for an application root
///
/// # Examples
///
/// ```no_run
/// use waypost_parser::Scanner;
///
/// let result = Scanner::new("app").skip_dir(".waypost").scan().unwrap();
/// for route in &result.routes {
///     println!("{} {}", route.method, route.pattern);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    skip_dirs: Vec<PathBuf>,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skip_dirs: Vec::new(),
        }
    }

    /// Excludes a directory (typically the import staging directory)
    pub fn skip_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skip_dirs.push(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walks the root depth-first in file-name order
    ///
    /// A missing root yields an empty result.
    pub fn scan(&self) -> Result<ScanResult, ScanError> {
        let mut result = ScanResult::default();

        if !self.root.is_dir() {
            debug!("App directory {:?} does not exist, nothing to scan", self.root);
            return Ok(result);
        }

        let skip_dirs: Vec<PathBuf> = self
            .skip_dirs
            .iter()
            .filter_map(|dir| fs::canonicalize(dir).ok())
            .collect();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_ignored(entry, &skip_dirs));

        for entry in walker {
            let entry = entry.map_err(|source| ScanError::Walk {
                path: self.root.clone(),
                source,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(kind) = entry.file_name().to_str().and_then(FileKind::from_file_name) else {
                continue;
            };

            self.scan_file(&entry, kind, &mut result)?;
        }

        info!(
            "Scanned {:?}: {} routes, {} middleware, {} pages, {} layouts, proxy: {}",
            self.root,
            result.routes.len(),
            result.middleware.len(),
            result.pages.len(),
            result.layouts.len(),
            result.proxy.is_some()
        );

        Ok(result)
    }

    fn scan_file(
        &self,
        entry: &DirEntry,
        kind: FileKind,
        result: &mut ScanResult,
    ) -> Result<(), ScanError> {
        let path = entry.path();
        let translation = translate_segments(self.dir_segments(path).iter().map(String::as_str));
        if translation.pruned {
            return Ok(());
        }

        if kind == FileKind::Proxy && entry.depth() != 1 {
            skip(
                result,
                path,
                "proxy.rs is only recognized at the application root",
            );
            return Ok(());
        }

        let source = fs::read_to_string(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parse = || {
            syn::parse_file(&source).map_err(|source| ScanError::Parse {
                path: path.to_path_buf(),
                source,
            })
        };

        // page and layout bodies are template text, not plain Rust items
        match kind {
            FileKind::Route => scan_routes(&parse()?.items, &translation, path, result),
            FileKind::Middleware => scan_middleware(&parse()?.items, &translation, path, result),
            FileKind::Proxy => scan_proxy(&parse()?.items, path, result),
            FileKind::Page => scan_page_file(&source, &translation, path, result),
            FileKind::Layout => scan_layout_file(&source, &translation, path, result),
        }
        Ok(())
    }

    /// Directory components between the root and the file
    fn dir_segments(&self, file: &Path) -> Vec<String> {
        file.strip_prefix(&self.root)
            .ok()
            .and_then(Path::parent)
            .map(|dir| {
                dir.components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Scans `root` with default settings
pub fn scan(root: impl Into<PathBuf>) -> Result<ScanResult, ScanError> {
    Scanner::new(root).scan()
}

/// Hidden entries, private folders and staging directories
fn is_ignored(entry: &DirEntry, skip_dirs: &[PathBuf]) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }

    if !entry.file_type().is_dir() {
        return false;
    }

    if classify_segment(&name) == Segment::Skip {
        return true;
    }

    if entry.path().join(STAGING_MANIFEST).is_file() {
        return true;
    }

    !skip_dirs.is_empty()
        && fs::canonicalize(entry.path()).is_ok_and(|dir| skip_dirs.contains(&dir))
}

fn skip(result: &mut ScanResult, path: &Path, message: impl Into<String>) {
    let diagnostic = Diagnostic::skipped(path, message);
    debug!("{}", diagnostic);
    result.diagnostics.push(diagnostic);
}

/// Public, non-method functions of a file
fn public_fns(items: &[Item]) -> impl Iterator<Item = &ItemFn> {
    items.iter().filter_map(|item| match item {
        Item::Fn(f) if matches!(f.vis, Visibility::Public(_)) => Some(f),
        _ => None,
    })
}

fn scan_routes(items: &[Item], translation: &Translation, path: &Path, result: &mut ScanResult) {
    for f in public_fns(items) {
        let name = f.sig.ident.to_string();
        let Some(method) = Method::from_handler_name(&name) else {
            continue;
        };

        match check_handler(&f.sig) {
            Ok(()) => result
                .routes
                .push(RouteRecord::new(method, translation, path, name)),
            Err(reason) => skip(result, path, format!("handler `{}` skipped: {}", name, reason)),
        }
    }
}

fn scan_middleware(
    items: &[Item],
    translation: &Translation,
    path: &Path,
    result: &mut ScanResult,
) {
    let mut found = false;
    for f in public_fns(items).filter(|f| f.sig.ident == MIDDLEWARE_FN) {
        match check_middleware(&f.sig) {
            Ok(()) if !found => {
                found = true;
                result
                    .middleware
                    .push(MiddlewareRecord::new(translation, path, MIDDLEWARE_FN));
            }
            Ok(()) => {}
            Err(reason) => skip(result, path, format!("middleware skipped: {}", reason)),
        }
    }
}

fn scan_proxy(items: &[Item], path: &Path, result: &mut ScanResult) {
    let Some(f) = public_fns(items).find(|f| f.sig.ident == PROXY_FN) else {
        skip(result, path, "no `pub fn proxy` declaration");
        return;
    };

    let has_valid_signature = match check_proxy(&f.sig) {
        Ok(()) => true,
        Err(reason) => {
            skip(result, path, format!("proxy disabled: {}", reason));
            false
        }
    };

    result.proxy = Some(ProxyDescriptor {
        source_file: path.to_path_buf(),
        has_valid_signature,
        matcher_patterns: proxy_config(items),
    });
}

/// String literals of the `PROXY_CONFIG` matcher, in declaration order
pub fn proxy_config(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .find_map(|item| match item {
            Item::Const(c) if c.ident == PROXY_CONFIG => Some(&*c.expr),
            Item::Static(s) if s.ident == PROXY_CONFIG => Some(&*s.expr),
            _ => None,
        })
        .map(matcher_patterns)
        .unwrap_or_default()
}

fn matcher_patterns(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Reference(r) => matcher_patterns(&r.expr),
        Expr::Paren(p) => matcher_patterns(&p.expr),
        Expr::Group(g) => matcher_patterns(&g.expr),
        Expr::Struct(s) => s
            .fields
            .iter()
            .find(|field| matches!(&field.member, Member::Named(ident) if ident == MATCHER_FIELD))
            .map(|field| string_elements(&field.expr))
            .unwrap_or_default(),
        other => string_elements(other),
    }
}

/// Literal strings of `&[..]`, `[..]` or `vec![..]`; anything else is ignored
fn string_elements(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Reference(r) => string_elements(&r.expr),
        Expr::Paren(p) => string_elements(&p.expr),
        Expr::Array(array) => array.elems.iter().filter_map(string_literal).collect(),
        Expr::Macro(m) if m.mac.path.segments.last().is_some_and(|s| s.ident == "vec") => m
            .mac
            .parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated)
            .map(|elems| elems.iter().filter_map(string_literal).collect())
            .unwrap_or_default(),
        Expr::Lit(_) => string_literal(expr).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Some(s.value()),
        _ => None,
    }
}

fn page_params(declared: Vec<DeclaredParam>, translation: &Translation) -> Vec<PageParam> {
    declared
        .into_iter()
        .map(|p| {
            let from_url = translation.params.contains(&p.name);
            PageParam::new(p.name, p.ty, from_url)
        })
        .collect()
}

fn scan_page_file(source: &str, translation: &Translation, path: &Path, result: &mut ScanResult) {
    let Some(decl) = scan_page(source) else {
        skip(result, path, "no `pub fn page(` declaration");
        return;
    };

    result.pages.push(PageRecord {
        pattern: translation.pattern.clone(),
        scope: translation.scope.clone(),
        source_file: path.to_path_buf(),
        params: page_params(decl.params, translation),
        url_params: translation.params.clone(),
        title: decl.title,
        has_loader: decl.has_loader,
    });
}

fn scan_layout_file(
    source: &str,
    translation: &Translation,
    path: &Path,
    result: &mut ScanResult,
) {
    let Some(decl) = scan_layout(source) else {
        skip(
            result,
            path,
            format!(
                "layout needs `pub fn layout(` and a `{}` marker",
                CHILDREN_MARKER
            ),
        );
        return;
    };

    result.layouts.push(LayoutRecord {
        prefix: translation.pattern.clone(),
        scope: translation.scope.clone(),
        source_file: path.to_path_buf(),
        params: page_params(decl.params, translation),
        title: decl.title,
    });
}
