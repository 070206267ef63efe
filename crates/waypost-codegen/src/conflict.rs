//! Page/route conflict resolution and parameter checks
//!
//! A page serves GET for its directory. When a route file in the same
//! directory also exports `get`, the page wins and the handler is dropped.
//! Nothing here fails: every finding becomes a [`Diagnostic`].

use std::path::Path;
use tracing::debug;

use waypost_parser::{Diagnostic, ScanResult};
use waypost_router::{
    LayoutRecord, Method, MiddlewareRecord, PageRecord, ProxyDescriptor, RouteRecord,
};

/// Scan output after conflicts are settled
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub routes: Vec<RouteRecord>,
    pub middleware: Vec<MiddlewareRecord>,
    pub proxy: Option<ProxyDescriptor>,
    pub pages: Vec<PageRecord>,
    pub layouts: Vec<LayoutRecord>,
    /// Scan diagnostics followed by resolution diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolved {
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
            && self.middleware.is_empty()
            && self.proxy.is_none()
            && self.pages.is_empty()
            && self.layouts.is_empty()
    }

    pub fn advisories(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind.is_advisory())
    }
}

/// Drops GET handlers shadowed by pages and checks page parameters
pub fn resolve(scan: ScanResult) -> Resolved {
    let ScanResult {
        mut routes,
        middleware,
        proxy,
        pages,
        layouts,
        mut diagnostics,
    } = scan;

    for page in &pages {
        let page_dir = page.source_file.parent();
        let mut dropped_from = None;

        routes.retain(|route| {
            let shadowed = route.method == Method::Get && route.source_file.parent() == page_dir;
            if shadowed {
                dropped_from = Some(route.source_file.clone());
            }
            !shadowed
        });

        if let Some(route_file) = dropped_from {
            diagnostics.push(report(Diagnostic::conflict(
                &route_file,
                format!(
                    "GET {} is served by the page in {}; its `get` handler is not registered",
                    page.pattern,
                    display_file(&page.source_file)
                ),
            )));
        }

        diagnostics.extend(check_params(page));
    }

    Resolved {
        routes,
        middleware,
        proxy,
        pages,
        layouts,
        diagnostics,
    }
}

/// Parameter-shape warnings for one page, one per mismatched name
///
/// Pages with a `load` hook receive their data from it, so no warnings are
/// produced for them.
pub fn check_params(page: &PageRecord) -> Vec<Diagnostic> {
    if page.has_loader {
        return Vec::new();
    }

    let mut found = Vec::new();

    for name in &page.url_params {
        if !page.params.iter().any(|p| &p.name == name) {
            found.push(report(Diagnostic::param_mismatch(
                &page.source_file,
                format!(
                    "URL parameter `{}` of {} is not declared by `page` and will not be accessible",
                    name, page.pattern
                ),
            )));
        }
    }

    for param in page.params.iter().filter(|p| !p.from_url) {
        let mut message = format!(
            "parameter `{}` is not part of {} and will receive `Default::default()`",
            param.name, page.pattern
        );
        if !param.is_scalar() {
            message.push_str(&format!(
                "; export `pub fn load(ctx: &mut Context)` to provide `{}`",
                param.ty
            ));
        }
        found.push(report(Diagnostic::param_mismatch(&page.source_file, message)));
    }

    found
}

/// Diagnostics are printed by the caller; the log only traces them
fn report(diagnostic: Diagnostic) -> Diagnostic {
    debug!("{}", diagnostic);
    diagnostic
}

fn display_file(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
