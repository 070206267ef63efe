//! Registration code generator
//!
//! Renders the single module that wires every discovered entry point into
//! the runtime `App`. Output is a pure function of its inputs, so repeated
//! runs over unchanged sources produce byte-identical files.

use std::fmt::Write as _;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, info};

use waypost_router::{segment_ident, LayoutRecord, PageParam, PageRecord, RouteTree};

use crate::alias::AliasAllocator;
use crate::error::{GenerateError, Result};
use crate::sanitize::{is_legal_segment, ImportPlan};

/// First line of every generated file
pub const GENERATED_HEADER: &str = "// @generated by waypost. DO NOT EDIT.";

pub const DEFAULT_RUNTIME_CRATE: &str = "waypost";

/// How a page is called from its registration closure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCall {
    /// `load(ctx)` feeds `page(data)`
    Loader,
    /// Parameters are pulled from the URL (or defaulted)
    Params,
    /// `page()`
    Direct,
}

impl PageCall {
    pub fn for_page(page: &PageRecord) -> Self {
        if page.has_loader {
            PageCall::Loader
        } else if page.params.is_empty() {
            PageCall::Direct
        } else {
            PageCall::Params
        }
    }
}

/// Renders the registration module
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use waypost_codegen::{Generator, ImportPlan};
/// use waypost_router::RouteTree;
///
/// let plan = ImportPlan::default();
/// let source = Generator::new(Path::new("src/routes_gen.rs"), &plan)
///     .render(&RouteTree::new(), &[], &[]);
/// assert!(source.contains("pub fn register(_app: &mut waypost::App) -> waypost::Result<()>"));
/// ```
#[derive(Debug, Clone)]
pub struct Generator<'a> {
    output: &'a Path,
    plan: &'a ImportPlan,
    runtime_crate: String,
}

impl<'a> Generator<'a> {
    pub fn new(output: &'a Path, plan: &'a ImportPlan) -> Self {
        Self {
            output,
            plan,
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
        }
    }

    pub fn runtime_crate(mut self, name: impl Into<String>) -> Self {
        self.runtime_crate = name.into();
        self
    }

    /// Proxy, then middleware and routes in discovery order, then pages
    /// and layouts
    pub fn render(&self, tree: &RouteTree, pages: &[PageRecord], layouts: &[LayoutRecord]) -> String {
        let rt = &self.runtime_crate;
        let mut aliases = AliasAllocator::new();
        let mut calls: Vec<String> = Vec::new();

        if let Some(proxy) = tree.proxy().filter(|p| p.has_valid_signature) {
            let alias = self.alias(&mut aliases, &proxy.source_file);
            let patterns: Vec<String> = proxy
                .matcher_patterns
                .iter()
                .map(|p| format!("{:?}", p))
                .collect();
            calls.push(format!("app.proxy({}::proxy, &[{}])?;", alias, patterns.join(", ")));
        }

        for m in tree.middleware() {
            let alias = self.alias(&mut aliases, &m.source_file);
            calls.push(format!(
                "app.middleware({:?}, {:?}, {}::{});",
                m.prefix, m.scope, alias, m.identifier
            ));
        }

        for route in tree.routes() {
            let alias = self.alias(&mut aliases, &route.source_file);
            calls.push(format!(
                "app.route({}::Method::{}, {:?}, {:?}, {}::{});",
                rt,
                route.method.variant_name(),
                route.pattern,
                route.scope,
                alias,
                route.handler
            ));
        }

        for page in pages {
            let alias = self.alias(&mut aliases, &page.source_file);
            calls.push(render_page(page, &alias));
        }

        for layout in layouts {
            let alias = self.alias(&mut aliases, &layout.source_file);
            calls.push(format!(
                "app.layout({:?}, {}::layout);",
                layout.prefix, alias
            ));
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", GENERATED_HEADER);
        let _ = writeln!(out, "// Regenerate with `waypost generate`.");
        let _ = writeln!(out);
        let _ = writeln!(out, "#![allow(dead_code, unused_imports, clippy::all)]");

        if !aliases.is_empty() {
            let _ = writeln!(out);
        }
        for (module, alias) in aliases.modules() {
            let _ = writeln!(out, "#[path = {:?}]", self.module_path(module));
            let _ = writeln!(out, "mod {};", alias);
        }

        let _ = writeln!(out);
        if calls.is_empty() {
            let _ = writeln!(
                out,
                "pub fn register(_app: &mut {rt}::App) -> {rt}::Result<()> {{",
                rt = rt
            );
        } else {
            let _ = writeln!(
                out,
                "pub fn register(app: &mut {rt}::App) -> {rt}::Result<()> {{",
                rt = rt
            );
        }
        for call in &calls {
            for line in call.lines() {
                let _ = writeln!(out, "    {}", line);
            }
        }
        let _ = writeln!(out, "    Ok(())");
        let _ = writeln!(out, "}}");

        debug!("Rendered {} modules, {} registrations", aliases.len(), calls.len());
        out
    }

    fn alias(&self, aliases: &mut AliasAllocator, file: &Path) -> String {
        let base = self.base_alias(file);
        aliases.alias_for(file, &base).to_string()
    }

    /// `<last directory>_<file stem>`, `root_<stem>` at the app root
    fn base_alias(&self, file: &Path) -> String {
        let stem = file
            .file_stem()
            .map(|s| segment_ident(&s.to_string_lossy()))
            .unwrap_or_else(|| "module".to_string());

        let dir = file
            .parent()
            .and_then(|dir| dir.strip_prefix(self.plan.app_dir()).ok())
            .and_then(|rel| rel.file_name())
            .map(|name| segment_ident(&name.to_string_lossy()))
            .unwrap_or_else(|| "root".to_string());

        format!("{}_{}", dir, stem)
    }

    /// Import path relative to the output file's directory, `/`-separated
    fn module_path(&self, file: &Path) -> String {
        let resolved = self.plan.resolve(file);
        let base = self.output.parent().unwrap_or_else(|| Path::new(""));
        let relative = pathdiff::diff_paths(&resolved, base).unwrap_or(resolved);
        to_slash(&relative)
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir => Some(String::new()),
            Component::Prefix(p) => Some(p.as_os_str().to_string_lossy().into_owned()),
            Component::CurDir => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn render_page(page: &PageRecord, alias: &str) -> String {
    let title = match &page.title {
        Some(title) => format!("Some({:?})", title),
        None => "None".to_string(),
    };

    let body = match PageCall::for_page(page) {
        PageCall::Loader => format!(
            "    let data = {alias}::load(ctx)?;\n    ctx.render({alias}::page(data))",
            alias = alias
        ),
        PageCall::Direct => format!("    ctx.render({}::page())", alias),
        PageCall::Params => {
            let mut body = String::new();
            let mut args = Vec::new();
            for (index, param) in page.params.iter().enumerate() {
                let (binding, arg) = bind_param(param, index);
                body.push_str(&binding);
                body.push('\n');
                args.push(arg);
            }
            body.push_str(&format!("    ctx.render({}::page({}))", alias, args.join(", ")));
            body
        }
    };

    format!(
        "app.page({:?}, {:?}, {}, |ctx| {{\n{}\n}});",
        page.pattern, page.scope, title, body
    )
}

/// Names the registration closure already uses
const RESERVED_BINDINGS: &[&str] = &["ctx", "data"];

/// `let` statement for one page argument plus the expression passed
fn bind_param(param: &PageParam, index: usize) -> (String, String) {
    let reserved = RESERVED_BINDINGS.contains(&param.name.as_str());
    let var = if is_legal_segment(&param.name) && !reserved {
        param.name.clone()
    } else {
        format!("arg{}", index)
    };

    if param.from_url && param.is_scalar() {
        if param.is_borrowed_str() {
            (
                format!("    let {} = ctx.param::<String>({:?})?;", var, param.name),
                format!("&{}", var),
            )
        } else {
            (
                format!("    let {} = ctx.param::<{}>({:?})?;", var, param.ty, param.name),
                var,
            )
        }
    } else {
        (
            format!("    let {}: {} = Default::default();", var, param.ty),
            var,
        )
    }
}

/// Outcome of writing the generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

/// What writing `content` to `path` would do, without writing
///
/// An existing file is only replaced when it is empty or starts with
/// [`GENERATED_HEADER`]; anything else is hand-written and refused.
pub fn plan_write(path: &Path, content: &str) -> Result<WriteOutcome> {
    match fs::read_to_string(path) {
        Ok(existing) if existing == content => Ok(WriteOutcome::Unchanged),
        Ok(existing) if existing.trim().is_empty() || existing.starts_with(GENERATED_HEADER) => {
            Ok(WriteOutcome::Updated)
        }
        Ok(_) => Err(GenerateError::WouldClobber {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WriteOutcome::Created),
        Err(e) => Err(GenerateError::io("read", path, e)),
    }
}

/// Writes `content` to `path`; identical content is left untouched
pub fn write_output(path: &Path, content: &str) -> Result<WriteOutcome> {
    let outcome = plan_write(path, content)?;
    if outcome == WriteOutcome::Unchanged {
        return Ok(outcome);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GenerateError::io("create directory", parent, e))?;
    }
    fs::write(path, content).map_err(|e| GenerateError::io("write", path, e))?;
    info!("Wrote {:?} ({:?})", path, outcome);
    Ok(outcome)
}
