// File: src/pipeline.rs
// Purpose: One-call scan → resolve → tree → render → stage → write

use std::path::{Path, PathBuf};
use tracing::info;

use waypost_parser::{Diagnostic, Scanner};
use waypost_router::RouteTree;

use crate::conflict::{resolve, Resolved};
use crate::error::{GenerateError, Result};
use crate::generator::{plan_write, write_output, Generator, WriteOutcome, DEFAULT_RUNTIME_CRATE};
use crate::sanitize::{ImportPlan, ImportSanitizer, StagingReport};

/// Inputs of a generation run
#[derive(Debug, Clone)]
pub struct Options {
    /// Application directory to scan
    pub app_dir: PathBuf,
    /// Generated module path
    pub output: PathBuf,
    /// Crate the generated code registers against
    pub runtime_crate: String,
    /// Link sanitized directories into `staging_dir`
    pub materialize: bool,
    pub staging_dir: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            app_dir: PathBuf::from("app"),
            output: PathBuf::from("src/routes_gen.rs"),
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
            materialize: true,
            staging_dir: PathBuf::from(".waypost/imports"),
        }
    }
}

impl Options {
    /// Resolves every relative path against `root`
    pub fn rooted(mut self, root: &Path) -> Self {
        self.app_dir = root.join(&self.app_dir);
        self.output = root.join(&self.output);
        self.staging_dir = root.join(&self.staging_dir);
        self
    }
}

/// Scan and resolution results, before anything is written
#[derive(Debug, Clone)]
pub struct Analysis {
    pub resolved: Resolved,
    pub tree: RouteTree,
}

impl Analysis {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.resolved.diagnostics
    }
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct Generation {
    pub analysis: Analysis,
    pub plan: ImportPlan,
    pub source: String,
    pub staging: StagingReport,
    pub outcome: WriteOutcome,
}

/// Indexes resolved records; an uncompilable proxy matcher is fatal
pub fn build_tree(resolved: &Resolved) -> Result<RouteTree> {
    let mut tree = RouteTree::new();

    if let Some(proxy) = &resolved.proxy {
        tree.register_proxy(proxy.clone())
            .map_err(|source| GenerateError::Matcher {
                file: proxy.source_file.clone(),
                source,
            })?;
    }
    for m in &resolved.middleware {
        tree.insert_middleware(m.clone());
    }
    for route in &resolved.routes {
        tree.insert_route(route.clone());
    }
    Ok(tree)
}

/// Scans, resolves and builds the tree without touching the filesystem
pub fn check(options: &Options) -> Result<Analysis> {
    let scan = Scanner::new(&options.app_dir)
        .skip_dir(&options.staging_dir)
        .scan()?;
    let resolved = resolve(scan);
    let tree = build_tree(&resolved)?;
    Ok(Analysis { resolved, tree })
}

/// Runs the whole pipeline and writes the generated module
pub fn run(options: &Options) -> Result<Generation> {
    let analysis = check(options)?;

    let sanitizer = ImportSanitizer::new(&options.app_dir, &options.staging_dir)
        .materialize(options.materialize);
    let plan = sanitizer.plan(imported_files(&analysis));

    let source = Generator::new(&options.output, &plan)
        .runtime_crate(options.runtime_crate.as_str())
        .render(
            &analysis.tree,
            &analysis.resolved.pages,
            &analysis.resolved.layouts,
        );

    // refuse before staging so a clobber leaves nothing behind
    plan_write(&options.output, &source)?;
    let staging = sanitizer.stage(&plan)?;
    let outcome = write_output(&options.output, &source)?;

    info!(
        "Generated {:?}: {} routes, {} middleware, {} pages, {} layouts",
        options.output,
        analysis.tree.len(),
        analysis.tree.middleware().len(),
        analysis.resolved.pages.len(),
        analysis.resolved.layouts.len()
    );

    Ok(Generation {
        analysis,
        plan,
        source,
        staging,
        outcome,
    })
}

/// Every file the generated module imports
fn imported_files(analysis: &Analysis) -> Vec<&Path> {
    let tree = &analysis.tree;
    let proxy = tree
        .proxy()
        .filter(|p| p.has_valid_signature)
        .map(|p| p.source_file.as_path());

    proxy
        .into_iter()
        .chain(tree.middleware().iter().map(|m| m.source_file.as_path()))
        .chain(tree.routes().iter().map(|r| r.source_file.as_path()))
        .chain(analysis.resolved.pages.iter().map(|p| p.source_file.as_path()))
        .chain(analysis.resolved.layouts.iter().map(|l| l.source_file.as_path()))
        .collect()
}
