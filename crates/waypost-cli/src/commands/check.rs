use anyhow::{Context as _, Result};
use colored::Colorize;
use waypost_codegen::check;

use super::{print_diagnostics, summary, Context};
use crate::PathArgs;

/// Fails only on fatal errors; advisories are printed
pub fn execute(ctx: &Context, paths: &PathArgs) -> Result<()> {
    let options = ctx.options(paths)?;

    let analysis =
        check(&options).with_context(|| format!("Check failed for {:?}", options.app_dir))?;

    print_diagnostics(analysis.diagnostics(), ctx.verbose);

    if analysis.resolved.is_empty() {
        println!("{}", "⚠ Nothing to register yet".yellow());
    }
    println!(
        "{} {} routes, {} pages ({})",
        "✓".green(),
        analysis.tree.len(),
        analysis.resolved.pages.len(),
        summary(analysis.diagnostics())
    );

    Ok(())
}
