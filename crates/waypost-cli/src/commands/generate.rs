use anyhow::{Context as _, Result};
use colored::Colorize;
use waypost_codegen::{run, WriteOutcome};

use super::{print_diagnostics, summary, Context};
use crate::PathArgs;

pub fn execute(
    ctx: &Context,
    paths: &PathArgs,
    runtime_crate: Option<String>,
    no_materialize: bool,
) -> Result<()> {
    let mut options = ctx.options(paths)?;
    if let Some(name) = runtime_crate {
        options.runtime_crate = name;
    }
    if no_materialize {
        options.materialize = false;
    }

    println!("{}", "Generating routes...".green().bold());

    let generation = run(&options)
        .with_context(|| format!("Failed to generate routes from {:?}", options.app_dir))?;

    print_diagnostics(generation.analysis.diagnostics(), ctx.verbose);

    let status = match generation.outcome {
        WriteOutcome::Created => "created".green(),
        WriteOutcome::Updated => "updated".green(),
        WriteOutcome::Unchanged => "unchanged".dimmed(),
    };
    let tree = &generation.analysis.tree;
    println!(
        "{} {} ({}): {} routes, {} middleware, {} pages, {} layouts",
        "✓".green(),
        options.output.display(),
        status,
        tree.len(),
        tree.middleware().len(),
        generation.analysis.resolved.pages.len(),
        generation.analysis.resolved.layouts.len()
    );

    let staging = generation.staging;
    if !staging.is_noop() {
        println!(
            "  staged imports: {} created, {} repaired, {} removed",
            staging.created, staging.repaired, staging.removed
        );
    }
    println!("  {}", summary(generation.analysis.diagnostics()).dimmed());

    Ok(())
}
