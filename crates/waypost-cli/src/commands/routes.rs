use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;
use waypost_codegen::check;
use waypost_router::{Method, RouteTree};

use super::Context;
use crate::PathArgs;

#[derive(Serialize)]
struct Listing<'a> {
    method: Method,
    pattern: &'a str,
    priority: u32,
    scope: &'a str,
    handler: String,
    middleware: Vec<String>,
    proxied: bool,
}

pub fn execute(ctx: &Context, paths: &PathArgs, json: bool) -> Result<()> {
    let options = ctx.options(paths)?;
    let analysis =
        check(&options).with_context(|| format!("Failed to scan {:?}", options.app_dir))?;

    let listing = listing(&analysis.tree);

    if json {
        let out = serde_json::to_string_pretty(&listing).context("Failed to encode routes")?;
        println!("{}", out);
        return Ok(());
    }

    if listing.is_empty() && analysis.resolved.pages.is_empty() {
        println!("{}", "No routes found".yellow());
        return Ok(());
    }

    for entry in &listing {
        println!(
            "{:<8} {:<32} {}",
            entry.method.as_str().cyan().bold(),
            entry.pattern,
            entry.handler.dimmed()
        );
        if entry.proxied {
            println!("         {} proxy", "↳".dimmed());
        }
        for m in &entry.middleware {
            println!("         {} {}", "↳".dimmed(), m);
        }
    }

    for page in &analysis.resolved.pages {
        println!(
            "{:<8} {:<32} {}",
            "PAGE".magenta().bold(),
            page.pattern,
            page.source_file.display().to_string().dimmed()
        );
    }
    for layout in &analysis.resolved.layouts {
        println!(
            "{:<8} {:<32} {}",
            "LAYOUT".magenta(),
            layout.prefix,
            layout.source_file.display().to_string().dimmed()
        );
    }

    Ok(())
}

/// Routes in match order
fn listing(tree: &RouteTree) -> Vec<Listing<'_>> {
    tree.routes_by_priority()
        .into_iter()
        .map(|route| Listing {
            method: route.method,
            pattern: &route.pattern,
            priority: route.priority,
            scope: &route.scope,
            handler: format!("{}::{}", route.source_file.display(), route.handler),
            middleware: tree
                .chain_for(route)
                .into_iter()
                .map(|m| m.source_file.display().to_string())
                .collect(),
            proxied: tree.proxy_applies(&route.pattern),
        })
        .collect()
}
