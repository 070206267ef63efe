pub mod check;
pub mod generate;
pub mod routes;

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use waypost_codegen::Options;
use waypost_parser::{Diagnostic, DiagnosticKind};

use crate::config::{Config, CONFIG_FILE};
use crate::PathArgs;

/// Settings shared by every subcommand
pub struct Context {
    pub root: PathBuf,
    pub verbose: bool,
}

impl Context {
    /// waypost.toml merged with command-line overrides
    pub fn options(&self, paths: &PathArgs) -> Result<Options> {
        let mut config = Config::load(self.root.join(CONFIG_FILE))?;
        if let Some(dir) = &paths.app_dir {
            config.app.dir = dir.clone();
        }
        if let Some(output) = &paths.output {
            config.output.path = output.clone();
        }
        Ok(config.to_options(&self.root))
    }
}

/// Prints diagnostics; skipped declarations only when verbose
pub fn print_diagnostics(diagnostics: &[Diagnostic], verbose: bool) {
    for d in diagnostics {
        let label = match d.kind {
            DiagnosticKind::SkippedDeclaration if !verbose => continue,
            DiagnosticKind::SkippedDeclaration => "skipped".dimmed(),
            DiagnosticKind::Conflict => "conflict".yellow().bold(),
            DiagnosticKind::ParamMismatch => "warning".yellow(),
        };
        println!("  {} {}: {}", label, d.file.display().to_string().cyan(), d.message);
    }
}

/// Count line like "2 conflicts, 1 warning"
pub fn summary(diagnostics: &[Diagnostic]) -> String {
    let count = |kind: DiagnosticKind| diagnostics.iter().filter(|d| d.kind == kind).count();
    let plural = |n: usize, word: &str| format!("{} {}{}", n, word, if n == 1 { "" } else { "s" });

    format!(
        "{}, {}, {}",
        plural(count(DiagnosticKind::Conflict), "conflict"),
        plural(count(DiagnosticKind::ParamMismatch), "warning"),
        plural(count(DiagnosticKind::SkippedDeclaration), "skipped declaration")
    )
}
