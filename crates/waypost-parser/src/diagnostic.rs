// File: src/diagnostic.rs
// Purpose: Non-fatal findings collected during scanning and resolution

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A recognized declaration with the wrong shape was left out
    SkippedDeclaration,
    /// A route GET handler lost against a page in the same directory
    Conflict,
    /// Page parameters and URL parameters disagree
    ParamMismatch,
}

impl DiagnosticKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::SkippedDeclaration => "skipped",
            DiagnosticKind::Conflict => "conflict",
            DiagnosticKind::ParamMismatch => "params",
        }
    }

    /// Whether the finding is shown without `--verbose`
    pub fn is_advisory(&self) -> bool {
        !matches!(self, DiagnosticKind::SkippedDeclaration)
    }
}

/// A plain-text finding tied to a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: PathBuf,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, file: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn skipped(file: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::SkippedDeclaration, file, message)
    }

    pub fn conflict(file: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Conflict, file, message)
    }

    pub fn param_mismatch(file: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::ParamMismatch, file, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.kind.label(),
            self.file.display(),
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::conflict("app/users/route.rs", "GET handler dropped");
        assert_eq!(d.to_string(), "[conflict] app/users/route.rs: GET handler dropped");
        assert!(d.kind.is_advisory());
        assert!(!Diagnostic::skipped("a.rs", "x").kind.is_advisory());
    }
}
