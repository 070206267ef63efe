use std::io;
use std::path::PathBuf;
use thiserror::Error;
use waypost_parser::ScanError;
use waypost_router::PatternError;

/// Failures that stop a generation run
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("invalid proxy matcher in {}: {source}", file.display())]
    Matcher {
        file: PathBuf,
        #[source]
        source: PatternError,
    },

    #[error("refusing to overwrite {}: it was not generated by waypost", path.display())]
    WouldClobber { path: PathBuf },

    #[error("refusing to replace {}: it was not created by waypost", path.display())]
    StagingConflict { path: PathBuf },

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid staging manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl GenerateError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        GenerateError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;
