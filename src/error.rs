use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a restructuring run.
///
/// Resolution misses and destination conflicts are not errors: the former are
/// dropped from the graph and the latter become plan warnings.
#[derive(Error, Debug)]
pub enum RestructureError {
    /// The project's module-resolution configuration is missing or invalid.
    /// Raised before any analysis happens.
    #[error("configuration error in {}: {reason}", path.display())]
    Configuration { path: PathBuf, reason: String },

    /// A file-system operation failed while applying a plan. Operations that
    /// already ran are not rolled back.
    #[error("{operation} failed on {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file scheduled for import rewriting no longer parses.
    #[error("cannot rewrite imports in {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl RestructureError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = RestructureError> = std::result::Result<T, E>;
