use std::path::PathBuf;

use serde::Serialize;

/// One resolved relative import from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEdge {
    /// The importing file.
    pub source: PathBuf,
    /// The file the specifier resolved to.
    pub target: PathBuf,
    /// The raw specifier as written in source (e.g. `"./utils"`).
    pub specifier: String,
}
