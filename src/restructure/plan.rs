use std::path::{Path, PathBuf};

use serde::Serialize;

/// A planned relocation with a human-readable justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMove {
    pub from: PathBuf,
    pub to: PathBuf,
    pub reason: String,
}

/// A specifier substitution to perform inside `file` (path before any move).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRewrite {
    pub file: PathBuf,
    pub old_specifier: String,
    pub new_specifier: String,
}

/// Everything a restructuring pass would do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestructurePlan {
    pub moves: Vec<FileMove>,
    pub rewrites: Vec<ImportRewrite>,
    pub new_directories: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl RestructurePlan {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// `path` relative to `root` with forward slashes, or the full path when outside `root`.
pub fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// File name without its last extension (`foo.test.ts` -> `foo.test`).
pub fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("")
}

/// Whether `path` is a directory-index module (`index.ts`, `index.js`, ...).
pub fn is_index_file(path: &Path) -> bool {
    file_stem(path) == "index"
}
