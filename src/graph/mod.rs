pub mod edge;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use edge::ImportEdge;

/// The project's module graph.
///
/// `files` is the restructuring-candidate set; `edges`, `imported_by` and `imports`
/// span the whole project, because files outside the candidate set may import into
/// it and need their specifiers rewritten too.
///
/// Built once per run and then only read: every later stage borrows it.
#[derive(Debug, Default)]
pub struct ImportGraph {
    /// Candidate files eligible to move.
    pub files: BTreeSet<PathBuf>,
    /// Every resolved relative import, in discovery order.
    pub edges: Vec<ImportEdge>,
    /// target -> files importing it.
    pub imported_by: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    /// source -> files it imports.
    pub imports: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    /// `(source, specifier)` pairs already recorded.
    seen: HashSet<(PathBuf, String)>,
}

impl ImportGraph {
    /// Create a graph over the given candidate files, with no edges yet.
    pub fn new(files: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            files: files.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Record a resolved import. Returns `false` when the same specifier was already
    /// recorded for the same source file (it necessarily resolves to the same target).
    pub fn add_edge(&mut self, edge: ImportEdge) -> bool {
        if !self
            .seen
            .insert((edge.source.clone(), edge.specifier.clone()))
        {
            return false;
        }
        self.imported_by
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.source.clone());
        self.imports
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.target.clone());
        self.edges.push(edge);
        true
    }

    /// Whether `path` is a restructuring candidate.
    pub fn is_candidate(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    /// The importer of `file` when there is exactly one.
    pub fn sole_importer(&self, file: &Path) -> Option<&Path> {
        let importers = self.imported_by.get(file)?;
        if importers.len() != 1 {
            return None;
        }
        importers.iter().next().map(PathBuf::as_path)
    }
}
