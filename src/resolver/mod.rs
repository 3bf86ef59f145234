pub mod file_resolver;
pub mod tsconfig;

pub use file_resolver::{ResolutionOutcome, build_resolver, is_relative_specifier, resolve_import};
pub use tsconfig::{ProjectSettings, load_project_settings};

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::graph::{ImportGraph, edge::ImportEdge};
use crate::parser::parse_references;
use crate::walker::path_contains_node_modules;

/// Statistics collected while building the module graph.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Project files whose references were extracted.
    pub files_parsed: usize,
    /// Project files that could not be read or parsed.
    pub files_skipped: usize,
    /// Relative specifiers resolved to a project file (one edge each).
    pub resolved: usize,
    /// Relative specifiers that could not be resolved; they produce no edge.
    pub unresolved: usize,
    /// Relative specifiers that resolved into `node_modules`; they produce no edge.
    pub external: usize,
}

/// Build the module graph for the whole project.
///
/// Every file in `project_files` is parsed (not just the candidates) because files
/// outside the candidate set may import into it. For each reference:
///
/// 1. non-relative specifiers (packages, aliases) are ignored;
/// 2. relative specifiers are resolved with the project resolver;
/// 3. targets inside `node_modules` and resolution misses are dropped silently.
///
/// # Parameters
/// - `candidates`: files eligible to move (become [`ImportGraph::files`])
/// - `project_files`: every source file of the project, in traversal order
/// - `settings`: validated resolution configuration
pub fn build_import_graph(
    candidates: &[PathBuf],
    project_files: &[PathBuf],
    settings: &ProjectSettings,
) -> (ImportGraph, GraphStats) {
    let resolver = build_resolver(&settings.tsconfig_path);
    let mut graph = ImportGraph::new(candidates.iter().cloned());
    let mut stats = GraphStats::default();

    for file in project_files {
        if path_contains_node_modules(file) {
            continue;
        }

        let source = match std::fs::read(file) {
            Ok(s) => s,
            Err(err) => {
                warn!("skipping {}: {err}", file.display());
                stats.files_skipped += 1;
                continue;
            }
        };
        let references = match parse_references(file, &source) {
            Ok(r) => r,
            Err(err) => {
                warn!("skipping {}: {err:#}", file.display());
                stats.files_skipped += 1;
                continue;
            }
        };
        stats.files_parsed += 1;

        for reference in references {
            let specifier = reference.specifier;
            if !is_relative_specifier(&specifier) {
                continue;
            }
            debug!(kind = ?reference.kind, "{}: '{}'", file.display(), specifier);

            match resolve_import(&resolver, file, &specifier) {
                ResolutionOutcome::Resolved(target) => {
                    if path_contains_node_modules(&target) {
                        debug!("{} imports '{}' -> node_modules, no edge", file.display(), specifier);
                        stats.external += 1;
                        continue;
                    }
                    stats.resolved += 1;
                    graph.add_edge(ImportEdge {
                        source: file.clone(),
                        target,
                        specifier,
                    });
                }
                ResolutionOutcome::Unresolved(reason) => {
                    debug!("{} imports '{}' -> unresolved: {}", file.display(), specifier, reason);
                    stats.unresolved += 1;
                }
            }
        }
    }

    debug!(
        ?stats,
        edges = graph.edges.len(),
        importing_files = graph.imports.len(),
        imported_files = graph.imported_by.len(),
        "module graph built"
    );
    (graph, stats)
}
