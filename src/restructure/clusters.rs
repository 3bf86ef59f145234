//! Single-consumer detection over the module graph.
//!
//! Two independent heuristics:
//!
//! - **file clusters**: a file imported by exactly one sibling (same directory, not an
//!   index) nests under the top of its single-importer chain;
//! - **directory clusters**: a directory whose cross-directory importers all live in one
//!   other directory nests under that directory.
//!
//! Both are strict predicates, so the result only depends on the graph, and ordering
//! follows graph discovery order.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::graph::ImportGraph;

use super::plan::is_index_file;

/// A file that owns one or more exclusively dependent siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCluster {
    pub root: PathBuf,
    pub children: Vec<PathBuf>,
}

/// A directory that is the only consumer of one or more other directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryCluster {
    pub parent: PathBuf,
    pub children: Vec<PathBuf>,
}

/// Detect file clusters.
///
/// A non-index candidate with exactly one importer, where that importer is a candidate
/// in the same directory and not an index file, joins the cluster rooted at the top of
/// its single-importer chain (see [`find_chain_root`]).
///
/// A file belongs to at most one cluster. Single-importer cycles can make two files
/// each other's root; the cluster discovered first wins and later clusters drop any
/// already claimed file.
pub fn cluster_files(graph: &ImportGraph) -> Vec<FileCluster> {
    let mut clusters: Vec<FileCluster> = Vec::new();
    let mut by_root: HashMap<&Path, usize> = HashMap::new();

    for file in &graph.files {
        if is_index_file(file) {
            continue;
        }
        let Some(importer) = graph.sole_importer(file) else {
            continue;
        };
        if !graph.is_candidate(importer) || importer.parent() != file.parent() || is_index_file(importer) {
            continue;
        }

        let root = find_chain_root(graph, file, importer);
        if root == file.as_path() {
            continue;
        }

        let idx = *by_root.entry(root).or_insert_with(|| {
            clusters.push(FileCluster {
                root: root.to_path_buf(),
                children: Vec::new(),
            });
            clusters.len() - 1
        });
        clusters[idx].children.push(file.clone());
    }

    claim_exclusively(clusters)
}

/// Climb the single-importer chain upward from `start` (the sole importer of `file`).
///
/// Climbing continues while the current link has exactly one importer that is a
/// candidate in the same directory and not an index file. Every visited file is
/// recorded, starting with `file`, so a cyclic chain stops at the first repeat
/// instead of looping.
fn find_chain_root<'a>(graph: &'a ImportGraph, file: &'a Path, start: &'a Path) -> &'a Path {
    let mut visited: HashSet<&Path> = HashSet::from([file]);
    let mut current = start;

    loop {
        let Some(importer) = graph.sole_importer(current) else {
            return current;
        };
        if importer.parent() != current.parent()
            || is_index_file(importer)
            || !graph.is_candidate(importer)
            || !visited.insert(importer)
        {
            return current;
        }
        current = importer;
    }
}

fn claim_exclusively(clusters: Vec<FileCluster>) -> Vec<FileCluster> {
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut accepted = Vec::with_capacity(clusters.len());

    for mut cluster in clusters {
        if claimed.contains(&cluster.root) {
            debug!("dropping cluster at {}: root already nested elsewhere", cluster.root.display());
            continue;
        }
        cluster
            .children
            .retain(|child| *child != cluster.root && !claimed.contains(child));
        if cluster.children.is_empty() {
            continue;
        }
        claimed.insert(cluster.root.clone());
        claimed.extend(cluster.children.iter().cloned());
        accepted.push(cluster);
    }

    accepted
}

/// Detect directory clusters.
///
/// For each directory `D` targeted by a cross-directory edge into a candidate file, if
/// every such edge comes from a single directory `P`, and neither is an ancestor of the
/// other, `D` nests under `P`. Children sharing `P` are grouped.
///
/// Filters, in order:
/// - `protected` directories (project root, scope roots) never move;
/// - a directory chosen as a parent is removed wherever it appears as a child, so one
///   pass nests a single level (repeated runs go deeper);
/// - a cluster whose parent sits inside a moving child is dropped for this pass.
pub fn cluster_directories(graph: &ImportGraph, protected: &[PathBuf]) -> Vec<DirectoryCluster> {
    // target dir -> importing dirs, in edge discovery order
    let mut dir_order: Vec<&Path> = Vec::new();
    let mut dir_importers: HashMap<&Path, BTreeSet<&Path>> = HashMap::new();

    for edge in &graph.edges {
        let (Some(source_dir), Some(target_dir)) = (edge.source.parent(), edge.target.parent())
        else {
            continue;
        };
        if source_dir == target_dir || !graph.is_candidate(&edge.target) {
            continue;
        }
        dir_importers
            .entry(target_dir)
            .or_insert_with(|| {
                dir_order.push(target_dir);
                BTreeSet::new()
            })
            .insert(source_dir);
    }

    let mut clusters: Vec<DirectoryCluster> = Vec::new();
    let mut by_parent: HashMap<&Path, usize> = HashMap::new();

    for dir in dir_order {
        let importers = &dir_importers[dir];
        if importers.len() != 1 {
            continue;
        }
        let Some(&parent) = importers.iter().next() else {
            continue;
        };
        if protected.iter().any(|p| p == dir) {
            debug!("not nesting protected directory {}", dir.display());
            continue;
        }
        if is_ancestor(dir, parent) || is_ancestor(parent, dir) {
            continue;
        }

        let idx = *by_parent.entry(parent).or_insert_with(|| {
            clusters.push(DirectoryCluster {
                parent: parent.to_path_buf(),
                children: Vec::new(),
            });
            clusters.len() - 1
        });
        clusters[idx].children.push(dir.to_path_buf());
    }

    let parents: HashSet<PathBuf> = clusters.iter().map(|c| c.parent.clone()).collect();
    for cluster in &mut clusters {
        cluster.children.retain(|child| !parents.contains(child));
    }
    clusters.retain(|c| !c.children.is_empty());

    let moving: Vec<PathBuf> = clusters
        .iter()
        .flat_map(|c| c.children.iter().cloned())
        .collect();
    clusters.retain(|c| {
        let inside_moving = moving.iter().any(|m| is_ancestor(m, &c.parent));
        if inside_moving {
            debug!("deferring cluster at {}: it is inside a moving directory", c.parent.display());
        }
        !inside_moving
    });

    clusters
}

/// True when `ancestor` strictly contains `descendant` (component-wise).
pub fn is_ancestor(ancestor: &Path, descendant: &Path) -> bool {
    descendant != ancestor && descendant.starts_with(ancestor)
}
