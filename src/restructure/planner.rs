use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::walker::list_files_recursive;

use super::clusters::{DirectoryCluster, FileCluster};
use super::plan::{FileMove, display_path, file_stem};

/// Extensions whose sibling file would take precedence over a same-named directory
/// when resolving an extensionless specifier.
const SHADOWING_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Moves, new directories and warnings produced by [`MovePlanner`].
#[derive(Debug, Default)]
pub struct MovePlan {
    pub moves: Vec<FileMove>,
    pub directories: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Turns clusters into concrete moves.
///
/// File clusters are planned first, then directory clusters. The planner remembers
/// every source already scheduled and every destination already claimed, so later
/// clusters cannot collide with earlier ones.
pub struct MovePlanner<'a> {
    root: &'a Path,
    plan: MovePlan,
    scheduled: HashSet<PathBuf>,
    destinations: HashSet<PathBuf>,
}

impl<'a> MovePlanner<'a> {
    /// `root` is the project root, used to print warnings as relative paths.
    pub fn new(root: &'a Path) -> Self {
        Self {
            root,
            plan: MovePlan::default(),
            scheduled: HashSet::new(),
            destinations: HashSet::new(),
        }
    }

    /// Plan `dirname(root)/stem(root)/` for each file cluster.
    ///
    /// The root becomes `index.<ext>` (keeping its own extension) and each child
    /// moves in under its own name.
    pub fn plan_file_moves(&mut self, clusters: &[FileCluster]) {
        for cluster in clusters {
            let Some(dir) = cluster.root.parent() else {
                continue;
            };
            let stem = file_stem(&cluster.root);
            let new_dir = dir.join(stem);

            if std::iter::once(&cluster.root)
                .chain(&cluster.children)
                .any(|f| self.scheduled.contains(f))
            {
                debug!("cluster at {} overlaps an earlier move", cluster.root.display());
                continue;
            }
            if self.has_conflict(&cluster.root, &new_dir, &cluster.root) {
                continue;
            }

            let index_name = match cluster.root.extension() {
                Some(ext) => format!("index.{}", ext.to_string_lossy()),
                None => "index".to_owned(),
            };

            self.claim_destination(&new_dir);
            self.schedule(FileMove {
                from: cluster.root.clone(),
                to: new_dir.join(index_name),
                reason: format!("Main module of new {stem}/ directory"),
            });
            for child in &cluster.children {
                let Some(name) = child.file_name() else {
                    continue;
                };
                self.schedule(FileMove {
                    from: child.clone(),
                    to: new_dir.join(name),
                    reason: format!("Only imported by {stem}"),
                });
            }
        }
    }

    /// Plan `parent/basename(child)/` for each child directory, moving every file
    /// underneath it with its relative layout preserved.
    ///
    /// A child that holds a file already scheduled by a file cluster is deferred to a
    /// later pass with a warning.
    ///
    /// # Errors
    /// Propagates failures to list a child directory.
    pub fn plan_directory_moves(&mut self, clusters: &[DirectoryCluster]) -> Result<()> {
        for cluster in clusters {
            let parent_name = cluster
                .parent
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            for child in &cluster.children {
                let Some(name) = child.file_name() else {
                    continue;
                };
                let dest = cluster.parent.join(name);
                if self.has_conflict(child, &dest, child) {
                    continue;
                }

                let files = list_files_recursive(child)?;
                if files.is_empty() {
                    debug!("{} has no files to move", child.display());
                    continue;
                }
                if files.iter().any(|f| self.scheduled.contains(f)) {
                    self.record_warning(format!(
                        "Deferring {}/: it contains files already scheduled to move",
                        display_path(self.root, child)
                    ));
                    continue;
                }

                self.claim_destination(&dest);
                for file in files {
                    let Ok(relative) = file.strip_prefix(child) else {
                        continue;
                    };
                    let to = dest.join(relative);
                    self.schedule(FileMove {
                        from: file,
                        to,
                        reason: format!("Directory only imported from {parent_name}/"),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> MovePlan {
        self.plan
    }

    /// Check `dest` for a conflict and record a warning naming the skipped `subject`.
    ///
    /// `leaving` is the path that vacates the sibling slot (`foo.ts` for a new `foo/`).
    fn has_conflict(&mut self, subject: &Path, dest: &Path, leaving: &Path) -> bool {
        let subject_label = if subject.is_dir() {
            format!("{}/", display_path(self.root, subject))
        } else {
            display_path(self.root, subject)
        };
        let dest_label = display_path(self.root, dest);

        if dest.exists() {
            self.record_warning(format!("Skipping {subject_label}: directory {dest_label}/ already exists"));
            return true;
        }
        if self.destinations.contains(dest) {
            self.record_warning(format!(
                "Skipping {subject_label}: directory {dest_label}/ is already the destination of another move"
            ));
            return true;
        }
        if let Some(sibling) = self.shadowing_sibling(dest, leaving) {
            self.record_warning(format!(
                "Skipping {subject_label}: {} would shadow directory {dest_label}/",
                display_path(self.root, &sibling)
            ));
            return true;
        }
        false
    }

    /// A file next to `dest` named `<dest>.<ext>` that stays in place.
    fn shadowing_sibling(&self, dest: &Path, leaving: &Path) -> Option<PathBuf> {
        let name = dest.file_name()?.to_string_lossy();
        SHADOWING_EXTENSIONS
            .iter()
            .map(|ext| dest.with_file_name(format!("{name}.{ext}")))
            .find(|sibling| {
                sibling.is_file() && sibling != leaving && !self.scheduled.contains(sibling)
            })
    }

    fn record_warning(&mut self, message: String) {
        debug!("{message}");
        self.plan.warnings.push(message);
    }

    fn claim_destination(&mut self, dir: &Path) {
        self.destinations.insert(dir.to_path_buf());
        self.plan.directories.push(dir.to_path_buf());
    }

    fn schedule(&mut self, mv: FileMove) {
        self.scheduled.insert(mv.from.clone());
        self.plan.moves.push(mv);
    }
}
