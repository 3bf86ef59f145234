use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{RestructureError, Result};
use crate::parser::parse_references;

use super::plan::{ImportRewrite, RestructurePlan, display_path};
use super::rewrites::group_by_file;

/// What [`execute_plan`] changed on disk.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub files_rewritten: usize,
    pub directories_created: usize,
    pub files_moved: usize,
    pub directories_removed: usize,
}

/// Apply a plan to the file system.
///
/// 1. rewrite import specifiers in place, at their original paths;
/// 2. create the new directories;
/// 3. move files (creating destination parents as needed);
/// 4. remove source directories left empty, walking upward but never past `root`.
///
/// The first failure aborts the run. Nothing already done is rolled back.
pub fn execute_plan(plan: &RestructurePlan, root: &Path) -> Result<ExecutionReport> {
    let mut report = ExecutionReport::default();

    for (file, rewrites) in group_by_file(&plan.rewrites) {
        let content = fs::read_to_string(file).map_err(|e| RestructureError::io("read", file, e))?;
        let updated = apply_rewrites(file, &content, &rewrites)?;
        if updated != content {
            fs::write(file, updated).map_err(|e| RestructureError::io("write", file, e))?;
            report.files_rewritten += 1;
            debug!("rewrote imports in {}", display_path(root, file));
        }
    }

    for dir in &plan.new_directories {
        fs::create_dir_all(dir).map_err(|e| RestructureError::io("create directory", dir, e))?;
        report.directories_created += 1;
    }

    for mv in &plan.moves {
        if let Some(parent) = mv.to.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RestructureError::io("create directory", parent, e))?;
        }
        fs::rename(&mv.from, &mv.to).map_err(|e| RestructureError::io("move", &mv.from, e))?;
        report.files_moved += 1;
        debug!(
            "moved {} -> {}",
            display_path(root, &mv.from),
            display_path(root, &mv.to)
        );
    }

    report.directories_removed =
        remove_empty_directories(plan.moves.iter().filter_map(|m| m.from.parent()), root)?;

    info!(
        rewritten = report.files_rewritten,
        moved = report.files_moved,
        created = report.directories_created,
        removed = report.directories_removed,
        "plan applied"
    );
    Ok(report)
}

/// Replace every specifier in `content` that has a rewrite, keeping its quotes.
///
/// The file is re-parsed and only the string contents of import, re-export and
/// dynamic-import specifiers are replaced, so identical text elsewhere (comments,
/// unrelated strings) is left alone.
fn apply_rewrites(path: &Path, content: &str, rewrites: &[&ImportRewrite]) -> Result<String> {
    let replacements: HashMap<&str, &str> = rewrites
        .iter()
        .map(|r| (r.old_specifier.as_str(), r.new_specifier.as_str()))
        .collect();

    let references =
        parse_references(path, content.as_bytes()).map_err(|e| RestructureError::Parse {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })?;

    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for reference in references {
        let Some(replacement) = replacements.get(reference.specifier.as_str()) else {
            continue;
        };
        out.push_str(&content[last..reference.span.start]);
        out.push_str(&escape_quote(replacement, reference.quote));
        last = reference.span.end;
    }
    out.push_str(&content[last..]);
    Ok(out)
}

/// Escape `quote` (and backslashes) so `specifier` stays a single string literal.
fn escape_quote(specifier: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(specifier.len());
    for c in specifier.chars() {
        if c == quote || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Remove directories that no longer have entries, deepest first. A removal makes the
/// parent a candidate too. `root` and anything outside it are never touched.
fn remove_empty_directories<'a>(
    dirs: impl Iterator<Item = &'a Path>,
    root: &Path,
) -> Result<usize> {
    let mut pending: BTreeSet<PathBuf> = dirs.map(Path::to_path_buf).collect();
    let mut removed = 0;

    while let Some(dir) = pending
        .iter()
        .max_by_key(|d| d.components().count())
        .cloned()
    {
        pending.remove(&dir);
        if dir == root || !dir.starts_with(root) || !dir.is_dir() {
            continue;
        }
        let mut entries =
            fs::read_dir(&dir).map_err(|e| RestructureError::io("read directory", &dir, e))?;
        if entries.next().is_some() {
            continue;
        }
        fs::remove_dir(&dir).map_err(|e| RestructureError::io("remove directory", &dir, e))?;
        removed += 1;
        debug!("removed empty directory {}", display_path(root, &dir));
        if let Some(parent) = dir.parent() {
            pending.insert(parent.to_path_buf());
        }
    }
    Ok(removed)
}
