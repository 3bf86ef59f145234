use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::NestConfig;
use crate::error::{RestructureError, Result};

/// Source file extensions that take part in the module graph.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// The files eligible for restructuring, plus the directories the root pattern matched.
#[derive(Debug, Default)]
pub struct CandidateSet {
    /// Directories matched by the root pattern. These never move themselves.
    pub scope_roots: Vec<PathBuf>,
    /// Candidate source files, in traversal order, without duplicates.
    pub files: Vec<PathBuf>,
}

/// Walk a project directory and collect every source file that can import a candidate.
///
/// Only `node_modules` and hidden entries are skipped. `.gitignore` rules and
/// `config.exclude` narrow the candidate set, not the project: an excluded test file
/// still imports the files that move, and its specifiers must be rewritten with them.
/// Traversal is sorted by file name so two walks over an unchanged tree yield the
/// same order.
pub fn walk_project(root: &Path) -> Vec<PathBuf> {
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    collect_source_files(walker, |_| true, &mut files);
    files
}

/// Expand a root pattern (relative to `project_root`) into candidate files.
///
/// A plain path names a directory to walk (or a single file). A pattern containing
/// glob metacharacters is expanded with `glob`, and every match is handled the same way.
pub fn discover_candidates(project_root: &Path, pattern: &str, config: &NestConfig) -> CandidateSet {
    let mut set = CandidateSet::default();

    let matches: Vec<PathBuf> = if is_glob(pattern) {
        let full = project_root.join(pattern).to_string_lossy().into_owned();
        match glob::glob(&full) {
            Ok(paths) => paths.flatten().collect(),
            Err(err) => {
                warn!("invalid root pattern {pattern:?}: {err}");
                Vec::new()
            }
        }
    } else {
        vec![project_root.join(pattern)]
    };

    let mut seen = HashSet::new();
    for entry in matches {
        if entry.is_dir() {
            let mut files = Vec::new();
            collect_candidates(&entry, config, &mut files);
            set.files.extend(files.into_iter().filter(|f| seen.insert(f.clone())));
            set.scope_roots.push(entry);
        } else if entry.is_file()
            && has_source_extension(&entry)
            && !is_excluded_by_config(&entry, config)
            && seen.insert(entry.clone())
        {
            set.files.push(entry);
        }
    }

    debug!(
        "root pattern {:?} matched {} file(s) in {} director(ies)",
        pattern,
        set.files.len(),
        set.scope_roots.len()
    );
    set
}

/// List every file below `dir`, hidden and ignored files included.
///
/// Used for directory moves: whatever is left behind would keep the source
/// directory alive, so nothing is filtered.
pub fn list_files_recursive(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let walker = ignore::WalkBuilder::new(dir)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = result.map_err(|err| {
            RestructureError::io("list directory", dir, std::io::Error::other(err.to_string()))
        })?;
        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

/// Collect candidate files below `root`, honouring `.gitignore` and `config.exclude`.
fn collect_candidates(root: &Path, config: &NestConfig, out: &mut Vec<PathBuf>) {
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(true)
        // Read .gitignore files even when the directory is not inside a git repository.
        .require_git(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    collect_source_files(walker, |path| !is_excluded_by_config(path, config), out);
}

fn collect_source_files(walker: ignore::Walk, keep: impl Fn(&Path) -> bool, out: &mut Vec<PathBuf>) {
    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };

        let path = entry.path();

        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }

        // Hard exclusion, regardless of ignore files.
        if path_contains_node_modules(path) {
            continue;
        }

        if !has_source_extension(path) || !keep(path) {
            continue;
        }

        out.push(path.to_path_buf());
    }
}

fn has_source_extension(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    SOURCE_EXTENSIONS.contains(&ext)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Returns true if any component of `path` is named `node_modules`.
pub fn path_contains_node_modules(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| s == "node_modules")
            .unwrap_or(false)
    })
}

/// Returns true if `path` matches any exclusion pattern from config.
fn is_excluded_by_config(path: &Path, config: &NestConfig) -> bool {
    let patterns = match &config.exclude {
        Some(p) => p,
        None => return false,
    };

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        let Ok(matcher) = glob::Pattern::new(pattern) else {
            continue;
        };
        if matcher.matches(&path_str) {
            return true;
        }
        // Also check if any component matches the pattern directly.
        if path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .any(|s| matcher.matches(s))
        {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_walk_project_returns_only_source_files() {
        let dir = tmp();
        fs::write(dir.path().join("main.ts"), "export {}").unwrap();
        fs::write(dir.path().join("README.md"), "# Hello").unwrap();

        let files = walk_project(dir.path());
        assert_eq!(names(&files, dir.path()), vec!["main.ts"]);
    }

    #[test]
    fn test_walk_project_excludes_node_modules() {
        let dir = tmp();
        let nm = dir.path().join("node_modules").join("pkg");
        fs::create_dir_all(&nm).unwrap();
        fs::write(nm.join("index.js"), "module.exports = {}").unwrap();
        fs::write(dir.path().join("app.ts"), "export {}").unwrap();

        let files = walk_project(dir.path());
        assert_eq!(names(&files, dir.path()), vec!["app.ts"]);
    }

    #[test]
    fn test_exclude_patterns_narrow_candidates_not_project() {
        let dir = tmp();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("app.ts"), "export {}").unwrap();
        fs::write(src.join("app.test.ts"), "export {}").unwrap();

        let config = NestConfig {
            exclude: Some(vec!["*.test.ts".to_string()]),
            ..NestConfig::default()
        };
        let set = discover_candidates(dir.path(), "src", &config);
        assert_eq!(names(&set.files, dir.path()), vec!["src/app.ts"]);

        let files = walk_project(dir.path());
        assert_eq!(names(&files, dir.path()), vec!["src/app.test.ts", "src/app.ts"]);
    }

    #[test]
    fn test_gitignored_sources_still_join_the_project_walk() {
        let dir = tmp();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("generated")).unwrap();
        fs::write(src.join(".gitignore"), "generated/\n").unwrap();
        fs::write(src.join("app.ts"), "export {}").unwrap();
        fs::write(src.join("generated").join("client.ts"), "export {}").unwrap();

        let set = discover_candidates(dir.path(), "src", &NestConfig::default());
        assert_eq!(names(&set.files, dir.path()), vec!["src/app.ts"]);

        let files = walk_project(dir.path());
        assert_eq!(
            names(&files, dir.path()),
            vec!["src/app.ts", "src/generated/client.ts"]
        );
    }

    #[test]
    fn test_walk_order_is_sorted_and_stable() {
        let dir = tmp();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("c.ts"), "").unwrap();
        fs::write(dir.path().join("a.ts"), "").unwrap();
        fs::write(dir.path().join("b").join("x.ts"), "").unwrap();

        let first = walk_project(dir.path());
        let second = walk_project(dir.path());
        assert_eq!(first, second);
        assert_eq!(names(&first, dir.path()), vec!["a.ts", "b/x.ts", "c.ts"]);
    }

    #[test]
    fn test_discover_candidates_plain_directory() {
        let dir = tmp();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.ts"), "").unwrap();
        fs::write(dir.path().join("outside.ts"), "").unwrap();

        let set = discover_candidates(dir.path(), "src", &NestConfig::default());
        assert_eq!(set.scope_roots, vec![src.clone()]);
        assert_eq!(names(&set.files, dir.path()), vec!["src/a.ts"]);
    }

    #[test]
    fn test_discover_candidates_glob_pattern() {
        let dir = tmp();
        for pkg in ["one", "two"] {
            let src = dir.path().join("packages").join(pkg).join("src");
            fs::create_dir_all(&src).unwrap();
            fs::write(src.join("index.ts"), "").unwrap();
        }

        let set = discover_candidates(dir.path(), "packages/*/src", &NestConfig::default());
        assert_eq!(set.scope_roots.len(), 2);
        assert_eq!(
            names(&set.files, dir.path()),
            vec!["packages/one/src/index.ts", "packages/two/src/index.ts"]
        );
    }

    #[test]
    fn test_discover_candidates_missing_directory_is_empty() {
        let dir = tmp();
        let set = discover_candidates(dir.path(), "src", &NestConfig::default());
        assert!(set.files.is_empty());
        assert!(set.scope_roots.is_empty());
    }

    #[test]
    fn test_list_files_recursive_includes_hidden_and_non_source() {
        let dir = tmp();
        let widgets = dir.path().join("widgets");
        fs::create_dir_all(widgets.join("icons")).unwrap();
        fs::write(widgets.join("button.ts"), "").unwrap();
        fs::write(widgets.join(".keep"), "").unwrap();
        fs::write(widgets.join("icons").join("star.svg"), "").unwrap();

        let files = list_files_recursive(&widgets).unwrap();
        assert_eq!(
            names(&files, &widgets),
            vec![".keep", "button.ts", "icons/star.svg"]
        );
    }
}
