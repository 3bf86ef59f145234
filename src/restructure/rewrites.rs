use std::collections::HashMap;
use std::path::Path;

use crate::graph::edge::ImportEdge;

use super::plan::{FileMove, ImportRewrite, file_stem};

/// Extensions dropped from generated specifiers; the resolver probes them back.
const STRIPPED_EXTENSIONS: &[&str] = &[".tsx", ".ts", ".jsx", ".js"];

/// Extensions an author may have written out explicitly (`./util.js`).
const EXPLICIT_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Compute the import rewrites a set of moves requires.
///
/// Every edge with a moved source or a moved target gets a new specifier, computed
/// from the source's final location to the target's final location. Rewrites whose
/// new specifier equals the old one are dropped. The `file` of a rewrite is the
/// source path *before* moves, because rewrites are applied first.
pub fn compute_rewrites(moves: &[FileMove], edges: &[ImportEdge]) -> Vec<ImportRewrite> {
    let destination: HashMap<&Path, &Path> = moves
        .iter()
        .map(|m| (m.from.as_path(), m.to.as_path()))
        .collect();

    let mut rewrites = Vec::new();
    for edge in edges {
        let new_source = destination.get(edge.source.as_path()).copied();
        let new_target = destination.get(edge.target.as_path()).copied();
        if new_source.is_none() && new_target.is_none() {
            continue;
        }

        let specifier = compute_specifier(
            new_source.unwrap_or(&edge.source),
            new_target.unwrap_or(&edge.target),
            &edge.specifier,
        );
        if specifier == edge.specifier {
            continue;
        }
        rewrites.push(ImportRewrite {
            file: edge.source.clone(),
            old_specifier: edge.specifier.clone(),
            new_specifier: specifier,
        });
    }
    rewrites
}

/// The relative specifier `from_file` should use to import `to_file`.
///
/// - separators are always `/`;
/// - `.ts`/`.tsx`/`.js`/`.jsx` are stripped and a trailing `/index` is collapsed,
///   unless `original` spelled the target's extension out, in which case that
///   spelling is kept (`./util.js` stays `../util.js` after a move);
/// - the result always starts with `./` or `../`.
pub fn compute_specifier(from_file: &Path, to_file: &Path, original: &str) -> String {
    let from_dir = from_file.parent().unwrap_or_else(|| Path::new(""));
    let relative = pathdiff::diff_paths(to_file, from_dir).unwrap_or_else(|| to_file.to_path_buf());
    let relative = relative.to_string_lossy().replace('\\', "/");

    let specifier = match explicit_extension(original, to_file) {
        Some(ext) => with_extension(&relative, to_file, ext),
        None => collapse_index(strip_extension(&relative)),
    };
    ensure_relative(specifier)
}

/// The extension `original` spells out when its last segment names `to_file`'s stem.
fn explicit_extension<'a>(original: &'a str, to_file: &Path) -> Option<&'a str> {
    let last = original.rsplit('/').next()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() || !EXPLICIT_EXTENSIONS.contains(&ext) {
        return None;
    }
    (stem == file_stem(to_file)).then_some(ext)
}

fn with_extension(relative: &str, to_file: &Path, ext: &str) -> String {
    let base = match to_file.extension() {
        Some(actual) => relative
            .strip_suffix(actual.to_string_lossy().as_ref())
            .and_then(|r| r.strip_suffix('.'))
            .unwrap_or(relative),
        None => relative,
    };
    format!("{base}.{ext}")
}

fn strip_extension(relative: &str) -> &str {
    STRIPPED_EXTENSIONS
        .iter()
        .find_map(|ext| relative.strip_suffix(ext))
        .filter(|stripped| !stripped.is_empty() && !stripped.ends_with('/'))
        .unwrap_or(relative)
}

fn collapse_index(specifier: &str) -> String {
    specifier
        .strip_suffix("/index")
        .unwrap_or(specifier)
        .to_owned()
}

fn ensure_relative(specifier: String) -> String {
    if specifier == "." || specifier == ".." || specifier.starts_with("./") || specifier.starts_with("../") {
        specifier
    } else {
        format!("./{specifier}")
    }
}

/// Group rewrites by the file they apply to, keeping first-appearance order.
pub fn group_by_file(rewrites: &[ImportRewrite]) -> Vec<(&Path, Vec<&ImportRewrite>)> {
    let mut groups: Vec<(&Path, Vec<&ImportRewrite>)> = Vec::new();
    let mut index: HashMap<&Path, usize> = HashMap::new();
    for rewrite in rewrites {
        let idx = *index.entry(rewrite.file.as_path()).or_insert_with(|| {
            groups.push((rewrite.file.as_path(), Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(rewrite);
    }
    groups
}
