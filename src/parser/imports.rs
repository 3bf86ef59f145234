use std::ops::Range;
use std::sync::OnceLock;

use tree_sitter::{Language, Node, Query, QueryCursor, StreamingIterator, Tree};

use super::languages::Grammar;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// The syntactic form a module reference was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Static import: `import { X } from './module'`, `import './side-effect'`
    Import,
    /// Re-export with a source: `export { X } from './module'`, `export * from './module'`
    ReExport,
    /// Dynamic import with a single string literal: `import('./module')`
    DynamicImport,
}

/// A module specifier found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    pub kind: ReferenceKind,
    /// The specifier text as written, without quotes.
    pub specifier: String,
    /// Byte range of the specifier text inside the source (quotes excluded).
    pub span: Range<usize>,
    /// The quote character surrounding the specifier.
    pub quote: char,
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// Static imports, including type-only and side-effect imports.
const IMPORT_QUERY: &str = r#"
    (import_statement
      source: (string) @source)
"#;

/// Exports that carry a module source (`export ... from`).
const REEXPORT_QUERY: &str = r#"
    (export_statement
      source: (string) @source)
"#;

/// Dynamic import() calls. The single-argument check is done in code.
const DYNAMIC_IMPORT_QUERY: &str = r#"
    (call_expression
      function: (import)
      arguments: (arguments) @args)
"#;

// ---------------------------------------------------------------------------
// Query cache
// ---------------------------------------------------------------------------

/// Compiled queries for one grammar. Queries are bound to the language they were
/// compiled for, so each grammar gets its own set.
struct ReferenceQueries {
    import: Query,
    reexport: Query,
    dynamic_import: Query,
}

static QUERIES: [OnceLock<ReferenceQueries>; 3] = [OnceLock::new(), OnceLock::new(), OnceLock::new()];

fn queries(grammar: Grammar) -> &'static ReferenceQueries {
    QUERIES[grammar.slot()].get_or_init(|| {
        let language: Language = grammar.language();
        ReferenceQueries {
            import: Query::new(&language, IMPORT_QUERY).expect("invalid import query"),
            reexport: Query::new(&language, REEXPORT_QUERY).expect("invalid re-export query"),
            dynamic_import: Query::new(&language, DYNAMIC_IMPORT_QUERY)
                .expect("invalid dynamic import query"),
        }
    })
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Turn a `string` node into a reference, if it holds a plain literal.
///
/// Strings with escape sequences or no content are skipped: their source text is
/// not the specifier value, so they cannot be rewritten by span.
fn string_reference(kind: ReferenceKind, string: Node, source: &[u8]) -> Option<ModuleReference> {
    if string.kind() != "string" || string.named_child_count() != 1 {
        return None;
    }
    let fragment = string.named_child(0)?;
    if fragment.kind() != "string_fragment" {
        return None;
    }
    let quote = *source.get(string.start_byte())? as char;
    let specifier = fragment.utf8_text(source).ok()?.to_owned();
    Some(ModuleReference {
        kind,
        specifier,
        span: fragment.start_byte()..fragment.end_byte(),
        quote,
    })
}

fn collect_captures(
    query: &Query,
    capture: &str,
    tree: &Tree,
    source: &[u8],
    mut visit: impl FnMut(Node),
) {
    let Some(idx) = query.capture_index_for_name(capture) else {
        return;
    };
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);
    while let Some(m) = matches.next() {
        for cap in m.captures.iter().filter(|c| c.index == idx) {
            visit(cap.node);
        }
    }
}

/// Extract every module reference (imports, re-exports, dynamic imports) from a
/// parsed syntax tree, ordered by position in the source.
pub fn extract_references(tree: &Tree, source: &[u8], grammar: Grammar) -> Vec<ModuleReference> {
    let q = queries(grammar);
    let mut refs = Vec::new();

    collect_captures(&q.import, "source", tree, source, |node| {
        refs.extend(string_reference(ReferenceKind::Import, node, source));
    });

    collect_captures(&q.reexport, "source", tree, source, |node| {
        refs.extend(string_reference(ReferenceKind::ReExport, node, source));
    });

    collect_captures(&q.dynamic_import, "args", tree, source, |args| {
        // Only `import('literal')`: computed or multi-argument calls are not module edges.
        if args.named_child_count() != 1 {
            return;
        }
        if let Some(arg) = args.named_child(0) {
            refs.extend(string_reference(ReferenceKind::DynamicImport, arg, source));
        }
    });

    refs.sort_by_key(|r| r.span.start);
    refs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
