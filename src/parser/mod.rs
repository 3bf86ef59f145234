pub mod imports;
pub mod languages;

use std::cell::RefCell;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tree_sitter::Parser;

use imports::{ModuleReference, extract_references};
use languages::Grammar;

// Parsers are reused across files; the graph builder parses every project file on one thread.
thread_local! {
    static PARSERS: [RefCell<Option<Parser>>; 3] = const {
        [RefCell::new(None), RefCell::new(None), RefCell::new(None)]
    };
}

/// Returns the grammar for `path`'s extension, or `None` for non-source files.
pub fn grammar_for_path(path: &Path) -> Option<Grammar> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    Grammar::for_extension(ext)
}

/// Parse a source file and extract its module references (imports, re-exports,
/// dynamic imports), ordered by position.
///
/// # Errors
/// Returns an error if:
/// - The file extension is not a supported source extension
/// - `tree-sitter` returns `None` (malformed / truncated source)
pub fn parse_references(path: &Path, source: &[u8]) -> Result<Vec<ModuleReference>> {
    let grammar =
        grammar_for_path(path).ok_or_else(|| anyhow!("unsupported file extension: {:?}", path))?;

    let tree = PARSERS.with(|parsers| -> Result<_> {
        let mut slot = parsers[grammar.slot()].borrow_mut();
        if slot.is_none() {
            let mut parser = Parser::new();
            parser
                .set_language(&grammar.language())
                .with_context(|| format!("failed to set tree-sitter language for {grammar:?}"))?;
            *slot = Some(parser);
        }
        let parser = slot.as_mut().ok_or_else(|| anyhow!("parser slot is empty"))?;
        Ok(parser.parse(source, None))
    })?;
    let tree = tree.ok_or_else(|| anyhow!("tree-sitter returned None for {:?}", path))?;

    Ok(extract_references(&tree, source, grammar))
}
