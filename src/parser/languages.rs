use tree_sitter::Language;

/// The tree-sitter grammar a source file is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Grammar {
    /// Pick the grammar for a file extension, or `None` if the extension is not supported.
    ///
    /// - `.ts`/`.mts`/`.cts` -> TypeScript grammar (`LANGUAGE_TYPESCRIPT`)
    /// - `.tsx` -> TSX grammar (`LANGUAGE_TSX`)
    /// - `.js`/`.jsx`/`.mjs`/`.cjs` -> JavaScript grammar (`LANGUAGE`, which also covers JSX)
    ///
    /// TypeScript and TSX MUST stay separate: the TypeScript grammar cannot parse JSX, and
    /// the TSX grammar breaks angle-bracket type assertions (`<T>expr`).
    pub fn for_extension(ext: &str) -> Option<Grammar> {
        match ext {
            "ts" | "mts" | "cts" => Some(Grammar::TypeScript),
            "tsx" => Some(Grammar::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(Grammar::JavaScript),
            _ => None,
        }
    }

    pub fn language(self) -> Language {
        match self {
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    /// Stable slot used to index per-grammar caches.
    pub(crate) fn slot(self) -> usize {
        match self {
            Grammar::TypeScript => 0,
            Grammar::Tsx => 1,
            Grammar::JavaScript => 2,
        }
    }
}
