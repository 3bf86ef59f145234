use std::path::{Path, PathBuf};

use oxc_resolver::{ResolveOptions, Resolver, TsconfigOptions, TsconfigReferences};

/// The outcome of resolving a single import specifier.
#[derive(Debug)]
pub enum ResolutionOutcome {
    /// Successfully resolved to an absolute file path.
    Resolved(PathBuf),
    /// The specifier could not be resolved. `String` contains a human-readable reason.
    Unresolved(String),
}

/// Build an `oxc_resolver::Resolver` configured for TypeScript projects.
///
/// - TypeScript extensions are probed first (`.ts`, `.tsx`, `.mts`), then JavaScript.
/// - `.js` extension aliases map to `.ts`/`.tsx`/`.js` so projects that write
///   `import './foo.js'` in TypeScript source resolve correctly.
/// - Directories fall back to their `index` file.
/// - The project's tsconfig is attached so `paths`/`baseUrl` and project references
///   behave as they do in the compiler.
pub fn build_resolver(tsconfig_path: &Path) -> Resolver {
    Resolver::new(ResolveOptions {
        extensions: vec![
            ".ts".into(),
            ".tsx".into(),
            ".mts".into(),
            ".js".into(),
            ".jsx".into(),
            ".mjs".into(),
            ".json".into(),
        ],
        extension_alias: vec![(
            ".js".into(),
            vec![".ts".into(), ".tsx".into(), ".js".into()],
        )],
        tsconfig: Some(TsconfigOptions {
            config_file: tsconfig_path.to_path_buf(),
            references: TsconfigReferences::Auto,
        }),
        condition_names: vec!["node".into(), "import".into()],
        ..ResolveOptions::default()
    })
}

/// Resolve a single import specifier from the perspective of `from_file`.
///
/// The resolver uses `from_file`'s parent directory as the resolution base, which matches
/// how Node.js and TypeScript resolve relative imports.
pub fn resolve_import(resolver: &Resolver, from_file: &Path, specifier: &str) -> ResolutionOutcome {
    let dir = match from_file.parent() {
        Some(d) => d,
        None => {
            return ResolutionOutcome::Unresolved("from_file has no parent directory".to_owned());
        }
    };

    match resolver.resolve(dir, specifier) {
        Ok(resolution) => ResolutionOutcome::Resolved(resolution.into_path_buf()),
        Err(e) => ResolutionOutcome::Unresolved(e.to_string()),
    }
}

/// Only relative specifiers (`./x`, `../x`, `.`, `..`) take part in restructuring.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with('.')
}
