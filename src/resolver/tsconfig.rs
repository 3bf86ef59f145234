use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{RestructureError, Result};

/// The project's module-resolution settings, validated before any analysis.
#[derive(Debug, Clone)]
pub struct ProjectSettings {
    /// Absolute path to the tsconfig handed to the resolver.
    pub tsconfig_path: PathBuf,
}

/// Parse tsconfig content. Plain JSON is tried first; tsconfig files routinely carry
/// comments and trailing commas, so JSON5 is the fallback.
pub(crate) fn parse_tsconfig_value(content: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str(content) {
        return Some(v);
    }
    if let Ok(v) = json_five::from_str::<Value>(content) {
        return Some(v);
    }
    None
}

/// Load and validate the resolution configuration at `tsconfig_path`.
///
/// # Errors
/// [`RestructureError::Configuration`] when the file is missing, unreadable, not
/// valid JSON/JSON5, or not a JSON object.
pub fn load_project_settings(tsconfig_path: &Path) -> Result<ProjectSettings> {
    let config_error = |reason: String| RestructureError::Configuration {
        path: tsconfig_path.to_path_buf(),
        reason,
    };

    let content = std::fs::read_to_string(tsconfig_path).map_err(|e| config_error(e.to_string()))?;
    let value = parse_tsconfig_value(&content)
        .ok_or_else(|| config_error("not valid JSON".to_owned()))?;
    if !value.is_object() {
        return Err(config_error("expected a JSON object".to_owned()));
    }

    Ok(ProjectSettings {
        tsconfig_path: tsconfig_path.to_path_buf(),
    })
}
