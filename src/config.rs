use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// File name of the optional tool configuration at the project root.
pub const CONFIG_FILE: &str = "code-nest.toml";

/// Configuration loaded from `code-nest.toml` at the project root.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct NestConfig {
    /// Default root pattern when none is given on the command line (`src` when unset).
    pub root: Option<String>,
    /// Module-resolution configuration, relative to the project root (`tsconfig.json` when unset).
    pub tsconfig: Option<PathBuf>,
    /// Additional path patterns to exclude from analysis (beyond .gitignore and node_modules).
    pub exclude: Option<Vec<String>>,
}

impl NestConfig {
    /// Load configuration from `code-nest.toml` in the given root directory.
    ///
    /// Returns a default (empty) configuration if the file does not exist or cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!("failed to parse {CONFIG_FILE}: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                warn!("failed to read {CONFIG_FILE}: {err}. Using defaults.");
                Self::default()
            }
        }
    }

    /// The root pattern used when the command line does not name one.
    pub fn default_root(&self) -> &str {
        self.root.as_deref().unwrap_or("src")
    }

    /// Absolute path of the module-resolution configuration for `project_root`.
    pub fn tsconfig_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(
            self.tsconfig
                .as_deref()
                .unwrap_or_else(|| Path::new("tsconfig.json")),
        )
    }
}
