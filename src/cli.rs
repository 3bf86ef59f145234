use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Dependency-graph driven restructuring for TypeScript/JavaScript projects.
///
/// code-nest reads the import graph and nests files and directories that have a
/// single consumer under the module that uses them, rewriting relative imports so
/// everything still resolves.
#[derive(Parser, Debug)]
#[command(
    name = "code-nest",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan (and optionally apply) a restructuring of the files matched by PATTERN.
    ///
    /// By default nothing is written: the plan is printed and the command exits.
    Restructure {
        /// Directory, file or glob (relative to the project root) selecting the files
        /// that may move. Defaults to `root` in code-nest.toml, or `src`.
        pattern: Option<String>,

        /// Path to the project root (the directory holding tsconfig.json).
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Execute the plan instead of only printing it.
        #[arg(long)]
        apply: bool,

        /// With --apply, repeat plan/apply passes up to this many times.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
        max_depth: u16,

        /// Output the plan as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,

        /// Log per-file and per-cluster decisions to stderr.
        #[arg(short, long)]
        verbose: bool,
    },
}
