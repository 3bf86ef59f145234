mod cli;
mod config;
mod error;
mod graph;
mod output;
mod parser;
mod resolver;
mod restructure;
mod walker;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use restructure::{Project, RestructureOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Restructure {
            pattern,
            project,
            apply,
            max_depth,
            json,
            verbose,
        } => {
            // Logs go to stderr so stdout stays clean for --json.
            let default_level = if verbose { "debug" } else { "warn" };
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(default_level)),
                )
                .init();

            let project = Project::open(&project)
                .with_context(|| format!("cannot restructure {}", project.display()))?;
            let pattern = pattern.unwrap_or_else(|| project.config.default_root().to_owned());
            let options = RestructureOptions {
                pattern,
                apply,
                max_depth: usize::from(max_depth),
            };

            let report = restructure::run(&project, &options, |pass, plan| {
                if !json && (!plan.moves.is_empty() || !plan.warnings.is_empty()) {
                    output::print_plan(plan, &project.root, pass);
                }
            })
            .context("restructuring failed")?;

            if json {
                output::print_json(&report, &project.root);
            } else if report.candidates == 0 {
                println!("No files found matching pattern: {}", options.pattern);
            } else if report.passes.iter().all(|p| p.plan.is_empty()) {
                println!("No restructuring needed");
            } else if report.applied() {
                let moved: usize = report.passes.iter().map(|p| p.plan.moves.len()).sum();
                let passes = report.passes.iter().filter(|p| p.execution.is_some()).count();
                println!("Restructuring complete: {moved} file(s) moved in {passes} pass(es)");
            } else {
                println!("\nDry run. Use --apply to execute.");
            }
        }
    }

    Ok(())
}
