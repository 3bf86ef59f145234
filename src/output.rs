use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::Path;

use serde_json::json;

use crate::restructure::RunReport;
use crate::restructure::plan::{RestructurePlan, display_path};
use crate::restructure::rewrites::group_by_file;

/// Print one pass's plan to stdout, with ANSI colour when stdout is a terminal.
pub fn print_plan(plan: &RestructurePlan, project_root: &Path, pass: usize) {
    let use_color = std::io::stdout().is_terminal();
    print!("{}", render_plan(plan, project_root, pass, use_color));
}

/// Render a plan: warnings, new directories, moves, rewrites grouped per file, and a
/// summary line. Passes after the first get a header.
pub fn render_plan(plan: &RestructurePlan, project_root: &Path, pass: usize, use_color: bool) -> String {
    let paint = |code: &str, s: &str| {
        if use_color {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    };
    let header = |s: &str| paint("1", s);
    let rel = |p: &Path| display_path(project_root, p);

    let mut out = String::new();
    if pass > 1 {
        let _ = writeln!(out, "{}\n", header(&format!("=== Pass {pass} ===")));
    }

    if !plan.warnings.is_empty() {
        let _ = writeln!(out, "{}", header("Warnings:"));
        for warning in &plan.warnings {
            let _ = writeln!(out, "  {}", paint("33", &format!("! {warning}")));
        }
        out.push('\n');
    }

    if !plan.new_directories.is_empty() {
        let _ = writeln!(out, "{}", header("New directories:"));
        for dir in &plan.new_directories {
            let _ = writeln!(out, "  {}", paint("32", &format!("+ {}/", rel(dir))));
        }
        out.push('\n');
    }

    if !plan.moves.is_empty() {
        let _ = writeln!(out, "{}", header("File moves:"));
        for mv in &plan.moves {
            let _ = writeln!(out, "  {} -> {}", rel(&mv.from), rel(&mv.to));
            let _ = writeln!(out, "    {}", paint("2", &mv.reason));
        }
        out.push('\n');
    }

    if !plan.rewrites.is_empty() {
        let _ = writeln!(out, "{}", header("Import rewrites:"));
        for (file, rewrites) in group_by_file(&plan.rewrites) {
            let _ = writeln!(out, "  {}", rel(file));
            for r in rewrites {
                let _ = writeln!(out, "    '{}' -> '{}'", r.old_specifier, r.new_specifier);
            }
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "Summary: {} file(s) moved, {} imports rewritten",
        plan.moves.len(),
        plan.rewrites.len()
    );
    out
}

/// The whole run as JSON, with project-relative paths.
pub fn report_to_json(report: &RunReport, project_root: &Path) -> serde_json::Value {
    let rel = |p: &Path| display_path(project_root, p);
    let passes: Vec<_> = report
        .passes
        .iter()
        .map(|pass| {
            let plan = &pass.plan;
            json!({
                "moves": plan.moves.iter().map(|m| json!({
                    "from": rel(&m.from),
                    "to": rel(&m.to),
                    "reason": m.reason,
                })).collect::<Vec<_>>(),
                "rewrites": plan.rewrites.iter().map(|r| json!({
                    "file": rel(&r.file),
                    "old_specifier": r.old_specifier,
                    "new_specifier": r.new_specifier,
                })).collect::<Vec<_>>(),
                "new_directories": plan.new_directories.iter().map(|d| rel(d)).collect::<Vec<_>>(),
                "warnings": plan.warnings,
                "graph": pass.stats,
                "execution": pass.execution,
            })
        })
        .collect();

    json!({
        "candidates": report.candidates,
        "applied": report.applied(),
        "passes": passes,
    })
}

pub fn print_json(report: &RunReport, project_root: &Path) {
    match serde_json::to_string_pretty(&report_to_json(report, project_root)) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error serialising plan: {e}"),
    }
}
