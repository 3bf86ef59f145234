//! Plan and apply a dependency-driven restructuring pass.
//!
//! One pass is: walk, build the module graph, detect clusters, plan moves, compute
//! rewrites. Applying a pass executes the plan on disk. With `max_depth > 1` and
//! `apply`, passes repeat until one finds nothing to move.

pub mod clusters;
pub mod executor;
pub mod plan;
pub mod planner;
pub mod rewrites;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::NestConfig;
use crate::error::{RestructureError, Result};
use crate::graph::ImportGraph;
use crate::resolver::{GraphStats, ProjectSettings, build_import_graph, load_project_settings};
use crate::walker::{CandidateSet, discover_candidates, walk_project};

use clusters::{cluster_directories, cluster_files};
use executor::{ExecutionReport, execute_plan};
use plan::RestructurePlan;
use planner::{MovePlan, MovePlanner};
use rewrites::compute_rewrites;

/// A project opened for restructuring: canonical root, tool config and validated
/// resolution settings.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: NestConfig,
    pub settings: ProjectSettings,
}

impl Project {
    /// Open the project at `root`.
    ///
    /// # Errors
    /// [`RestructureError::Configuration`] when the root does not exist or the
    /// resolution configuration is missing or invalid. Nothing is analysed before
    /// this check passes.
    pub fn open(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .map_err(|e| RestructureError::Configuration {
                path: root.to_path_buf(),
                reason: format!("cannot open project root: {e}"),
            })?;
        let config = NestConfig::load(&root);
        let settings = load_project_settings(&config.tsconfig_path(&root))?;
        Ok(Self {
            root,
            config,
            settings,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RestructureOptions {
    pub pattern: String,
    pub apply: bool,
    pub max_depth: usize,
}

/// One planned (and possibly applied) pass.
#[derive(Debug)]
pub struct Pass {
    pub plan: RestructurePlan,
    pub stats: GraphStats,
    pub execution: Option<ExecutionReport>,
}

/// Result of [`run`].
#[derive(Debug, Default)]
pub struct RunReport {
    /// Candidate files matched by the pattern on the first pass.
    pub candidates: usize,
    pub passes: Vec<Pass>,
}

impl RunReport {
    pub fn applied(&self) -> bool {
        self.passes.iter().any(|p| p.execution.is_some())
    }
}

/// Plan one pass over the current state of the project.
pub fn build_plan(project: &Project, candidates: &CandidateSet) -> Result<(RestructurePlan, GraphStats)> {
    let (_, plan, stats) = plan_with_graph(project, candidates)?;
    Ok((plan, stats))
}

fn plan_with_graph(
    project: &Project,
    candidates: &CandidateSet,
) -> Result<(ImportGraph, RestructurePlan, GraphStats)> {
    let project_files = walk_project(&project.root);
    let (graph, stats) = build_import_graph(&candidates.files, &project_files, &project.settings);

    let mut protected = candidates.scope_roots.clone();
    protected.push(project.root.clone());

    let file_clusters = cluster_files(&graph);
    let dir_clusters = cluster_directories(&graph, &protected);
    debug!(
        file_clusters = file_clusters.len(),
        directory_clusters = dir_clusters.len(),
        "clusters detected"
    );

    let mut planner = MovePlanner::new(&project.root);
    planner.plan_file_moves(&file_clusters);
    planner.plan_directory_moves(&dir_clusters)?;
    let MovePlan {
        moves,
        directories,
        warnings,
    } = planner.finish();

    let rewrites = compute_rewrites(&moves, &graph.edges);
    let plan = RestructurePlan {
        moves,
        rewrites,
        new_directories: directories,
        warnings,
    };
    Ok((graph, plan, stats))
}

/// Plan, and with `options.apply` execute, up to `options.max_depth` passes.
///
/// `on_plan` sees each plan before it is applied. A dry run always stops after the
/// first pass, since later passes depend on the applied state.
///
/// # Errors
/// Fatal configuration and I/O errors; a failed pass leaves earlier passes applied.
pub fn run(
    project: &Project,
    options: &RestructureOptions,
    mut on_plan: impl FnMut(usize, &RestructurePlan),
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let max_passes = if options.apply { options.max_depth.max(1) } else { 1 };
    if !options.apply && options.max_depth > 1 {
        debug!("dry run plans a single pass; --max-depth only applies with --apply");
    }

    for pass in 1..=max_passes {
        let candidates = discover_candidates(&project.root, &options.pattern, &project.config);
        if pass == 1 {
            report.candidates = candidates.files.len();
        }
        if candidates.files.is_empty() {
            break;
        }

        let (plan, stats) = build_plan(project, &candidates)?;
        info!(
            pass,
            moves = plan.moves.len(),
            rewrites = plan.rewrites.len(),
            warnings = plan.warnings.len(),
            "planned restructuring pass"
        );
        on_plan(pass, &plan);

        let execution = if options.apply && !plan.is_empty() {
            Some(execute_plan(&plan, &project.root)?)
        } else {
            None
        };
        let done = execution.is_none();
        report.passes.push(Pass {
            plan,
            stats,
            execution,
        });
        if done {
            break;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edge::ImportEdge;
    use crate::restructure::plan::{FileMove, ImportRewrite, display_path};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new(files: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().canonicalize().unwrap();
            fs::write(root.join("tsconfig.json"), "{}").unwrap();
            for (rel, content) in files {
                let path = root.join(rel);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, content).unwrap();
            }
            Self { _dir: dir, root }
        }

        fn p(&self, rel: &str) -> PathBuf {
            self.root.join(rel)
        }

        fn project(&self) -> Project {
            Project::open(&self.root).unwrap()
        }

        fn plan(&self) -> RestructurePlan {
            let project = self.project();
            let candidates = discover_candidates(&project.root, "src", &project.config);
            build_plan(&project, &candidates).unwrap().0
        }

        fn moves(&self, plan: &RestructurePlan) -> Vec<(String, String)> {
            plan.moves
                .iter()
                .map(|m| (display_path(&self.root, &m.from), display_path(&self.root, &m.to)))
                .collect()
        }

        fn read(&self, rel: &str) -> String {
            fs::read_to_string(self.p(rel)).unwrap()
        }
    }

    fn pair(from: &str, to: &str) -> (String, String) {
        (from.to_owned(), to.to_owned())
    }

    fn scenario_a() -> Fixture {
        Fixture::new(&[
            ("src/foo.ts", "import { help } from './fooHelper';\nexport const foo = help;\n"),
            ("src/fooHelper.ts", "export const help = 1;\n"),
            ("src/pages/home.ts", "import { foo } from '../foo';\n"),
        ])
    }

    fn scenario_b() -> Fixture {
        Fixture::new(&[
            ("src/main.ts", "import './dashboard/panel';\n"),
            (
                "src/dashboard/panel.ts",
                "import { button } from '../widgets';\nimport { Button } from '../widgets/button';\n",
            ),
            ("src/widgets/index.ts", "export * from './button';\n"),
            ("src/widgets/button.ts", "export const button = 1;\nexport class Button {}\n"),
        ])
    }

    #[test]
    fn test_missing_tsconfig_fails_before_analysis() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        let err = Project::open(dir.path()).unwrap_err();
        assert!(matches!(err, RestructureError::Configuration { .. }));
    }

    #[test]
    fn test_scenario_a_single_helper() {
        let fx = scenario_a();
        let plan = fx.plan();

        assert_eq!(
            fx.moves(&plan),
            vec![
                pair("src/foo.ts", "src/foo/index.ts"),
                pair("src/fooHelper.ts", "src/foo/fooHelper.ts"),
            ]
        );
        assert_eq!(plan.new_directories, vec![fx.p("src/foo")]);
        // `./fooHelper` moves along with its importer and `../foo` resolves to the new index
        assert!(plan.rewrites.is_empty());
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_scenario_b_directory_cluster() {
        let fx = scenario_b();
        let plan = fx.plan();

        assert_eq!(
            fx.moves(&plan),
            vec![
                pair("src/widgets/button.ts", "src/dashboard/widgets/button.ts"),
                pair("src/widgets/index.ts", "src/dashboard/widgets/index.ts"),
            ]
        );
        assert_eq!(
            plan.rewrites,
            vec![
                ImportRewrite {
                    file: fx.p("src/dashboard/panel.ts"),
                    old_specifier: "../widgets".into(),
                    new_specifier: "./widgets".into(),
                },
                ImportRewrite {
                    file: fx.p("src/dashboard/panel.ts"),
                    old_specifier: "../widgets/button".into(),
                    new_specifier: "./widgets/button".into(),
                },
            ]
        );
        assert!(
            plan.moves
                .iter()
                .all(|m| m.reason == "Directory only imported from dashboard/")
        );
    }

    #[test]
    fn test_scenario_c_conflict_skips_only_that_cluster() {
        let fx = Fixture::new(&[
            ("src/foo.ts", "import { help } from './fooHelper';\n"),
            ("src/fooHelper.ts", "export const help = 1;\n"),
            ("src/foo/notes.md", "existing\n"),
            ("src/bar.ts", "import { u } from './barUtil';\n"),
            ("src/barUtil.ts", "export const u = 1;\n"),
        ]);
        let plan = fx.plan();

        assert_eq!(
            plan.warnings,
            vec!["Skipping src/foo.ts: directory src/foo/ already exists".to_owned()]
        );
        assert_eq!(
            fx.moves(&plan),
            vec![
                pair("src/bar.ts", "src/bar/index.ts"),
                pair("src/barUtil.ts", "src/bar/barUtil.ts"),
            ]
        );
    }

    #[test]
    fn test_planning_is_deterministic() {
        let fx = scenario_b();
        let first = fx.plan();
        let second = fx.plan();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_no_op_rewrites_are_suppressed() {
        let fx = scenario_a();
        let plan = fx.plan();
        assert!(plan.rewrites.iter().all(|r| r.old_specifier != r.new_specifier));
    }

    #[test]
    fn test_apply_scenario_b() {
        let fx = scenario_b();
        let project = fx.project();
        let options = RestructureOptions {
            pattern: "src".into(),
            apply: true,
            max_depth: 1,
        };
        let report = run(&project, &options, |_, _| {}).unwrap();
        assert!(report.applied());

        assert!(!fx.p("src/widgets").exists());
        assert_eq!(
            fx.read("src/dashboard/panel.ts"),
            "import { button } from './widgets';\nimport { Button } from './widgets/button';\n"
        );
        assert_eq!(fx.read("src/dashboard/widgets/index.ts"), "export * from './button';\n");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let fx = scenario_a();
        let project = fx.project();
        let options = RestructureOptions {
            pattern: "src".into(),
            apply: false,
            max_depth: 3,
        };
        let mut seen = Vec::new();
        let report = run(&project, &options, |pass, plan| seen.push((pass, plan.moves.len()))).unwrap();

        assert_eq!(seen, vec![(1, 2)]);
        assert!(!report.applied());
        assert!(fx.p("src/foo.ts").exists());
        assert!(!fx.p("src/foo").exists());
    }

    #[test]
    fn test_max_depth_nests_over_several_passes() {
        // pass 1 nests fooHelper under foo/, pass 2 nests foo/ under pages/
        let fx = scenario_a();
        let project = fx.project();
        let options = RestructureOptions {
            pattern: "src".into(),
            apply: true,
            max_depth: 5,
        };
        let report = run(&project, &options, |_, _| {}).unwrap();

        assert_eq!(report.passes.len(), 3);
        assert!(report.passes[2].plan.is_empty());
        assert!(fx.p("src/pages/foo/index.ts").exists());
        assert!(fx.p("src/pages/foo/fooHelper.ts").exists());
        assert!(!fx.p("src/foo").exists());
        assert_eq!(fx.read("src/pages/home.ts"), "import { foo } from './foo';\n");
    }

    #[test]
    fn test_applied_state_is_stable() {
        let fx = scenario_b();
        let project = fx.project();
        let options = RestructureOptions {
            pattern: "src".into(),
            apply: true,
            max_depth: 1,
        };
        run(&project, &options, |_, _| {}).unwrap();
        assert!(fx.plan().is_empty());
    }

    #[test]
    fn test_empty_pattern_reports_no_candidates() {
        let fx = Fixture::new(&[("lib/a.ts", "export {}\n")]);
        let options = RestructureOptions {
            pattern: "src".into(),
            apply: false,
            max_depth: 1,
        };
        let report = run(&fx.project(), &options, |_, _| {}).unwrap();
        assert_eq!(report.candidates, 0);
        assert!(report.passes.is_empty());
    }

    #[test]
    fn test_excluded_files_still_count_as_importers() {
        let fx = Fixture::new(&[
            ("code-nest.toml", "exclude = [\"*.test.ts\"]\n"),
            ("src/foo.ts", "import { h } from './fooHelper';\n"),
            ("src/fooHelper.ts", "export const h = 1;\n"),
            ("src/fooHelper.test.ts", "import { h } from './fooHelper';\n"),
        ]);
        let plan = fx.plan();

        // fooHelper has two importers, so nothing nests under foo
        assert!(plan.moves.is_empty(), "{:?}", fx.moves(&plan));
    }

    #[test]
    fn test_apply_rewrites_excluded_importer() {
        let fx = Fixture::new(&[
            ("code-nest.toml", "exclude = [\"*.test.ts\"]\n"),
            ("src/main.ts", "import './dashboard/panel';\n"),
            ("src/dashboard/panel.ts", "import { Button } from '../widgets/button';\n"),
            ("src/dashboard/panel.test.ts", "import { Button } from '../widgets/button';\n"),
            ("src/widgets/button.ts", "export class Button {}\n"),
        ]);
        let options = RestructureOptions {
            pattern: "src".into(),
            apply: true,
            max_depth: 1,
        };
        run(&fx.project(), &options, |_, _| {}).unwrap();

        assert!(fx.p("src/dashboard/widgets/button.ts").exists());
        assert_eq!(
            fx.read("src/dashboard/panel.test.ts"),
            "import { Button } from './widgets/button';\n"
        );
        assert_eq!(
            fx.read("src/dashboard/panel.ts"),
            "import { Button } from './widgets/button';\n"
        );
    }

    // -----------------------------------------------------------------------
    // Generated projects: applying a plan keeps every import pointing at the
    // same module.
    // -----------------------------------------------------------------------

    const DIRS: &[&str] = &["src", "src/a", "src/b", "src/a/c"];

    #[derive(Debug, Clone)]
    struct GeneratedFile {
        dir: usize,
        index: bool,
        imports: Vec<bool>,
    }

    fn generated_project() -> impl Strategy<Value = Vec<GeneratedFile>> {
        (2usize..8).prop_flat_map(|n| {
            prop::collection::vec(
                (0..DIRS.len(), prop::bool::weighted(0.2), prop::collection::vec(prop::bool::weighted(0.3), n)),
                n,
            )
            .prop_map(|files| {
                files
                    .into_iter()
                    .map(|(dir, index, imports)| GeneratedFile { dir, index, imports })
                    .collect()
            })
        })
    }

    fn write_generated(files: &[GeneratedFile]) -> (Fixture, Vec<PathBuf>) {
        let fx = Fixture::new(&[]);
        let mut index_taken = [false; 4];
        let paths: Vec<PathBuf> = files
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let name = if f.index && !index_taken[f.dir] {
                    index_taken[f.dir] = true;
                    "index.ts".to_owned()
                } else {
                    format!("f{i}.ts")
                };
                fx.p(DIRS[f.dir]).join(name)
            })
            .collect();

        for (i, file) in files.iter().enumerate() {
            let mut content = String::new();
            for (j, &wanted) in file.imports.iter().enumerate() {
                if wanted && j != i {
                    let specifier = rewrites::compute_specifier(&paths[i], &paths[j], "");
                    content.push_str(&format!("import {{ v{j} }} from '{specifier}';\n"));
                }
            }
            content.push_str(&format!("export const v{i} = {i};\n"));
            fs::create_dir_all(paths[i].parent().unwrap()).unwrap();
            fs::write(&paths[i], content).unwrap();
        }
        (fx, paths)
    }

    fn full_graph(project: &Project) -> ImportGraph {
        let files = walk_project(&project.root);
        build_import_graph(&files, &files, &project.settings).0
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_applied_plan_preserves_every_import(files in generated_project()) {
            let (fx, _) = write_generated(&files);
            let project = fx.project();
            let candidates = discover_candidates(&project.root, "src", &project.config);
            let (before, plan, _) = plan_with_graph(&project, &candidates).unwrap();

            // planning twice gives the same plan
            let (_, again, _) = plan_with_graph(&project, &candidates).unwrap();
            prop_assert_eq!(&plan, &again);

            execute_plan(&plan, &project.root).unwrap();
            let after = full_graph(&project);

            let moved: HashMap<&Path, &Path> = plan
                .moves
                .iter()
                .map(|FileMove { from, to, .. }| (from.as_path(), to.as_path()))
                .collect();
            let renamed: HashMap<(&Path, &str), &str> = plan
                .rewrites
                .iter()
                .map(|r| ((r.file.as_path(), r.old_specifier.as_str()), r.new_specifier.as_str()))
                .collect();
            let locate = |p: &PathBuf| moved.get(p.as_path()).map_or(p.clone(), |to| to.to_path_buf());

            prop_assert_eq!(before.edges.len(), after.edges.len());
            for ImportEdge { source, target, specifier } in &before.edges {
                let new_source = locate(source);
                let new_specifier = renamed
                    .get(&(source.as_path(), specifier.as_str()))
                    .copied()
                    .unwrap_or(specifier);
                let found = after
                    .edges
                    .iter()
                    .find(|e| e.source == new_source && e.specifier == new_specifier);
                prop_assert!(found.is_some(), "lost import {} in {}", new_specifier, new_source.display());
                prop_assert_eq!(&found.unwrap().target, &locate(target));
            }
        }
    }
}
