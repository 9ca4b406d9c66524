//! Command dispatch: one function per subcommand

use std::fs;
use std::io;
use std::path::Path;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::{resolve_template, DemoReport, DemoRunner, LinkMode};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{is_cycle_intact, CloneDepth, GraphArena, GraphRender, ObjectId, Prototype};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Demo { fixture }) => {
            let settings = Settings::load(cli.config.as_deref())?;
            cmd_demo(&settings, fixture.as_deref())
        }
        Some(Commands::CloneGraph {
            depth,
            fixture,
            tree,
        }) => {
            let settings = Settings::load(cli.config.as_deref())?;
            cmd_clone(&settings, *depth, fixture.as_deref(), *tree)
        }
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

#[instrument(skip(settings))]
fn cmd_demo(settings: &Settings, fixture: Option<&Path>) -> CliResult<()> {
    let fixture = fixture.or(settings.fixture.as_deref());
    debug!(?fixture, "running demo");
    let template = resolve_template(fixture)?;
    let report = DemoRunner::new(template).run()?;

    for stage in &report.stages {
        output::header(&stage.title);
        if settings.show_tree {
            for graph in &stage.graphs {
                output::block(graph);
            }
        }
        for check in &stage.checks {
            output::check(&check.label, check.passed);
        }
    }

    demo_outcome(&report)?;
    output::success(&format!("all {} checks passed", report.checks().count()));
    Ok(())
}

/// Fails with the number of failed checks, if any.
pub fn demo_outcome(report: &DemoReport) -> CliResult<()> {
    match report.failures().len() {
        0 => Ok(()),
        failures => Err(CliError::ChecksFailed(failures)),
    }
}

/// What `clone` observed about one copy.
#[derive(Debug, Clone)]
pub struct CloneReport {
    pub depth: CloneDepth,
    pub original: ObjectId,
    pub copy: ObjectId,
    pub scalar: i64,
    pub original_objects: usize,
    pub copy_objects: usize,
    /// Labels of objects reachable from both graphs
    pub shared: Vec<String>,
    /// Whether the copy's node is owned by the copy; None when the fixture is not linked
    pub relinked: Option<bool>,
    pub original_tree: String,
    pub copy_tree: String,
}

/// Build the fixture graph, clone it at `depth` and compare both graphs.
#[instrument(level = "debug")]
pub fn clone_fixture(depth: CloneDepth, fixture: Option<&Path>) -> CliResult<CloneReport> {
    let template = resolve_template(fixture)?;
    let original = template.build()?;
    let copy = original.clone_to(depth);
    debug!(%depth, original = %ObjectId::of(&original), copy = %ObjectId::of(&copy), "cloned");

    let original_graph = GraphArena::from_container(&original);
    let copy_graph = GraphArena::from_container(&copy);
    let shared = copy_graph
        .shared_with(&original_graph)
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let scalar = copy.borrow().scalar;

    Ok(CloneReport {
        depth,
        original: ObjectId::of(&original),
        copy: ObjectId::of(&copy),
        scalar,
        original_objects: original_graph.ids().len(),
        copy_objects: copy_graph.ids().len(),
        shared,
        relinked: (template.link == LinkMode::Linked).then(|| is_cycle_intact(&copy)),
        original_tree: original_graph.to_tree_string().to_string(),
        copy_tree: copy_graph.to_tree_string().to_string(),
    })
}

#[instrument(skip(settings))]
fn cmd_clone(
    settings: &Settings,
    depth: Option<CloneDepth>,
    fixture: Option<&Path>,
    tree: bool,
) -> CliResult<()> {
    let depth = depth.unwrap_or(settings.depth);
    let report = clone_fixture(depth, fixture.or(settings.fixture.as_deref()))?;

    output::header(&format!("{} clone", report.depth));
    output::action("original", &report.original);
    output::action("copy", &report.copy);
    output::detail(&format!("scalar: {}", report.scalar));
    output::detail(&format!(
        "objects: {} in original, {} in copy",
        report.original_objects, report.copy_objects
    ));

    if report.shared.is_empty() {
        output::detail("shared with original: none");
    } else {
        output::detail("shared with original:");
        for label in &report.shared {
            output::detail(&format!("  {label}"));
        }
    }

    if tree || settings.show_tree {
        output::header("original graph");
        output::block(&report.original_tree);
        output::header("copy graph");
        output::block(&report.copy_tree);
    }

    if let Some(relinked) = report.relinked {
        output::check("copy.backref.owner is copy", relinked);
        if !relinked {
            return Err(CliError::ChecksFailed(1));
        }
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::action("global", "(no config directory)"),
            }
            match &cli.config {
                Some(path) => output::action("local", &path.display()),
                None => output::action("local", "(none)"),
            }
        }
        ConfigCommands::Init { force } => {
            let path = global_config_path().ok_or_else(|| {
                CliError::InvalidArgs("cannot determine config directory".to_string())
            })?;
            init_config(&path, *force)?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}

/// Write the config template to `path`; an existing file needs `force`.
pub fn init_config(path: &Path, force: bool) -> CliResult<()> {
    if path.exists() && !force {
        return Err(CliError::InvalidArgs(format!(
            "config already exists: {} (use --force to overwrite)",
            path.display()
        )));
    }
    if path.exists() {
        output::warning(&format!("overwriting {}", path.display()));
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| CliError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, Settings::template()).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}
