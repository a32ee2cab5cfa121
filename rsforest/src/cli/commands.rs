//! Command dispatch and rendering of results

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::services::ForestView;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_dir, global_config_path, local_config_path, Settings};
use crate::domain::TreeNodeConvert;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Tree { file, ids }) => cmd_tree(file, ids),
        Some(Commands::Flat { file, ids, output }) => cmd_flat(file, ids, output.as_deref()),
        Some(Commands::Subtree { file, id }) => cmd_subtree(file, id),
        Some(Commands::Ancestors { file, ids }) => cmd_ancestors(file, ids),
        Some(Commands::Descendants { file, id }) => cmd_descendants(file, id),
        Some(Commands::Check { file }) => cmd_check(file),
        Some(Commands::Config { command }) => cmd_config(command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `rsforest --help`".to_string(),
        )),
    }
}

/// Container configured for the directory holding `file`.
fn container_for(file: &Path) -> CliResult<ServiceContainer> {
    let dir = file.parent().filter(|d| !d.as_os_str().is_empty());
    let settings = Settings::load(dir)?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

fn label(view: &ForestView, settings: &Settings, idx: generational_arena::Index) -> String {
    match view.forest.entity(idx) {
        Some(record) if settings.show_order => format!("{} ({})", record, record.order_num),
        Some(record) => record.to_string(),
        None => "<missing>".to_string(),
    }
}

fn print_flat(view: &ForestView) {
    for record in view.records() {
        let line = [
            record.id.clone(),
            record.parent_id.clone().unwrap_or_else(|| "-".to_string()),
            record.order_num.to_string(),
        ]
        .iter()
        .join("\t");
        output::info(&line);
    }
}

fn print_ids(view: &ForestView) {
    for id in view.ids() {
        output::info(id);
    }
}

#[instrument]
fn cmd_tree(file: &Path, ids: &[String]) -> CliResult<()> {
    let container = container_for(file)?;
    let view = container.forest_service().tree(file, ids)?;
    let settings = &container.settings;

    let mut trees: Vec<Tree<String>> = view
        .order
        .iter()
        .map(|&root| {
            view.forest
                .to_tree_with(root, &|idx| label(&view, settings, idx))
        })
        .collect();

    match trees.len() {
        0 => output::warning("no records"),
        1 => output::info(&trees.remove(0)),
        _ => output::info(&Tree::new(settings.root_label.clone()).with_leaves(trees)),
    }
    Ok(())
}

#[instrument]
fn cmd_flat(file: &Path, ids: &[String], target: Option<&Path>) -> CliResult<()> {
    let container = container_for(file)?;
    let service = container.forest_service();
    let view = service.flat(file, ids)?;

    match target {
        Some(target) if target == file => Err(CliError::InvalidArgs(format!(
            "refusing to overwrite input file {}",
            file.display()
        ))),
        Some(target) => {
            service.export(&view, target)?;
            output::action("Written", &target.display());
            Ok(())
        }
        None => {
            print_flat(&view);
            Ok(())
        }
    }
}

#[instrument]
fn cmd_subtree(file: &Path, id: &str) -> CliResult<()> {
    let container = container_for(file)?;
    let view = container.forest_service().subtree(file, id)?;
    print_flat(&view);
    Ok(())
}

#[instrument]
fn cmd_ancestors(file: &Path, ids: &[String]) -> CliResult<()> {
    let container = container_for(file)?;
    let view = container.forest_service().ancestors(file, ids)?;
    print_ids(&view);
    Ok(())
}

#[instrument]
fn cmd_descendants(file: &Path, id: &str) -> CliResult<()> {
    let container = container_for(file)?;
    let view = container.forest_service().descendants(file, id)?;
    print_ids(&view);
    Ok(())
}

#[instrument]
fn cmd_check(file: &Path) -> CliResult<()> {
    let container = container_for(file)?;
    let report = container.forest_service().check(file)?;

    for u in &report.unresolved {
        output::warning(&format!(
            "{}: parent '{}' not found, treated as root",
            u.id, u.parent_id
        ));
    }
    output::success(&format!(
        "{}: {} nodes, {} roots",
        file.display(),
        report.nodes,
        report.roots
    ));
    Ok(())
}

fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show { dir, global } => {
            let settings = if *global {
                Settings::load_global_only()?
            } else {
                Settings::load(dir.as_deref())?
            };
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                let dir = global_config_dir().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?;
                std::fs::create_dir_all(&dir)
                    .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
                dir.join("rsforest.toml")
            } else {
                local_config_path(Path::new("."))
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            output::header("Config paths");
            match global_config_path() {
                Some(p) => output::detail(&format!("global: {}", p.display())),
                None => output::detail("global: <unavailable>"),
            }
            output::detail(&format!("local:  {}", local_config_path(Path::new(".")).display()));
        }
    }
    Ok(())
}
