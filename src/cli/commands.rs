//! Command dispatch: one handler per subcommand

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, NodeCommands, SeqCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{expand_path, global_config_path, local_config_path, Settings};
use crate::domain::{flatten, CollectionId, ItemId, NodeId, Payload};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Run the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => cmd_config(cli, command),
        Commands::Node { command } => {
            let container = build_container(cli)?;
            cmd_node(&container, command)
        }
        Commands::Seq { command } => {
            let container = build_container(cli)?;
            cmd_seq(&container, command)
        }
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("resolve current directory", e).into()),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = project_dir(cli)?;
    let mut settings = Settings::load(Some(&dir))?;
    if let Some(data_file) = &cli.data_file {
        settings.data_file = expand_path(data_file);
    }
    Ok(settings)
}

fn build_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = load_settings(cli)?;
    Ok(ServiceContainer::new(settings)?)
}

fn parse_attributes(title: &str, raw: &[String]) -> CliResult<Payload> {
    raw.iter().try_fold(Payload::titled(title), |payload, attr| {
        match attr.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok(payload.with_attribute(key, value)),
            _ => Err(CliError::InvalidArgs(format!(
                "attribute '{attr}' is not KEY=VALUE"
            ))),
        }
    })
}

#[instrument(level = "debug", skip(container))]
fn cmd_node(container: &ServiceContainer, command: &NodeCommands) -> CliResult<()> {
    let nodes = &container.nodes;
    match command {
        NodeCommands::Add {
            title,
            parent,
            order,
            attributes,
        } => {
            let payload = parse_attributes(title, attributes)?;
            let node = nodes.create(parent.map(NodeId), payload, *order)?;
            output::action("Created", &output::node_label(&node));
        }
        NodeCommands::Move { id, parent, order } => {
            let node = nodes.move_to(NodeId(*id), parent.map(NodeId), *order)?;
            let place = match node.parent_id {
                Some(parent) => format!("under #{parent}"),
                None => "to the roots".to_string(),
            };
            output::action("Moved", &format!("{} {}", output::node_label(&node), place));
        }
        NodeCommands::Reorder { parent, ids } => {
            let ordered = ids.iter().copied().map(NodeId).collect_vec();
            for node in nodes.reorder_siblings(parent.map(NodeId), &ordered)? {
                output::info(&output::node_label(&node));
            }
        }
        NodeCommands::Ancestors { id } => {
            for node in nodes.ancestors(NodeId(*id))? {
                output::info(&output::node_label(&node));
            }
        }
        NodeCommands::Descendants { id } => {
            let below = nodes.descendants(NodeId(*id))?;
            debug!("{} descendant(s) of {}", below.len(), id);
            for descendant in below {
                output::info(&output::node_label(&nodes.get(descendant)?));
            }
        }
        NodeCommands::Rm { id } => {
            let removed = nodes.delete(NodeId(*id))?;
            output::success(&format!(
                "removed {}",
                removed.iter().map(|id| format!("#{id}")).join(", ")
            ));
        }
        NodeCommands::Tree { root } => {
            let forest = match root {
                Some(root) => nodes.subtree(NodeId(*root))?,
                None => nodes.forest()?,
            };
            if forest.is_empty() {
                output::warning("no nodes");
                return Ok(());
            }
            for tree in output::render_forest(&flatten(&forest)) {
                output::info(&tree);
            }
            output::detail(&output::forest_summary(&forest));
        }
        NodeCommands::Flat { root } => {
            for entry in nodes.flatten(root.map(NodeId))? {
                output::info(&output::flat_line(&entry));
            }
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_seq(container: &ServiceContainer, command: &SeqCommands) -> CliResult<()> {
    let sequences = &container.sequences;
    match command {
        SeqCommands::New { title } => {
            let collection = sequences.create_collection(title)?;
            output::action(
                "Created",
                &format!("collection #{} {}", collection.id, collection.title),
            );
        }
        SeqCommands::Collections => {
            for collection in sequences.collections()? {
                output::info(&format!("#{} {}", collection.id, collection.title));
            }
        }
        SeqCommands::List { collection } => {
            let collection = sequences.collection(CollectionId(*collection))?;
            output::header(&collection.title);
            for entry in sequences.flatten(collection.id)? {
                output::detail(&output::item_label(&entry.item));
            }
        }
        SeqCommands::Insert {
            collection,
            title,
            position,
            number,
        } => {
            let item = sequences.insert_at_position(
                CollectionId(*collection),
                Payload::titled(title),
                position.unwrap_or(u32::MAX),
                *number,
            )?;
            output::action("Inserted", &output::item_label(&item));
        }
        SeqCommands::Reorder { collection, ids } => {
            let ordered = ids.iter().copied().map(ItemId).collect_vec();
            for item in sequences.reorder(CollectionId(*collection), &ordered)? {
                output::detail(&output::item_label(&item));
            }
        }
        SeqCommands::Renumber { item, number } => {
            let item = sequences.safely_update_number(ItemId(*item), *number)?;
            output::action("Renumbered", &output::item_label(&item));
        }
        SeqCommands::Rm { item } => {
            let item = sequences.remove(ItemId(*item))?;
            output::success(&format!("removed {}", output::item_label(&item)));
        }
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let dir = project_dir(cli)?;
            match global_config_path() {
                Some(path) => output::action("global", &describe(&path)),
                None => output::warning("no home directory, global config unavailable"),
            }
            output::action("local", &describe(&local_config_path(&dir)));
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("no home directory for a global config".to_string())
                })?
            } else {
                local_config_path(&project_dir(cli)?)
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}

fn describe(path: &Path) -> String {
    let state = if path.exists() { "" } else { " (not present)" };
    format!("{}{}", path.display(), state)
}
