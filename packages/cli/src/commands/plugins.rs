use anyhow::Result;
use clap::Args;
use colored::Colorize;
use markwright_core::system::NODE_KINDS;
use markwright_core::NodeKindSpec;
use markwright_editor::{EditorBuilder, EditorConfig};
use markwright_plugins::PLUGIN_IDS;

#[derive(Debug, Args)]
pub struct PluginsArgs {
    /// Also list the node kinds each active plugin registers
    #[arg(short, long)]
    pub kinds: bool,
}

/// One row of the plugin listing
#[derive(Debug, Clone, PartialEq)]
pub struct PluginRow {
    pub id: String,
    pub active: bool,
    pub kinds: Vec<NodeKindSpec>,
}

pub fn plugins(args: PluginsArgs, cwd: &str) -> Result<()> {
    let config = EditorConfig::load(cwd)?;
    for row in plugin_rows(&config)? {
        let marker = if row.active { "●".green() } else { "○".dimmed() };
        println!("{} {}", marker, row.id.bright_white());
        if args.kinds {
            for spec in &row.kinds {
                let role = if spec.decorator { "decorator" } else { "element" };
                println!("    {} {}", spec.kind, role.dimmed());
            }
        }
    }
    Ok(())
}

/// Core plus every known plugin, active ones in activation order first
pub fn plugin_rows(config: &EditorConfig) -> Result<Vec<PluginRow>> {
    let editor = EditorBuilder::from_config(config)?.build()?;
    let kinds = editor.realm().values(editor.realm().resolve(NODE_KINDS)?)?;

    let active = editor.active_plugins()?;
    let mut rows: Vec<PluginRow> = active
        .iter()
        .map(|id| PluginRow {
            id: id.clone(),
            active: true,
            kinds: kinds.iter().filter(|spec| &spec.owner == id).cloned().collect(),
        })
        .collect();
    rows.extend(
        PLUGIN_IDS
            .iter()
            .filter(|id| !active.iter().any(|a| a == *id))
            .map(|id| PluginRow {
                id: id.to_string(),
                active: false,
                kinds: Vec::new(),
            }),
    );
    Ok(rows)
}
