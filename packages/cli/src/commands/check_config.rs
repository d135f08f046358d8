use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use markwright_editor::{EditorBuilder, EditorConfig, DEFAULT_CONFIG_NAME};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct CheckConfigArgs {
    /// Directory holding markwright.config.json (defaults to current directory)
    pub dir: Option<PathBuf>,
}

pub fn check_config(args: CheckConfigArgs, cwd: &str) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from(cwd));
    let active = validate_dir(&dir)?;

    println!(
        "{} {} composes {} plugins: {}",
        "✓".green(),
        dir.join(DEFAULT_CONFIG_NAME).display(),
        active.len(),
        active.join(", ")
    );
    Ok(())
}

/// Load the config in `dir` and compose it; returns the active plugin ids
pub fn validate_dir(dir: &Path) -> Result<Vec<String>> {
    let config = EditorConfig::load(dir)
        .with_context(|| format!("Cannot load {}", dir.join(DEFAULT_CONFIG_NAME).display()))?;
    let editor = EditorBuilder::from_config(&config)?
        .build()
        .context("Configuration does not compose")?;
    Ok(editor.active_plugins()?)
}
