use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use markwright_core::SyntaxNode;
use markwright_editor::{EditorBuilder, EditorConfig};
use tracing::debug;

#[derive(Debug, Args)]
pub struct RoundtripArgs {
    /// Syntax tree to import and export again (mdast-shaped JSON)
    pub file: PathBuf,

    /// Fail unless the exported tree equals the input
    #[arg(long)]
    pub check: bool,

    /// Write the exported tree here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn roundtrip(args: RoundtripArgs, cwd: &str) -> Result<()> {
    let config = EditorConfig::load(cwd)?;
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Cannot read {}", args.file.display()))?;
    let tree: SyntaxNode = serde_json::from_str(&source)
        .with_context(|| format!("{} is not a syntax tree", args.file.display()))?;

    let name = args.file.display().to_string();
    let saved = roundtrip_tree(&config, &name, &tree)?;

    if args.check {
        if saved != tree {
            return Err(anyhow!("{} changed after import and export", name));
        }
        eprintln!("{} {} is stable", "✓".green(), name);
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&saved)?;
    match args.out {
        Some(out) => {
            fs::write(&out, json)?;
            eprintln!("{} {} → {}", "✓".green(), name, out.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Import `tree` into an editor built from `config` and export it back
pub fn roundtrip_tree(config: &EditorConfig, name: &str, tree: &SyntaxNode) -> Result<SyntaxNode> {
    let editor = EditorBuilder::from_config(config)?.build()?;
    editor.load(name, tree)?;
    let saved = editor.save()?;
    debug!(document = name, stable = (&saved == tree), "Round trip finished");
    Ok(saved)
}
