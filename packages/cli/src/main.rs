mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    check_config, init, plugins, roundtrip, CheckConfigArgs, InitArgs, PluginsArgs, RoundtripArgs,
};
use tracing_subscriber::EnvFilter;

/// Markwright CLI - compose editor plugins and round-trip markup trees
#[derive(Parser, Debug)]
#[command(name = "markwright")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a markwright.config.json with the default plugins
    Init(InitArgs),

    /// Import a JSON syntax tree and export it again
    Roundtrip(RoundtripArgs),

    /// List plugins and whether the config activates them
    Plugins(PluginsArgs),

    /// Compose the configured plugins and report problems
    CheckConfig(CheckConfigArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Roundtrip(args) => roundtrip(args, &cwd),
                Command::Plugins(args) => plugins(args, &cwd),
                Command::CheckConfig(args) => check_config(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
