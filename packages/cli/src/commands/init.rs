use anyhow::Result;
use clap::Args;
use colored::Colorize;
use markwright_editor::{EditorConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Fail on syntax kinds no plugin handles
    #[arg(long)]
    pub strict: bool,

    /// Default code block language
    #[arg(short, long, default_value = "")]
    pub language: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let mut config = EditorConfig {
        strict: args.strict,
        ..EditorConfig::default()
    };
    config.code_block.default_language = args.language;

    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!("  Plugins: {}", config.plugins.join(", ").dimmed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().display().to_string();
        let args = InitArgs {
            strict: true,
            language: "rust".to_string(),
            force: false,
        };
        init(args, &cwd).unwrap();

        let config = EditorConfig::load(dir.path()).unwrap();
        assert!(config.strict);
        assert_eq!(config.code_block.default_language, "rust");
        assert_eq!(config.plugins, EditorConfig::default().plugins);
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().display().to_string();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "plugins": [] }"#).unwrap();

        let args = InitArgs {
            strict: false,
            language: String::new(),
            force: false,
        };
        init(args, &cwd).unwrap();
        assert!(EditorConfig::load(dir.path()).unwrap().plugins.is_empty());
    }
}
