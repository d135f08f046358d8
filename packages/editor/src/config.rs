use std::path::Path;

use markwright_core::{CorePlugin, JsxComponentDescriptor, RealmPlugin, ViewMode};
use markwright_plugins::{
    CodeBlockPlugin, DiffSourcePlugin, JsxPlugin, LinkDialogPlugin, SandpackConfig, SandpackPlugin,
    ThematicBreakPlugin, ToolbarPlugin, PLUGIN_IDS,
};
use serde::{Deserialize, Serialize};

use crate::EditorError;

pub const DEFAULT_CONFIG_NAME: &str = "markwright.config.json";

/// Markwright configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Fail on syntax kinds no plugin handles
    #[serde(default)]
    pub strict: bool,

    /// Plugin ids, in activation order
    #[serde(default = "default_plugins")]
    pub plugins: Vec<String>,

    #[serde(default)]
    pub code_block: CodeBlockConfig,

    #[serde(default)]
    pub view_mode: ViewMode,

    #[serde(default)]
    pub sandpack: SandpackConfig,

    #[serde(default)]
    pub jsx_components: Vec<JsxComponentDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlockConfig {
    #[serde(default)]
    pub default_language: String,
}

fn default_plugins() -> Vec<String> {
    PLUGIN_IDS.iter().map(|id| id.to_string()).collect()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            strict: false,
            plugins: default_plugins(),
            code_block: CodeBlockConfig::default(),
            view_mode: ViewMode::default(),
            sandpack: SandpackConfig::default(),
            jsx_components: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }

    /// Instantiate the configured plugins, in order
    pub fn build_plugins(&self) -> Result<Vec<Box<dyn RealmPlugin>>, EditorError> {
        self.plugins.iter().map(|id| self.plugin(id)).collect()
    }

    fn plugin(&self, id: &str) -> Result<Box<dyn RealmPlugin>, EditorError> {
        let plugin: Box<dyn RealmPlugin> = match id {
            "core" => Box::new(CorePlugin { strict: self.strict }),
            "codeblock" => Box::new(CodeBlockPlugin {
                default_language: self.code_block.default_language.clone(),
                editors: Vec::new(),
            }),
            "jsx" => Box::new(JsxPlugin {
                components: self.jsx_components.clone(),
            }),
            "sandpack" => Box::new(SandpackPlugin {
                config: self.sandpack.clone(),
            }),
            "thematicBreak" => Box::new(ThematicBreakPlugin),
            "linkDialog" => Box::new(LinkDialogPlugin),
            "diffSource" => Box::new(DiffSourcePlugin {
                view_mode: self.view_mode,
                diff_markdown: String::new(),
            }),
            "toolbar" => Box::new(ToolbarPlugin::default()),
            other => return Err(EditorError::Config(format!("Unknown plugin '{}'", other))),
        };
        Ok(plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "strict": true,
            "plugins": ["codeblock", "thematicBreak"],
            "codeBlock": { "defaultLanguage": "rust" },
            "viewMode": "source"
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert!(config.strict);
        assert_eq!(config.plugins, vec!["codeblock", "thematicBreak"]);
        assert_eq!(config.code_block.default_language, "rust");
        assert_eq!(config.view_mode, ViewMode::Source);
        assert_eq!(config.sandpack.default_preset, "react");
        assert!(config.jsx_components.is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert!(!config.strict);
        assert_eq!(config.plugins.len(), PLUGIN_IDS.len());
        assert_eq!(config.view_mode, ViewMode::RichText);
        assert_eq!(config.build_plugins().unwrap().len(), PLUGIN_IDS.len());
    }

    #[test]
    fn test_unknown_plugin_is_config_error() {
        let config = EditorConfig {
            plugins: vec!["emoji".to_string()],
            ..EditorConfig::default()
        };
        let err = config.build_plugins().err().unwrap();
        assert_eq!(err.to_string(), "Invalid configuration: Unknown plugin 'emoji'");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap(), EditorConfig::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "plugins": [] }"#).unwrap();
        assert!(EditorConfig::load(dir.path()).unwrap().plugins.is_empty());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ not json").unwrap();
        assert!(matches!(EditorConfig::load(dir.path()), Err(EditorError::Json(_))));
    }
}
