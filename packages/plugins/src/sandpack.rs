//! # Live Code Sandboxes
//!
//! Code blocks whose meta matches a configured preset import as `sandpack`
//! nodes instead of plain code blocks (their visitor outranks the code-block
//! one). Insertion selects the new node once the host reports it mounted:
//!
//! ```text
//! insertSandpack(meta) ─► with_latest_from(config) ─► try_map(preset) ─► NodeFactory{request}
//!        ├─► core.insertDecoratorNode                      (host inserts, then)
//!        └─► pendingSelection = request     core.nodeReady{request} ─┐
//!                                                                    ▼
//!                                   with_latest_from(pendingSelection) ─► SelectNode
//! ```

use std::cell::Cell as Counter;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::anyhow;
use markwright_core::system::{INSERT_DECORATOR_NODE, NODE_READY, PRESENTATION_COMMANDS};
use markwright_core::{
    register_node_kinds, register_visitor, Cell, Export, Import, Key, KeyGenerator, KindClaim,
    NodeFactory, NodeKindSpec, NodeReady, PresentationCommand, PresentationNode, Realm, RealmPlugin,
    Signal, SyntaxNode, VisitorDescriptor,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::codeblock::CODE_PROPS;

pub const SANDPACK_CONFIG: Key<Cell<SandpackConfig>> = Key::required("sandpack.config");
pub const INSERT_SANDPACK: Key<Signal<String>> = Key::new("sandpack.insertSandpack");
pub const PENDING_SELECTION: Key<Cell<Option<String>>> = Key::required("sandpack.pendingSelection");

pub const SANDPACK_KIND: &str = "sandpack";

/// Priority of the sandpack import visitor; above ordinary code blocks
pub const SANDPACK_VISITOR_PRIORITY: i32 = 20;

const DEFAULT_SNIPPET_CONTENT: &str = r#"
export default function App() {
  return (
    <div className="App">
      <h1>Hello CodeSandbox</h1>
      <h2>Start editing to see some magic happen!</h2>
    </div>
  );
}
"#;

/// Named dependencies a preset can offer on top of its own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencySet {
    pub name: String,
    pub dependencies: BTreeMap<String, String>,
}

/// Named files a preset can offer on top of its own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSet {
    pub name: String,
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandpackPreset {
    pub name: String,
    pub label: String,
    /// Code-block meta that selects this preset
    pub meta: String,
    pub sandpack_template: String,
    pub sandpack_theme: String,
    pub snippet_file_name: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    #[serde(default)]
    pub additional_dependency_sets: Vec<DependencySet>,
    #[serde(default)]
    pub additional_file_sets: Vec<FileSet>,
    #[serde(default)]
    pub default_snippet_language: Option<String>,
    #[serde(default)]
    pub default_snippet_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandpackConfig {
    pub default_preset: String,
    pub presets: Vec<SandpackPreset>,
}

impl Default for SandpackConfig {
    fn default() -> Self {
        Self {
            default_preset: "react".to_string(),
            presets: vec![SandpackPreset {
                name: "react".to_string(),
                label: "React".to_string(),
                meta: "live react".to_string(),
                sandpack_template: "react".to_string(),
                sandpack_theme: "light".to_string(),
                snippet_file_name: "/App.js".to_string(),
                dependencies: BTreeMap::new(),
                files: BTreeMap::new(),
                additional_dependency_sets: Vec::new(),
                additional_file_sets: Vec::new(),
                default_snippet_language: Some("jsx".to_string()),
                default_snippet_content: Some(DEFAULT_SNIPPET_CONTENT.to_string()),
            }],
        }
    }
}

impl SandpackConfig {
    /// Preset for `meta`, or the default preset when `meta` is empty
    pub fn preset_for(&self, meta: &str) -> Option<&SandpackPreset> {
        if meta.is_empty() {
            self.presets.iter().find(|p| p.name == self.default_preset)
        } else {
            self.presets.iter().find(|p| p.meta == meta)
        }
    }
}

fn sandpack_node(keys: &mut KeyGenerator, preset: &SandpackPreset) -> PresentationNode {
    PresentationNode::new(SANDPACK_KIND, keys.next_key())
        .with_prop("code", preset.default_snippet_content.clone().unwrap_or_default())
        .with_prop(
            "language",
            preset
                .default_snippet_language
                .clone()
                .unwrap_or_else(|| "jsx".to_string()),
        )
        .with_prop("meta", preset.meta.clone())
}

#[derive(Debug, Clone, Default)]
pub struct SandpackPlugin {
    pub config: SandpackConfig,
}

impl RealmPlugin for SandpackPlugin {
    fn id(&self) -> &'static str {
        "sandpack"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![
            INSERT_DECORATOR_NODE.name(),
            NODE_READY.name(),
            PRESENTATION_COMMANDS.name(),
        ]
    }

    fn init(&self, realm: &Realm) -> anyhow::Result<()> {
        let config = realm.declare_cell(SANDPACK_CONFIG, Some(self.config.clone()))?;
        let pending = realm.declare_cell(PENDING_SELECTION, Some(None))?;
        let insert = realm.declare_signal(INSERT_SANDPACK)?;

        let requests = Rc::new(Counter::new(0u64));
        let with_config = realm.with_latest_from(insert, config)?;
        let factory = realm.try_map(with_config, move |(meta, config): &(String, SandpackConfig)| {
            let preset = config
                .preset_for(meta)
                .cloned()
                .ok_or_else(|| anyhow!("No sandpack preset found with meta '{}'", meta))?;
            requests.set(requests.get() + 1);
            let request = format!("sandpack-{}", requests.get());
            debug!(preset = %preset.name, request = %request, "Inserting sandpack");
            Ok(NodeFactory::new(SANDPACK_KIND, move |keys| sandpack_node(keys, &preset)).with_request(request))
        })?;

        // Record the request before the host sees the insertion
        realm.subscribe(factory, move |realm, factory: &NodeFactory| {
            realm.publish(pending, factory.request().map(str::to_string))?;
            Ok(())
        })?;
        realm.link(factory, realm.resolve(INSERT_DECORATOR_NODE)?)?;

        let ready = realm.with_latest_from(realm.resolve(NODE_READY)?, pending)?;
        let select = realm.filter_map(ready, |(ready, pending): &(NodeReady, Option<String>)| {
            match (&ready.request, pending) {
                (Some(request), Some(pending)) if request == pending => {
                    Some(PresentationCommand::SelectNode { key: ready.key.clone() })
                }
                _ => None,
            }
        })?;
        realm.subscribe(select, move |realm, _: &PresentationCommand| {
            realm.publish(pending, None)?;
            Ok(())
        })?;
        realm.link(select, realm.resolve(PRESENTATION_COMMANDS)?)?;

        register_visitor(realm, live_code_import())?;
        register_visitor(realm, sandpack_export())?;
        register_node_kinds(realm, vec![NodeKindSpec::decorator(SANDPACK_KIND, "sandpack")])?;

        info!(presets = self.config.presets.len(), default = %self.config.default_preset, "Sandpack enabled");
        Ok(())
    }

    fn update(&self, realm: &Realm) -> anyhow::Result<()> {
        realm.publish(realm.resolve(SANDPACK_CONFIG)?, self.config.clone())?;
        Ok(())
    }
}

fn live_code_import() -> VisitorDescriptor<Import> {
    VisitorDescriptor::<Import>::new("sandpack.code", KindClaim::kind("code"), |node: &SyntaxNode, ctx| {
        let mut out = PresentationNode::new(SANDPACK_KIND, ctx.next_key());
        out.props = CODE_PROPS.lift(&node.props);
        Ok(out)
    })
    .with_priority(SANDPACK_VISITOR_PRIORITY)
    .when(|node, ctx| {
        let Some(meta) = node.prop_str("meta").filter(|meta| !meta.is_empty()) else {
            return false;
        };
        ctx.realm()
            .resolve(SANDPACK_CONFIG)
            .and_then(|config| ctx.realm().value(config))
            .ok()
            .flatten()
            .map_or(false, |config| config.presets.iter().any(|p| p.meta == meta))
    })
}

fn sandpack_export() -> VisitorDescriptor<Export> {
    VisitorDescriptor::new(
        "sandpack.sandpack",
        KindClaim::kind(SANDPACK_KIND),
        |node: &PresentationNode, _ctx| {
            let mut out = SyntaxNode::new("code");
            out.props = CODE_PROPS.lower(&node.props);
            Ok(out)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_lookup_by_meta_or_default() {
        let config = SandpackConfig::default();
        assert_eq!(config.preset_for("").map(|p| p.name.as_str()), Some("react"));
        assert_eq!(config.preset_for("live react").map(|p| p.name.as_str()), Some("react"));
        assert!(config.preset_for("live vue").is_none());
    }

    #[test]
    fn test_config_reads_camel_case() {
        let config: SandpackConfig = serde_json::from_value(serde_json::json!({
            "defaultPreset": "vanilla",
            "presets": [{
                "name": "vanilla",
                "label": "Vanilla",
                "meta": "live",
                "sandpackTemplate": "vanilla",
                "sandpackTheme": "dark",
                "snippetFileName": "/index.js"
            }]
        }))
        .unwrap();
        assert_eq!(config.preset_for("").unwrap().snippet_file_name, "/index.js");
        assert!(config.presets[0].default_snippet_language.is_none());
        assert!(config.presets[0].additional_file_sets.is_empty());
    }

    #[test]
    fn test_preset_reads_additional_sets() {
        let preset: SandpackPreset = serde_json::from_value(serde_json::json!({
            "name": "react",
            "label": "React",
            "meta": "live react",
            "sandpackTemplate": "react",
            "sandpackTheme": "light",
            "snippetFileName": "/App.js",
            "additionalDependencySets": [
                { "name": "charts", "dependencies": { "recharts": "^2.0.0" } }
            ],
            "additionalFileSets": [
                { "name": "styles", "files": { "/styles.css": "body {}" } }
            ]
        }))
        .unwrap();
        assert_eq!(preset.additional_dependency_sets[0].name, "charts");
        assert_eq!(
            preset.additional_dependency_sets[0].dependencies.get("recharts").map(String::as_str),
            Some("^2.0.0")
        );
        assert_eq!(
            preset.additional_file_sets[0].files.get("/styles.css").map(String::as_str),
            Some("body {}")
        );
    }
}
