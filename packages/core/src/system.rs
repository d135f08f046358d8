//! Shared nodes of the editor system and the payloads they carry.
//!
//! Every key here is declared by [`CorePlugin`](crate::CorePlugin) (or, for
//! the active-plugin set, by the [`Composer`](crate::Composer)) and resolved by
//! feature plugins.

use std::fmt;
use std::rc::Rc;

use markwright_reactive::{Aggregate, Cell, Key, Realm, RealmError, Signal};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::conversion::{Export, Import, VisitorDescriptor};
use crate::tree::{KeyGenerator, NodeKey, PresentationNode};

pub const ACTIVE_PLUGINS: Key<Aggregate<String>> = Key::new("core.activePlugins");
pub const IMPORT_VISITORS: Key<Aggregate<VisitorDescriptor<Import>>> = Key::new("core.importVisitors");
pub const EXPORT_VISITORS: Key<Aggregate<VisitorDescriptor<Export>>> = Key::new("core.exportVisitors");
pub const NODE_KINDS: Key<Aggregate<NodeKindSpec>> = Key::new("core.nodeKinds");
pub const SYNTAX_EXTENSIONS: Key<Aggregate<String>> = Key::new("core.syntaxExtensions");
pub const SERIALIZER_EXTENSIONS: Key<Aggregate<String>> = Key::new("core.serializerExtensions");
pub const MDAST_EXTENSIONS: Key<Aggregate<String>> = Key::new("core.mdastExtensions");

pub const INSERT_DECORATOR_NODE: Key<Signal<NodeFactory>> = Key::new("core.insertDecoratorNode");
pub const PRESENTATION_COMMANDS: Key<Signal<PresentationCommand>> = Key::new("core.presentationCommands");
pub const NODE_READY: Key<Signal<NodeReady>> = Key::new("core.nodeReady");

pub const VIEW_MODE: Key<Cell<ViewMode>> = Key::required("core.viewMode");
pub const JSX_IS_AVAILABLE: Key<Cell<bool>> = Key::required("core.jsxIsAvailable");
pub const JSX_COMPONENT_DESCRIPTORS: Key<Cell<Vec<JsxComponentDescriptor>>> =
    Key::required("core.jsxComponentDescriptors");

/// A presentation node kind and the plugin that registered it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKindSpec {
    pub kind: String,
    pub owner: String,
    /// Rendered by an embedded editor rather than as rich text
    pub decorator: bool,
}

impl NodeKindSpec {
    pub fn new(kind: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            owner: owner.into(),
            decorator: false,
        }
    }

    pub fn decorator(kind: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            decorator: true,
            ..Self::new(kind, owner)
        }
    }
}

/// Append node kinds owned by `owner` to `core.nodeKinds`
pub fn register_node_kinds(realm: &Realm, specs: Vec<NodeKindSpec>) -> Result<(), RealmError> {
    let kinds = realm.resolve(NODE_KINDS)?;
    realm.append(kinds, specs)
}

/// Builds a presentation node on demand, drawing keys from the document
#[derive(Clone)]
pub struct NodeFactory {
    kind: String,
    request: Option<String>,
    build: Rc<dyn Fn(&mut KeyGenerator) -> PresentationNode>,
}

impl NodeFactory {
    pub fn new<F>(kind: impl Into<String>, build: F) -> Self
    where
        F: Fn(&mut KeyGenerator) -> PresentationNode + 'static,
    {
        Self {
            kind: kind.into(),
            request: None,
            build: Rc::new(build),
        }
    }

    /// Tag the insertion so its `nodeReady` can be matched
    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn request(&self) -> Option<&str> {
        self.request.as_deref()
    }

    pub fn build(&self, keys: &mut KeyGenerator) -> PresentationNode {
        (self.build)(keys)
    }
}

impl fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeFactory")
            .field("kind", &self.kind)
            .field("request", &self.request)
            .finish()
    }
}

/// Where an inserted node lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertAt {
    /// After the selected top-level block, or at the end of the root
    NearestRoot,
    /// As the last child of the given node
    Inside(NodeKey),
}

/// Instructions for the presentation layer
#[derive(Debug, Clone)]
pub enum PresentationCommand {
    InsertNode { factory: NodeFactory, at: InsertAt },
    SelectNode { key: NodeKey },
    RemoveNode { key: NodeKey },
    SetProp { key: NodeKey, name: String, value: Value },
}

/// Published by the presentation host once an inserted node is mounted
#[derive(Debug, Clone, PartialEq)]
pub struct NodeReady {
    pub key: NodeKey,
    pub kind: String,
    pub request: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    #[default]
    RichText,
    Diff,
    Source,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewMode::RichText => "rich-text",
            ViewMode::Diff => "diff",
            ViewMode::Source => "source",
        })
    }
}

/// Whether a JSX component appears as a block or inline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsxKind {
    Flow,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsxPropDescriptor {
    pub name: String,
    #[serde(rename = "type", default = "default_prop_type")]
    pub prop_type: String,
    #[serde(default)]
    pub required: bool,
}

fn default_prop_type() -> String {
    "string".to_string()
}

/// A JSX component the editor knows how to insert and edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsxComponentDescriptor {
    pub name: String,
    pub kind: JsxKind,
    /// Module the component is imported from
    pub source: String,
    #[serde(default)]
    pub default_export: bool,
    #[serde(default)]
    pub props: Vec<JsxPropDescriptor>,
    #[serde(default)]
    pub has_children: bool,
}
