//! The base plugin every editor activates first.
//!
//! Declares the shared system nodes, registers the structural visitors and,
//! unless `strict`, the catch-all visitors that keep unknown kinds intact:
//!
//! ```text
//! import:  unknown "x" {..props}  ─►  generic { syntaxKind: "x", ..props }
//! export:  generic { syntaxKind: "x", ..props }  ─►  "x" {..props}
//! ```

use markwright_reactive::Realm;
use serde_json::Value;
use tracing::debug;

use crate::compose::RealmPlugin;
use crate::conversion::{register_visitor, Export, Import, KindClaim, VisitorDescriptor};
use crate::props::PropMapping;
use crate::system::*;
use crate::tree::{PresentationNode, SyntaxNode};

/// Kinds converted one-to-one, props and children preserved
pub const STRUCTURAL_KINDS: &[&str] = &[
    "root",
    "paragraph",
    "text",
    "heading",
    "emphasis",
    "strong",
    "inlineCode",
    "blockquote",
    "list",
    "listItem",
    "break",
    "image",
    "html",
];

/// Presentation kind of nodes preserved by the fallback visitors
pub const GENERIC_KIND: &str = "generic";

/// Prop under which a generic node remembers its syntax kind
pub const SYNTAX_KIND_PROP: &str = "syntaxKind";

#[derive(Debug, Clone, Default)]
pub struct CorePlugin {
    /// Fail on unknown kinds instead of preserving them
    pub strict: bool,
}

impl CorePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }
}

impl RealmPlugin for CorePlugin {
    fn id(&self) -> &'static str {
        "core"
    }

    fn init(&self, realm: &Realm) -> anyhow::Result<()> {
        realm.declare_aggregate(IMPORT_VISITORS)?;
        realm.declare_aggregate(EXPORT_VISITORS)?;
        realm.declare_aggregate(NODE_KINDS)?;
        realm.declare_aggregate(SYNTAX_EXTENSIONS)?;
        realm.declare_aggregate(SERIALIZER_EXTENSIONS)?;
        realm.declare_aggregate(MDAST_EXTENSIONS)?;
        realm.declare_cell(VIEW_MODE, Some(ViewMode::RichText))?;
        realm.declare_cell(JSX_IS_AVAILABLE, Some(false))?;
        realm.declare_cell(JSX_COMPONENT_DESCRIPTORS, Some(Vec::new()))?;
        realm.declare_signal(NODE_READY)?;

        let commands = realm.declare_signal(PRESENTATION_COMMANDS)?;
        let insert = realm.declare_signal(INSERT_DECORATOR_NODE)?;
        let as_command = realm.map(insert, |factory: &NodeFactory| PresentationCommand::InsertNode {
            factory: factory.clone(),
            at: InsertAt::NearestRoot,
        })?;
        realm.link(as_command, commands)?;

        register_visitor(realm, structural_import())?;
        register_visitor(realm, structural_export())?;

        let mut kinds: Vec<NodeKindSpec> = STRUCTURAL_KINDS
            .iter()
            .map(|kind| NodeKindSpec::new(*kind, "core"))
            .collect();

        if !self.strict {
            register_visitor(realm, generic_import())?;
            register_visitor(realm, generic_export())?;
            kinds.push(NodeKindSpec::new(GENERIC_KIND, "core"));
        }
        register_node_kinds(realm, kinds)?;

        debug!(strict = self.strict, "Core system declared");
        Ok(())
    }
}

fn structural_import() -> VisitorDescriptor<Import> {
    VisitorDescriptor::new(
        "core.structural",
        KindClaim::kinds(STRUCTURAL_KINDS.iter().copied()),
        |node: &SyntaxNode, ctx| {
            let children = ctx.convert_children(node)?;
            let mut out = PresentationNode::new(node.kind.clone(), ctx.next_key()).with_children(children);
            out.props = node.props.clone();
            Ok(out)
        },
    )
}

fn structural_export() -> VisitorDescriptor<Export> {
    VisitorDescriptor::new(
        "core.structural",
        KindClaim::kinds(STRUCTURAL_KINDS.iter().copied()),
        |node: &PresentationNode, ctx| {
            let children = ctx.convert_children(node)?;
            let mut out = SyntaxNode::new(node.kind.clone()).with_children(children);
            out.props = node.props.clone();
            Ok(out)
        },
    )
}

/// Syntax props that would collide with the kind tag are escaped, never lost
const GENERIC_PROPS: PropMapping = PropMapping::new(&[], &[SYNTAX_KIND_PROP]);

fn generic_import() -> VisitorDescriptor<Import> {
    VisitorDescriptor::fallback("core.generic", |node: &SyntaxNode, ctx| {
        let children = ctx.convert_children(node)?;
        let mut out = PresentationNode::new(GENERIC_KIND, ctx.next_key()).with_children(children);
        out.props = GENERIC_PROPS.lift(&node.props);
        out.props
            .insert(SYNTAX_KIND_PROP.to_string(), Value::String(node.kind.clone()));
        Ok(out)
    })
}

fn generic_export() -> VisitorDescriptor<Export> {
    VisitorDescriptor::fallback("core.generic", |node: &PresentationNode, ctx| {
        let children = ctx.convert_children(node)?;
        // Only nodes produced by `generic_import` carry escaped props
        let (kind, props) = match (node.kind.as_str(), node.props.get(SYNTAX_KIND_PROP)) {
            (GENERIC_KIND, Some(Value::String(kind))) => (kind.clone(), GENERIC_PROPS.lower(&node.props)),
            _ => (node.kind.clone(), node.props.clone()),
        };
        let mut out = SyntaxNode::new(kind).with_children(children);
        out.props = props;
        Ok(out)
    })
}
