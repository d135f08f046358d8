//! JSX elements and ESM statements embedded in markup.
//!
//! `mdxJsxFlowElement` / `mdxJsxTextElement` import as a `jsx` decorator node
//! whose `jsxKind` prop remembers flow vs. text; `mdxjsEsm` imports as
//! `jsxEsm`. Attributes are kept in their syntax-tree shape.

use std::collections::BTreeMap;

use markwright_core::system::{
    INSERT_DECORATOR_NODE, JSX_COMPONENT_DESCRIPTORS, JSX_IS_AVAILABLE, MDAST_EXTENSIONS,
    SERIALIZER_EXTENSIONS, SYNTAX_EXTENSIONS,
};
use markwright_core::{
    register_node_kinds, register_visitor, ConversionError, Export, Import, JsxComponentDescriptor,
    JsxKind, Key, KindClaim, NodeFactory, NodeKindSpec, PresentationNode, PropMapping, Realm,
    RealmError, RealmPlugin, Signal, SyntaxNode, VisitorDescriptor,
};
use serde_json::{json, Value};
use tracing::debug;

pub const INSERT_JSX: Key<Signal<InsertJsx>> = Key::new("jsx.insertJsx");

pub const JSX_KIND: &str = "jsx";
pub const JSX_ESM_KIND: &str = "jsxEsm";

const FLOW_ELEMENT: &str = "mdxJsxFlowElement";
const TEXT_ELEMENT: &str = "mdxJsxTextElement";
const ESM: &str = "mdxjsEsm";

/// Remembers flow vs. text on the presentation side
pub const JSX_KIND_PROP: &str = "jsxKind";

const ELEMENT_PROPS: PropMapping = PropMapping::new(&[], &[JSX_KIND_PROP]);

/// Payload of `jsx.insertJsx`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertJsx {
    pub kind: JsxKind,
    pub name: String,
    pub props: BTreeMap<String, String>,
    /// Templates; keys are reassigned on insertion
    pub children: Vec<PresentationNode>,
}

impl InsertJsx {
    pub fn flow(name: impl Into<String>) -> Self {
        Self {
            kind: JsxKind::Flow,
            name: name.into(),
            props: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self {
            kind: JsxKind::Text,
            ..Self::flow(name)
        }
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }
}

fn jsx_kind_label(kind: JsxKind) -> &'static str {
    match kind {
        JsxKind::Flow => "flow",
        JsxKind::Text => "text",
    }
}

/// Syntax-tree attribute list for plain string props
pub fn to_jsx_attributes(props: &BTreeMap<String, String>) -> Value {
    Value::Array(
        props
            .iter()
            .map(|(name, value)| json!({ "type": "mdxJsxAttribute", "name": name, "value": value }))
            .collect(),
    )
}

/// Registered descriptor for the component called `name`
pub fn descriptor_for(realm: &Realm, name: &str) -> Result<Option<JsxComponentDescriptor>, RealmError> {
    let descriptors = realm
        .value(realm.resolve(JSX_COMPONENT_DESCRIPTORS)?)?
        .unwrap_or_default();
    Ok(descriptors.into_iter().find(|d| d.name == name))
}

#[derive(Debug, Clone, Default)]
pub struct JsxPlugin {
    pub components: Vec<JsxComponentDescriptor>,
}

impl RealmPlugin for JsxPlugin {
    fn id(&self) -> &'static str {
        "jsx"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![JSX_IS_AVAILABLE.name(), INSERT_DECORATOR_NODE.name()]
    }

    fn init(&self, realm: &Realm) -> anyhow::Result<()> {
        realm.publish(realm.resolve(JSX_IS_AVAILABLE)?, true)?;
        realm.append(realm.resolve(MDAST_EXTENSIONS)?, ["mdxFromMarkdown".to_string()])?;
        realm.append(realm.resolve(SYNTAX_EXTENSIONS)?, ["mdxjs".to_string()])?;
        realm.append(realm.resolve(SERIALIZER_EXTENSIONS)?, ["mdxToMarkdown".to_string()])?;

        let insert = realm.declare_signal(INSERT_JSX)?;
        let factory = realm.map(insert, |payload: &InsertJsx| {
            let payload = payload.clone();
            NodeFactory::new(JSX_KIND, move |keys| {
                let mut children = payload.children.clone();
                for child in &mut children {
                    child.rekey(keys);
                }
                PresentationNode::new(JSX_KIND, keys.next_key())
                    .with_prop(JSX_KIND_PROP, jsx_kind_label(payload.kind))
                    .with_prop("name", payload.name.clone())
                    .with_prop("attributes", to_jsx_attributes(&payload.props))
                    .with_children(children)
            })
        })?;
        realm.link(factory, realm.resolve(INSERT_DECORATOR_NODE)?)?;

        register_visitor(realm, element_import())?;
        register_visitor(realm, esm_import())?;
        register_visitor(realm, element_export())?;
        register_visitor(realm, esm_export())?;
        register_node_kinds(
            realm,
            vec![
                NodeKindSpec::decorator(JSX_KIND, "jsx"),
                NodeKindSpec::decorator(JSX_ESM_KIND, "jsx"),
            ],
        )?;

        self.update(realm)?;
        debug!(components = self.components.len(), "JSX enabled");
        Ok(())
    }

    fn update(&self, realm: &Realm) -> anyhow::Result<()> {
        realm.publish(realm.resolve(JSX_COMPONENT_DESCRIPTORS)?, self.components.clone())?;
        Ok(())
    }
}

fn element_import() -> VisitorDescriptor<Import> {
    VisitorDescriptor::new(
        "jsx.element",
        KindClaim::kinds([FLOW_ELEMENT, TEXT_ELEMENT]),
        |node: &SyntaxNode, ctx| {
            let children = ctx.convert_children(node)?;
            let kind = if node.kind == FLOW_ELEMENT { JsxKind::Flow } else { JsxKind::Text };
            let mut out = PresentationNode::new(JSX_KIND, ctx.next_key()).with_children(children);
            out.props = ELEMENT_PROPS.lift(&node.props);
            out.props
                .insert(JSX_KIND_PROP.to_string(), Value::from(jsx_kind_label(kind)));
            Ok(out)
        },
    )
}

fn esm_import() -> VisitorDescriptor<Import> {
    VisitorDescriptor::new("jsx.esm", KindClaim::kind(ESM), |node: &SyntaxNode, ctx| {
        let mut out = PresentationNode::new(JSX_ESM_KIND, ctx.next_key());
        out.props = node.props.clone();
        Ok(out)
    })
}

fn element_export() -> VisitorDescriptor<Export> {
    VisitorDescriptor::new("jsx.element", KindClaim::kind(JSX_KIND), |node: &PresentationNode, ctx| {
        let children = ctx.convert_children(node)?;
        let kind = match node.props.get(JSX_KIND_PROP) {
            Some(Value::String(kind)) if kind == "flow" => FLOW_ELEMENT,
            Some(Value::String(kind)) if kind == "text" => TEXT_ELEMENT,
            other => {
                return Err(ConversionError::visitor(
                    "jsx.element",
                    format!("unknown jsxKind {:?}", other),
                ))
            }
        };
        let mut out = SyntaxNode::new(kind).with_children(children);
        out.props = ELEMENT_PROPS.lower(&node.props);
        Ok(out)
    })
}

fn esm_export() -> VisitorDescriptor<Export> {
    VisitorDescriptor::new("jsx.esm", KindClaim::kind(JSX_ESM_KIND), |node: &PresentationNode, _ctx| {
        let mut out = SyntaxNode::new(ESM);
        out.props = node.props.clone();
        Ok(out)
    })
}
