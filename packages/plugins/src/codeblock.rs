//! # Code Blocks
//!
//! Fenced code (`code` in the syntax tree) becomes a `codeBlock` decorator
//! node, edited by whichever registered editor matches its language and meta.
//!
//! ```text
//! insertCodeBlock(options)
//!   ─► with_latest_from(defaultLanguage)
//!   ─► map(NodeFactory)
//!   ─► core.insertDecoratorNode
//! ```

use std::fmt;
use std::rc::Rc;

use markwright_core::system::{INSERT_DECORATOR_NODE, IMPORT_VISITORS};
use markwright_core::{
    register_node_kinds, register_visitor, select_by_priority, Aggregate, Cell, Export, Import,
    Key, KeyGenerator, KindClaim, NodeFactory, NodeKindSpec, PresentationNode, Prioritized,
    PropMapping, Realm, RealmError, RealmPlugin, Signal, SyntaxNode, VisitorDescriptor,
};
use tracing::debug;

pub const DEFAULT_CODE_BLOCK_LANGUAGE: Key<Cell<String>> = Key::required("codeblock.defaultLanguage");
pub const CODE_BLOCK_EDITOR_DESCRIPTORS: Key<Aggregate<CodeBlockEditorDescriptor>> =
    Key::new("codeblock.editorDescriptors");
pub const INSERT_CODE_BLOCK: Key<Signal<CodeBlockOptions>> = Key::new("codeblock.insertCodeBlock");

pub const CODE_BLOCK_KIND: &str = "codeBlock";

/// `code` syntax props as seen by code block editors
pub(crate) const CODE_PROPS: PropMapping =
    PropMapping::new(&[("value", "code"), ("lang", "language")], &[]);

/// Partial options for a new code block; unset fields use defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeBlockOptions {
    pub code: Option<String>,
    pub language: Option<String>,
    pub meta: Option<String>,
}

/// An embedded editor for code blocks it matches
#[derive(Clone)]
pub struct CodeBlockEditorDescriptor {
    pub editor: String,
    priority: i32,
    matcher: Rc<dyn Fn(&str, &str) -> bool>,
}

impl CodeBlockEditorDescriptor {
    pub fn new<F>(editor: impl Into<String>, priority: i32, matcher: F) -> Self
    where
        F: Fn(&str, &str) -> bool + 'static,
    {
        Self {
            editor: editor.into(),
            priority,
            matcher: Rc::new(matcher),
        }
    }

    /// Matches every code block
    pub fn catch_all(editor: impl Into<String>, priority: i32) -> Self {
        Self::new(editor, priority, |_, _| true)
    }

    /// Matches blocks of one language
    pub fn for_language(editor: impl Into<String>, priority: i32, language: &str) -> Self {
        let language = language.to_string();
        Self::new(editor, priority, move |candidate, _| candidate == language)
    }

    pub fn matches(&self, language: &str, meta: &str) -> bool {
        (self.matcher)(language, meta)
    }
}

impl Prioritized for CodeBlockEditorDescriptor {
    fn priority(&self) -> i32 {
        self.priority
    }
}

impl fmt::Debug for CodeBlockEditorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeBlockEditorDescriptor")
            .field("editor", &self.editor)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Editor chosen for a block with `language` and `meta`
pub fn editor_for(realm: &Realm, language: &str, meta: &str) -> Result<Option<String>, RealmError> {
    let descriptors = realm.values(realm.resolve(CODE_BLOCK_EDITOR_DESCRIPTORS)?)?;
    Ok(select_by_priority(&descriptors, |d| d.matches(language, meta)).map(|d| d.editor.clone()))
}

/// Build a `codeBlock` presentation node
pub fn code_block_node(keys: &mut KeyGenerator, code: &str, language: &str, meta: &str) -> PresentationNode {
    PresentationNode::new(CODE_BLOCK_KIND, keys.next_key())
        .with_prop("code", code)
        .with_prop("language", language)
        .with_prop("meta", meta)
}

#[derive(Debug, Clone, Default)]
pub struct CodeBlockPlugin {
    pub default_language: String,
    pub editors: Vec<CodeBlockEditorDescriptor>,
}

impl RealmPlugin for CodeBlockPlugin {
    fn id(&self) -> &'static str {
        "codeblock"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![IMPORT_VISITORS.name(), INSERT_DECORATOR_NODE.name()]
    }

    fn init(&self, realm: &Realm) -> anyhow::Result<()> {
        let default_language = realm.declare_cell(DEFAULT_CODE_BLOCK_LANGUAGE, Some(self.default_language.clone()))?;
        let descriptors = realm.declare_aggregate(CODE_BLOCK_EDITOR_DESCRIPTORS)?;
        realm.append(descriptors, self.editors.iter().cloned())?;

        let insert = realm.declare_signal(INSERT_CODE_BLOCK)?;
        let with_language = realm.with_latest_from(insert, default_language)?;
        let factory = realm.map(with_language, |(options, default_language): &(CodeBlockOptions, String)| {
            let code = options.code.clone().unwrap_or_default();
            let language = options.language.clone().unwrap_or_else(|| default_language.clone());
            let meta = options.meta.clone().unwrap_or_default();
            NodeFactory::new(CODE_BLOCK_KIND, move |keys| code_block_node(keys, &code, &language, &meta))
        })?;
        realm.link(factory, realm.resolve(INSERT_DECORATOR_NODE)?)?;

        register_visitor(realm, code_import())?;
        register_visitor(realm, code_block_export())?;
        register_node_kinds(realm, vec![NodeKindSpec::decorator(CODE_BLOCK_KIND, "codeblock")])?;

        debug!(default_language = %self.default_language, editors = self.editors.len(), "Code blocks enabled");
        Ok(())
    }

    fn update(&self, realm: &Realm) -> anyhow::Result<()> {
        realm.publish(realm.resolve(DEFAULT_CODE_BLOCK_LANGUAGE)?, self.default_language.clone())?;
        Ok(())
    }
}

fn code_import() -> VisitorDescriptor<Import> {
    VisitorDescriptor::new("codeblock.code", KindClaim::kind("code"), |node: &SyntaxNode, ctx| {
        let mut out = PresentationNode::new(CODE_BLOCK_KIND, ctx.next_key());
        out.props = CODE_PROPS.lift(&node.props);
        Ok(out)
    })
}

fn code_block_export() -> VisitorDescriptor<Export> {
    VisitorDescriptor::new(
        "codeblock.codeBlock",
        KindClaim::kind(CODE_BLOCK_KIND),
        |node: &PresentationNode, _ctx| {
            let mut out = SyntaxNode::new("code");
            out.props = CODE_PROPS.lower(&node.props);
            Ok(out)
        },
    )
}
