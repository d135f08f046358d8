//! # Editor
//!
//! Coordinates the import → edit → export pipeline for one document:
//!
//! ```text
//! EditorBuilder::build
//!   core ─► plugins (config order) ─► post_init ─► validate
//!
//! Editor::load(tree)    SyntaxNode ──import──► Document
//! plugin signals        ──► core.presentationCommands ──► Document::apply
//!                                                  └──► core.nodeReady
//! Editor::save()        Document ──export──► SyntaxNode
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use markwright_core::system::{NODE_READY, PRESENTATION_COMMANDS};
use markwright_core::{
    Composer, ConversionRegistry, CorePlugin, Export, Import, KeyGenerator, PresentationCommand,
    PresentationNode, Realm, RealmPlugin, Subscription, SyntaxNode,
};
use tracing::{debug, info, instrument};

use crate::{Document, EditorConfig, EditorError};

/// Collects plugins before composing an [`Editor`]
#[derive(Default)]
pub struct EditorBuilder {
    strict: bool,
    plugins: Vec<Box<dyn RealmPlugin>>,
}

impl EditorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for the plugins and options of `config`
    pub fn from_config(config: &EditorConfig) -> Result<Self, EditorError> {
        Ok(Self {
            strict: config.strict,
            plugins: config.build_plugins()?,
        })
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn plugin(mut self, plugin: impl RealmPlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Compose core plus the plugins, in the order given
    pub fn build(self) -> Result<Editor, EditorError> {
        let realm = Realm::new();
        let mut composer = Composer::new(realm.clone())?;
        composer.register_plugin(Box::new(CorePlugin { strict: self.strict }))?;
        for plugin in self.plugins {
            composer.register_plugin(plugin)?;
        }
        composer.post_init_all()?;
        composer.validate()?;

        let document = Rc::new(RefCell::new(None));
        let host = attach_document(&realm, document.clone())?;

        let plugins = composer.active_plugins()?;
        info!(realm = realm.id(), plugins = ?plugins, strict = self.strict, "Editor built");
        Ok(Editor {
            composer,
            document,
            host,
        })
    }
}

/// Apply presentation commands to the loaded document and announce insertions
fn attach_document(
    realm: &Realm,
    document: Rc<RefCell<Option<Document>>>,
) -> Result<Subscription, EditorError> {
    let commands = realm.resolve(PRESENTATION_COMMANDS)?;
    let ready = realm.resolve(NODE_READY)?;
    let subscription = realm.subscribe(commands, move |realm, command: &PresentationCommand| {
        let mounted = {
            let mut slot = document.borrow_mut();
            let document = slot.as_mut().ok_or_else(|| anyhow!("No document loaded"))?;
            document.apply(command)?
        };
        if let Some(mounted) = mounted {
            debug!(key = %mounted.key, kind = %mounted.kind, "Node mounted");
            realm.publish(ready, mounted)?;
        }
        Ok(())
    })?;
    Ok(subscription)
}

/// A composed editor hosting at most one document
pub struct Editor {
    composer: Composer,
    document: Rc<RefCell<Option<Document>>>,
    host: Subscription,
}

impl Editor {
    pub fn builder() -> EditorBuilder {
        EditorBuilder::new()
    }

    /// The graph; plugin signals are published through it
    pub fn realm(&self) -> &Realm {
        self.composer.realm()
    }

    pub fn active_plugins(&self) -> Result<Vec<String>, EditorError> {
        Ok(self.composer.active_plugins()?)
    }

    /// Import `tree` and make it the current document
    #[instrument(skip(self, tree), fields(kinds = tree.kinds().len()))]
    pub fn load(&self, name: &str, tree: &SyntaxNode) -> Result<(), EditorError> {
        let realm = self.realm();
        let mut keys = KeyGenerator::new(name);
        let root = ConversionRegistry::<Import>::snapshot(realm)
            .and_then(|import| import.convert(realm, tree, &mut keys))
            .map_err(|source| EditorError::Load {
                document: name.to_string(),
                source,
            })?;

        info!(document = name, nodes = root.node_count(), "Document loaded");
        *self.document.borrow_mut() = Some(Document::new(name, root, keys));
        Ok(())
    }

    /// Export the current document
    #[instrument(skip(self))]
    pub fn save(&self) -> Result<SyntaxNode, EditorError> {
        let (name, root) = self
            .with_document(|doc| (doc.name.clone(), doc.root().clone()))
            .ok_or(EditorError::NoDocument)?;
        let realm = self.realm();
        let mut keys = KeyGenerator::new(&name);
        let tree = ConversionRegistry::<Export>::snapshot(realm)
            .and_then(|export| export.convert(realm, &root, &mut keys))
            .map_err(|source| EditorError::Save {
                document: name.clone(),
                source,
            })?;

        info!(document = %name, "Document saved");
        Ok(tree)
    }

    /// Read the current document, if one is loaded
    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> Option<R> {
        self.document.borrow().as_ref().map(f)
    }

    /// Presentation tree of the current document
    pub fn presentation(&self) -> Option<PresentationNode> {
        self.with_document(|doc| doc.root().clone())
    }

    /// Re-apply an active plugin's parameters
    pub fn update_plugin(&self, plugin: &dyn RealmPlugin) -> Result<(), EditorError> {
        Ok(self.composer.update_plugin(plugin)?)
    }

    /// Release the document, every plugin and the realm's contents
    pub fn teardown(&mut self) {
        self.host.dispose();
        self.document.borrow_mut().take();
        self.composer.teardown();
        info!("Editor torn down");
    }
}
