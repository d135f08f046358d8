//! # Document Handle
//!
//! In-memory presentation host for one document.
//!
//! A Document owns the presentation tree produced by import, the key
//! generator that keeps node keys unique, and the current selection. It
//! applies [`PresentationCommand`]s coming out of the realm and reports each
//! mounted insertion as a [`NodeReady`].
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Import → Commands → Export → Save
//!   ↓       ↓         ↓         ↓       ↓
//! JSON  Presentation  version  Syntax  JSON
//! ```

use markwright_core::{InsertAt, KeyGenerator, NodeKey, NodeReady, PresentationCommand, PresentationNode};
use tracing::debug;

use crate::EditorError;

/// Editable presentation document
#[derive(Debug, Clone)]
pub struct Document {
    /// Name the document was loaded under
    pub name: String,

    /// Current version number (increments on each applied command)
    pub version: u64,

    root: PresentationNode,
    selection: Option<NodeKey>,
    keys: KeyGenerator,
}

impl Document {
    /// Wrap an imported tree; `keys` must be the generator that keyed it
    pub fn new(name: impl Into<String>, root: PresentationNode, keys: KeyGenerator) -> Self {
        Self {
            name: name.into(),
            version: 0,
            root,
            selection: None,
            keys,
        }
    }

    pub fn root(&self) -> &PresentationNode {
        &self.root
    }

    pub fn selection(&self) -> Option<&NodeKey> {
        self.selection.as_ref()
    }

    pub fn find(&self, key: &NodeKey) -> Option<&PresentationNode> {
        self.root.find(key)
    }

    /// Apply a command. Insertions return the mounted node's readiness.
    pub fn apply(&mut self, command: &PresentationCommand) -> Result<Option<NodeReady>, EditorError> {
        let ready = match command {
            PresentationCommand::InsertNode { factory, at } => {
                let node = factory.build(&mut self.keys);
                let ready = NodeReady {
                    key: node.key.clone(),
                    kind: node.kind.clone(),
                    request: factory.request().map(str::to_string),
                };
                self.insert(node, at)?;
                Some(ready)
            }

            PresentationCommand::SelectNode { key } => {
                self.require(key)?;
                self.selection = Some(key.clone());
                None
            }

            PresentationCommand::RemoveNode { key } => {
                self.root
                    .remove(key)
                    .ok_or_else(|| EditorError::NodeNotFound(key.clone()))?;
                if self.selection.as_ref().map_or(false, |selected| self.root.find(selected).is_none()) {
                    self.selection = None;
                }
                None
            }

            PresentationCommand::SetProp { key, name, value } => {
                let node = self
                    .root
                    .find_mut(key)
                    .ok_or_else(|| EditorError::NodeNotFound(key.clone()))?;
                node.props.insert(name.clone(), value.clone());
                None
            }
        };

        self.version += 1;
        debug!(document = %self.name, version = self.version, "Applied presentation command");
        Ok(ready)
    }

    fn require(&self, key: &NodeKey) -> Result<&PresentationNode, EditorError> {
        self.root
            .find(key)
            .ok_or_else(|| EditorError::NodeNotFound(key.clone()))
    }

    fn insert(&mut self, node: PresentationNode, at: &InsertAt) -> Result<(), EditorError> {
        match at {
            InsertAt::NearestRoot => {
                // After the top-level block holding the selection, else at the end
                let index = self
                    .selection
                    .as_ref()
                    .and_then(|selected| {
                        self.root
                            .children
                            .iter()
                            .position(|block| block.find(selected).is_some())
                    })
                    .map_or(self.root.children.len(), |index| index + 1);
                self.root.children.insert(index, node);
            }
            InsertAt::Inside(parent) => {
                self.root
                    .find_mut(parent)
                    .ok_or_else(|| EditorError::NodeNotFound(parent.clone()))?
                    .children
                    .push(node);
            }
        }
        Ok(())
    }
}
