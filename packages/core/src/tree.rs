//! # Tree Boundary Types
//!
//! The two trees the core converts between. Both are defined by external
//! collaborators (a markup parser/serializer and a rendering layer); the core
//! only needs the kind tag, the properties and the children.
//!
//! ```text
//! SyntaxNode (mdast-shaped JSON)  ──import──►  PresentationNode (keyed, editable)
//!                                 ◄──export──
//! ```

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Anything carrying a kind tag and children; what visitors dispatch on
pub trait TreeNode {
    fn kind(&self) -> &str;

    fn children(&self) -> &[Self]
    where
        Self: Sized;
}

/// A node of the markup syntax tree.
///
/// Serializes as `{ "type": ..., "children": [...], ...props }`, so trees
/// produced by mdast-style parsers deserialize without an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,

    #[serde(flatten)]
    pub props: BTreeMap<String, Value>,
}

impl SyntaxNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            children: Vec::new(),
            props: BTreeMap::new(),
        }
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    /// String property, if present and a string
    pub fn prop_str(&self, name: &str) -> Option<&str> {
        self.props.get(name).and_then(Value::as_str)
    }

    /// Every distinct kind in this subtree, in first-seen order
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds = Vec::new();
        collect_kinds(self, &mut kinds);
        kinds
    }
}

fn collect_kinds(node: &SyntaxNode, kinds: &mut Vec<String>) {
    if !kinds.iter().any(|k| k == &node.kind) {
        kinds.push(node.kind.clone());
    }
    for child in &node.children {
        collect_kinds(child, kinds);
    }
}

impl TreeNode for SyntaxNode {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Key of a presentation node, unique within one document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node of the editable presentation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationNode {
    pub kind: String,
    pub key: NodeKey,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PresentationNode>,
}

impl PresentationNode {
    pub fn new(kind: impl Into<String>, key: NodeKey) -> Self {
        Self {
            kind: kind.into(),
            key,
            props: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<PresentationNode>) -> Self {
        self.children = children;
        self
    }

    pub fn prop_str(&self, name: &str) -> Option<&str> {
        self.props.get(name).and_then(Value::as_str)
    }

    pub fn find(&self, key: &NodeKey) -> Option<&PresentationNode> {
        if &self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }

    pub fn find_mut(&mut self, key: &NodeKey) -> Option<&mut PresentationNode> {
        if &self.key == key {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(key))
    }

    /// Remove the descendant with `key`; the node itself is never removed
    pub fn remove(&mut self, key: &NodeKey) -> Option<PresentationNode> {
        if let Some(index) = self.children.iter().position(|child| &child.key == key) {
            return Some(self.children.remove(index));
        }
        self.children.iter_mut().find_map(|child| child.remove(key))
    }

    /// Assign fresh keys to this subtree, for templates inserted more than once
    pub fn rekey(&mut self, keys: &mut KeyGenerator) {
        self.key = keys.next_key();
        for child in &mut self.children {
            child.rekey(keys);
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(PresentationNode::node_count)
            .sum::<usize>()
    }
}

impl TreeNode for PresentationNode {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Generate a document seed from its name using CRC32
pub fn document_seed(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential key generator for presentation nodes of one document
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    seed: String,
    count: u32,
}

impl KeyGenerator {
    pub fn new(document: &str) -> Self {
        Self {
            seed: document_seed(document),
            count: 0,
        }
    }

    pub fn next_key(&mut self) -> NodeKey {
        self.count += 1;
        NodeKey(format!("{}-{}", self.seed, self.count))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
