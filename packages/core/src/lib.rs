//! # Markwright Core
//!
//! Plugin composition and tree conversion on top of the reactive graph.
//!
//! ```text
//!   Composer ──activates──► RealmPlugin::init(&Realm)
//!      │                        │ declares nodes, appends descriptors
//!      ▼                        ▼
//!   validate()            core.importVisitors / core.exportVisitors
//!                               │ snapshot
//!                               ▼
//!   SyntaxNode ──ConversionRegistry<Import>──► PresentationNode
//!   SyntaxNode ◄──ConversionRegistry<Export>── PresentationNode
//! ```
//!
//! ## Example
//!
//! ```
//! use markwright_core::{Composer, ConversionRegistry, CorePlugin, Import, KeyGenerator, Realm, SyntaxNode};
//!
//! let realm = Realm::new();
//! let mut composer = Composer::new(realm.clone()).unwrap();
//! composer.register_plugin(Box::new(CorePlugin::new())).unwrap();
//! composer.validate().unwrap();
//!
//! let tree = SyntaxNode::new("root").with_child(SyntaxNode::new("paragraph"));
//! let import = ConversionRegistry::<Import>::snapshot(&realm).unwrap();
//! let doc = import.convert(&realm, &tree, &mut KeyGenerator::new("README.md")).unwrap();
//! assert_eq!(doc.children[0].kind, "paragraph");
//! ```

pub mod base;
pub mod compose;
pub mod conversion;
pub mod error;
pub mod priority;
pub mod props;
pub mod system;
pub mod tree;

pub use base::CorePlugin;
pub use compose::{append_to, Activation, Composer, RealmPlugin};
pub use conversion::{
    register_visitor, ConversionRegistry, Direction, Export, Import, KindClaim, VisitContext,
    VisitorDescriptor, DEFAULT_PRIORITY, FALLBACK_PRIORITY,
};
pub use error::{ComposeError, ConversionError};
pub use priority::{select_by_priority, sort_by_priority, Prioritized};
pub use props::{PropMapping, Props, ESCAPE_PREFIX};
pub use system::{
    register_node_kinds, InsertAt, JsxComponentDescriptor, JsxKind, JsxPropDescriptor, NodeFactory,
    NodeKindSpec, NodeReady, PresentationCommand, ViewMode,
};
pub use tree::{document_seed, KeyGenerator, NodeKey, PresentationNode, SyntaxNode, TreeNode};

pub use markwright_reactive::{
    Aggregate, Cell, Key, NodeId, Realm, RealmError, Signal, Subscription,
};
