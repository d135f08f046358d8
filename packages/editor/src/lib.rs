//! # Markwright Editor
//!
//! Document host for a composed markwright realm.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ core: composer, visitor registries          │
//! │ plugins: codeblock, jsx, sandpack, ...      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document lifecycle + commands       │
//! │  - Build a realm from config or plugins     │
//! │  - Import/export syntax trees               │
//! │  - Apply presentation commands              │
//! │  - Announce mounted nodes (core.nodeReady)  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use markwright_editor::{EditorBuilder, EditorConfig};
//! use markwright_plugins::toolbar::trigger;
//!
//! let config = EditorConfig::load(".")?;
//! let editor = EditorBuilder::from_config(&config)?.build()?;
//!
//! editor.load("README.md", &tree)?;
//! trigger(editor.realm(), "insert_thematic_break")?;
//! let saved = editor.save()?;
//! ```

mod config;
mod document;
mod editor;
mod errors;

pub use config::{CodeBlockConfig, EditorConfig, DEFAULT_CONFIG_NAME};
pub use document::Document;
pub use editor::{Editor, EditorBuilder};
pub use errors::EditorError;

// Re-export the tree types hosts exchange with the editor
pub use markwright_core::{NodeKey, PresentationCommand, PresentationNode, SyntaxNode};
