//! # Markwright Plugins
//!
//! Feature plugins built on the core system nodes. Each plugin is a params
//! struct implementing [`RealmPlugin`](markwright_core::RealmPlugin); its
//! fields are the options a host configures.
//!
//! | id              | contributes                                           |
//! |-----------------|-------------------------------------------------------|
//! | `codeblock`     | `code` ↔ `codeBlock`, editor descriptors, insertion   |
//! | `jsx`           | MDX JSX elements and ESM, component descriptors       |
//! | `sandpack`      | live code blocks selected by preset meta              |
//! | `thematicBreak` | horizontal rules                                      |
//! | `linkDialog`    | links and the link edit dialog state                  |
//! | `diffSource`    | rich-text / diff / source view mode                   |
//! | `toolbar`       | toolbar items over the signals above                  |

pub mod codeblock;
pub mod diff_source;
pub mod jsx;
pub mod link_dialog;
pub mod sandpack;
pub mod thematic_break;
pub mod toolbar;

pub use codeblock::{CodeBlockEditorDescriptor, CodeBlockOptions, CodeBlockPlugin};
pub use diff_source::DiffSourcePlugin;
pub use jsx::{InsertJsx, JsxPlugin};
pub use link_dialog::{LinkDialogPlugin, LinkDialogState};
pub use sandpack::{SandpackConfig, SandpackPlugin, SandpackPreset};
pub use thematic_break::ThematicBreakPlugin;
pub use toolbar::{ToolbarItem, ToolbarPlugin};

/// Ids of every plugin this crate provides, in recommended activation order
pub const PLUGIN_IDS: &[&str] = &[
    "codeblock",
    "jsx",
    "sandpack",
    "thematicBreak",
    "linkDialog",
    "diffSource",
    "toolbar",
];
