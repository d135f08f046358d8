//! Error types for the editor

use markwright_core::{ComposeError, ConversionError, NodeKey, RealmError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Failed to load '{document}': {source}")]
    Load {
        document: String,
        #[source]
        source: ConversionError,
    },

    #[error("Failed to save '{document}': {source}")]
    Save {
        document: String,
        #[source]
        source: ConversionError,
    },

    #[error("Composition error: {0}")]
    Compose(#[from] ComposeError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Realm error: {0}")]
    Realm(#[from] RealmError),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("No document loaded")]
    NoDocument,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
