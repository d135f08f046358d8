//! Error types for composition and conversion

use markwright_reactive::RealmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Plugin '{plugin}' requires node '{node}', which was never declared")]
    MissingDependency { plugin: String, node: String },

    #[error("Plugin '{plugin}' declared cell '{node}' without a required initial value")]
    InvalidInitialState { plugin: String, node: String },

    #[error("Plugin '{plugin}' failed to initialize: {message}")]
    Init {
        plugin: String,
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Plugin '{plugin}' failed to update: {message}")]
    Update {
        plugin: String,
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Plugin '{0}' is not active")]
    PluginNotActive(String),

    #[error("Node kind '{kind}' registered by both '{first}' and '{second}'")]
    DuplicateNodeKind {
        kind: String,
        first: String,
        second: String,
    },

    #[error("{direction} visitors '{first}' and '{second}' both claim '{kind}' at priority {priority}")]
    AmbiguousVisitors {
        direction: &'static str,
        kind: String,
        first: String,
        second: String,
        priority: i32,
    },

    #[error("Realm error: {0}")]
    Realm(#[from] RealmError),
}

impl ComposeError {
    /// Classify an initializer failure, surfacing invariant violations by name
    pub fn init_failure(plugin: &str, source: anyhow::Error) -> Self {
        if let Some(RealmError::InvalidInitialState { node }) = source.downcast_ref::<RealmError>() {
            return ComposeError::InvalidInitialState {
                plugin: plugin.to_string(),
                node: node.clone(),
            };
        }
        ComposeError::Init {
            plugin: plugin.to_string(),
            message: format!("{:#}", source),
            source,
        }
    }

    pub fn update_failure(plugin: &str, source: anyhow::Error) -> Self {
        ComposeError::Update {
            plugin: plugin.to_string(),
            message: format!("{:#}", source),
            source,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("No {direction} visitor matches node kind '{kind}' (at {path})")]
    NoMatchingVisitor {
        direction: &'static str,
        kind: String,
        path: String,
    },

    #[error("Visitor '{visitor}' failed: {message}")]
    Visitor { visitor: String, message: String },

    #[error("Realm error: {0}")]
    Realm(#[from] RealmError),
}

impl ConversionError {
    pub fn visitor(visitor: impl Into<String>, message: impl Into<String>) -> Self {
        ConversionError::Visitor {
            visitor: visitor.into(),
            message: message.into(),
        }
    }
}
