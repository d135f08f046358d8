//! # Plugin Composition
//!
//! Plugins contribute to one shared [`Realm`] in a host-chosen order:
//!
//! ```text
//! register_plugin(core)  ─► requires? ─► init ─► core.activePlugins += "core"
//! register_plugin(p1)    ─► requires? ─► init ─► core.activePlugins += "p1"
//! ...
//! post_init_all()        ─► post_init for every plugin, activation order
//! validate()             ─► duplicate node kinds / ambiguous visitors
//! ```
//!
//! The composer never reorders plugins. Re-registering an active id is a
//! logged no-op.

use markwright_reactive::{Aggregate, Realm, RealmError};
use tracing::{debug, warn};

use crate::conversion::{ConversionRegistry, Direction, Export, Import};
use crate::error::ComposeError;
use crate::priority::Prioritized;
use crate::system::{NodeKindSpec, ACTIVE_PLUGINS, NODE_KINDS};

/// A bundle of realm contributions
pub trait RealmPlugin {
    /// Unique id, recorded in `core.activePlugins`
    fn id(&self) -> &'static str;

    /// Node names that must be declared before `init` runs
    fn requires(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Declare nodes, register visitors, wire pipelines
    fn init(&self, realm: &Realm) -> anyhow::Result<()>;

    /// Runs once after every plugin has initialized
    fn post_init(&self, _realm: &Realm) -> anyhow::Result<()> {
        Ok(())
    }

    /// Re-apply changed parameters. May run any number of times.
    fn update(&self, _realm: &Realm) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Outcome of [`Composer::register_plugin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Activated,
    AlreadyActive,
}

/// Activates plugins against one realm, in registration order
pub struct Composer {
    realm: Realm,
    active: Aggregate<String>,
    plugins: Vec<Box<dyn RealmPlugin>>,
    post_initialized: usize,
}

impl Composer {
    /// Create the active-plugin set in `realm`
    pub fn new(realm: Realm) -> Result<Self, ComposeError> {
        let active = realm.declare_aggregate(ACTIVE_PLUGINS)?;
        Ok(Self {
            realm,
            active,
            plugins: Vec::new(),
            post_initialized: 0,
        })
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// Ids of active plugins, in activation order
    pub fn active_plugins(&self) -> Result<Vec<String>, ComposeError> {
        Ok(self.realm.values(self.active)?)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.realm
            .values(self.active)
            .map(|ids| ids.iter().any(|active| active == id))
            .unwrap_or(false)
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn RealmPlugin>) -> Result<Activation, ComposeError> {
        let id = plugin.id();
        if self.is_active(id) {
            warn!(plugin = id, "Plugin already active, skipping activation");
            return Ok(Activation::AlreadyActive);
        }

        for node in plugin.requires() {
            if !self.realm.contains(node) {
                return Err(ComposeError::MissingDependency {
                    plugin: id.to_string(),
                    node: node.to_string(),
                });
            }
        }

        plugin
            .init(&self.realm)
            .map_err(|err| ComposeError::init_failure(id, err))?;
        self.realm.append(self.active, [id.to_string()])?;
        self.plugins.push(plugin);

        debug!(plugin = id, position = self.plugins.len(), "Plugin activated");
        Ok(Activation::Activated)
    }

    /// Run `post_init` for every plugin activated since the last call
    pub fn post_init_all(&mut self) -> Result<(), ComposeError> {
        for plugin in &self.plugins[self.post_initialized..] {
            plugin
                .post_init(&self.realm)
                .map_err(|err| ComposeError::init_failure(plugin.id(), err))?;
        }
        self.post_initialized = self.plugins.len();
        Ok(())
    }

    /// Re-apply `plugin`'s parameters; only `update` runs
    pub fn update_plugin(&self, plugin: &dyn RealmPlugin) -> Result<(), ComposeError> {
        let id = plugin.id();
        if !self.is_active(id) {
            return Err(ComposeError::PluginNotActive(id.to_string()));
        }
        debug!(plugin = id, "Updating plugin");
        plugin
            .update(&self.realm)
            .map_err(|err| ComposeError::update_failure(id, err))
    }

    /// Reject duplicate node kinds and ambiguous same-priority visitors
    pub fn validate(&self) -> Result<(), ComposeError> {
        if self.realm.contains(NODE_KINDS.name()) {
            let kinds = self.realm.values(self.realm.resolve(NODE_KINDS)?)?;
            check_node_kinds(&kinds)?;
        }
        self.check_visitors::<Import>()?;
        self.check_visitors::<Export>()?;
        Ok(())
    }

    fn check_visitors<D: Direction>(&self) -> Result<(), ComposeError> {
        let key = D::registry_key();
        if !self.realm.contains(key.name()) {
            return Ok(());
        }
        let descriptors = self.realm.values(self.realm.resolve(key)?)?;
        let registry = ConversionRegistry::<D>::new(descriptors);
        match registry.ambiguity() {
            Some((first, second, kind)) => Err(ComposeError::AmbiguousVisitors {
                direction: D::NAME,
                kind,
                first: first.name().to_string(),
                second: second.name().to_string(),
                priority: first.priority(),
            }),
            None => Ok(()),
        }
    }

    /// Drop every plugin and release the realm's contents
    pub fn teardown(&mut self) {
        debug!(plugins = self.plugins.len(), "Tearing down composer");
        self.plugins.clear();
        self.post_initialized = 0;
        self.realm.teardown();
    }
}

fn check_node_kinds(kinds: &[NodeKindSpec]) -> Result<(), ComposeError> {
    for (index, spec) in kinds.iter().enumerate() {
        if let Some(first) = kinds[..index].iter().find(|earlier| earlier.kind == spec.kind) {
            return Err(ComposeError::DuplicateNodeKind {
                kind: spec.kind.clone(),
                first: first.owner.clone(),
                second: spec.owner.clone(),
            });
        }
    }
    Ok(())
}

/// Plugin-facing append to a shared aggregate
pub fn append_to<T: Clone + 'static>(
    realm: &Realm,
    aggregate: Aggregate<T>,
    items: impl IntoIterator<Item = T>,
) -> Result<(), RealmError> {
    realm.append(aggregate, items)
}
