//! # Toolbar
//!
//! Toolbar items are data plus an action against the realm. The plugin's
//! dependencies are the union of its items' dependencies, so a toolbar
//! configured with "insert code block" fails to activate without the
//! code-block plugin rather than failing on first click.

use std::fmt;
use std::rc::Rc;

use anyhow::{anyhow, Context};
use markwright_core::system::VIEW_MODE;
use markwright_core::{Aggregate, Key, Realm, RealmPlugin, ViewMode};
use tracing::debug;

use crate::codeblock::{CodeBlockOptions, INSERT_CODE_BLOCK};
use crate::diff_source::{next_view_mode, DIFF_MARKDOWN};
use crate::link_dialog::OPEN_LINK_EDIT_DIALOG;
use crate::thematic_break::INSERT_THEMATIC_BREAK;

pub const TOOLBAR_ITEMS: Key<Aggregate<ToolbarItem>> = Key::new("toolbar.items");

pub const DIFF_SOURCE_TOGGLE: &str = "diff_source_toggle";

type Action = Rc<dyn Fn(&Realm) -> anyhow::Result<()>>;

#[derive(Clone)]
pub struct ToolbarItem {
    pub id: String,
    pub title: String,
    pub icon: String,
    /// Nodes the action publishes to
    pub requires: Vec<&'static str>,
    action: Action,
}

impl ToolbarItem {
    pub fn new<F>(id: impl Into<String>, title: impl Into<String>, icon: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Realm) -> anyhow::Result<()> + 'static,
    {
        Self {
            id: id.into(),
            title: title.into(),
            icon: icon.into(),
            requires: Vec::new(),
            action: Rc::new(action),
        }
    }

    pub fn requiring(mut self, node: &'static str) -> Self {
        self.requires.push(node);
        self
    }

    pub fn run(&self, realm: &Realm) -> anyhow::Result<()> {
        (self.action)(realm)
    }
}

impl fmt::Debug for ToolbarItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolbarItem")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("icon", &self.icon)
            .field("requires", &self.requires)
            .finish()
    }
}

pub fn create_link() -> ToolbarItem {
    ToolbarItem::new("create_link", "Create link", "link", |realm| {
        realm.publish(realm.resolve(OPEN_LINK_EDIT_DIALOG)?, String::new())?;
        Ok(())
    })
    .requiring(OPEN_LINK_EDIT_DIALOG.name())
}

pub fn insert_thematic_break() -> ToolbarItem {
    ToolbarItem::new("insert_thematic_break", "Insert thematic break", "horizontal_rule", |realm| {
        realm.publish(realm.resolve(INSERT_THEMATIC_BREAK)?, ())?;
        Ok(())
    })
    .requiring(INSERT_THEMATIC_BREAK.name())
}

pub fn insert_code_block() -> ToolbarItem {
    ToolbarItem::new("insert_code_block", "Insert code block", "frame_source", |realm| {
        realm.publish(realm.resolve(INSERT_CODE_BLOCK)?, CodeBlockOptions::default())?;
        Ok(())
    })
    .requiring(INSERT_CODE_BLOCK.name())
}

/// Cycles rich text → diff → source
pub fn diff_source_toggle() -> ToolbarItem {
    ToolbarItem::new(DIFF_SOURCE_TOGGLE, "Toggle view mode", "difference", |realm| {
        let mode = realm.resolve(VIEW_MODE)?;
        let current = realm.value(mode)?.unwrap_or_default();
        realm.publish(mode, next_view_mode(current))?;
        Ok(())
    })
    .requiring(DIFF_MARKDOWN.name())
}

pub fn builtin_items() -> Vec<ToolbarItem> {
    vec![
        create_link(),
        insert_thematic_break(),
        insert_code_block(),
        diff_source_toggle(),
    ]
}

#[derive(Debug, Clone)]
pub struct ToolbarPlugin {
    pub items: Vec<ToolbarItem>,
}

impl Default for ToolbarPlugin {
    fn default() -> Self {
        Self {
            items: builtin_items(),
        }
    }
}

impl RealmPlugin for ToolbarPlugin {
    fn id(&self) -> &'static str {
        "toolbar"
    }

    fn requires(&self) -> Vec<&'static str> {
        let mut nodes = vec![VIEW_MODE.name()];
        for item in &self.items {
            for node in &item.requires {
                if !nodes.contains(node) {
                    nodes.push(*node);
                }
            }
        }
        nodes
    }

    fn init(&self, realm: &Realm) -> anyhow::Result<()> {
        let items = realm.declare_aggregate(TOOLBAR_ITEMS)?;
        realm.append(items, self.items.iter().cloned())?;
        debug!(items = self.items.len(), "Toolbar ready");
        Ok(())
    }
}

/// Run the action of the item with `id`
pub fn trigger(realm: &Realm, id: &str) -> anyhow::Result<()> {
    let items = realm.values(realm.resolve(TOOLBAR_ITEMS)?)?;
    let item = items
        .iter()
        .find(|item| item.id == id)
        .ok_or_else(|| anyhow!("No toolbar item '{}'", id))?;
    item.run(realm)
        .with_context(|| format!("Toolbar item '{}' failed", id))
}

/// Items shown in the current view mode; only the toggle outside rich text
pub fn visible_items(realm: &Realm) -> anyhow::Result<Vec<ToolbarItem>> {
    let items = realm.values(realm.resolve(TOOLBAR_ITEMS)?)?;
    let mode = realm.value(realm.resolve(VIEW_MODE)?)?.unwrap_or_default();
    Ok(match mode {
        ViewMode::RichText => items,
        _ => items
            .into_iter()
            .filter(|item| item.id == DIFF_SOURCE_TOGGLE)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_is_union_without_duplicates() {
        let plugin = ToolbarPlugin {
            items: vec![insert_code_block(), insert_code_block(), create_link()],
        };
        assert_eq!(
            plugin.requires(),
            vec![
                "core.viewMode",
                "codeblock.insertCodeBlock",
                "linkDialog.openLinkEditDialog",
            ]
        );
    }

    #[test]
    fn test_builtin_ids() {
        let ids: Vec<_> = builtin_items().into_iter().map(|item| item.id).collect();
        assert_eq!(
            ids,
            vec![
                "create_link",
                "insert_thematic_break",
                "insert_code_block",
                "diff_source_toggle",
            ]
        );
    }
}
