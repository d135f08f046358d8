//! Rich-text / diff / source view switching

use markwright_core::system::VIEW_MODE;
use markwright_core::{Cell, Key, Realm, RealmPlugin, ViewMode};
use tracing::debug;

/// Markup the diff view compares against
pub const DIFF_MARKDOWN: Key<Cell<String>> = Key::required("diffSource.diffMarkdown");

#[derive(Debug, Clone, Default)]
pub struct DiffSourcePlugin {
    pub view_mode: ViewMode,
    pub diff_markdown: String,
}

impl RealmPlugin for DiffSourcePlugin {
    fn id(&self) -> &'static str {
        "diffSource"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![VIEW_MODE.name()]
    }

    fn init(&self, realm: &Realm) -> anyhow::Result<()> {
        realm.declare_cell(DIFF_MARKDOWN, Some(self.diff_markdown.clone()))?;
        realm.publish(realm.resolve(VIEW_MODE)?, self.view_mode)?;
        debug!(view_mode = %self.view_mode, "Diff/source view enabled");
        Ok(())
    }

    fn update(&self, realm: &Realm) -> anyhow::Result<()> {
        realm
            .batch()
            .publish(realm.resolve(VIEW_MODE)?, self.view_mode)?
            .publish(realm.resolve(DIFF_MARKDOWN)?, self.diff_markdown.clone())?
            .commit()?;
        Ok(())
    }
}

/// The mode after `current` in the toggle cycle
pub fn next_view_mode(current: ViewMode) -> ViewMode {
    match current {
        ViewMode::RichText => ViewMode::Diff,
        ViewMode::Diff => ViewMode::Source,
        ViewMode::Source => ViewMode::RichText,
    }
}
