//! Links and the dialog that edits them

use markwright_core::system::IMPORT_VISITORS;
use markwright_core::{
    register_node_kinds, register_visitor, Cell, Export, Import, Key, KindClaim, NodeKindSpec,
    PresentationNode, Realm, RealmPlugin, Signal, SyntaxNode, VisitorDescriptor,
};

/// Open the dialog on the given url (empty for a new link)
pub const OPEN_LINK_EDIT_DIALOG: Key<Signal<String>> = Key::new("linkDialog.openLinkEditDialog");
pub const CANCEL_LINK_EDIT: Key<Signal<()>> = Key::new("linkDialog.cancelLinkEdit");
pub const LINK_DIALOG_STATE: Key<Cell<LinkDialogState>> = Key::required("linkDialog.state");

pub const LINK_KIND: &str = "link";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LinkDialogState {
    #[default]
    Inactive,
    Editing { url: String },
}

#[derive(Debug, Clone, Default)]
pub struct LinkDialogPlugin;

impl RealmPlugin for LinkDialogPlugin {
    fn id(&self) -> &'static str {
        "linkDialog"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![IMPORT_VISITORS.name()]
    }

    fn init(&self, realm: &Realm) -> anyhow::Result<()> {
        let state = realm.declare_cell(LINK_DIALOG_STATE, Some(LinkDialogState::Inactive))?;
        let open = realm.declare_signal(OPEN_LINK_EDIT_DIALOG)?;
        let cancel = realm.declare_signal(CANCEL_LINK_EDIT)?;

        let editing = realm.map(open, |url: &String| LinkDialogState::Editing { url: url.clone() })?;
        realm.link(editing, state)?;
        let inactive = realm.map(cancel, |_: &()| LinkDialogState::Inactive)?;
        realm.link(inactive, state)?;

        // Links keep url/title; children are ordinary inline content
        register_visitor(
            realm,
            VisitorDescriptor::<Import>::new("linkDialog.link", KindClaim::kind(LINK_KIND), |node: &SyntaxNode, ctx| {
                let children = ctx.convert_children(node)?;
                let mut out = PresentationNode::new(LINK_KIND, ctx.next_key()).with_children(children);
                out.props = node.props.clone();
                Ok(out)
            }),
        )?;
        register_visitor(
            realm,
            VisitorDescriptor::<Export>::new(
                "linkDialog.link",
                KindClaim::kind(LINK_KIND),
                |node: &PresentationNode, ctx| {
                    let children = ctx.convert_children(node)?;
                    let mut out = SyntaxNode::new(LINK_KIND).with_children(children);
                    out.props = node.props.clone();
                    Ok(out)
                },
            ),
        )?;
        register_node_kinds(realm, vec![NodeKindSpec::new(LINK_KIND, "linkDialog")])?;
        Ok(())
    }
}
