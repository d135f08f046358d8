//! Horizontal rules (`thematicBreak` on both sides of the conversion)

use markwright_core::system::INSERT_DECORATOR_NODE;
use markwright_core::{
    register_node_kinds, register_visitor, Export, Import, Key, KindClaim, NodeFactory, NodeKindSpec,
    PresentationNode, Realm, RealmPlugin, Signal, SyntaxNode, VisitorDescriptor,
};

pub const INSERT_THEMATIC_BREAK: Key<Signal<()>> = Key::new("thematicBreak.insertThematicBreak");

pub const THEMATIC_BREAK_KIND: &str = "thematicBreak";

#[derive(Debug, Clone, Default)]
pub struct ThematicBreakPlugin;

impl RealmPlugin for ThematicBreakPlugin {
    fn id(&self) -> &'static str {
        "thematicBreak"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![INSERT_DECORATOR_NODE.name()]
    }

    fn init(&self, realm: &Realm) -> anyhow::Result<()> {
        let insert = realm.declare_signal(INSERT_THEMATIC_BREAK)?;
        let factory = realm.map(insert, |_: &()| {
            NodeFactory::new(THEMATIC_BREAK_KIND, |keys| {
                PresentationNode::new(THEMATIC_BREAK_KIND, keys.next_key())
            })
        })?;
        realm.link(factory, realm.resolve(INSERT_DECORATOR_NODE)?)?;

        register_visitor(
            realm,
            VisitorDescriptor::<Import>::new(
                "thematicBreak",
                KindClaim::kind(THEMATIC_BREAK_KIND),
                |node: &SyntaxNode, ctx| {
                    let mut out = PresentationNode::new(THEMATIC_BREAK_KIND, ctx.next_key());
                    out.props = node.props.clone();
                    Ok(out)
                },
            ),
        )?;
        register_visitor(
            realm,
            VisitorDescriptor::<Export>::new(
                "thematicBreak",
                KindClaim::kind(THEMATIC_BREAK_KIND),
                |node: &PresentationNode, _ctx| {
                    let mut out = SyntaxNode::new(THEMATIC_BREAK_KIND);
                    out.props = node.props.clone();
                    Ok(out)
                },
            ),
        )?;
        register_node_kinds(realm, vec![NodeKindSpec::decorator(THEMATIC_BREAK_KIND, "thematicBreak")])?;
        Ok(())
    }
}
