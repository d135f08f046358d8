//! Composition behavior across several plugins sharing one realm

use markwright_core::system::{IMPORT_VISITORS, NODE_KINDS};
use markwright_core::*;

const ITEMS: Key<Aggregate<String>> = Key::new("test.items");

/// Declares the shared aggregate if nobody has yet, then contributes to it
struct Contributor {
    id: &'static str,
    items: Vec<&'static str>,
}

impl RealmPlugin for Contributor {
    fn id(&self) -> &'static str {
        self.id
    }

    fn init(&self, realm: &Realm) -> anyhow::Result<()> {
        let items = if realm.contains(ITEMS.name()) {
            realm.resolve(ITEMS)?
        } else {
            realm.declare_aggregate(ITEMS)?
        };
        append_to(realm, items, self.items.iter().map(|s| s.to_string()))?;
        Ok(())
    }
}

fn contributor(id: &'static str, items: &[&'static str]) -> Box<dyn RealmPlugin> {
    Box::new(Contributor {
        id,
        items: items.to_vec(),
    })
}

fn collected(order: [Box<dyn RealmPlugin>; 2]) -> Vec<String> {
    let realm = Realm::new();
    let mut composer = Composer::new(realm.clone()).unwrap();
    for plugin in order {
        composer.register_plugin(plugin).unwrap();
    }
    realm.values(realm.resolve(ITEMS).unwrap()).unwrap()
}

#[test]
fn test_aggregate_concatenates_in_activation_order() {
    let ab = collected([contributor("a", &["a1", "a2"]), contributor("b", &["b1"])]);
    let ba = collected([contributor("b", &["b1"]), contributor("a", &["a1", "a2"])]);

    assert_eq!(ab, vec!["a1", "a2", "b1"]);
    assert_eq!(ba, vec!["b1", "a1", "a2"]);
}

/// Registers one import visitor for `kind` at `priority`
struct VisitorPlugin {
    id: &'static str,
    kind: &'static str,
    priority: i32,
}

impl RealmPlugin for VisitorPlugin {
    fn id(&self) -> &'static str {
        self.id
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![IMPORT_VISITORS.name()]
    }

    fn init(&self, realm: &Realm) -> anyhow::Result<()> {
        let tag = self.id;
        register_visitor(
            realm,
            VisitorDescriptor::<Import>::new(tag, KindClaim::kind(self.kind), move |_, ctx| {
                Ok(PresentationNode::new(tag, ctx.next_key()))
            })
            .with_priority(self.priority),
        )?;
        Ok(())
    }
}

fn composed(plugins: Vec<Box<dyn RealmPlugin>>) -> (Realm, Composer) {
    let realm = Realm::new();
    let mut composer = Composer::new(realm.clone()).unwrap();
    composer.register_plugin(Box::new(CorePlugin::new())).unwrap();
    for plugin in plugins {
        composer.register_plugin(plugin).unwrap();
    }
    (realm, composer)
}

#[test]
fn test_visitor_selection_is_independent_of_activation_order() {
    let specific = || -> Box<dyn RealmPlugin> {
        Box::new(VisitorPlugin {
            id: "callout.specific",
            kind: "callout",
            priority: DEFAULT_PRIORITY,
        })
    };
    let low = || -> Box<dyn RealmPlugin> {
        Box::new(VisitorPlugin {
            id: "callout.low",
            kind: "callout",
            priority: 5,
        })
    };

    for plugins in [vec![specific(), low()], vec![low(), specific()]] {
        let (realm, composer) = composed(plugins);
        composer.validate().unwrap();
        let import = ConversionRegistry::<Import>::snapshot(&realm).unwrap();

        let callout = SyntaxNode::new("callout");
        let unknown = SyntaxNode::new("admonition");
        for _ in 0..3 {
            assert_eq!(
                import.selected_visitor(&realm, &callout).as_deref(),
                Some("callout.specific")
            );
            assert_eq!(
                import.selected_visitor(&realm, &unknown).as_deref(),
                Some("core.generic")
            );
        }
    }
}

#[test]
fn test_same_priority_overlap_is_rejected() {
    let (_realm, composer) = composed(vec![
        Box::new(VisitorPlugin {
            id: "first",
            kind: "callout",
            priority: DEFAULT_PRIORITY,
        }),
        Box::new(VisitorPlugin {
            id: "second",
            kind: "callout",
            priority: DEFAULT_PRIORITY,
        }),
    ]);

    let err = composer.validate().unwrap_err();
    assert!(matches!(
        err,
        ComposeError::AmbiguousVisitors { direction: "import", ref kind, ref first, ref second, priority: 10 }
            if kind == "callout" && first == "first" && second == "second"
    ));
}

#[test]
fn test_visitor_plugin_requires_core() {
    let realm = Realm::new();
    let mut composer = Composer::new(realm).unwrap();
    let err = composer
        .register_plugin(Box::new(VisitorPlugin {
            id: "early",
            kind: "callout",
            priority: DEFAULT_PRIORITY,
        }))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Plugin 'early' requires node 'core.importVisitors', which was never declared"
    );
}

#[test]
fn test_duplicate_node_kind_across_plugins() {
    struct Shadow;

    impl RealmPlugin for Shadow {
        fn id(&self) -> &'static str {
            "shadow"
        }

        fn init(&self, realm: &Realm) -> anyhow::Result<()> {
            register_node_kinds(realm, vec![NodeKindSpec::new("paragraph", "shadow")])?;
            Ok(())
        }
    }

    let (realm, composer) = composed(vec![Box::new(Shadow)]);
    let kinds = realm.values(realm.resolve(NODE_KINDS).unwrap()).unwrap();
    assert!(kinds.iter().any(|k| k.owner == "shadow"));

    let err = composer.validate().unwrap_err();
    assert!(matches!(
        err,
        ComposeError::DuplicateNodeKind { ref kind, ref first, ref second }
            if kind == "paragraph" && first == "core" && second == "shadow"
    ));
}

#[test]
fn test_required_cell_without_value_fails_activation() {
    const LANGUAGE: Key<Cell<String>> = Key::required("test.language");

    struct Careless;

    impl RealmPlugin for Careless {
        fn id(&self) -> &'static str {
            "careless"
        }

        fn init(&self, realm: &Realm) -> anyhow::Result<()> {
            realm.declare_cell(LANGUAGE, None)?;
            Ok(())
        }
    }

    let (_realm, mut composer) = composed(vec![]);
    let err = composer.register_plugin(Box::new(Careless)).unwrap_err();
    assert!(matches!(
        err,
        ComposeError::InvalidInitialState { ref plugin, ref node }
            if plugin == "careless" && node == "test.language"
    ));
    assert!(!composer.is_active("careless"));
}

#[test]
fn test_post_init_runs_once_in_activation_order() {
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Ordered(&'static str, Rc<RefCell<Vec<&'static str>>>);

    impl RealmPlugin for Ordered {
        fn id(&self) -> &'static str {
            self.0
        }

        fn init(&self, _realm: &Realm) -> anyhow::Result<()> {
            Ok(())
        }

        fn post_init(&self, _realm: &Realm) -> anyhow::Result<()> {
            self.1.borrow_mut().push(self.0);
            Ok(())
        }
    }

    let log = Rc::new(RefCell::new(Vec::new()));
    let (_realm, mut composer) = composed(vec![
        Box::new(Ordered("b", log.clone())),
        Box::new(Ordered("a", log.clone())),
    ]);

    composer.post_init_all().unwrap();
    composer.post_init_all().unwrap();
    assert_eq!(*log.borrow(), vec!["b", "a"]);
    assert_eq!(composer.active_plugins().unwrap(), vec!["core", "b", "a"]);
}
