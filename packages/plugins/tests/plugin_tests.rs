//! Plugin behavior against a realm with a stand-in presentation host

use std::cell::RefCell;
use std::rc::Rc;

use markwright_core::system::{
    EXPORT_VISITORS, IMPORT_VISITORS, INSERT_DECORATOR_NODE, JSX_IS_AVAILABLE, MDAST_EXTENSIONS,
    NODE_READY, PRESENTATION_COMMANDS, SERIALIZER_EXTENSIONS, SYNTAX_EXTENSIONS, VIEW_MODE,
};
use markwright_core::*;
use markwright_plugins::codeblock::{editor_for, DEFAULT_CODE_BLOCK_LANGUAGE, INSERT_CODE_BLOCK};
use markwright_plugins::jsx::INSERT_JSX;
use markwright_plugins::link_dialog::{CANCEL_LINK_EDIT, LINK_DIALOG_STATE, OPEN_LINK_EDIT_DIALOG};
use markwright_plugins::sandpack::{INSERT_SANDPACK, PENDING_SELECTION};
use markwright_plugins::toolbar::{trigger, visible_items, DIFF_SOURCE_TOGGLE};
use markwright_plugins::*;

fn compose(plugins: Vec<Box<dyn RealmPlugin>>) -> (Realm, Composer) {
    let realm = Realm::new();
    let mut composer = Composer::new(realm.clone()).unwrap();
    composer.register_plugin(Box::new(CorePlugin::new())).unwrap();
    for plugin in plugins {
        composer.register_plugin(plugin).unwrap();
    }
    composer.post_init_all().unwrap();
    composer.validate().unwrap();
    (realm, composer)
}

#[derive(Default)]
struct HostLog {
    inserted: Vec<PresentationNode>,
    selected: Vec<NodeKey>,
}

/// Applies insert/select commands and reports inserted nodes as ready
fn attach_host(realm: &Realm) -> Rc<RefCell<HostLog>> {
    let log = Rc::new(RefCell::new(HostLog::default()));
    let keys = Rc::new(RefCell::new(KeyGenerator::new("host")));
    let host = log.clone();
    let commands = realm.resolve(PRESENTATION_COMMANDS).unwrap();
    realm
        .subscribe(commands, move |realm, command: &PresentationCommand| {
            match command {
                PresentationCommand::InsertNode { factory, .. } => {
                    let node = factory.build(&mut keys.borrow_mut());
                    let ready = NodeReady {
                        key: node.key.clone(),
                        kind: node.kind.clone(),
                        request: factory.request().map(str::to_string),
                    };
                    host.borrow_mut().inserted.push(node);
                    realm.publish(realm.resolve(NODE_READY)?, ready)?;
                }
                PresentationCommand::SelectNode { key } => host.borrow_mut().selected.push(key.clone()),
                _ => {}
            }
            Ok(())
        })
        .unwrap();
    log
}

#[test]
fn test_code_block_uses_default_language() {
    let (realm, composer) = compose(vec![Box::new(CodeBlockPlugin {
        default_language: "rust".to_string(),
        ..CodeBlockPlugin::default()
    })]);
    let host = attach_host(&realm);
    let insert = realm.resolve(INSERT_CODE_BLOCK).unwrap();

    realm.publish(insert, CodeBlockOptions::default()).unwrap();
    composer
        .update_plugin(&CodeBlockPlugin {
            default_language: "ts".to_string(),
            ..CodeBlockPlugin::default()
        })
        .unwrap();
    realm.publish(insert, CodeBlockOptions::default()).unwrap();
    realm
        .publish(
            insert,
            CodeBlockOptions {
                language: Some("python".to_string()),
                code: Some("print(1)".to_string()),
                ..CodeBlockOptions::default()
            },
        )
        .unwrap();

    let host = host.borrow();
    let languages: Vec<_> = host
        .inserted
        .iter()
        .map(|node| node.prop_str("language").unwrap_or_default())
        .collect();
    assert_eq!(languages, vec!["rust", "ts", "python"]);
    assert_eq!(host.inserted[2].prop_str("code"), Some("print(1)"));
    assert_eq!(
        realm.value(realm.resolve(DEFAULT_CODE_BLOCK_LANGUAGE).unwrap()).unwrap().as_deref(),
        Some("ts")
    );
}

#[test]
fn test_code_block_second_activation_changes_nothing() {
    let realm = Realm::new();
    let mut composer = Composer::new(realm.clone()).unwrap();
    composer.register_plugin(Box::new(CorePlugin::new())).unwrap();
    composer.register_plugin(Box::new(CodeBlockPlugin::default())).unwrap();
    let nodes = realm.nodes();
    let visitor_counts = |realm: &Realm| {
        (
            realm.values(realm.resolve(IMPORT_VISITORS).unwrap()).unwrap().len(),
            realm.values(realm.resolve(EXPORT_VISITORS).unwrap()).unwrap().len(),
        )
    };
    let counts = visitor_counts(&realm);

    assert_eq!(
        composer.register_plugin(Box::new(CodeBlockPlugin::default())).unwrap(),
        Activation::AlreadyActive
    );
    composer.post_init_all().unwrap();
    assert_eq!(realm.nodes(), nodes);
    assert_eq!(visitor_counts(&realm), counts);

    let host = attach_host(&realm);
    realm
        .publish(realm.resolve(INSERT_CODE_BLOCK).unwrap(), CodeBlockOptions::default())
        .unwrap();
    assert_eq!(host.borrow().inserted.len(), 1);
}

#[test]
fn test_own_props_survive_renamed_and_injected_names() {
    let (realm, _composer) = compose(vec![
        Box::new(CodeBlockPlugin::default()),
        Box::new(JsxPlugin::default()),
    ]);
    let tree = SyntaxNode::new("root").with_children(vec![
        SyntaxNode::new("code")
            .with_prop("lang", "rust")
            .with_prop("value", "a")
            .with_prop("code", "b")
            .with_prop("language", "c"),
        SyntaxNode::new("mdxJsxFlowElement")
            .with_prop("name", "Box")
            .with_prop("jsxKind", "own"),
        SyntaxNode::new("directive").with_prop("syntaxKind", "x"),
    ]);

    let mut keys = KeyGenerator::new("collisions.md");
    let imported = ConversionRegistry::<Import>::snapshot(&realm)
        .unwrap()
        .convert(&realm, &tree, &mut keys)
        .unwrap();
    let block = &imported.children[0];
    assert_eq!(block.prop_str("code"), Some("a"));
    assert_eq!(block.prop_str("language"), Some("rust"));
    assert_eq!(imported.children[1].prop_str("jsxKind"), Some("flow"));

    let exported = ConversionRegistry::<Export>::snapshot(&realm)
        .unwrap()
        .convert(&realm, &imported, &mut keys)
        .unwrap();
    assert_eq!(exported, tree);
}

#[test]
fn test_code_block_editor_selection() {
    let (realm, _composer) = compose(vec![Box::new(CodeBlockPlugin {
        default_language: String::new(),
        editors: vec![
            CodeBlockEditorDescriptor::catch_all("plain-text", 0),
            CodeBlockEditorDescriptor::for_language("rust-analyzer", 10, "rust"),
        ],
    })]);

    assert_eq!(editor_for(&realm, "rust", "").unwrap().as_deref(), Some("rust-analyzer"));
    assert_eq!(editor_for(&realm, "go", "").unwrap().as_deref(), Some("plain-text"));
}

#[test]
fn test_sandpack_selected_when_ready() {
    let (realm, _composer) = compose(vec![Box::new(SandpackPlugin::default())]);
    let host = attach_host(&realm);

    realm
        .publish(realm.resolve(INSERT_SANDPACK).unwrap(), String::new())
        .unwrap();

    let host = host.borrow();
    assert_eq!(host.inserted.len(), 1);
    let inserted = &host.inserted[0];
    assert_eq!(inserted.kind, "sandpack");
    assert_eq!(inserted.prop_str("meta"), Some("live react"));
    assert_eq!(host.selected, vec![inserted.key.clone()]);
    assert_eq!(
        realm.value(realm.resolve(PENDING_SELECTION).unwrap()).unwrap(),
        Some(None)
    );
}

#[test]
fn test_sandpack_ignores_unrelated_ready_nodes() {
    let (realm, _composer) = compose(vec![
        Box::new(SandpackPlugin::default()),
        Box::new(ThematicBreakPlugin),
    ]);
    let host = attach_host(&realm);

    realm
        .publish(
            realm.resolve(markwright_plugins::thematic_break::INSERT_THEMATIC_BREAK).unwrap(),
            (),
        )
        .unwrap();

    let host = host.borrow();
    assert_eq!(host.inserted.len(), 1);
    assert!(host.selected.is_empty());
}

#[test]
fn test_sandpack_unknown_meta_fails_without_inserting() {
    let (realm, _composer) = compose(vec![Box::new(SandpackPlugin::default())]);
    let host = attach_host(&realm);

    let err = realm
        .publish(realm.resolve(INSERT_SANDPACK).unwrap(), "live svelte".to_string())
        .unwrap_err();

    assert!(err.failures()[0].message.contains("No sandpack preset found"));
    assert!(host.borrow().inserted.is_empty());
}

#[test]
fn test_sandpack_visitor_outranks_code_block_for_live_meta() {
    let (realm, _composer) = compose(vec![
        Box::new(CodeBlockPlugin::default()),
        Box::new(SandpackPlugin::default()),
    ]);
    let import = ConversionRegistry::<Import>::snapshot(&realm).unwrap();

    let live = SyntaxNode::new("code").with_prop("lang", "jsx").with_prop("meta", "live react");
    let plain = SyntaxNode::new("code").with_prop("lang", "jsx").with_prop("meta", "");
    assert_eq!(import.selected_visitor(&realm, &live).as_deref(), Some("sandpack.code"));
    assert_eq!(import.selected_visitor(&realm, &plain).as_deref(), Some("codeblock.code"));
}

#[test]
fn test_jsx_marks_availability_and_inserts() {
    let (realm, _composer) = compose(vec![Box::new(JsxPlugin::default())]);
    let host = attach_host(&realm);
    assert_eq!(realm.value(realm.resolve(JSX_IS_AVAILABLE).unwrap()).unwrap(), Some(true));
    for (extensions, expected) in [
        (MDAST_EXTENSIONS, "mdxFromMarkdown"),
        (SYNTAX_EXTENSIONS, "mdxjs"),
        (SERIALIZER_EXTENSIONS, "mdxToMarkdown"),
    ] {
        assert_eq!(realm.values(realm.resolve(extensions).unwrap()).unwrap(), vec![expected]);
    }

    realm
        .publish(
            realm.resolve(INSERT_JSX).unwrap(),
            InsertJsx::flow("Callout").with_prop("tone", "info"),
        )
        .unwrap();

    let host = host.borrow();
    let node = &host.inserted[0];
    assert_eq!(node.kind, "jsx");
    assert_eq!(node.prop_str("name"), Some("Callout"));
    assert_eq!(node.prop_str("jsxKind"), Some("flow"));
}

#[test]
fn test_link_dialog_state() {
    let (realm, _composer) = compose(vec![Box::new(LinkDialogPlugin)]);
    let state = realm.resolve(LINK_DIALOG_STATE).unwrap();
    assert_eq!(realm.value(state).unwrap(), Some(LinkDialogState::Inactive));

    realm
        .publish(realm.resolve(OPEN_LINK_EDIT_DIALOG).unwrap(), "https://example.com".to_string())
        .unwrap();
    assert_eq!(
        realm.value(state).unwrap(),
        Some(LinkDialogState::Editing {
            url: "https://example.com".to_string()
        })
    );

    realm.publish(realm.resolve(CANCEL_LINK_EDIT).unwrap(), ()).unwrap();
    assert_eq!(realm.value(state).unwrap(), Some(LinkDialogState::Inactive));
}

#[test]
fn test_toolbar_requires_item_plugins() {
    let realm = Realm::new();
    let mut composer = Composer::new(realm).unwrap();
    composer.register_plugin(Box::new(CorePlugin::new())).unwrap();
    composer.register_plugin(Box::new(LinkDialogPlugin)).unwrap();
    composer.register_plugin(Box::new(ThematicBreakPlugin)).unwrap();
    composer.register_plugin(Box::new(DiffSourcePlugin::default())).unwrap();

    let err = composer
        .register_plugin(Box::new(ToolbarPlugin::default()))
        .unwrap_err();
    assert!(matches!(
        err,
        ComposeError::MissingDependency { ref plugin, ref node }
            if plugin == "toolbar" && node == "codeblock.insertCodeBlock"
    ));
}

#[test]
fn test_toolbar_toggle_hides_rich_text_items() {
    let (realm, _composer) = compose(vec![
        Box::new(CodeBlockPlugin::default()),
        Box::new(ThematicBreakPlugin),
        Box::new(LinkDialogPlugin),
        Box::new(DiffSourcePlugin::default()),
        Box::new(ToolbarPlugin::default()),
    ]);
    let host = attach_host(&realm);

    assert_eq!(visible_items(&realm).unwrap().len(), 4);
    trigger(&realm, "insert_thematic_break").unwrap();
    assert_eq!(host.borrow().inserted[0].kind, "thematicBreak");

    trigger(&realm, DIFF_SOURCE_TOGGLE).unwrap();
    assert_eq!(
        realm.value(realm.resolve(VIEW_MODE).unwrap()).unwrap(),
        Some(ViewMode::Diff)
    );
    let visible: Vec<_> = visible_items(&realm).unwrap().into_iter().map(|item| item.id).collect();
    assert_eq!(visible, vec![DIFF_SOURCE_TOGGLE]);

    assert!(trigger(&realm, "bold").is_err());
}

#[test]
fn test_trigger_without_toolbar_fails() {
    let (realm, _composer) = compose(vec![Box::new(ThematicBreakPlugin)]);
    let inserts = Rc::new(RefCell::new(0));
    let counter = inserts.clone();
    realm
        .subscribe(realm.resolve(INSERT_DECORATOR_NODE).unwrap(), move |_, _: &NodeFactory| {
            *counter.borrow_mut() += 1;
            Ok(())
        })
        .unwrap();

    let err = trigger(&realm, "insert_thematic_break").unwrap_err();
    assert!(err.to_string().contains("toolbar.items"));
    assert_eq!(*inserts.borrow(), 0);
}
