use annotag::entities::annotation::StateRef;
use annotag::entities::tools::{BuiltinTools, Tool, ToolConfig, ToolKind};
use annotag::entities::traits::ToolFactory;
use annotag::tags::{self, ellipse::EllipseAttrs};
use annotag::{Document, DocumentError, TagError, TagRegistry, ValidationPolicy, registry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn fresh_registry() -> TagRegistry {
    let reg = TagRegistry::new();
    tags::register_all(&reg).unwrap();
    reg
}

const ELLIPSE_ON_IMAGE: &str = r#"
<View>
  <Ellipse name="e1" toName="img1"/>
  <Image name="img1" value="$img"/>
</View>
"#;

#[test]
fn ellipse_resolves_its_target() {
    let reg = fresh_registry();
    let doc = Document::parse(ELLIPSE_ON_IMAGE, &reg, ValidationPolicy::Strict).unwrap();

    let e1 = doc.get("e1").unwrap();
    assert_eq!(e1.type_name(), "EllipseModel");
    assert!(e1.is_live());
    assert_eq!(doc.resolve_target(e1).unwrap().name(), Some("img1"));

    // Ellipse renders nothing; the container and image do
    let tree = doc.render();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].kind, "image");
}

#[test]
fn ellipse_defaults_reach_the_tool() {
    let reg = fresh_registry();
    let doc = Document::parse(ELLIPSE_ON_IMAGE, &reg, ValidationPolicy::Strict).unwrap();
    let e1 = doc.get("e1").unwrap();

    let attrs = EllipseAttrs::from_attrs(e1.attrs());
    assert_eq!(attrs.opacity, 1.0);
    assert_eq!(attrs.fill_color, "#f48a42");
    assert_eq!(attrs.stroke_width, "1");
    assert_eq!(attrs.stroke_color, "#f48a42");
    assert_eq!(attrs.fill_opacity, 0.2);
    assert!(attrs.can_rotate);

    let tool = e1.tool("ellipse").unwrap();
    assert_eq!(tool.control(), Some(e1.id()));
    assert_eq!(tool.style().get_float("fillopacity"), Some(0.2));
}

#[test]
fn has_states_follows_labels() {
    let reg = fresh_registry();
    let without = Document::parse(ELLIPSE_ON_IMAGE, &reg, ValidationPolicy::Strict).unwrap();
    assert!(!without.get("e1").unwrap().has_states());

    let with_labels = r#"
<View>
  <Image name="img1" value="$img"/>
  <Ellipse name="e1" toName="img1"/>
  <Labels name="lbl" toName="img1">
    <Label value="Cat"/>
    <Label value="Dog" background="blue"/>
  </Labels>
</View>
"#;
    let doc = Document::parse(with_labels, &reg, ValidationPolicy::Strict).unwrap();
    let e1 = doc.get("e1").unwrap();
    assert!(e1.has_states());
    assert_eq!(e1.states(), vec![StateRef::new("lbl", "labels")]);
}

#[test]
fn has_states_notifies_watchers() {
    let reg = fresh_registry();
    let doc = Document::parse(ELLIPSE_ON_IMAGE, &reg, ValidationPolicy::Strict).unwrap();
    let e1 = doc.get("e1").unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    e1.watch_has_states(move |has| sink.lock().unwrap().push(has)).unwrap();

    let ann = doc.annotation();
    ann.attach_state("img1", StateRef::new("lbl", "labels"));
    // Re-attaching the same state is not a change
    ann.attach_state("img1", StateRef::new("lbl", "labels"));
    ann.detach_state("img1", "lbl");

    assert_eq!(*seen.lock().unwrap(), [true, false]);
}

#[test]
fn dropped_watch_stays_silent() {
    let reg = fresh_registry();
    let doc = Document::parse(ELLIPSE_ON_IMAGE, &reg, ValidationPolicy::Strict).unwrap();
    let e1 = doc.get("e1").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let id = e1
        .watch_has_states(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    doc.annotation().attach_state("img1", StateRef::new("a", "labels"));
    assert!(e1.unwatch_has_states(id));
    doc.annotation().attach_state("img1", StateRef::new("b", "labels"));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(doc.annotation().bus().queue_len(), 0);
}

#[test]
fn deeply_nested_markup_is_rejected() {
    let reg = fresh_registry();
    let src = "<View>".repeat(5000) + r#"<Image name="i" value="$i"/>"# + &"</View>".repeat(5000);
    let err = Document::parse(&src, &reg, ValidationPolicy::Strict).unwrap_err();
    assert!(matches!(err, DocumentError::Markup { .. }), "{err:?}");
}

#[test]
fn errors_are_reported_per_stage() {
    let reg = fresh_registry();
    let cases: &[(&str, fn(&DocumentError) -> bool)] = &[
        ("<View>", |e| matches!(e, DocumentError::Markup { .. })),
        ("<Brush name=\"b\"/>", |e| matches!(e, DocumentError::UnresolvedTag(_))),
        (
            r#"<View><Image name="x" value="$a"/><Image name="x" value="$b"/></View>"#,
            |e| matches!(e, DocumentError::DuplicateName(_)),
        ),
        (r#"<Ellipse name="e1" toName="ghost"/>"#, |e| {
            matches!(e, DocumentError::UnresolvedReference { .. })
        }),
        (r#"<Ellipse name="e1" opacity="1.5"/>"#, |e| {
            matches!(
                e,
                DocumentError::Tag {
                    source: TagError::Validation(_),
                    ..
                }
            )
        }),
    ];
    for (src, check) in cases {
        let err = Document::parse(src, &reg, ValidationPolicy::Strict).unwrap_err();
        assert!(check(&err), "{src}: unexpected {err:?}");
    }
}

#[test]
fn sealed_registry_still_resolves() {
    let reg = fresh_registry();
    Document::parse(ELLIPSE_ON_IMAGE, &reg, ValidationPolicy::Strict).unwrap();
    assert!(matches!(
        tags::ellipse::register(&reg),
        Err(TagError::RegistryClosed(_))
    ));
    // Later documents parse against the same sealed registry
    assert!(Document::parse(ELLIPSE_ON_IMAGE, &reg, ValidationPolicy::Strict).is_ok());
}

#[test]
fn custom_tool_factory_is_used() {
    struct Counting(AtomicUsize);

    impl ToolFactory for Counting {
        fn create_tool(&self, config: ToolConfig) -> Tool {
            self.0.fetch_add(1, Ordering::SeqCst);
            BuiltinTools.create_tool(config)
        }
    }

    let reg = fresh_registry();
    let factory = Counting(AtomicUsize::new(0));
    let doc = Document::parse_with_tools(
        ELLIPSE_ON_IMAGE,
        &reg,
        ValidationPolicy::Strict,
        &factory,
    )
    .unwrap();
    assert_eq!(factory.0.load(Ordering::SeqCst), 1);
    assert_eq!(doc.get("e1").unwrap().tool("ellipse").unwrap().kind(), ToolKind::Ellipse);
}

#[test]
fn global_registry_round_trip() {
    let reg = registry();
    tags::register_all(reg).unwrap();
    assert!(matches!(tags::register_all(reg), Err(TagError::DuplicateTag(_))));
    let doc = Document::parse(ELLIPSE_ON_IMAGE, reg, ValidationPolicy::Strict).unwrap();
    assert_eq!(doc.len(), 3);
}
