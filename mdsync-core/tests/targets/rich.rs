use crate::support::{parse, KITCHENSINK};
use insta::assert_snapshot;
use mdsync_core::formats::rich::{RichDocumentTarget, RichOptions, RichPayload, StructuralElement};
use mdsync_core::ir::nodes::{Block, CalloutKind};
use mdsync_core::target::Target;

#[test]
fn heading_and_paragraph_render_to_json() {
    let payload = RichDocumentTarget::default()
        .render(&parse("# Setup {#setup}\n\nRun **now**."))
        .unwrap();
    assert_snapshot!(payload.to_string(), @r#"
{
  "body": [
    {
      "type": "paragraph",
      "style": "HEADING_1",
      "headingId": "setup",
      "quoteDepth": 0,
      "runs": [
        {
          "content": "Setup",
          "style": {}
        }
      ]
    },
    {
      "type": "paragraph",
      "style": "NORMAL_TEXT",
      "quoteDepth": 0,
      "runs": [
        {
          "content": "Run ",
          "style": {}
        },
        {
          "content": "now",
          "style": {
            "bold": true
          }
        },
        {
          "content": ".",
          "style": {}
        }
      ]
    }
  ]
}
"#);
}

#[test]
fn kitchensink_reads_back_unchanged() {
    let doc = parse(KITCHENSINK);
    for native_callouts in [false, true] {
        let target = RichDocumentTarget::new(RichOptions { native_callouts });
        let back = target.parse(&target.render(&doc).unwrap()).unwrap();
        assert_eq!(back.blocks, doc.blocks, "native_callouts = {native_callouts}");
        assert_eq!(back.declared_title().as_deref(), Some("Release Guide"));
    }
}

#[test]
fn payload_json_survives_the_transport() {
    let payload = RichDocumentTarget::default().render(&parse(KITCHENSINK)).unwrap();
    let json = payload.to_string();
    assert_eq!(RichPayload::from_json(&json).unwrap(), payload);
}

#[test]
fn payloads_from_other_editors_are_accepted() {
    // Missing optional fields take their defaults.
    let json = r#"{
        "body": [
            {"type": "paragraph", "style": "NORMAL_TEXT", "runs": [{"content": "Hi"}]},
            {"type": "horizontalRule"},
            {"type": "callout", "kind": "tip", "body": [
                {"type": "paragraph", "style": "NORMAL_TEXT", "runs": [{"content": "Inside"}]}
            ]}
        ]
    }"#;
    let payload = RichPayload::from_json(json).unwrap();
    assert!(matches!(payload.body[1], StructuralElement::HorizontalRule { quote_depth: 0 }));

    let doc = RichDocumentTarget::default().parse(&payload).unwrap();
    assert!(doc.front_matter.is_none());
    assert_eq!(doc.blocks[0], Block::text("Hi"));
    assert_eq!(doc.blocks[1], Block::Rule);
    let Block::Callout(callout) = &doc.blocks[2] else {
        panic!("expected callout, got {:?}", doc.blocks[2]);
    };
    assert_eq!(callout.kind, CalloutKind::Tip);
    assert_eq!(callout.children, vec![Block::text("Inside")]);
}

#[test]
fn malformed_json_is_reported() {
    assert!(RichPayload::from_json("{\"body\": [{\"type\": \"sparkle\"}]}").is_err());
}
