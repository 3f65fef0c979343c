use crate::support::{parse, KITCHENSINK};
use insta::assert_snapshot;
use mdsync_core::formats::markdown::serialize;
use mdsync_core::ir::nodes::{
    Block, Callout, CalloutKind, CodeFence, Heading, HeadingLevel, InlineRun, ListItem, Table,
    TableCell,
};
use mdsync_core::ir::FrontMatterKey;

#[test]
fn kitchensink_parses_into_the_expected_tree() {
    let doc = parse(KITCHENSINK);

    let front_matter = doc.front_matter.as_ref().expect("front matter");
    assert_eq!(front_matter.get_str(FrontMatterKey::Title).as_deref(), Some("Release Guide"));
    assert!(front_matter.contains("owner"));

    assert_eq!(
        doc.blocks,
        vec![
            Block::Heading(Heading::with_text(HeadingLevel::TOP, "Overview").with_anchor("overview")),
            Block::paragraph(vec![
                InlineRun::text("Ship "),
                InlineRun::Bold(vec![InlineRun::text("fast")]),
                InlineRun::text(" and "),
                InlineRun::Italic(vec![InlineRun::text("safely")]),
                InlineRun::text(", see "),
                InlineRun::link("the docs", "https://example.com/docs"),
                InlineRun::text("."),
            ]),
            Block::Callout(Callout {
                kind: CalloutKind::Warning,
                title: Some("Careful".into()),
                children: vec![Block::paragraph(vec![
                    InlineRun::text("Do not skip "),
                    InlineRun::Code("cargo test".into()),
                    InlineRun::text("."),
                ])],
            }),
            Block::Callout(Callout {
                kind: CalloutKind::Note,
                title: None,
                children: vec![Block::text("Plain quotes become notes.")],
            }),
            Block::ListItem(ListItem {
                ordered: false,
                children: vec![Block::text("first")],
            }),
            Block::ListItem(ListItem {
                ordered: false,
                children: vec![
                    Block::text("second"),
                    Block::ListItem(ListItem {
                        ordered: true,
                        children: vec![Block::text("nested")],
                    }),
                ],
            }),
            Block::Table(Table {
                header: vec![TableCell::text("Key"), TableCell::text("Value")],
                rows: vec![vec![TableCell::text("a"), TableCell::text("1")]],
            }),
            Block::CodeFence(CodeFence {
                language: Some("rust".into()),
                text: "fn main() {}".into(),
            }),
            Block::Rule,
        ]
    );
}

#[test]
fn kitchensink_serializes_canonically() {
    let markdown = serialize(&parse(KITCHENSINK));
    assert_snapshot!(markdown, @r#"
---
title: Release Guide
owner: docs-team
---

# Overview {#overview}

Ship **fast** and *safely*, see [the docs](https://example.com/docs).

:::warning Careful
Do not skip `cargo test`.
:::

:::note
Plain quotes become notes.
:::

- first
- second
  1. nested

| Key | Value |
| --- | --- |
| a | 1 |

```rust
fn main() {}
```

---
"#);
}

#[test]
fn serialized_output_parses_back_to_the_same_tree() {
    let doc = parse(KITCHENSINK);
    assert_eq!(parse(&serialize(&doc)), doc);
}

#[test]
fn special_characters_survive_a_round_trip() {
    let doc = mdsync_core::Document::new(vec![
        Block::Heading(Heading::new(
            HeadingLevel::new(2).unwrap(),
            vec![InlineRun::text("C# and F# {#not-an-anchor}")],
        )),
        Block::paragraph(vec![InlineRun::text("1. not a list, *not emphasis*, a_b and [x]")]),
        Block::paragraph(vec![InlineRun::text("> not a quote")]),
        Block::paragraph(vec![InlineRun::text(":::tip not a fence")]),
        Block::paragraph(vec![InlineRun::Code("a ` tick".into())]),
    ]);
    assert_eq!(parse(&serialize(&doc)), doc);
}

#[test]
fn quotes_inside_fences_stay_quotes() {
    let doc = parse(":::info Heads up\n> quoted inside\n\nafter\n:::\n");
    let Block::Callout(callout) = &doc.blocks[0] else {
        panic!("expected callout, got {:?}", doc.blocks[0]);
    };
    assert_eq!(callout.kind, CalloutKind::Info);
    assert!(matches!(callout.children[0], Block::BlockQuote(_)));
    assert_eq!(parse(&serialize(&doc)), doc);
}
