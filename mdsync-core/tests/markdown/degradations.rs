use mdsync_core::error::DegradationKind;
use mdsync_core::formats::markdown::parse_with_report;
use mdsync_core::formats::markdown::parser::MAX_NESTING;
use mdsync_core::ir::nodes::{plain_text, Block, CalloutKind, CodeFence};

fn kinds(source: &str) -> Vec<DegradationKind> {
    parse_with_report(source)
        .1
        .into_iter()
        .map(|degradation| degradation.kind)
        .collect()
}

#[test]
fn unterminated_code_fence_runs_to_the_end() {
    let (doc, report) = parse_with_report("intro\n\n```sh\necho hi\n\n# not a heading\n");
    assert_eq!(
        doc.blocks[1],
        Block::CodeFence(CodeFence {
            language: Some("sh".into()),
            text: "echo hi\n\n# not a heading".into(),
        })
    );
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].line, 3);
    assert_eq!(report[0].kind, DegradationKind::UnterminatedCodeFence);
}

#[test]
fn unknown_callout_kind_falls_back_to_note() {
    let (doc, report) = parse_with_report(":::danger Stop\nnow\n:::\n");
    let Block::Callout(callout) = &doc.blocks[0] else {
        panic!("expected callout");
    };
    assert_eq!(callout.kind, CalloutKind::Note);
    assert_eq!(callout.title.as_deref(), Some("Stop"));
    assert_eq!(report[0].kind, DegradationKind::UnknownCalloutKind("danger".into()));
}

#[test]
fn malformed_constructs_read_as_paragraphs() {
    assert_eq!(
        kinds("####### too deep\n\n| a | b |\n| c | d |\n\n:::\n"),
        vec![
            DegradationKind::HeadingTooDeep(7),
            DegradationKind::TableWithoutSeparator,
            DegradationKind::StrayFenceClose,
        ]
    );
    let (doc, _) = parse_with_report("####### too deep\n");
    assert!(matches!(doc.blocks[0], Block::Paragraph(_)));
}

#[test]
fn unterminated_front_matter_is_content() {
    let (doc, report) = parse_with_report("---\ntitle: x\n");
    assert!(doc.front_matter.is_none());
    assert_eq!(report[0].kind, DegradationKind::UnterminatedFrontMatter);
}

/// Containers along the first-child path, and the block they end in.
fn first_leaf(mut block: &Block) -> (usize, &Block) {
    let mut depth = 0;
    while let Some(child) = block.children().first() {
        depth += 1;
        block = child;
    }
    (depth, block)
}

#[test]
fn deep_quotes_are_cut_at_the_nesting_limit() {
    let source = format!("{} x\n", ">".repeat(5_000));
    let (doc, report) = parse_with_report(&source);

    assert_eq!(doc.blocks.len(), 1);
    let (depth, leaf) = first_leaf(&doc.blocks[0]);
    assert_eq!(depth, MAX_NESTING);
    let Block::Paragraph(paragraph) = leaf else {
        panic!("expected the remainder as a paragraph, got {leaf:?}");
    };
    assert_eq!(
        plain_text(&paragraph.content),
        format!("{} x", ">".repeat(5_000 - MAX_NESTING))
    );
    assert_eq!(
        report.into_iter().map(|d| d.kind).collect::<Vec<_>>(),
        vec![DegradationKind::NestingTooDeep(MAX_NESTING)]
    );
}

#[test]
fn deep_lists_and_callouts_stay_total() {
    let list = format!("{}x\n", "- ".repeat(1_000));
    let callouts = format!("{}x\n{}", ":::note\n".repeat(500), ":::\n".repeat(500));

    for source in [list, callouts] {
        let (doc, report) = parse_with_report(&source);
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(first_leaf(&doc.blocks[0]).0, MAX_NESTING);
        assert!(matches!(first_leaf(&doc.blocks[0]).1, Block::Paragraph(_)));
        assert_eq!(
            report.into_iter().map(|d| d.kind).collect::<Vec<_>>(),
            vec![DegradationKind::NestingTooDeep(MAX_NESTING)]
        );
    }
}
