use crate::support::source;
use mdsync_core::common::toc::TocScope;
use mdsync_core::ir::nodes::{Block, InlineRun};
use mdsync_core::{assemble, BatchOptions, BatchSpec, Document};

/// Link targets in document order, depth first.
fn toc_targets(blocks: &[Block]) -> Vec<String> {
    let mut targets = Vec::new();
    for block in blocks {
        if let Block::Paragraph(paragraph) = block {
            for run in &paragraph.content {
                if let InlineRun::Link { url, .. } = run {
                    targets.extend(url.strip_prefix('#').map(str::to_string));
                }
            }
        }
        targets.extend(toc_targets(block.children()));
    }
    targets
}

fn anchors_at(doc: &Document, levels: &[u8]) -> Vec<String> {
    doc.blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading(heading) if levels.contains(&heading.level.get()) => heading.anchor.clone(),
            _ => None,
        })
        .collect()
}

fn handbook(scope: TocScope) -> Document {
    assemble(BatchSpec {
        sources: vec![
            source("install", "# Install\n\n## Linux\n\nsteps\n\n## macOS\n\nsteps"),
            source("usage", "---\ntitle: Usage\n---\n## Flags\n\ntext"),
            source("faq", "plain text only"),
        ],
        options: BatchOptions {
            batch_title: Some("Handbook".into()),
            toc_scope: scope,
            ..BatchOptions::default()
        },
    })
}

#[test]
fn top_level_toc_lists_each_file_title() {
    let doc = handbook(TocScope::TopLevel);
    assert_eq!(toc_targets(&doc.blocks), vec!["install", "usage", "faq"]);
    assert_eq!(anchors_at(&doc, &[1]), vec!["install", "usage", "faq"]);
    // Second-level headings are left unanchored.
    assert!(anchors_at(&doc, &[2]).is_empty());
}

#[test]
fn all_levels_toc_follows_the_outline() {
    let doc = handbook(TocScope::AllLevels);
    assert_eq!(
        toc_targets(&doc.blocks),
        vec!["install", "linux", "macos", "usage", "flags", "faq"]
    );

    // Nested under its file title.
    let Block::ListItem(install) = &doc.blocks[2] else {
        panic!("expected the first toc entry, got {:?}", doc.blocks[2]);
    };
    assert_eq!(install.children.len(), 3);
}

#[test]
fn toc_precedes_the_first_source() {
    let doc = handbook(TocScope::TopLevel);
    let headings: Vec<String> = doc
        .blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading(heading) => Some(heading.plain_text()),
            _ => None,
        })
        .take(3)
        .collect();
    assert_eq!(headings, vec!["Handbook", "Table of Contents", "Install"]);
}
