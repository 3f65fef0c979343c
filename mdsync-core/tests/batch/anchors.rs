use mdsync_core::common::toc::TocScope;
use mdsync_core::ir::nodes::{Block, Callout, CalloutKind, Heading, HeadingLevel, InlineRun};
use mdsync_core::{assemble, BatchOptions, BatchSource, BatchSpec, Document};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::{option, sample};
use std::collections::HashSet;

fn collect_anchors(blocks: &[Block], out: &mut Vec<String>) {
    for block in blocks {
        if let Block::Heading(heading) = block {
            out.extend(heading.anchor.clone());
        }
        collect_anchors(block.children(), out);
    }
}

fn collect_links(blocks: &[Block], out: &mut Vec<String>) {
    for block in blocks {
        if let Block::Paragraph(paragraph) = block {
            for run in &paragraph.content {
                if let InlineRun::Link { url, .. } = run {
                    out.push(url.clone());
                }
            }
        }
        collect_links(block.children(), out);
    }
}

// Few distinct texts, so collisions are the common case.
fn heading() -> impl Strategy<Value = Block> {
    (
        1usize..=3,
        sample::select(vec!["Intro", "intro", "Setup", "Set up", "", "!!!", "Intro 2"]),
        option::of(sample::select(vec!["intro", "intro-2", "setup"])),
    )
        .prop_map(|(level, text, anchor)| {
            let mut heading = Heading::with_text(HeadingLevel::clamped(level), text);
            heading.anchor = anchor.map(str::to_string);
            Block::Heading(heading)
        })
}

fn source_blocks() -> impl Strategy<Value = Vec<Block>> {
    vec(
        prop_oneof![
            3 => heading(),
            1 => Just(Block::text("body")),
            1 => vec(heading(), 1..3).prop_map(|children| Block::Callout(Callout {
                kind: CalloutKind::Note,
                title: None,
                children,
            })),
        ],
        0..5,
    )
}

fn options() -> impl Strategy<Value = BatchOptions> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(use_file_titles_as_headers, all_levels, demote_source_headings, batch_title)| {
            BatchOptions {
                use_file_titles_as_headers,
                toc_scope: if all_levels {
                    TocScope::AllLevels
                } else {
                    TocScope::TopLevel
                },
                demote_source_headings,
                batch_title: batch_title.then(|| "Intro".to_string()),
                ..BatchOptions::default()
            }
        },
    )
}

proptest! {
    #[test]
    fn anchors_are_unique_and_every_toc_link_resolves(
        sources in vec(source_blocks(), 1..4),
        options in options(),
    ) {
        let sources = sources
            .into_iter()
            .enumerate()
            .map(|(index, blocks)| BatchSource::new(format!("file-{index}"), Document::new(blocks)))
            .collect();
        let doc = assemble(BatchSpec { sources, options });

        let mut anchors = Vec::new();
        collect_anchors(&doc.blocks, &mut anchors);
        let unique: HashSet<&String> = anchors.iter().collect();
        prop_assert_eq!(unique.len(), anchors.len(), "duplicate anchors in {:?}", anchors);

        let mut links = Vec::new();
        collect_links(&doc.blocks, &mut links);
        for link in links {
            let target = link.strip_prefix('#').unwrap_or(&link).to_string();
            prop_assert!(unique.contains(&target), "dangling toc link {}", link);
        }
    }

    #[test]
    fn assembly_is_deterministic(sources in vec(source_blocks(), 1..4), options in options()) {
        let spec = BatchSpec {
            sources: sources
                .into_iter()
                .map(|blocks| BatchSource::new("same", Document::new(blocks)))
                .collect(),
            options,
        };
        prop_assert_eq!(assemble(spec.clone()), assemble(spec));
    }
}
