//! Round-trip properties over generated documents.
//!
//! The generators only produce documents already in canonical form (merged
//! text runs, no empty paragraphs), since that is what a parser hands back.

use mdsync_core::destination::{
    resolve, Destination, Resolution, SyncIntent, WikiLocator, WikiPageRef,
};
use mdsync_core::formats::markdown::parser::{parse_with_report, MAX_NESTING};
use mdsync_core::formats::rich::{RichDocumentTarget, RichOptions};
use mdsync_core::formats::wiki::WikiPageTarget;
use mdsync_core::ir::nodes::{
    normalize_inlines, Block, BlockQuote, Callout, CalloutKind, CodeFence, Document, Heading,
    HeadingLevel, InlineRun, ListItem, Table, TableCell,
};
use mdsync_core::target::{Formatter, Target, TargetOptions};
use mdsync_core::TargetKind;
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::{option, sample};

/// Words for the rich target. Lowercase, so a bold line never reads as a callout label.
const RICH_WORDS: &str = "[a-z]{1,8}( [a-z]{1,8}){0,3}";
/// Words for the wiki target, including characters the markup must escape.
const WIKI_WORDS: &str = "[a-z&<>\"]{1,8}( [a-z&<>\"]{1,8}){0,3}";
/// Page titles, including characters that are meaningful in YAML or in a `SPACE:Title` pair.
const PAGE_TITLE: &str = "[A-Za-z0-9 :&?#'\"!.,()_-]{1,24}";
const CODE_TEXT: &str = "[ -~]{0,16}(\n[ -~]{0,16}){0,2}";

fn inline(words: &'static str) -> impl Strategy<Value = InlineRun> {
    prop_oneof![
        4 => words.prop_map(InlineRun::Text),
        1 => words.prop_map(|text| InlineRun::Bold(vec![InlineRun::Text(text)])),
        1 => words.prop_map(|text| InlineRun::Italic(vec![InlineRun::Text(text)])),
        1 => words.prop_map(InlineRun::Code),
        1 => (words, "#[a-z]{1,6}|https://example\\.com/[a-z]{1,6}")
            .prop_map(|(text, url)| InlineRun::link(text, url)),
    ]
}

fn inlines(words: &'static str) -> impl Strategy<Value = Vec<InlineRun>> {
    vec(inline(words), 1..4).prop_map(normalize_inlines)
}

fn table(words: &'static str) -> impl Strategy<Value = Block> {
    (1usize..4).prop_flat_map(move |width| {
        let row = move || {
            vec(inlines(words), width).prop_map(|cells| {
                cells
                    .into_iter()
                    .map(|content| TableCell { content })
                    .collect::<Vec<_>>()
            })
        };
        (row(), vec(row(), 0..3)).prop_map(|(header, rows)| Block::Table(Table { header, rows }))
    })
}

fn leaf(words: &'static str) -> impl Strategy<Value = Block> {
    prop_oneof![
        1 => (1usize..=6, inlines(words), option::of("[a-z]{1,8}")).prop_map(
            |(level, content, anchor)| {
                let mut heading = Heading::new(HeadingLevel::clamped(level), content);
                heading.anchor = anchor;
                Block::Heading(heading)
            }
        ),
        3 => inlines(words).prop_map(Block::paragraph),
        1 => (option::of("[a-z]{1,6}"), CODE_TEXT)
            .prop_map(|(language, text)| Block::CodeFence(CodeFence { language, text })),
        1 => table(words),
        1 => Just(Block::Rule),
    ]
}

fn block(words: &'static str) -> impl Strategy<Value = Block> {
    leaf(words).prop_recursive(3, 24, 4, move |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(|children| Block::BlockQuote(BlockQuote { children })),
            (
                sample::select(CalloutKind::ALL.to_vec()),
                option::of("[a-z]{1,8}( [a-z]{1,8}){0,2}"),
                vec(inner.clone(), 0..4),
            )
                .prop_map(|(kind, title, children)| Block::Callout(Callout {
                    kind,
                    title,
                    children,
                })),
            (any::<bool>(), vec(inner, 0..4))
                .prop_map(|(ordered, children)| Block::ListItem(ListItem { ordered, children })),
        ]
    })
}

fn document(words: &'static str) -> impl Strategy<Value = Document> {
    vec(block(words), 0..6).prop_map(Document::new)
}

proptest! {
    #[test]
    fn wiki_storage_reads_back_exactly(doc in document(WIKI_WORDS)) {
        let target = WikiPageTarget;
        let payload = target.render(&doc).unwrap();
        let back = target.parse(&payload).unwrap();
        prop_assert_eq!(back.blocks, doc.blocks);
    }

    #[test]
    fn rich_payload_is_stable_after_one_round(
        doc in document(RICH_WORDS),
        native_callouts in any::<bool>(),
    ) {
        let target = RichDocumentTarget::new(RichOptions { native_callouts });
        let first = target.render(&doc).unwrap();
        let second = target.render(&target.parse(&first).unwrap()).unwrap();
        prop_assert_eq!(second, first);
    }

    #[test]
    fn built_in_targets_accept_every_construct(doc in document(WIKI_WORDS)) {
        for kind in [TargetKind::RichDocument, TargetKind::WikiPage] {
            let formatter = Formatter::for_kind(kind, &TargetOptions::default());
            let rendered = formatter.render(&doc);
            prop_assert!(rendered.is_ok(), "{} rejected the document", kind);
            prop_assert_eq!(rendered.unwrap(), formatter.render(&doc).unwrap());
        }
    }

    #[test]
    fn deeply_nested_markdown_stays_total(
        prefixes in vec(sample::select(vec!["> ", "- ", "1. ", "* "]), 0..300),
        with_fence in any::<bool>(),
    ) {
        let line = format!("{}x", prefixes.concat());
        let source = if with_fence {
            format!(":::warning\n{line}\n:::\n")
        } else {
            format!("{line}\n")
        };
        let (doc, _) = parse_with_report(&source);
        prop_assert!(nesting(&doc.blocks) <= MAX_NESTING);
        for kind in [TargetKind::RichDocument, TargetKind::WikiPage] {
            let formatter = Formatter::for_kind(kind, &TargetOptions::default());
            prop_assert!(formatter.render(&doc).is_ok());
        }
    }

    #[test]
    fn linked_documents_resolve_to_the_same_destination(destination in destination()) {
        let mut doc = Document::default();
        doc.link_destination(&destination);
        prop_assert_eq!(
            resolve(&doc, None, SyncIntent::Update, TargetKind::RichDocument).unwrap(),
            Resolution::Existing(destination)
        );
    }
}

/// Destinations a sync can link a document to. Wiki page ids are numeric, so a
/// title made only of digits reads back as an id and is left out.
fn destination() -> impl Strategy<Value = Destination> {
    let space = "~?[A-Z][A-Z0-9]{0,5}";
    let title = PAGE_TITLE
        .prop_map(|title| title.trim().to_string())
        .prop_filter("titles are trimmed, non-empty and not numeric", |title| {
            !title.is_empty() && !title.chars().all(|c| c.is_ascii_digit())
        });
    prop_oneof![
        "[a-zA-Z][a-zA-Z0-9_-]{0,43}".prop_map(Destination::rich),
        ("[1-9][0-9]{0,9}", option::of(space)).prop_map(|(id, space_key)| {
            Destination::WikiPage(WikiLocator {
                space_key,
                page: WikiPageRef::Id(id),
            })
        }),
        (space, title).prop_map(|(space, title)| Destination::wiki_title(space, title)),
    ]
}

fn nesting(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|block| match block.children() {
            [] => 0,
            children => 1 + nesting(children),
        })
        .max()
        .unwrap_or(0)
}
