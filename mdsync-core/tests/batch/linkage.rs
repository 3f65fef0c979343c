//! A merged document is a new document: it never inherits a source's destination.

use crate::support::source;
use mdsync_core::destination::{resolve, Resolution, SyncIntent, TargetKind};
use mdsync_core::error::SyncError;
use mdsync_core::{assemble, BatchOptions, BatchSource, BatchSpec};
use proptest::prelude::*;
use proptest::sample;

const LINKED_WIKI: &str =
    "---\ndestination_type: wiki\ndestination_id: \"42\"\ntitle: Install\n---\n# Install\n";
const LINKED_RICH: &str =
    "---\ndestination_type: gdoc\ndestination_id: 1AbCdEfGhIjKlMnOpQrStUvWxYz0123\n---\nUsage.\n";
const UNLINKED: &str = "# FAQ\n";

#[test]
fn batch_of_linked_sources_has_no_destination() {
    let doc = assemble(BatchSpec {
        sources: vec![source("install", LINKED_WIKI), source("faq", UNLINKED)],
        options: BatchOptions::default(),
    });

    let err = resolve(&doc, None, SyncIntent::Update, TargetKind::RichDocument).unwrap_err();
    assert!(matches!(err, SyncError::AmbiguousDestination { .. }), "{err}");
    assert_eq!(
        resolve(&doc, None, SyncIntent::Create, TargetKind::RichDocument).unwrap(),
        Resolution::Create(TargetKind::RichDocument)
    );
}

proptest! {
    #[test]
    fn merged_linkage_is_never_inherited(
        picks in proptest::collection::vec(sample::select(vec![LINKED_WIKI, LINKED_RICH, UNLINKED]), 1..4),
        batch_title in proptest::option::of("[A-Z][a-z]{2,8}"),
    ) {
        let sources: Vec<BatchSource> = picks
            .iter()
            .enumerate()
            .map(|(index, text)| source(&format!("file-{index}"), text))
            .collect();
        let doc = assemble(BatchSpec {
            sources,
            options: BatchOptions { batch_title, ..BatchOptions::default() },
        });

        prop_assert_eq!(
            resolve(&doc, None, SyncIntent::Create, TargetKind::WikiPage).unwrap(),
            Resolution::Create(TargetKind::WikiPage)
        );
    }
}
