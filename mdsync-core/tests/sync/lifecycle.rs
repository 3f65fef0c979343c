use crate::support::{parse, MemoryTransport};
use mdsync_core::destination::{Resolution, SyncIntent, TargetKind};
use mdsync_core::formats::markdown::serialize;
use mdsync_core::ir::FrontMatterKey;
use mdsync_core::sync::{list_revisions, PushAction};
use mdsync_core::{plan_push, pull, push, resolve, Destination, PushRequest, SyncError, TargetOptions};

const NOTES: &str = "# Weekly Notes\n\n- shipped the parser\n- fixed **two** bugs\n";

fn request(intent: SyncIntent, default_kind: TargetKind) -> PushRequest<'static> {
    PushRequest {
        explicit: None,
        intent,
        default_kind,
        fallback_title: "weekly",
    }
}

#[test]
fn create_link_update_pull() {
    let options = TargetOptions::default();
    let mut transport = MemoryTransport::default();
    let mut doc = parse(NOTES);

    // First sync creates the document, titled from its heading.
    let plan = plan_push(&doc, request(SyncIntent::Create, TargetKind::RichDocument), &options).unwrap();
    assert!(matches!(
        &plan.action,
        PushAction::Create { kind: TargetKind::RichDocument, title } if title == "Weekly Notes"
    ));
    let destination = push(plan, &mut transport).unwrap();
    assert_eq!(destination, Destination::rich(format!("doc-{:0>24}", 1)));

    // The linkage written back to the file is enough for the next run.
    doc.link_destination(&destination);
    let saved = serialize(&doc);
    assert!(saved.starts_with("---\ndestination_type: rich-document\n"));
    let reloaded = parse(&saved);
    assert_eq!(
        resolve(&reloaded, None, SyncIntent::Update, TargetKind::WikiPage).unwrap(),
        Resolution::Existing(destination.clone())
    );

    let plan = plan_push(&reloaded, request(SyncIntent::Update, TargetKind::WikiPage), &options).unwrap();
    assert_eq!(plan.action, PushAction::Update(destination.clone()));
    assert_eq!(push(plan, &mut transport).unwrap(), destination);
    assert_eq!(transport.writes, 2);

    let pulled = pull(&destination, &transport, &options).unwrap();
    assert_eq!(pulled.blocks, doc.blocks);
    let front_matter = pulled.front_matter.expect("linkage");
    assert_eq!(
        front_matter.get_str(FrontMatterKey::DestinationId).as_deref(),
        Some(destination.id_value())
    );

    let revisions: Vec<String> = list_revisions(&destination, &transport)
        .unwrap()
        .into_iter()
        .map(|revision| revision.id)
        .collect();
    assert_eq!(revisions, vec!["2", "1"]);
}

#[test]
fn pulled_wiki_page_keeps_its_space() {
    let options = TargetOptions::default();
    let mut transport = MemoryTransport::default();
    let doc = parse("---\ntitle: Runbook\n---\nRestart the service.\n");

    let plan = plan_push(&doc, request(SyncIntent::Create, TargetKind::WikiPage), &options).unwrap();
    let created = push(plan, &mut transport).unwrap();
    assert_eq!(created, Destination::wiki_id("1001"));

    let pulled = pull(&created, &transport, &options).unwrap();
    assert_eq!(pulled.declared_title().as_deref(), Some("Runbook"));
    let source = serialize(&pulled);
    assert!(source.contains("destination_type: wiki-page\n"));
    assert!(source.contains("destination_id: '1001'\n"));

    assert_eq!(
        resolve(&parse(&source), None, SyncIntent::Update, TargetKind::RichDocument).unwrap(),
        Resolution::Existing(created)
    );
}

#[test]
fn updating_a_missing_document_reports_the_transport_error() {
    let options = TargetOptions::default();
    let mut transport = MemoryTransport::default();
    let doc = parse("---\ndestination_type: wiki\ndestination_id: \"42\"\n---\nBody\n");

    let plan = plan_push(&doc, request(SyncIntent::Update, TargetKind::RichDocument), &options).unwrap();
    let err = push(plan, &mut transport).unwrap_err();
    assert!(matches!(err, SyncError::Transport(_)));
    assert_eq!(err.to_string(), "transport error: no document at wiki-page #42");
    assert_eq!(transport.writes, 0);
}
