//! Sync orchestration
//!
//! Composes resolution, rendering and the remote [`Transport`]. Everything that
//! can fail inside this crate happens while building a [`PushPlan`]; [`push`]
//! then performs exactly one remote write. A failed plan never reaches the
//! transport.
//!
//! ```text
//! Document ──plan_push──► PushPlan ──push──► Transport::create / update
//! Destination ──pull──► Transport::fetch ──► Formatter::parse ──► Document
//! ```

use crate::destination::{resolve, Destination, Resolution, SyncIntent, TargetKind};
use crate::error::{Result, TransportError};
use crate::ir::nodes::Document;
use crate::target::{Formatter, NativePayload, TargetOptions};
use serde::{Deserialize, Serialize};
use tracing::info;

/// The remote service. Implementations own authentication and HTTP.
pub trait Transport {
    /// Creates a document and returns where it now lives.
    fn create(
        &mut self,
        kind: TargetKind,
        title: &str,
        payload: &NativePayload,
    ) -> std::result::Result<Destination, TransportError>;

    /// Replaces the whole body of an existing document.
    fn update(
        &mut self,
        destination: &Destination,
        payload: &NativePayload,
    ) -> std::result::Result<(), TransportError>;

    fn fetch(&self, destination: &Destination) -> std::result::Result<NativePayload, TransportError>;

    /// Revision history in the service's order, oldest first.
    fn revisions(
        &self,
        destination: &Destination,
    ) -> std::result::Result<Vec<Revision>, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: String,
    #[serde(default)]
    pub modified_time: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Pinned against automatic pruning.
    #[serde(default)]
    pub keep_forever: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushAction {
    Create { kind: TargetKind, title: String },
    Update(Destination),
}

/// A fully rendered write, ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushPlan {
    pub action: PushAction,
    pub payload: NativePayload,
}

impl PushPlan {
    pub fn kind(&self) -> TargetKind {
        self.payload.kind()
    }
}

/// Where to send a document when nothing else says so.
#[derive(Debug, Clone, PartialEq)]
pub struct PushRequest<'a> {
    pub explicit: Option<Destination>,
    pub intent: SyncIntent,
    pub default_kind: TargetKind,
    /// Title for a new document when the document declares none (the file stem).
    pub fallback_title: &'a str,
}

/// Resolves the destination and renders the payload for it.
pub fn plan_push(
    document: &Document,
    request: PushRequest<'_>,
    options: &TargetOptions,
) -> Result<PushPlan> {
    let resolution = resolve(document, request.explicit, request.intent, request.default_kind)?;
    let kind = match &resolution {
        Resolution::Existing(destination) => destination.kind(),
        Resolution::Create(kind) => *kind,
    };

    let payload = Formatter::for_kind(kind, options).render(document)?;
    let action = match resolution {
        Resolution::Existing(destination) => PushAction::Update(destination),
        Resolution::Create(kind) => PushAction::Create {
            kind,
            title: document_title(document, request.fallback_title),
        },
    };

    info!(target_kind = %kind, create = matches!(action, PushAction::Create { .. }), "push planned");
    Ok(PushPlan { action, payload })
}

/// Front-matter title, else the first heading, else `fallback`.
pub fn document_title(document: &Document, fallback: &str) -> String {
    document
        .declared_title()
        .or_else(|| {
            document
                .first_heading()
                .map(|heading| heading.plain_text())
                .filter(|text| !text.trim().is_empty())
        })
        .unwrap_or_else(|| fallback.to_string())
}

/// Performs the single write described by `plan`.
pub fn push(plan: PushPlan, transport: &mut dyn Transport) -> Result<Destination> {
    let destination = match plan.action {
        PushAction::Create { kind, title } => transport.create(kind, &title, &plan.payload)?,
        PushAction::Update(destination) => {
            transport.update(&destination, &plan.payload)?;
            destination
        }
    };
    info!(%destination, "pushed");
    Ok(destination)
}

/// Fetches a remote document and converts it into a linked local document.
pub fn pull(
    destination: &Destination,
    transport: &dyn Transport,
    options: &TargetOptions,
) -> Result<Document> {
    let payload = transport.fetch(destination)?;
    let mut document = Formatter::for_kind(destination.kind(), options).parse(&payload)?;
    document.link_destination(destination);
    info!(%destination, blocks = document.blocks.len(), "pulled");
    Ok(document)
}

/// Revision history, newest first.
pub fn list_revisions(destination: &Destination, transport: &dyn Transport) -> Result<Vec<Revision>> {
    let mut revisions = transport.revisions(destination)?;
    revisions.reverse();
    Ok(revisions)
}
