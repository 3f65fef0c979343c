//! Target trait and target dispatch
//!
//! A target renders a [`Document`] into the native payload of one remote
//! service and parses such a payload back. The set of targets is closed:
//! [`Formatter`] selects one by [`TargetKind`] and wraps its payload in
//! [`NativePayload`] so callers can stay target-agnostic.

use crate::destination::TargetKind;
use crate::error::{Result, SyncError};
use crate::formats::rich::{RichDocumentTarget, RichOptions, RichPayload};
use crate::formats::wiki::{WikiOptions, WikiPageTarget, WikiPayload};
use crate::ir::nodes::{Block, Document};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bidirectional conversion between the document tree and a native payload.
///
/// Implementors provide [`Target::emit`] and [`Target::parse`]. Callers go
/// through [`Target::render`], which refuses documents holding a block the
/// target does not support before any payload exists.
///
/// # Examples
///
/// ```ignore
/// struct PlainText;
///
/// impl Target for PlainText {
///     type Payload = String;
///
///     fn kind(&self) -> TargetKind {
///         TargetKind::WikiPage
///     }
///
///     fn supports(&self, block: &Block) -> bool {
///         !matches!(block, Block::Table(_))
///     }
///
///     fn emit(&self, document: &Document) -> String {
///         todo!()
///     }
///
///     fn parse(&self, payload: &String) -> Result<Document> {
///         todo!()
///     }
/// }
/// ```
pub trait Target {
    type Payload;

    fn kind(&self) -> TargetKind;

    /// Whether this target has a mapping for `block`. Checked recursively.
    fn supports(&self, _block: &Block) -> bool {
        true
    }

    /// Unchecked rendering. Use [`Target::render`].
    fn emit(&self, document: &Document) -> Self::Payload;

    fn parse(&self, payload: &Self::Payload) -> Result<Document>;

    /// Renders `document`, failing on the first unsupported block.
    fn render(&self, document: &Document) -> Result<Self::Payload> {
        if let Some(block) = first_unsupported(&document.blocks, &|block| self.supports(block)) {
            return Err(SyncError::UnsupportedConstruct {
                target: self.kind(),
                construct: block.name(),
            });
        }
        Ok(self.emit(document))
    }
}

fn first_unsupported<'a>(
    blocks: &'a [Block],
    supports: &dyn Fn(&Block) -> bool,
) -> Option<&'a Block> {
    blocks.iter().find_map(|block| {
        if supports(block) {
            first_unsupported(block.children(), supports)
        } else {
            Some(block)
        }
    })
}

/// Options for every target, as loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOptions {
    #[serde(default)]
    pub rich: RichOptions,
    #[serde(default)]
    pub wiki: WikiOptions,
}

/// A payload of either target, tagged with the [`TargetKind`] name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", content = "data")]
pub enum NativePayload {
    #[serde(rename = "rich-document")]
    Rich(RichPayload),
    #[serde(rename = "wiki-page")]
    Wiki(WikiPayload),
}

impl NativePayload {
    pub fn kind(&self) -> TargetKind {
        match self {
            NativePayload::Rich(_) => TargetKind::RichDocument,
            NativePayload::Wiki(_) => TargetKind::WikiPage,
        }
    }

    /// Reads a payload as exported by the remote service: rich payloads as
    /// JSON, wiki payloads as raw storage format.
    pub fn from_source(kind: TargetKind, source: &str) -> Result<Self> {
        match kind {
            TargetKind::RichDocument => RichPayload::from_json(source).map(NativePayload::Rich),
            TargetKind::WikiPage => Ok(NativePayload::Wiki(WikiPayload::new(source))),
        }
    }
}

/// The selected target, dispatched by kind.
#[derive(Debug, Clone)]
pub enum Formatter {
    Rich(RichDocumentTarget),
    Wiki(WikiPageTarget),
}

impl Formatter {
    pub fn for_kind(kind: TargetKind, options: &TargetOptions) -> Self {
        match kind {
            TargetKind::RichDocument => {
                Formatter::Rich(RichDocumentTarget::new(options.rich.clone()))
            }
            TargetKind::WikiPage => Formatter::Wiki(WikiPageTarget::new()),
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Formatter::Rich(target) => target.kind(),
            Formatter::Wiki(target) => target.kind(),
        }
    }

    pub fn render(&self, document: &Document) -> Result<NativePayload> {
        debug!(target_kind = %self.kind(), blocks = document.blocks.len(), "rendering");
        match self {
            Formatter::Rich(target) => target.render(document).map(NativePayload::Rich),
            Formatter::Wiki(target) => target.render(document).map(NativePayload::Wiki),
        }
    }

    pub fn parse(&self, payload: &NativePayload) -> Result<Document> {
        match (self, payload) {
            (Formatter::Rich(target), NativePayload::Rich(payload)) => target.parse(payload),
            (Formatter::Wiki(target), NativePayload::Wiki(payload)) => target.parse(payload),
            _ => Err(SyncError::PayloadMismatch {
                expected: self.kind(),
                found: payload.kind(),
            }),
        }
    }
}
