//! Error types for parsing, rendering and sync operations

use crate::destination::TargetKind;
use std::fmt;
use thiserror::Error;

/// Fatal errors. Any of these aborts the invocation before a remote write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// A block the selected target has no mapping for.
    #[error("{target} target cannot render a {construct} block")]
    UnsupportedConstruct {
        target: TargetKind,
        construct: &'static str,
    },

    /// No explicit target and no usable front-matter linkage.
    #[error("cannot determine destination: {reason}")]
    AmbiguousDestination { reason: String },

    /// A payload handed to the formatter of the other target.
    #[error("expected a {expected} payload, got a {found} payload")]
    PayloadMismatch {
        expected: TargetKind,
        found: TargetKind,
    },

    /// A native payload that could not be read at all.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Opaque failure reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// A malformed local construct that the parser downgraded instead of failing.
///
/// These are reported and logged, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDegradation {
    /// 1-based line where the construct starts.
    pub line: usize,
    pub kind: DegradationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradationKind {
    UnterminatedFrontMatter,
    UnterminatedCodeFence,
    UnterminatedCallout,
    UnknownCalloutKind(String),
    HeadingTooDeep(usize),
    /// Quotes, callouts or list items nested past the limit.
    NestingTooDeep(usize),
    StrayFenceClose,
    TableWithoutSeparator,
    RaggedTableRow { expected: usize, found: usize },
}

impl fmt::Display for ParseDegradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            DegradationKind::UnterminatedFrontMatter => {
                write!(f, "front-matter is never closed, read as content")
            }
            DegradationKind::UnterminatedCodeFence => {
                write!(f, "code fence is never closed, runs to end of document")
            }
            DegradationKind::UnterminatedCallout => {
                write!(f, "callout fence is never closed, runs to end of document")
            }
            DegradationKind::UnknownCalloutKind(kind) => {
                write!(f, "unknown callout kind '{kind}', using note")
            }
            DegradationKind::HeadingTooDeep(depth) => {
                write!(f, "heading marker with {depth} '#' read as paragraph")
            }
            DegradationKind::NestingTooDeep(limit) => {
                write!(f, "nested deeper than {limit} levels, read as paragraph")
            }
            DegradationKind::StrayFenceClose => write!(f, "':::' without an open callout"),
            DegradationKind::TableWithoutSeparator => {
                write!(f, "pipe row without separator row read as paragraph")
            }
            DegradationKind::RaggedTableRow { expected, found } => {
                write!(f, "table row has {found} cells, header has {expected}")
            }
        }
    }
}
