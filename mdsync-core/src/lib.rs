//! Markdown interoperability with hosted document services
//!
//!     This crate converts Markdown documents (with a front-matter preamble and `:::` callout
//!     fences) into the native payloads of two hosted services, a rich-document editor and a
//!     wiki, and back. It also merges several documents into one with a generated table of
//!     contents.
//!
//!     This is a pure lib: no network, no files, no terminal. The remote side is reached through
//!     the [`sync::Transport`] trait, which the caller implements.
//!
//! Architecture
//!
//!     Every conversion goes through one document tree (./ir/mod.rs). The Markdown parser
//!     builds it, the batch assembler rewrites it and the targets render it. Logic shared by
//!     more than one stage (anchors, callout classification, the table of contents) lives in
//!     ./common so that target code only deals with its own payload.
//!
//!     Pipeline:
//!
//!         text ─► formats::markdown::parse ─► Document
//!                     (common::callouts at each quote / fence)
//!         Document* ─► batch::assemble ─► Document
//!         Document ─► destination::resolve ─► Resolution
//!         Document ─► target::Formatter::render ─► NativePayload ─► Transport
//!
//!     And back: Transport ─► NativePayload ─► Formatter::parse ─► formats::markdown::serialize.
//!
//!     The file structure :
//!     .
//!     ├── error.rs                # SyncError, TransportError, ParseDegradation
//!     ├── target.rs               # Target trait, Formatter, NativePayload
//!     ├── destination.rs          # Destination, resolve
//!     ├── batch.rs                # Batch assembly
//!     ├── sync.rs                 # Transport trait, plan_push / push / pull
//!     ├── formats
//!     │   ├── markdown            # Source format: parser, inlines, serializer
//!     │   ├── rich                # Rich-document target
//!     │   └── wiki                # Wiki storage-format target
//!     ├── ir                      # Document tree and front-matter
//!     └── common                  # Anchors, callouts, table of contents
//!
//! Testing
//!     tests
//!     ├── lib.rs
//!     ├── scenarios.rs
//!     └── <area>
//!         └── <testname>.rs
//!
//!     Rust does not discover tests in subdirectories, so tests/lib.rs includes them as modules.
//!     Snapshots are inline (insta), next to the assertion they belong to.
//!
//! Errors
//!
//!     Malformed Markdown never fails: the parser downgrades the construct and reports a
//!     [`error::ParseDegradation`]. Fatal problems are [`error::SyncError`]s, and all of them
//!     surface while planning, before the single remote write.

pub mod batch;
pub mod common;
pub mod destination;
pub mod error;
pub mod formats;
pub mod ir;
pub mod sync;
pub mod target;

pub use batch::{assemble, BatchOptions, BatchSource, BatchSpec};
pub use common::toc::TocScope;
pub use destination::{resolve, Destination, Resolution, SyncIntent, TargetKind};
pub use error::{ParseDegradation, Result, SyncError, TransportError};
pub use ir::{Block, Document, FrontMatter};
pub use sync::{plan_push, pull, push, PushPlan, PushRequest, Transport};
pub use target::{Formatter, NativePayload, Target, TargetOptions};
