//! Format implementations
//!
//! The plain-text source format (Markdown with front-matter and `:::` callout
//! fences) and the two remote targets. Each converts to and from the document
//! tree in [`crate::ir`].

pub mod markdown;
pub mod rich;
pub mod wiki;

pub use rich::{RichDocumentTarget, RichOptions, RichPayload};
pub use wiki::{WikiOptions, WikiPageTarget, WikiPayload};
