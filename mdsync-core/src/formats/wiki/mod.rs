//! Wiki-page target
//!
//! Pages are stored as a storage-format XHTML fragment: plain XHTML for text
//! structure plus `ac:` elements for macros and in-page links.
//!
//! # Element Mapping Table
//!
//! | Document tree | Storage format                                                  |
//! |---------------|-----------------------------------------------------------------|
//! | Heading       | `<hN>` opening with an `anchor` macro when the heading has an id |
//! | Paragraph     | `<p>`, line breaks as `<br />`                                   |
//! | Callout       | `note`/`info`/`warning`/`tip` macro, `title` parameter, rich-text body |
//! | CodeFence     | `code` macro, `language` parameter, CDATA plain-text body        |
//! | ListItem      | `<li>`, neighbours of one kind share a `<ul>` or `<ol>`          |
//! | Table         | `<table><tbody>`, header row of `<th>`                           |
//! | Rule          | `<hr />`                                                         |
//! | BlockQuote    | `<blockquote>`                                                   |
//! | Link `#id`    | `ac:link` with `ac:anchor`                                       |
//! | Link          | `<a href>`                                                       |
//!
//! Parsing reads the fragment with `roxmltree`. Unknown macros and elements
//! degrade to their textual content.

pub mod parser;
pub mod serializer;

use crate::destination::TargetKind;
use crate::error::Result;
use crate::ir::nodes::Document;
use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::fmt;

pub(crate) const ANCHOR_MACRO: &str = "anchor";
pub(crate) const CODE_MACRO: &str = "code";
pub(crate) const TITLE_PARAMETER: &str = "title";
pub(crate) const LANGUAGE_PARAMETER: &str = "language";

/// Options for the wiki-page target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiOptions {
    /// Site root used to build page URLs, e.g. `https://example.atlassian.net/wiki`.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WikiPageTarget;

impl WikiPageTarget {
    pub fn new() -> Self {
        WikiPageTarget
    }
}

impl Target for WikiPageTarget {
    type Payload = WikiPayload;

    fn kind(&self) -> TargetKind {
        TargetKind::WikiPage
    }

    fn emit(&self, document: &Document) -> WikiPayload {
        WikiPayload {
            title: document.declared_title(),
            storage: serializer::render_blocks(&document.blocks),
        }
    }

    fn parse(&self, payload: &WikiPayload) -> Result<Document> {
        parser::parse(payload)
    }
}

/// A page body in storage format, plus the page title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub storage: String,
}

impl WikiPayload {
    pub fn new(storage: impl Into<String>) -> Self {
        Self {
            title: None,
            storage: storage.into(),
        }
    }
}

impl fmt::Display for WikiPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage)
    }
}
