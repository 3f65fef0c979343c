//! Rich-document target
//!
//! The payload is a flat list of structural elements, the way hosted document
//! editors store a body: paragraphs carry a named style, an optional bullet and
//! a quote depth instead of being nested. Serialized with serde as camelCase
//! JSON for the transport.
//!
//! # Element Mapping Table
//!
//! | Document tree     | Structural element                                         |
//! |-------------------|------------------------------------------------------------|
//! | Heading           | Paragraph, `HEADING_n`, `headingId` = anchor               |
//! | Paragraph         | Paragraph, `NORMAL_TEXT`                                   |
//! | CodeFence         | Paragraph with `code` style (monospace, language)          |
//! | ListItem          | Paragraphs with `bullet`; later ones marked `continuation` |
//! | Table             | Table, first row is the header                             |
//! | Rule              | HorizontalRule                                             |
//! | BlockQuote        | Children one `quoteDepth` deeper                           |
//! | Callout           | Callout element, or a quote whose first line is `**Kind: Title**` |
//!
//! # Lossy Conversions
//!
//! - Italic wrapping bold comes back as bold wrapping italic
//! - Adjacent block quotes merge
//! - Tables, rules, quotes and callouts inside list items leave the list

pub mod parser;
pub mod serializer;

use crate::destination::TargetKind;
use crate::error::Result;
use crate::ir::nodes::{CalloutKind, Document};
use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering options for the rich-document target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichOptions {
    /// Emit native callout elements instead of the quote fallback.
    pub native_callouts: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RichDocumentTarget {
    options: RichOptions,
}

impl RichDocumentTarget {
    pub fn new(options: RichOptions) -> Self {
        Self { options }
    }
}

impl Target for RichDocumentTarget {
    type Payload = RichPayload;

    fn kind(&self) -> TargetKind {
        TargetKind::RichDocument
    }

    fn emit(&self, document: &Document) -> RichPayload {
        serializer::render(document, &self.options)
    }

    fn parse(&self, payload: &RichPayload) -> Result<Document> {
        Ok(parser::parse(payload))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Vec<StructuralElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StructuralElement {
    Paragraph(RichParagraph),
    Table(RichTable),
    #[serde(rename_all = "camelCase")]
    HorizontalRule {
        #[serde(default)]
        quote_depth: u8,
    },
    Callout(RichCallout),
}

impl StructuralElement {
    pub fn quote_depth(&self) -> u8 {
        match self {
            StructuralElement::Paragraph(paragraph) => paragraph.quote_depth,
            StructuralElement::Table(table) => table.quote_depth,
            StructuralElement::HorizontalRule { quote_depth } => *quote_depth,
            StructuralElement::Callout(callout) => callout.quote_depth,
        }
    }

    pub(crate) fn bullet(&self) -> Option<Bullet> {
        match self {
            StructuralElement::Paragraph(paragraph) => paragraph.bullet,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichParagraph {
    pub style: NamedStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet: Option<Bullet>,
    #[serde(default)]
    pub quote_depth: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeStyle>,
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

/// Named paragraph styles, spelled the way the document API spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NamedStyle {
    NormalText,
    #[serde(rename = "HEADING_1")]
    Heading1,
    #[serde(rename = "HEADING_2")]
    Heading2,
    #[serde(rename = "HEADING_3")]
    Heading3,
    #[serde(rename = "HEADING_4")]
    Heading4,
    #[serde(rename = "HEADING_5")]
    Heading5,
    #[serde(rename = "HEADING_6")]
    Heading6,
}

impl NamedStyle {
    pub fn heading(level: u8) -> Self {
        match level {
            1 => NamedStyle::Heading1,
            2 => NamedStyle::Heading2,
            3 => NamedStyle::Heading3,
            4 => NamedStyle::Heading4,
            5 => NamedStyle::Heading5,
            _ => NamedStyle::Heading6,
        }
    }

    pub fn heading_level(self) -> Option<u8> {
        match self {
            NamedStyle::NormalText => None,
            NamedStyle::Heading1 => Some(1),
            NamedStyle::Heading2 => Some(2),
            NamedStyle::Heading3 => Some(3),
            NamedStyle::Heading4 => Some(4),
            NamedStyle::Heading5 => Some(5),
            NamedStyle::Heading6 => Some(6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bullet {
    pub ordered: bool,
    pub nesting_level: u8,
    /// Paragraph belongs to the item above it and shows no glyph.
    #[serde(default)]
    pub continuation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTable {
    pub rows: Vec<Vec<RichCell>>,
    pub header_rows: u8,
    #[serde(default)]
    pub quote_depth: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichCell {
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichCallout {
    pub kind: CalloutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: Vec<StructuralElement>,
    #[serde(default)]
    pub quote_depth: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub content: String,
    #[serde(default)]
    pub style: TextStyle,
}

impl TextRun {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            style: TextStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    /// Monospace.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl fmt::Display for RichPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl RichPayload {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| crate::error::SyncError::MalformedPayload(err.to_string()))
    }
}
