//! Destinations and destination resolution
//!
//! A [`Destination`] names one remote document. It comes either from the
//! command line or from the front-matter a previous sync left behind:
//!
//! ```text
//! ---
//! destination_type: confluence
//! destination_id: "123456"
//! destination_space: DOCS
//! ---
//! ```
//!
//! [`resolve`] turns that linkage (or its absence) into a [`Resolution`].

use crate::error::{Result, SyncError};
use crate::ir::frontmatter::{FrontMatter, FrontMatterKey};
use crate::ir::nodes::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use url::Url;

const RICH_DOCUMENT_BASE: &str = "https://docs.google.com/document/d";

static RICH_DOCUMENT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/document/d/([a-zA-Z0-9_-]+)").expect("static pattern")
});

static RICH_DOCUMENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("static pattern"));

static WIKI_SPACE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(~?[A-Z][A-Z0-9_]*):\s*(\S.*)$").expect("static pattern")
});

/// Which service a document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    RichDocument,
    WikiPage,
}

impl TargetKind {
    /// Recognizes the names used for `destination_type` and `--target`.
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias.trim().to_ascii_lowercase().as_str() {
            "rich-document" | "rich" | "gdoc" | "google-docs" | "googledocs" | "document" => {
                Some(TargetKind::RichDocument)
            }
            "wiki-page" | "wiki" | "confluence" | "page" => Some(TargetKind::WikiPage),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::RichDocument => "rich-document",
            TargetKind::WikiPage => "wiki-page",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TargetKind::from_alias(s).ok_or_else(|| format!("unknown target '{s}'"))
    }
}

/// How a wiki page is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WikiPageRef {
    Id(String),
    Title(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiLocator {
    pub space_key: Option<String>,
    pub page: WikiPageRef,
}

/// One concrete remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Destination {
    RichDocument { document_id: String },
    WikiPage(WikiLocator),
}

impl Destination {
    pub fn rich(document_id: impl Into<String>) -> Self {
        Destination::RichDocument {
            document_id: document_id.into(),
        }
    }

    pub fn wiki_id(page_id: impl Into<String>) -> Self {
        Destination::WikiPage(WikiLocator {
            space_key: None,
            page: WikiPageRef::Id(page_id.into()),
        })
    }

    pub fn wiki_title(space_key: impl Into<String>, title: impl Into<String>) -> Self {
        Destination::WikiPage(WikiLocator {
            space_key: Some(space_key.into()),
            page: WikiPageRef::Title(title.into()),
        })
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Destination::RichDocument { .. } => TargetKind::RichDocument,
            Destination::WikiPage(_) => TargetKind::WikiPage,
        }
    }

    /// Recognizes a destination from its shape alone.
    ///
    /// Accepts rich-document URLs, bare rich-document ids (longer than 20
    /// characters, no `/` or `.`), wiki page URLs and `SPACE:Title` pairs.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(id) = rich_document_id_from_url(raw) {
            return Some(Destination::rich(id));
        }
        if let Some(locator) = wiki_locator_from_url(raw) {
            return Some(Destination::WikiPage(locator));
        }
        if let Some(destination) = space_title_pair(raw) {
            return Some(destination);
        }
        if raw.len() > 20 && RICH_DOCUMENT_ID.is_match(raw) {
            return Some(Destination::rich(raw));
        }
        None
    }

    /// Reads an identifier under a known kind.
    ///
    /// For wiki pages, `space` qualifies the identifier: with a space the raw
    /// value is a page id or a whole title and is never split, without one a
    /// `SPACE:Title` pair is accepted. All-digit values are page ids.
    pub fn parse_as(kind: TargetKind, raw: &str, space: Option<&str>) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match kind {
            TargetKind::RichDocument => rich_document_id_from_url(raw)
                .or_else(|| RICH_DOCUMENT_ID.is_match(raw).then(|| raw.to_string()))
                .map(Destination::rich),
            TargetKind::WikiPage => {
                if let Some(locator) = wiki_locator_from_url(raw) {
                    return Some(Destination::WikiPage(locator));
                }
                let space_key = space.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
                if raw.chars().all(|c| c.is_ascii_digit()) {
                    return Some(Destination::WikiPage(WikiLocator {
                        space_key,
                        page: WikiPageRef::Id(raw.to_string()),
                    }));
                }
                match space_key {
                    Some(space_key) => Some(Destination::WikiPage(WikiLocator {
                        space_key: Some(space_key),
                        page: WikiPageRef::Title(raw.to_string()),
                    })),
                    // A title only names a page within a space.
                    None => space_title_pair(raw),
                }
            }
        }
    }

    /// Browser URL of the destination. Wiki pages need the site's base URL.
    pub fn url(&self, wiki_base_url: Option<&str>) -> Option<String> {
        match self {
            Destination::RichDocument { document_id } => {
                Some(format!("{RICH_DOCUMENT_BASE}/{document_id}/edit"))
            }
            Destination::WikiPage(locator) => {
                let mut url = Url::parse(wiki_base_url?).ok()?;
                match (&locator.page, &locator.space_key) {
                    (WikiPageRef::Id(id), _) => {
                        url.path_segments_mut()
                            .ok()?
                            .pop_if_empty()
                            .extend(["pages", "viewpage.action"]);
                        url.query_pairs_mut().append_pair("pageId", id);
                    }
                    (WikiPageRef::Title(title), Some(space)) => {
                        url.path_segments_mut()
                            .ok()?
                            .pop_if_empty()
                            .extend(["display", space.as_str(), title.as_str()]);
                    }
                    (WikiPageRef::Title(_), None) => return None,
                }
                Some(url.to_string())
            }
        }
    }

    /// Identifier as written to `destination_id`.
    pub fn id_value(&self) -> &str {
        match self {
            Destination::RichDocument { document_id } => document_id,
            Destination::WikiPage(WikiLocator {
                page: WikiPageRef::Id(id) | WikiPageRef::Title(id),
                ..
            }) => id,
        }
    }

    fn space_key(&self) -> Option<&str> {
        match self {
            Destination::WikiPage(locator) => locator.space_key.as_deref(),
            Destination::RichDocument { .. } => None,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::RichDocument { document_id } => write!(f, "rich-document {document_id}"),
            Destination::WikiPage(locator) => {
                f.write_str("wiki-page ")?;
                if let Some(space) = &locator.space_key {
                    write!(f, "{space}:")?;
                }
                match &locator.page {
                    WikiPageRef::Id(id) => write!(f, "#{id}"),
                    WikiPageRef::Title(title) => f.write_str(title),
                }
            }
        }
    }
}

fn rich_document_id_from_url(raw: &str) -> Option<String> {
    RICH_DOCUMENT_URL
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// `/wiki/spaces/KEY/pages/ID/...`, `...?pageId=ID` and `/display/KEY/Title`.
fn wiki_locator_from_url(raw: &str) -> Option<WikiLocator> {
    if !(raw.starts_with("https://") || raw.starts_with("http://")) {
        return None;
    }
    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "pageId") {
        return Some(WikiLocator {
            space_key: None,
            page: WikiPageRef::Id(id.into_owned()),
        });
    }

    let segments: Vec<String> = url
        .path_segments()?
        .map(|segment| decode_segment(segment))
        .collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    for window in segments.windows(4) {
        if let ["spaces", space, "pages", id] = window {
            if id.chars().all(|c| c.is_ascii_digit()) && !id.is_empty() {
                return Some(WikiLocator {
                    space_key: Some(space.to_string()),
                    page: WikiPageRef::Id(id.to_string()),
                });
            }
        }
    }
    for window in segments.windows(3) {
        if let ["display", space, title] = window {
            if !title.is_empty() {
                return Some(WikiLocator {
                    space_key: Some(space.to_string()),
                    page: WikiPageRef::Title(title.to_string()),
                });
            }
        }
    }
    None
}

/// Path segments use `+` for spaces in wiki display URLs.
fn decode_segment(segment: &str) -> String {
    url::form_urlencoded::parse(format!("s={segment}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| segment.to_string())
}

fn space_title_pair(raw: &str) -> Option<Destination> {
    let captures = WIKI_SPACE_TITLE.captures(raw)?;
    Some(Destination::wiki_title(
        captures.get(1)?.as_str(),
        captures.get(2)?.as_str().trim(),
    ))
}

/// Whether the caller is allowed to create a new remote document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncIntent {
    Update,
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    Existing(Destination),
    Create(TargetKind),
}

/// Decides where a document goes.
///
/// An explicit destination wins unconditionally. Otherwise the front-matter
/// linkage is used. With no usable linkage, [`SyncIntent::Create`] asks for a
/// new document of the declared (or default) kind and [`SyncIntent::Update`]
/// fails.
pub fn resolve(
    document: &Document,
    explicit: Option<Destination>,
    intent: SyncIntent,
    default_kind: TargetKind,
) -> Result<Resolution> {
    if let Some(destination) = explicit {
        debug!(%destination, "using explicit destination");
        return Ok(Resolution::Existing(destination));
    }

    let linkage = document
        .front_matter
        .as_ref()
        .map(linked_destination)
        .unwrap_or(Linkage::Missing {
            kind: None,
            reason: "no explicit destination and no front-matter".to_string(),
        });

    match (linkage, intent) {
        (Linkage::Found(destination), _) => {
            debug!(%destination, "destination resolved from front-matter");
            Ok(Resolution::Existing(destination))
        }
        (Linkage::Missing { kind, reason }, SyncIntent::Create) => {
            debug!(%reason, "no usable linkage, creating a new document");
            Ok(Resolution::Create(kind.unwrap_or(default_kind)))
        }
        (Linkage::Missing { reason, .. }, SyncIntent::Update) => {
            Err(SyncError::AmbiguousDestination { reason })
        }
    }
}

enum Linkage {
    Found(Destination),
    Missing {
        kind: Option<TargetKind>,
        reason: String,
    },
}

fn linked_destination(front_matter: &FrontMatter) -> Linkage {
    let declared = front_matter.get_str(FrontMatterKey::DestinationType);
    let id = front_matter.get_str(FrontMatterKey::DestinationId);
    let space = front_matter.get_str(FrontMatterKey::DestinationSpace);

    let kind = match declared.as_deref().map(|raw| (raw, TargetKind::from_alias(raw))) {
        Some((_, Some(kind))) => Some(kind),
        Some((raw, None)) => {
            return Linkage::Missing {
                kind: None,
                reason: format!("unknown {} '{raw}'", FrontMatterKey::DestinationType),
            }
        }
        None => None,
    };

    let Some(id) = id else {
        return Linkage::Missing {
            kind,
            reason: format!("front-matter has no {}", FrontMatterKey::DestinationId),
        };
    };

    let destination = match kind {
        Some(kind) => Destination::parse_as(kind, &id, space.as_deref()),
        // A space key only qualifies wiki pages, so it rules out splitting the id.
        None => match space.as_deref() {
            Some(space) => rich_document_id_from_url(&id)
                .map(Destination::rich)
                .or_else(|| Destination::parse_as(TargetKind::WikiPage, &id, Some(space))),
            None => Destination::parse(&id),
        },
    };

    match destination {
        Some(destination) => Linkage::Found(destination),
        None => Linkage::Missing {
            kind,
            reason: match kind {
                Some(kind) => format!("'{id}' is not a valid {kind} identifier"),
                None => format!("cannot tell which service '{id}' belongs to"),
            },
        },
    }
}

impl Document {
    /// Records the destination in front-matter so the next run resolves it
    /// without an explicit target.
    pub fn link_destination(&mut self, destination: &Destination) {
        let front_matter = self.front_matter.get_or_insert_with(FrontMatter::new);
        front_matter.set_key(FrontMatterKey::DestinationType, destination.kind().as_str());
        front_matter.set_key(FrontMatterKey::DestinationId, destination.id_value());
        match destination.space_key() {
            Some(space) => front_matter.set_key(FrontMatterKey::DestinationSpace, space),
            None => {
                front_matter.remove_key(FrontMatterKey::DestinationSpace);
            }
        }
    }
}
