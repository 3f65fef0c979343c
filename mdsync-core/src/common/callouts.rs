//! Callout classification.
//!
//! Block quotes and `:::kind` fences both end up as [`Callout`] blocks. This
//! module decides the kind and the title; it never looks at anything but the
//! tree it is handed.
//!
//! | Source                           | Kind           | Title                |
//! |----------------------------------|----------------|----------------------|
//! | `> text`                         | Note           | none                 |
//! | `> [!WARNING] Mind the gap`      | Warning        | `Mind the gap`       |
//! | `:::tip`                         | Tip            | none                 |
//! | `:::Warning Careful now`         | Warning        | `Careful now`        |
//! | `:::danger Stop`                 | Note (unknown) | `Stop`               |

use crate::ir::nodes::{Block, Callout, CalloutKind, InlineRun, Paragraph};
use tracing::debug;

/// Raw material the parser hands over once a quote or fence is closed.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroSource {
    Quote { children: Vec<Block> },
    Fence { info: String, children: Vec<Block> },
}

/// Kind and title parsed from the remainder of a `:::` opening line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceHeader {
    pub kind: CalloutKind,
    pub title: Option<String>,
    /// False when the keyword was not one of the four kinds.
    pub recognized: bool,
}

impl FenceHeader {
    pub fn parse(info: &str) -> Self {
        let info = info.trim();
        let (keyword, rest) = match info.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (info, ""),
        };
        let kind = CalloutKind::from_keyword(keyword);
        FenceHeader {
            kind: kind.unwrap_or_default(),
            title: (!rest.is_empty()).then(|| rest.to_string()),
            recognized: kind.is_some(),
        }
    }
}

pub fn classify(source: MacroSource) -> Callout {
    match source {
        MacroSource::Quote { children } => classify_quote(children),
        MacroSource::Fence { info, children } => {
            let header = FenceHeader::parse(&info);
            if !header.recognized {
                debug!(info = %info, "unrecognized callout kind, falling back to note");
            }
            Callout {
                kind: header.kind,
                title: header.title,
                children,
            }
        }
    }
}

fn classify_quote(mut children: Vec<Block>) -> Callout {
    if let Some(Block::Paragraph(first)) = children.first() {
        if let Some((kind, title, rest)) = split_alert_marker(&first.content) {
            if rest.is_empty() {
                children.remove(0);
            } else {
                children[0] = Block::Paragraph(Paragraph { content: rest });
            }
            return Callout {
                kind,
                title,
                children,
            };
        }
    }
    Callout {
        kind: CalloutKind::Note,
        title: None,
        children,
    }
}

/// Recognizes a leading `[!KIND] optional title` line in a quote's first
/// paragraph. Returns the kind, the title and what is left of the paragraph.
fn split_alert_marker(
    content: &[InlineRun],
) -> Option<(CalloutKind, Option<String>, Vec<InlineRun>)> {
    let InlineRun::Text(text) = content.first()? else {
        return None;
    };
    let (first_line, remainder) = match text.split_once('\n') {
        Some((line, remainder)) => (line, Some(remainder)),
        None => (text.as_str(), None),
    };
    // A title that continues into styled runs is not a plain marker line.
    if remainder.is_none() && content.len() > 1 {
        return None;
    }

    let marker = first_line.trim_start().strip_prefix("[!")?;
    let (keyword, title) = marker.split_once(']')?;
    let kind = CalloutKind::from_keyword(keyword)?;
    let title = title.trim();

    let mut rest = Vec::with_capacity(content.len());
    if let Some(remainder) = remainder.filter(|r| !r.is_empty()) {
        rest.push(InlineRun::Text(remainder.to_string()));
    }
    rest.extend(content.iter().skip(1).cloned());

    Some((
        kind,
        (!title.is_empty()).then(|| title.to_string()),
        rest,
    ))
}
