//! Table-of-contents generation.

use crate::ir::nodes::{Block, Heading, HeadingLevel, InlineRun, ListItem, Paragraph};
use serde::{Deserialize, Serialize};

/// Which headings take part in anchoring and in the table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TocScope {
    /// Only level-1 headings.
    #[default]
    TopLevel,
    /// Every heading level, nested by level.
    AllLevels,
}

impl TocScope {
    pub fn includes(self, level: HeadingLevel) -> bool {
        match self {
            TocScope::TopLevel => level == HeadingLevel::TOP,
            TocScope::AllLevels => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub text: String,
    pub anchor: String,
    pub level: HeadingLevel,
}

/// Collects entries for the anchored top-level headings within `scope`, in
/// document order.
pub fn collect_entries(blocks: &[Block], scope: TocScope) -> Vec<TocEntry> {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading(Heading {
                level,
                content,
                anchor: Some(anchor),
            }) if scope.includes(*level) => Some(TocEntry {
                text: crate::ir::nodes::plain_text(content),
                anchor: anchor.clone(),
                level: *level,
            }),
            _ => None,
        })
        .collect()
}

/// Builds the TOC heading followed by one link item per entry. Deeper entries
/// nest under the closest preceding shallower one.
pub fn toc_blocks(title: &str, entries: &[TocEntry]) -> Vec<Block> {
    let mut blocks = vec![Block::Heading(Heading::with_text(HeadingLevel::TOP, title))];
    blocks.extend(nest(entries));
    blocks
}

fn nest(entries: &[TocEntry]) -> Vec<Block> {
    let mut items = Vec::new();
    let mut index = 0;
    while index < entries.len() {
        let entry = &entries[index];
        let end = entries[index + 1..]
            .iter()
            .position(|next| next.level <= entry.level)
            .map_or(entries.len(), |offset| index + 1 + offset);

        let mut children = vec![Block::Paragraph(Paragraph {
            content: vec![InlineRun::link(
                entry.text.clone(),
                format!("#{}", entry.anchor),
            )],
        })];
        children.extend(nest(&entries[index + 1..end]));

        items.push(Block::ListItem(ListItem {
            ordered: false,
            children,
        }));
        index = end;
    }
    items
}
