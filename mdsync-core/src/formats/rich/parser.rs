//! Rich-document parsing (structural elements → document tree)
//!
//! Rebuilds nesting from the flat element list: quote depth turns back into
//! quotes and callouts, bullet levels back into nested list items.

use super::{RichParagraph, RichPayload, StructuralElement, TextRun};
use crate::ir::frontmatter::{FrontMatter, FrontMatterKey};
use crate::ir::nodes::{
    normalize_inlines, Block, BlockQuote, Callout, CalloutKind, CodeFence, Document, Heading,
    HeadingLevel, InlineRun, ListItem, Paragraph, Table, TableCell,
};

pub fn parse(payload: &RichPayload) -> Document {
    let front_matter = payload.title.as_ref().map(|title| {
        let mut front_matter = FrontMatter::new();
        front_matter.set_key(FrontMatterKey::Title, title);
        front_matter
    });
    Document {
        front_matter,
        blocks: blocks_at_depth(&payload.body, 0),
    }
}

/// Converts elements whose quote depth is at least `depth`.
fn blocks_at_depth(elements: &[StructuralElement], depth: u8) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while pos < elements.len() {
        let element = &elements[pos];

        if element.quote_depth() > depth {
            let end = run_end(elements, pos, |e| e.quote_depth() > depth);
            blocks.extend(quoted_group(&elements[pos..end], depth + 1));
            pos = end;
        } else if element.bullet().is_some() {
            let end = run_end(elements, pos, |e| {
                e.quote_depth() == depth && e.bullet().is_some()
            });
            blocks.extend(list_items(&elements[pos..end], 0));
            pos = end;
        } else {
            blocks.extend(element_to_block(element));
            pos += 1;
        }
    }

    blocks
}

fn run_end(
    elements: &[StructuralElement],
    start: usize,
    belongs: impl Fn(&StructuralElement) -> bool,
) -> usize {
    elements[start..]
        .iter()
        .position(|e| !belongs(e))
        .map_or(elements.len(), |offset| start + offset)
}

/// Splits a run of quoted elements into callouts (one per title line) or a
/// single block quote.
fn quoted_group(elements: &[StructuralElement], depth: u8) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while pos < elements.len() {
        let Some((kind, title)) = callout_title(&elements[pos], depth) else {
            // Content before any title line is a plain quote.
            let end = (pos + 1..elements.len())
                .find(|&index| callout_title(&elements[index], depth).is_some())
                .unwrap_or(elements.len());
            blocks.push(Block::BlockQuote(BlockQuote {
                children: blocks_at_depth(&elements[pos..end], depth),
            }));
            pos = end;
            continue;
        };

        let end = (pos + 1..elements.len())
            .find(|&index| callout_title(&elements[index], depth).is_some())
            .unwrap_or(elements.len());
        blocks.push(Block::Callout(Callout {
            kind,
            title,
            children: blocks_at_depth(&elements[pos + 1..end], depth),
        }));
        pos = end;
    }

    blocks
}

/// Recognizes the bold `Kind` / `Kind: Title` line that opens a fallback callout.
fn callout_title(element: &StructuralElement, depth: u8) -> Option<(CalloutKind, Option<String>)> {
    let StructuralElement::Paragraph(paragraph) = element else {
        return None;
    };
    if paragraph.quote_depth != depth
        || paragraph.bullet.is_some()
        || paragraph.code.is_some()
        || paragraph.style.heading_level().is_some()
        || paragraph.runs.is_empty()
    {
        return None;
    }
    let plain_bold = paragraph.runs.iter().all(|run| {
        run.style.bold && !run.style.italic && !run.style.code && run.style.link.is_none()
    });
    if !plain_bold {
        return None;
    }

    let text: String = paragraph.runs.iter().map(|run| run.content.as_str()).collect();
    let (label, title) = match text.split_once(": ") {
        Some((label, title)) => (label, Some(title.to_string())),
        None => (text.as_str(), None),
    };
    let kind = CalloutKind::ALL.into_iter().find(|kind| kind.label() == label)?;
    Some((kind, title))
}

/// Rebuilds list items at `level` from a run of bulleted paragraphs.
fn list_items(elements: &[StructuralElement], level: u8) -> Vec<Block> {
    let mut items = Vec::new();
    let mut pos = 0;

    while pos < elements.len() {
        let ordered = elements[pos].bullet().is_some_and(|bullet| bullet.ordered);
        let end = (pos + 1..elements.len())
            .find(|&index| {
                elements[index].bullet().is_some_and(|bullet| {
                    bullet.nesting_level <= level && !bullet.continuation
                })
            })
            .unwrap_or(elements.len());

        let mut children = Vec::new();
        let mut child = pos;
        while child < end {
            let nested = elements[child]
                .bullet()
                .is_some_and(|bullet| bullet.nesting_level > level);
            if nested {
                let nested_end = run_end(&elements[..end], child, |e| {
                    e.bullet().is_some_and(|bullet| bullet.nesting_level > level)
                });
                children.extend(list_items(&elements[child..nested_end], level + 1));
                child = nested_end;
            } else {
                children.extend(element_to_block(&elements[child]));
                child += 1;
            }
        }

        items.push(Block::ListItem(ListItem { ordered, children }));
        pos = end;
    }

    items
}

fn element_to_block(element: &StructuralElement) -> Option<Block> {
    match element {
        StructuralElement::Paragraph(paragraph) => paragraph_to_block(paragraph),
        StructuralElement::Table(table) => {
            let mut rows = table.rows.iter().map(|row| {
                row.iter()
                    .map(|cell| TableCell {
                        content: runs_to_inlines(&cell.runs),
                    })
                    .collect::<Vec<_>>()
            });
            let header = rows.next().unwrap_or_default();
            Some(Block::Table(Table {
                header,
                rows: rows.collect(),
            }))
        }
        StructuralElement::HorizontalRule { .. } => Some(Block::Rule),
        StructuralElement::Callout(callout) => Some(Block::Callout(Callout {
            kind: callout.kind,
            title: callout.title.clone(),
            children: blocks_at_depth(&callout.body, 0),
        })),
    }
}

fn paragraph_to_block(paragraph: &RichParagraph) -> Option<Block> {
    if let Some(code) = &paragraph.code {
        return Some(Block::CodeFence(CodeFence {
            language: code.language.clone(),
            text: paragraph.runs.iter().map(|run| run.content.as_str()).collect(),
        }));
    }

    let content = runs_to_inlines(&paragraph.runs);
    match paragraph.style.heading_level().and_then(HeadingLevel::new) {
        Some(level) => {
            let mut heading = Heading::new(level, content);
            heading.anchor = paragraph.heading_id.clone();
            Some(Block::Heading(heading))
        }
        // An empty paragraph only marks where a list item starts.
        None if content.is_empty() => None,
        None => Some(Block::Paragraph(Paragraph { content })),
    }
}

/// Regroups styled runs into inline runs. Bold always wraps italic.
pub(crate) fn runs_to_inlines(runs: &[TextRun]) -> Vec<InlineRun> {
    let mut out = Vec::new();
    for group in runs.chunk_by(|a, b| a.style.bold == b.style.bold) {
        let inner = italic_groups(group);
        if group[0].style.bold {
            out.push(InlineRun::Bold(inner));
        } else {
            out.extend(inner);
        }
    }
    normalize_inlines(out)
}

fn italic_groups(runs: &[TextRun]) -> Vec<InlineRun> {
    let mut out = Vec::new();
    for group in runs.chunk_by(|a, b| a.style.italic == b.style.italic) {
        let leaves = group.iter().map(leaf).collect();
        if group[0].style.italic {
            out.push(InlineRun::Italic(leaves));
        } else {
            out.extend(leaves);
        }
    }
    out
}

fn leaf(run: &TextRun) -> InlineRun {
    if run.style.code {
        InlineRun::Code(run.content.clone())
    } else if let Some(url) = &run.style.link {
        InlineRun::Link {
            text: run.content.clone(),
            url: url.clone(),
        }
    } else {
        InlineRun::Text(run.content.clone())
    }
}
