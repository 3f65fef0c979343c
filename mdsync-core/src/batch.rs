//! Batch assembly
//!
//! Merges independently authored documents into one, in input order:
//!
//! ```text
//! [batch title]            Heading 1, when `batch_title` is set
//! [table of contents]      Heading 1 + link list, when `generate_toc`
//! [file title]             Heading 1 per source, when `use_file_titles_as_headers`
//! source blocks
//! [rule]                   between sources, when `insert_horizontal_separators`
//! ...
//! ```
//!
//! Anchors are assigned once, over the concatenated document, so they are
//! unique across all sources.

use crate::common::anchors::AnchorRegistry;
use crate::common::toc::{collect_entries, toc_blocks, TocScope};
use crate::ir::frontmatter::{FrontMatter, FrontMatterKey};
use crate::ir::nodes::{plain_text, Block, Document, Heading, HeadingLevel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_TOC_TITLE: &str = "Table of Contents";

/// One input document and the name it was loaded under (usually the file stem).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSource {
    pub name: String,
    pub document: Document,
}

impl BatchSource {
    pub fn new(name: impl Into<String>, document: Document) -> Self {
        Self {
            name: name.into(),
            document,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    pub use_file_titles_as_headers: bool,
    pub insert_horizontal_separators: bool,
    pub generate_toc: bool,
    pub batch_title: Option<String>,
    pub toc_scope: TocScope,
    pub toc_title: String,
    /// Shift each source's own headings one level down under its file title.
    pub demote_source_headings: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            use_file_titles_as_headers: true,
            insert_horizontal_separators: true,
            generate_toc: true,
            batch_title: None,
            toc_scope: TocScope::default(),
            toc_title: DEFAULT_TOC_TITLE.to_string(),
            demote_source_headings: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSpec {
    pub sources: Vec<BatchSource>,
    pub options: BatchOptions,
}

pub fn assemble(spec: BatchSpec) -> Document {
    let BatchSpec { sources, options } = spec;
    info!(sources = sources.len(), toc = options.generate_toc, "assembling batch");

    let front_matter = merged_front_matter(&sources, &options);

    let source_count = sources.len();
    let mut body = Vec::new();
    for (index, source) in sources.into_iter().enumerate() {
        if index > 0 && options.insert_horizontal_separators {
            body.push(Block::Rule);
        }
        body.extend(source_blocks(source, &options));
    }

    assign_anchors(&mut body, options.toc_scope);

    let mut blocks = Vec::new();
    if let Some(title) = &options.batch_title {
        blocks.push(Block::Heading(Heading::with_text(HeadingLevel::TOP, title)));
    }
    if options.generate_toc {
        let entries = collect_entries(&body, options.toc_scope);
        debug!(entries = entries.len(), "generated table of contents");
        blocks.extend(toc_blocks(&options.toc_title, &entries));
    }
    blocks.extend(body);

    info!(sources = source_count, blocks = blocks.len(), "batch assembled");
    Document {
        front_matter,
        blocks,
    }
}

/// Keys that describe one source rather than the merged document.
const SOURCE_ONLY_KEYS: [FrontMatterKey; 4] = [
    FrontMatterKey::DestinationType,
    FrontMatterKey::DestinationId,
    FrontMatterKey::DestinationSpace,
    FrontMatterKey::Title,
];

/// Front-matter of the first source that has one, minus its linkage and title,
/// plus `batch_title`. The merged document is new, so it is never linked.
fn merged_front_matter(sources: &[BatchSource], options: &BatchOptions) -> Option<FrontMatter> {
    let mut front_matter = sources
        .iter()
        .find_map(|source| source.document.front_matter.clone())
        .unwrap_or_default();
    for key in SOURCE_ONLY_KEYS {
        if front_matter.remove_key(key) {
            debug!(%key, "source front-matter key left out of batch");
        }
    }
    if let Some(title) = &options.batch_title {
        front_matter.set_key(FrontMatterKey::BatchTitle, title);
    }
    (!front_matter.is_empty()).then_some(front_matter)
}

/// Title for a source: front-matter `title`, else its first heading, else its
/// name. A leading level-1 heading is returned as well when it supplies that
/// title (or repeats it), since the synthesized title replaces it.
fn source_title(source: &BatchSource) -> (String, Option<Heading>) {
    let leading = match source.document.blocks.first() {
        Some(Block::Heading(heading)) if heading.level == HeadingLevel::TOP => Some(heading),
        _ => None,
    };
    if let Some(title) = source.document.declared_title() {
        let repeated = leading.filter(|heading| heading.plain_text().trim() == title);
        return (title, repeated.cloned());
    }
    if let Some(heading) = leading {
        return (heading.plain_text(), Some(heading.clone()));
    }
    match source.document.first_heading() {
        Some(heading) => (heading.plain_text(), None),
        None => (source.name.clone(), None),
    }
}

fn source_blocks(source: BatchSource, options: &BatchOptions) -> Vec<Block> {
    if !options.use_file_titles_as_headers {
        return source.document.blocks;
    }

    let (title, absorbed) = source_title(&source);
    let mut blocks = source.document.blocks;
    let mut header = Heading::with_text(HeadingLevel::TOP, title);
    if let Some(leading) = absorbed {
        debug!(source = %source.name, "leading heading used as file title");
        blocks.remove(0);
        header.content = leading.content;
        header.anchor = leading.anchor;
    }

    if options.demote_source_headings {
        demote_headings(&mut blocks);
    }

    let mut out = Vec::with_capacity(blocks.len() + 1);
    out.push(Block::Heading(header));
    out.extend(blocks);
    out
}

fn demote_headings(blocks: &mut [Block]) {
    for block in blocks {
        match block {
            Block::Heading(heading) => heading.level = heading.level.demoted(),
            Block::BlockQuote(quote) => demote_headings(&mut quote.children),
            Block::Callout(callout) => demote_headings(&mut callout.children),
            Block::ListItem(item) => demote_headings(&mut item.children),
            _ => {}
        }
    }
}

/// Anchors every top-level heading within `scope`, and keeps any anchor
/// already present elsewhere unique.
fn assign_anchors(blocks: &mut [Block], scope: TocScope) {
    let mut registry = AnchorRegistry::new();
    for block in blocks.iter_mut() {
        match block {
            Block::Heading(heading) if scope.includes(heading.level) => {
                let base = heading
                    .anchor
                    .clone()
                    .unwrap_or_else(|| plain_text(&heading.content));
                heading.anchor = Some(registry.assign(&base));
            }
            block => dedupe_existing(block, &mut registry),
        }
    }
}

fn dedupe_existing(block: &mut Block, registry: &mut AnchorRegistry) {
    match block {
        Block::Heading(heading) => {
            if let Some(anchor) = heading.anchor.take() {
                heading.anchor = Some(registry.assign(&anchor));
            }
        }
        Block::BlockQuote(quote) => quote
            .children
            .iter_mut()
            .for_each(|child| dedupe_existing(child, registry)),
        Block::Callout(callout) => callout
            .children
            .iter_mut()
            .for_each(|child| dedupe_existing(child, registry)),
        Block::ListItem(item) => item
            .children
            .iter_mut()
            .for_each(|child| dedupe_existing(child, registry)),
        _ => {}
    }
}
