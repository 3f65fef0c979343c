//! Core data structures for the document tree.

use crate::ir::frontmatter::FrontMatter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed document: optional front-matter followed by an ordered list of blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub front_matter: Option<FrontMatter>,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            front_matter: None,
            blocks,
        }
    }

    pub fn with_front_matter(mut self, front_matter: FrontMatter) -> Self {
        self.front_matter = Some(front_matter);
        self
    }

    /// First heading of any level, if any.
    pub fn first_heading(&self) -> Option<&Heading> {
        self.blocks.iter().find_map(|block| match block {
            Block::Heading(heading) => Some(heading),
            _ => None,
        })
    }

    /// Title declared in front-matter. A merged document's `batch_title`
    /// takes precedence over the `title` inherited from its first source.
    pub fn declared_title(&self) -> Option<String> {
        use crate::ir::frontmatter::FrontMatterKey;
        let front_matter = self.front_matter.as_ref()?;
        front_matter
            .get_str(FrontMatterKey::BatchTitle)
            .or_else(|| front_matter.get_str(FrontMatterKey::Title))
    }
}

/// One structural block of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(Heading),
    Paragraph(Paragraph),
    BlockQuote(BlockQuote),
    Callout(Callout),
    CodeFence(CodeFence),
    ListItem(ListItem),
    Table(Table),
    Rule,
}

impl Block {
    /// Short lowercase name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Block::Heading(_) => "heading",
            Block::Paragraph(_) => "paragraph",
            Block::BlockQuote(_) => "block-quote",
            Block::Callout(_) => "callout",
            Block::CodeFence(_) => "code-fence",
            Block::ListItem(_) => "list-item",
            Block::Table(_) => "table",
            Block::Rule => "rule",
        }
    }

    /// Nested blocks for container variants.
    pub fn children(&self) -> &[Block] {
        match self {
            Block::BlockQuote(quote) => &quote.children,
            Block::Callout(callout) => &callout.children,
            Block::ListItem(item) => &item.children,
            _ => &[],
        }
    }

    pub fn paragraph(content: Vec<InlineRun>) -> Self {
        Block::Paragraph(Paragraph { content })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Block::paragraph(vec![InlineRun::Text(text.into())])
    }
}

/// Heading level, always within `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const TOP: HeadingLevel = HeadingLevel(1);
    pub const MAX: u8 = 6;

    pub fn new(level: u8) -> Option<Self> {
        (1..=Self::MAX).contains(&level).then_some(HeadingLevel(level))
    }

    /// Builds a level, saturating into `1..=6`.
    pub fn clamped(level: usize) -> Self {
        HeadingLevel(level.clamp(1, Self::MAX as usize) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// One level deeper, saturating at 6.
    pub fn demoted(self) -> Self {
        HeadingLevel((self.0 + 1).min(Self::MAX))
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a heading with a specific level.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: HeadingLevel,
    pub content: Vec<InlineRun>,
    pub anchor: Option<String>,
}

impl Heading {
    pub fn new(level: HeadingLevel, content: Vec<InlineRun>) -> Self {
        Self {
            level,
            content,
            anchor: None,
        }
    }

    pub fn with_text(level: HeadingLevel, text: impl Into<String>) -> Self {
        Self::new(level, vec![InlineRun::Text(text.into())])
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn plain_text(&self) -> String {
        plain_text(&self.content)
    }
}

/// Represents a paragraph of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub content: Vec<InlineRun>,
}

/// A quotation that was not turned into a callout (only occurs inside callouts).
#[derive(Debug, Clone, PartialEq)]
pub struct BlockQuote {
    pub children: Vec<Block>,
}

/// A highlighted note/info/warning/tip box.
#[derive(Debug, Clone, PartialEq)]
pub struct Callout {
    pub kind: CalloutKind,
    pub title: Option<String>,
    pub children: Vec<Block>,
}

/// Verbatim code, never reparsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeFence {
    pub language: Option<String>,
    pub text: String,
}

/// A single list item; consecutive items form a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub ordered: bool,
    pub children: Vec<Block>,
}

/// A pipe table. The header row is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<TableCell>,
    pub rows: Vec<Vec<TableCell>>,
}

/// Represents a table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub content: Vec<InlineRun>,
}

impl TableCell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![InlineRun::Text(text.into())],
        }
    }
}

/// Callout flavours shared by every target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutKind {
    #[default]
    Note,
    Info,
    Warning,
    Tip,
}

impl CalloutKind {
    pub const ALL: [CalloutKind; 4] = [
        CalloutKind::Note,
        CalloutKind::Info,
        CalloutKind::Warning,
        CalloutKind::Tip,
    ];

    /// Case-insensitive keyword lookup (`WARNING`, `warning`, `Warning`).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(keyword.trim()))
    }

    /// Canonical lowercase keyword, as written after `:::`.
    pub fn keyword(self) -> &'static str {
        match self {
            CalloutKind::Note => "note",
            CalloutKind::Info => "info",
            CalloutKind::Warning => "warning",
            CalloutKind::Tip => "tip",
        }
    }

    /// Capitalized label used for visible title lines.
    pub fn label(self) -> &'static str {
        match self {
            CalloutKind::Note => "Note",
            CalloutKind::Info => "Info",
            CalloutKind::Warning => "Warning",
            CalloutKind::Tip => "Tip",
        }
    }
}

impl fmt::Display for CalloutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Represents inline content, such as text, bold, italics, etc.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineRun {
    Text(String),
    Bold(Vec<InlineRun>),
    Italic(Vec<InlineRun>),
    Code(String),
    Link { text: String, url: String },
}

impl InlineRun {
    pub fn text(text: impl Into<String>) -> Self {
        InlineRun::Text(text.into())
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        InlineRun::Link {
            text: text.into(),
            url: url.into(),
        }
    }
}

/// Flattens inline runs to their visible text.
pub fn plain_text(runs: &[InlineRun]) -> String {
    let mut out = String::new();
    push_plain_text(runs, &mut out);
    out
}

fn push_plain_text(runs: &[InlineRun], out: &mut String) {
    for run in runs {
        match run {
            InlineRun::Text(text) | InlineRun::Code(text) => out.push_str(text),
            InlineRun::Link { text, .. } => out.push_str(text),
            InlineRun::Bold(children) | InlineRun::Italic(children) => {
                push_plain_text(children, out)
            }
        }
    }
}

/// Brings inline runs into canonical form: empty text runs are dropped and
/// adjacent text runs are merged, recursively.
pub fn normalize_inlines(runs: Vec<InlineRun>) -> Vec<InlineRun> {
    let mut out: Vec<InlineRun> = Vec::with_capacity(runs.len());
    for run in runs {
        let run = match run {
            InlineRun::Bold(children) => InlineRun::Bold(normalize_inlines(children)),
            InlineRun::Italic(children) => InlineRun::Italic(normalize_inlines(children)),
            InlineRun::Text(text) if text.is_empty() => continue,
            other => other,
        };
        match (out.last_mut(), run) {
            (Some(InlineRun::Text(previous)), InlineRun::Text(text)) => previous.push_str(&text),
            (_, run) => out.push(run),
        }
    }
    out
}
