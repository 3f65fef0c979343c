//! Markdown serialization (document tree → text)
//!
//! Output is canonical: `parse(serialize(doc))` gives back `doc` for documents
//! whose text runs carry no leading or trailing whitespace per line. Callouts
//! always come out as `:::` fences, whatever they were parsed from.

use crate::ir::nodes::{Block, Callout, CodeFence, Document, Heading, InlineRun, ListItem, Table, TableCell};

/// Serialize a document to Markdown text.
pub fn serialize(document: &Document) -> String {
    let mut out = String::new();
    if let Some(front_matter) = &document.front_matter {
        out.push_str("---\n");
        out.push_str(&front_matter.to_source());
        out.push_str("---\n");
        if !document.blocks.is_empty() {
            out.push('\n');
        }
    }

    out.push_str(&blocks_to_markdown(&document.blocks));
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn blocks_to_markdown(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Block> = None;

    for block in blocks {
        if let Some(previous) = previous {
            // List items interrupt paragraphs, so lists stay tight.
            let tight = matches!(block, Block::ListItem(_))
                && matches!(previous, Block::ListItem(_) | Block::Paragraph(_));
            out.push_str(if tight { "\n" } else { "\n\n" });
        }
        out.push_str(&block_to_markdown(block));
        previous = Some(block);
    }

    out
}

fn block_to_markdown(block: &Block) -> String {
    match block {
        Block::Heading(heading) => heading_to_markdown(heading),
        Block::Paragraph(paragraph) => inlines_to_markdown(&paragraph.content, InlineContext::Flow),
        Block::BlockQuote(quote) => prefix_lines(&blocks_to_markdown(&quote.children), ">", " "),
        Block::Callout(callout) => callout_to_markdown(callout),
        Block::CodeFence(code) => code_to_markdown(code),
        Block::ListItem(item) => list_item_to_markdown(item),
        Block::Table(table) => table_to_markdown(table),
        Block::Rule => "---".to_string(),
    }
}

fn heading_to_markdown(heading: &Heading) -> String {
    let mut out = "#".repeat(heading.level.get() as usize);
    let text = inlines_to_markdown(&heading.content, InlineContext::Heading);
    if !text.is_empty() {
        out.push(' ');
        out.push_str(&text);
    }
    if let Some(anchor) = &heading.anchor {
        out.push_str(&format!(" {{#{anchor}}}"));
    }
    out
}

fn callout_to_markdown(callout: &Callout) -> String {
    let mut out = format!(":::{}", callout.kind.keyword());
    if let Some(title) = &callout.title {
        out.push(' ');
        out.push_str(title);
    }
    out.push('\n');
    let body = blocks_to_markdown(&callout.children);
    if !body.is_empty() {
        out.push_str(&body);
        out.push('\n');
    }
    out.push_str(":::");
    out
}

fn code_to_markdown(code: &CodeFence) -> String {
    let fence = "`".repeat(longest_run(&code.text, '`').max(2) + 1);
    format!(
        "{fence}{}\n{}\n{fence}",
        code.language.as_deref().unwrap_or_default(),
        code.text
    )
}

fn list_item_to_markdown(item: &ListItem) -> String {
    let marker = if item.ordered { "1." } else { "-" };
    let body = blocks_to_markdown(&item.children);
    if body.is_empty() {
        return marker.to_string();
    }

    let indent = " ".repeat(marker.len() + 1);
    let mut out = String::new();
    for (index, line) in body.split('\n').enumerate() {
        if index == 0 {
            out.push_str(marker);
            out.push(' ');
        } else {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
            }
        }
        out.push_str(line);
    }
    out
}

fn table_to_markdown(table: &Table) -> String {
    let row = |cells: &[TableCell]| {
        let cells: Vec<String> = cells
            .iter()
            .map(|cell| inlines_to_markdown(&cell.content, InlineContext::Cell))
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = vec![
        row(&table.header),
        format!("|{}", " --- |".repeat(table.header.len().max(1))),
    ];
    lines.extend(table.rows.iter().map(|cells| row(cells)));
    lines.join("\n")
}

/// Prefixes every line, leaving blank lines with only the bare marker.
fn prefix_lines(text: &str, marker: &str, separator: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                marker.to_string()
            } else {
                format!("{marker}{separator}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineContext {
    /// Paragraph text; line breaks are kept.
    Flow,
    /// Single line; every `#` is escaped so no closing sequence or anchor
    /// attribute can be mistaken.
    Heading,
    /// Single line inside a pipe row.
    Cell,
}

fn inlines_to_markdown(runs: &[InlineRun], context: InlineContext) -> String {
    let mut writer = InlineWriter {
        out: String::new(),
        line_start: true,
        context,
    };
    writer.runs(runs);
    writer.out
}

struct InlineWriter {
    out: String,
    line_start: bool,
    context: InlineContext,
}

impl InlineWriter {
    fn runs(&mut self, runs: &[InlineRun]) {
        for run in runs {
            match run {
                InlineRun::Text(text) => self.text(text),
                InlineRun::Bold(children) => self.wrapped("**", children),
                InlineRun::Italic(children) => self.wrapped("*", children),
                InlineRun::Code(code) if !code.is_empty() => {
                    self.out.push_str(&code_span(code));
                    self.line_start = false;
                }
                InlineRun::Code(_) => {}
                InlineRun::Link { text, url } => {
                    self.out.push('[');
                    self.out.push_str(&escape_inline(&self.single_line(text), self.context));
                    self.out.push_str("](");
                    self.out.push_str(&link_destination(url));
                    self.out.push(')');
                    self.line_start = false;
                }
            }
        }
    }

    fn wrapped(&mut self, delimiter: &str, children: &[InlineRun]) {
        if children.is_empty() {
            return;
        }
        self.out.push_str(delimiter);
        self.line_start = false;
        self.runs(children);
        self.out.push_str(delimiter);
    }

    fn text(&mut self, text: &str) {
        let text = self.single_line(text);
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.out.push('\n');
                self.line_start = true;
            }
            let escaped = escape_inline(line, self.context);
            if self.line_start && !escaped.is_empty() {
                self.out.push_str(&escape_line_start(&escaped));
            } else {
                self.out.push_str(&escaped);
            }
            if !line.is_empty() {
                self.line_start = false;
            }
        }
    }

    fn single_line(&self, text: &str) -> String {
        match self.context {
            InlineContext::Flow => text.to_string(),
            InlineContext::Heading | InlineContext::Cell => text.replace('\n', " "),
        }
    }
}

fn escape_inline(text: &str, context: InlineContext) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, c) in text.char_indices() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '|' => {
                out.push('\\');
                out.push(c);
            }
            '#' if context == InlineContext::Heading => out.push_str("\\#"),
            '&' if looks_like_entity(&text[index + 1..]) => out.push_str("\\&"),
            c => out.push(c),
        }
    }
    out
}

/// `&amp;`, `&#123;` and `&#x1F;` would be decoded on the way back in.
fn looks_like_entity(after_ampersand: &str) -> bool {
    let name_len = after_ampersand
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '#')
        .count();
    name_len > 0 && after_ampersand[name_len..].starts_with(';')
}

/// Escapes characters that would open a block at the start of a line.
fn escape_line_start(line: &str) -> String {
    let Some(first) = line.chars().next() else {
        return String::new();
    };
    let rest = &line[first.len_utf8()..];
    let followed_by_space = rest.chars().next().map_or(true, char::is_whitespace);

    let escape_first = match first {
        '#' | '>' => true,
        '-' => followed_by_space || rest.chars().all(|c| c == '-' || c == ' '),
        '+' => followed_by_space,
        '=' => rest.chars().all(|c| c == '='),
        '~' => rest.starts_with("~~"),
        ':' => rest.starts_with("::"),
        _ => false,
    };
    if escape_first {
        return format!("\\{line}");
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && matches!(line[digits..].chars().next(), Some('.' | ')')) {
        return format!("{}\\{}", &line[..digits], &line[digits..]);
    }
    line.to_string()
}

fn code_span(code: &str) -> String {
    let fence = "`".repeat(longest_run(code, '`') + 1);
    let pad = code.starts_with('`')
        || code.ends_with('`')
        || (code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty());
    if pad {
        format!("{fence} {code} {fence}")
    } else {
        format!("{fence}{code}{fence}")
    }
}

fn link_destination(url: &str) -> String {
    if url.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{}>", url.replace('<', "%3C").replace('>', "%3E"))
    } else {
        url.to_string()
    }
}

fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
