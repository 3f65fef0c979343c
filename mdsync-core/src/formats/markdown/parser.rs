//! Markdown parsing (text → document tree)
//!
//! Block structure is segmented line by line here. Inline styling is handed to
//! [`super::inlines`] once the text of a paragraph, heading or table cell is
//! known. Parsing is total: anything that does not form a valid construct is
//! read as paragraph text and recorded as a [`ParseDegradation`].

use super::inlines;
use crate::common::callouts::{self, FenceHeader, MacroSource};
use crate::error::{DegradationKind, ParseDegradation};
use crate::ir::frontmatter::FrontMatter;
use crate::ir::nodes::{
    Block, CodeFence, Document, Heading, HeadingLevel, ListItem, Paragraph, Table, TableCell,
};
use tracing::debug;

/// Deepest container nesting (quotes, callouts, list items) kept as structure.
/// Anything deeper is read as paragraph text.
pub const MAX_NESTING: usize = 64;

/// Parses a document, logging every degradation at `debug`.
pub fn parse(source: &str) -> Document {
    let (document, degradations) = parse_with_report(source);
    for degradation in &degradations {
        debug!(%degradation, "degraded markdown construct");
    }
    document
}

/// Parses a document and returns the degradations alongside it.
pub fn parse_with_report(source: &str) -> (Document, Vec<ParseDegradation>) {
    let lines: Vec<Line> = source
        .lines()
        .enumerate()
        .map(|(index, text)| Line {
            number: index + 1,
            text: text.to_string(),
        })
        .collect();

    let mut parser = BlockParser::default();
    let (front_matter, body) = parser.front_matter(&lines);
    let blocks = parser.blocks(body, false);
    (
        Document {
            front_matter,
            blocks,
        },
        parser.degradations,
    )
}

#[derive(Debug, Clone)]
struct Line {
    number: usize,
    text: String,
}

impl Line {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// What a line opens, if it opens anything.
#[derive(Debug, Clone, PartialEq)]
enum Start {
    Heading,
    CodeFence(FenceMarker),
    CalloutOpen,
    CalloutClose,
    Quote,
    Rule,
    ListItem(ListMarker),
    Table,
}

#[derive(Debug, Default)]
struct BlockParser {
    degradations: Vec<ParseDegradation>,
    /// Containers open around the lines being parsed.
    depth: usize,
}

impl BlockParser {
    fn degrade(&mut self, line: usize, kind: DegradationKind) {
        self.degradations.push(ParseDegradation { line, kind });
    }

    fn nested(&mut self, lines: &[Line], in_fence: bool) -> Vec<Block> {
        self.depth += 1;
        let blocks = self.blocks(lines, in_fence);
        self.depth -= 1;
        blocks
    }

    /// Reads a container past [`MAX_NESTING`] as one literal paragraph.
    fn too_deep(&mut self, lines: &[Line]) -> Option<Block> {
        self.degrade(lines[0].number, DegradationKind::NestingTooDeep(MAX_NESTING));
        let text = lines
            .iter()
            .filter(|line| !line.is_blank())
            .map(|line| line.text.trim())
            .collect::<Vec<_>>()
            .join("\n");
        let content = inlines::tokenize(&text);
        (!content.is_empty()).then(|| Block::Paragraph(Paragraph { content }))
    }

    /// Splits off a `---` preamble when it is the first non-blank line.
    fn front_matter<'l>(&mut self, lines: &'l [Line]) -> (Option<FrontMatter>, &'l [Line]) {
        let Some(start) = lines.iter().position(|line| !line.is_blank()) else {
            return (None, lines);
        };
        if lines[start].text.trim_end() != "---" {
            return (None, lines);
        }

        let close = lines[start + 1..]
            .iter()
            .position(|line| matches!(line.text.trim_end(), "---" | "..."));
        match close {
            Some(offset) => {
                let end = start + 1 + offset;
                let source: String = lines[start + 1..end]
                    .iter()
                    .map(|line| format!("{}\n", line.text))
                    .collect();
                (Some(FrontMatter::parse(&source)), &lines[end + 1..])
            }
            None => {
                self.degrade(lines[start].number, DegradationKind::UnterminatedFrontMatter);
                (None, lines)
            }
        }
    }

    fn blocks(&mut self, lines: &[Line], in_fence: bool) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pos = 0;

        while pos < lines.len() {
            if lines[pos].is_blank() {
                pos += 1;
                continue;
            }

            let (block, next) = match block_start(lines, pos) {
                Some(Start::Heading) => (heading(&lines[pos].text), pos + 1),
                Some(Start::CodeFence(marker)) => self.code_fence(lines, pos, &marker),
                Some(Start::CalloutOpen) => self.callout(lines, pos),
                Some(Start::Quote) => self.quote(lines, pos, in_fence),
                Some(Start::Rule) => (Some(Block::Rule), pos + 1),
                Some(Start::ListItem(marker)) => self.list_item(lines, pos, &marker, in_fence),
                Some(Start::Table) => self.table(lines, pos),
                Some(Start::CalloutClose) => {
                    self.degrade(lines[pos].number, DegradationKind::StrayFenceClose);
                    self.paragraph(lines, pos)
                }
                None => self.paragraph(lines, pos),
            };

            blocks.extend(block);
            pos = next;
        }

        blocks
    }

    fn code_fence(&mut self, lines: &[Line], pos: usize, marker: &FenceMarker) -> (Option<Block>, usize) {
        let close = lines[pos + 1..]
            .iter()
            .position(|line| marker.closes(&line.text))
            .map(|offset| pos + 1 + offset);
        let end = close.unwrap_or_else(|| {
            self.degrade(lines[pos].number, DegradationKind::UnterminatedCodeFence);
            lines.len()
        });

        let text = lines[pos + 1..end]
            .iter()
            .map(|line| strip_columns(&line.text, marker.indent))
            .collect::<Vec<_>>()
            .join("\n");
        let language = marker
            .info
            .split_whitespace()
            .next()
            .map(str::to_string);

        let next = close.map_or(lines.len(), |close| close + 1);
        (Some(Block::CodeFence(CodeFence { language, text })), next)
    }

    fn callout(&mut self, lines: &[Line], pos: usize) -> (Option<Block>, usize) {
        let close = callout_close(lines, pos);
        let next = close.map_or(lines.len(), |close| close + 1);
        if self.depth >= MAX_NESTING {
            return (self.too_deep(&lines[pos..next]), next);
        }

        let info = lines[pos]
            .text
            .trim()
            .strip_prefix(":::")
            .unwrap_or_default()
            .to_string();

        let header = FenceHeader::parse(&info);
        if !header.recognized {
            let keyword = info.split_whitespace().next().unwrap_or_default();
            self.degrade(
                lines[pos].number,
                DegradationKind::UnknownCalloutKind(keyword.to_string()),
            );
        }

        let end = close.unwrap_or_else(|| {
            self.degrade(lines[pos].number, DegradationKind::UnterminatedCallout);
            lines.len()
        });

        let children = self.nested(&lines[pos + 1..end], true);
        let callout = callouts::classify(MacroSource::Fence { info, children });
        (Some(Block::Callout(callout)), next)
    }

    fn quote(&mut self, lines: &[Line], pos: usize, in_fence: bool) -> (Option<Block>, usize) {
        let end = lines[pos..]
            .iter()
            .position(|line| !line.text.trim_start().starts_with('>'))
            .map_or(lines.len(), |offset| pos + offset);
        if self.depth >= MAX_NESTING {
            return (self.too_deep(&lines[pos..end]), end);
        }

        let inner: Vec<Line> = lines[pos..end]
            .iter()
            .map(|line| Line {
                number: line.number,
                text: strip_quote_marker(&line.text),
            })
            .collect();
        let children = self.nested(&inner, in_fence);

        let block = if in_fence {
            Block::BlockQuote(crate::ir::nodes::BlockQuote { children })
        } else {
            Block::Callout(callouts::classify(MacroSource::Quote { children }))
        };
        (Some(block), end)
    }

    fn list_item(
        &mut self,
        lines: &[Line],
        pos: usize,
        marker: &ListMarker,
        in_fence: bool,
    ) -> (Option<Block>, usize) {
        let mut item_lines = vec![Line {
            number: lines[pos].number,
            text: marker.rest.clone(),
        }];
        let mut next = pos + 1;

        while next < lines.len() {
            let line = &lines[next];

            if line.is_blank() {
                // The item only continues past blank lines into indented content.
                let resume = lines[next..]
                    .iter()
                    .position(|line| !line.is_blank())
                    .map(|offset| next + offset);
                match resume {
                    Some(resume) if indent_columns(&lines[resume].text) >= marker.content_column => {
                        item_lines.extend(lines[next..resume].iter().map(|blank| Line {
                            number: blank.number,
                            text: String::new(),
                        }));
                        next = resume;
                        continue;
                    }
                    _ => break,
                }
            }

            if indent_columns(&line.text) >= marker.content_column {
                item_lines.push(Line {
                    number: line.number,
                    text: strip_columns(&line.text, marker.content_column),
                });
                next += 1;
                continue;
            }

            let continues_paragraph = item_lines.last().is_some_and(|last| !last.is_blank());
            if continues_paragraph && block_start(lines, next).is_none() {
                item_lines.push(Line {
                    number: line.number,
                    text: line.text.trim().to_string(),
                });
                next += 1;
                continue;
            }
            break;
        }

        if self.depth >= MAX_NESTING {
            return (self.too_deep(&lines[pos..next]), next);
        }

        let children = self.nested(&item_lines, in_fence);
        let item = ListItem {
            ordered: marker.ordered,
            children,
        };
        (Some(Block::ListItem(item)), next)
    }

    fn table(&mut self, lines: &[Line], pos: usize) -> (Option<Block>, usize) {
        let header: Vec<TableCell> = split_row(&lines[pos].text)
            .iter()
            .map(|cell| cell_from_text(cell))
            .collect();
        let width = header.len();

        let mut rows = Vec::new();
        let mut next = pos + 2;
        while next < lines.len() && !lines[next].is_blank() && lines[next].text.contains('|') {
            let mut row: Vec<TableCell> = split_row(&lines[next].text)
                .iter()
                .map(|cell| cell_from_text(cell))
                .collect();
            if row.len() != width {
                self.degrade(
                    lines[next].number,
                    DegradationKind::RaggedTableRow {
                        expected: width,
                        found: row.len(),
                    },
                );
                row.resize_with(width, || TableCell { content: Vec::new() });
            }
            rows.push(row);
            next += 1;
        }

        (Some(Block::Table(Table { header, rows })), next)
    }

    fn paragraph(&mut self, lines: &[Line], pos: usize) -> (Option<Block>, usize) {
        let mut end = pos + 1;
        while end < lines.len() && !lines[end].is_blank() && block_start(lines, end).is_none() {
            end += 1;
        }

        if lines[pos].text.trim_start().starts_with('|') {
            self.degrade(lines[pos].number, DegradationKind::TableWithoutSeparator);
        }
        for line in &lines[pos..end] {
            if let Some(depth) = atx_depth(line.text.trim()).filter(|depth| *depth > HeadingLevel::MAX as usize) {
                self.degrade(line.number, DegradationKind::HeadingTooDeep(depth));
            }
        }

        let text = lines[pos..end]
            .iter()
            .map(|line| line.text.trim())
            .collect::<Vec<_>>()
            .join("\n");
        let content = inlines::tokenize(&text);
        let block = (!content.is_empty()).then(|| Block::Paragraph(Paragraph { content }));
        (block, end)
    }
}

fn block_start(lines: &[Line], pos: usize) -> Option<Start> {
    let line = &lines[pos].text;
    let text = line.trim();

    if atx_depth(text).is_some_and(|depth| depth <= HeadingLevel::MAX as usize) {
        return Some(Start::Heading);
    }
    if let Some(marker) = code_fence_open(line) {
        return Some(Start::CodeFence(marker));
    }
    if let Some(info) = text.strip_prefix(":::") {
        return Some(if info.trim().is_empty() {
            Start::CalloutClose
        } else {
            Start::CalloutOpen
        });
    }
    if text.starts_with('>') {
        return Some(Start::Quote);
    }
    if is_rule(text) {
        return Some(Start::Rule);
    }
    if let Some(marker) = list_marker(line) {
        return Some(Start::ListItem(marker));
    }
    if is_table_start(lines, pos) {
        return Some(Start::Table);
    }
    None
}

/// Number of leading `#` when followed by whitespace or end of line.
fn atx_depth(text: &str) -> Option<usize> {
    let depth = text.chars().take_while(|c| *c == '#').count();
    if depth == 0 {
        return None;
    }
    text[depth..]
        .chars()
        .next()
        .map_or(true, char::is_whitespace)
        .then_some(depth)
}

fn heading(line: &str) -> Option<Block> {
    let text = line.trim();
    let depth = atx_depth(text)?;
    let level = HeadingLevel::new(u8::try_from(depth).ok()?)?;
    let mut rest = text[depth..].trim();

    // Optional closing sequence: a run of `#` preceded by a space, or nothing else.
    let without_closing = rest.trim_end_matches('#');
    if without_closing.len() != rest.len()
        && (without_closing.is_empty() || without_closing.ends_with(char::is_whitespace))
    {
        rest = without_closing.trim_end();
    }

    let (rest, anchor) = split_anchor_attribute(rest);
    let mut heading = Heading::new(level, inlines::tokenize(rest));
    heading.anchor = anchor;
    Some(Block::Heading(heading))
}

/// Splits a trailing `{#anchor}` attribute off heading text.
fn split_anchor_attribute(text: &str) -> (&str, Option<String>) {
    let Some(body) = text.strip_suffix('}') else {
        return (text, None);
    };
    let Some(open) = body.rfind("{#") else {
        return (text, None);
    };
    let id = &body[open + 2..];
    if id.is_empty() || id.contains(|c: char| c.is_whitespace() || c == '{' || c == '}') {
        return (text, None);
    }
    (body[..open].trim_end(), Some(id.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct FenceMarker {
    ch: char,
    len: usize,
    indent: usize,
    info: String,
}

impl FenceMarker {
    fn closes(&self, line: &str) -> bool {
        let text = line.trim();
        let run = text.chars().take_while(|c| *c == self.ch).count();
        run >= self.len && run == text.len()
    }
}

pub(super) fn code_fence_open(line: &str) -> Option<FenceMarker> {
    let text = line.trim_start();
    let ch = text.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = text.chars().take_while(|c| *c == ch).count();
    if len < 3 {
        return None;
    }
    let info = text[len..].trim();
    if ch == '`' && info.contains('`') {
        return None;
    }
    Some(FenceMarker {
        ch,
        len,
        indent: indent_columns(line),
        info: info.to_string(),
    })
}

/// Finds the `:::` that closes the callout opened at `pos`, honoring nested
/// callouts and skipping over code fences.
fn callout_close(lines: &[Line], pos: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut code: Option<FenceMarker> = None;

    for (index, line) in lines.iter().enumerate().skip(pos + 1) {
        if let Some(marker) = &code {
            if marker.closes(&line.text) {
                code = None;
            }
            continue;
        }
        if let Some(marker) = code_fence_open(&line.text) {
            code = Some(marker);
            continue;
        }
        if let Some(info) = line.text.trim().strip_prefix(":::") {
            if !info.trim().is_empty() {
                depth += 1;
            } else if depth == 0 {
                return Some(index);
            } else {
                depth -= 1;
            }
        }
    }
    None
}

fn strip_quote_marker(line: &str) -> String {
    let text = line.trim_start();
    let text = text.strip_prefix('>').unwrap_or(text);
    text.strip_prefix([' ', '\t']).unwrap_or(text).to_string()
}

/// Thematic break: three or more of the same `-`, `*` or `_`, spaces allowed.
pub(super) fn is_rule(text: &str) -> bool {
    let mut marks = text.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for mark in marks {
        if mark != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ListMarker {
    ordered: bool,
    /// Column where the item's content starts; continuation lines must reach it.
    content_column: usize,
    rest: String,
}

pub(super) fn list_marker(line: &str) -> Option<ListMarker> {
    let indent = indent_columns(line);
    let text = line.trim_start();

    let (ordered, marker_len) = match text.chars().next()? {
        '-' | '*' | '+' => (false, 1),
        c if c.is_ascii_digit() => {
            let digits = text.chars().take_while(char::is_ascii_digit).count();
            if digits > 9 || !matches!(text[digits..].chars().next(), Some('.' | ')')) {
                return None;
            }
            (true, digits + 1)
        }
        _ => return None,
    };

    let after = &text[marker_len..];
    if after.trim().is_empty() {
        return Some(ListMarker {
            ordered,
            content_column: indent + marker_len + 1,
            rest: String::new(),
        });
    }
    if !after.starts_with([' ', '\t']) {
        return None;
    }

    let spaces = after.chars().take_while(|c| *c == ' ' || *c == '\t').count();
    let (padding, rest) = if spaces > 4 {
        (1, &after[1..])
    } else {
        (spaces, &after[spaces..])
    };
    Some(ListMarker {
        ordered,
        content_column: indent + marker_len + padding,
        rest: rest.to_string(),
    })
}

fn is_table_start(lines: &[Line], pos: usize) -> bool {
    let header = &lines[pos].text;
    if !header.contains('|') {
        return false;
    }
    let Some(separator) = lines.get(pos + 1) else {
        return false;
    };
    let width = split_row(header).len();
    separator_width(&separator.text) == Some(width)
}

/// Number of columns in a `| --- | :-: |` row, if it is one.
fn separator_width(line: &str) -> Option<usize> {
    if !line.contains('-') {
        return None;
    }
    let cells = split_row(line);
    cells
        .iter()
        .all(|cell| {
            let dashes = cell.trim_start_matches(':').trim_end_matches(':');
            !dashes.is_empty() && dashes.chars().all(|c| c == '-')
        })
        .then_some(cells.len())
}

/// Splits a pipe row into cell texts. `\|` stays inside its cell as `|`.
fn split_row(line: &str) -> Vec<String> {
    let mut text = line.trim();
    text = text.strip_prefix('|').unwrap_or(text);
    if text.ends_with('|') && !text.ends_with("\\|") {
        text = &text[..text.len() - 1];
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            c => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

fn cell_from_text(text: &str) -> TableCell {
    TableCell {
        content: inlines::tokenize(text),
    }
}

/// Width of leading whitespace, tabs advancing to the next multiple of four.
fn indent_columns(line: &str) -> usize {
    let mut columns = 0;
    for c in line.chars() {
        match c {
            ' ' => columns += 1,
            '\t' => columns += 4 - columns % 4,
            _ => break,
        }
    }
    columns
}

/// Removes up to `columns` columns of leading whitespace.
fn strip_columns(line: &str, columns: usize) -> String {
    let mut seen = 0;
    for (index, c) in line.char_indices() {
        if seen >= columns {
            return line[index..].to_string();
        }
        match c {
            ' ' => seen += 1,
            '\t' => {
                let width = 4 - seen % 4;
                if seen + width > columns {
                    // Split tab: keep the overhang as spaces.
                    let overhang = seen + width - columns;
                    return format!("{}{}", " ".repeat(overhang), &line[index + 1..]);
                }
                seen += width;
            }
            _ => return line[index..].to_string(),
        }
    }
    String::new()
}
