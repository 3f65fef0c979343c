//! Inline tokenization
//!
//! Runs comrak's CommonMark inline rules over text that the block parser has
//! already segmented. Images, raw HTML and anything else without an
//! [`InlineRun`] counterpart stay in the output as literal text.

use super::parser::{code_fence_open, is_rule};
use crate::ir::nodes::{normalize_inlines, plain_text, InlineRun};
use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, ComrakOptions};

/// Tokenizes the text of one paragraph, heading or table cell.
pub fn tokenize(text: &str) -> Vec<InlineRun> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let guarded = text.split('\n').map(guard_line).collect::<Vec<_>>().join("\n");
    let arena = Arena::new();
    let root = parse_document(&arena, &guarded, &ComrakOptions::default());

    let mut runs = Vec::new();
    for (index, child) in root.children().enumerate() {
        if index > 0 {
            runs.push(InlineRun::text("\n"));
        }
        collect(child, &mut runs);
    }
    normalize_inlines(runs)
}

/// Escapes the first character of a line that comrak would otherwise read as
/// block syntax. Block structure has already been decided by the time text
/// gets here.
fn guard_line(line: &str) -> String {
    let text = line.trim_start();
    let lead = &line[..line.len() - text.len()];

    if opens_block(text) {
        return format!("{lead}\\{text}");
    }
    if let Some(digits) = ordered_marker_digits(text) {
        return format!("{lead}{}\\{}", &text[..digits], &text[digits..]);
    }
    line.to_string()
}

fn opens_block(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };
    let followed_by_space = || text[1..].chars().next().map_or(true, char::is_whitespace);
    match first {
        '#' => {
            let depth = text.chars().take_while(|c| *c == '#').count();
            depth <= 6 && text[depth..].chars().next().map_or(true, char::is_whitespace)
        }
        '>' => true,
        '-' => followed_by_space() || text.trim_end().chars().all(|c| c == '-') || is_rule(text),
        '+' => followed_by_space(),
        '*' | '_' => is_rule(text) || (first == '*' && followed_by_space()),
        '=' => text.trim_end().chars().all(|c| c == '='),
        '`' | '~' => code_fence_open(text).is_some(),
        '[' => text.contains("]:"),
        _ => false,
    }
}

/// Byte length of a leading `1.` / `1)` number when it would start a list.
fn ordered_marker_digits(text: &str) -> Option<usize> {
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let mut rest = text[digits..].chars();
    if !matches!(rest.next(), Some('.' | ')')) {
        return None;
    }
    rest.next().map_or(true, char::is_whitespace).then_some(digits)
}

fn collect<'a>(node: &'a AstNode<'a>, out: &mut Vec<InlineRun>) {
    let data = node.data.borrow();
    match &data.value {
        NodeValue::Text(text) => out.push(InlineRun::Text(text.clone())),
        NodeValue::SoftBreak | NodeValue::LineBreak => out.push(InlineRun::text("\n")),
        NodeValue::Code(code) => out.push(InlineRun::Code(code.literal.clone())),
        NodeValue::Strong => out.push(InlineRun::Bold(collect_children(node))),
        NodeValue::Emph => out.push(InlineRun::Italic(collect_children(node))),
        NodeValue::Link(link) => out.push(InlineRun::Link {
            text: plain_text(&collect_children(node)),
            url: link.url.clone(),
        }),
        NodeValue::Image(link) => out.push(InlineRun::Text(format!(
            "![{}]({})",
            plain_text(&collect_children(node)),
            link.url
        ))),
        NodeValue::HtmlInline(html) => out.push(InlineRun::Text(html.clone())),
        NodeValue::HtmlBlock(html) => {
            out.push(InlineRun::Text(html.literal.trim_end().to_string()))
        }
        NodeValue::CodeBlock(code) => {
            out.push(InlineRun::Text(code.literal.trim_end().to_string()))
        }
        _ => {
            for child in node.children() {
                collect(child, out);
            }
        }
    }
}

fn collect_children<'a>(node: &'a AstNode<'a>) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    for child in node.children() {
        collect(child, &mut runs);
    }
    runs
}
