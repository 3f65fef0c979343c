//! Wiki storage-format parsing (XHTML fragment → document tree)

use super::{WikiPayload, ANCHOR_MACRO, CODE_MACRO, LANGUAGE_PARAMETER, TITLE_PARAMETER};
use crate::error::{Result, SyncError};
use crate::ir::frontmatter::{FrontMatter, FrontMatterKey};
use crate::ir::nodes::{
    normalize_inlines, plain_text, Block, BlockQuote, Callout, CalloutKind, CodeFence, Document,
    Heading, HeadingLevel, InlineRun, ListItem, Paragraph, Table, TableCell,
};
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::Node;
use tracing::debug;

const AC_NAMESPACE: &str = "http://atlassian.com/content";
const RI_NAMESPACE: &str = "http://atlassian.com/resource/identifier";

static NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("static pattern"));

pub fn parse(payload: &WikiPayload) -> Result<Document> {
    let source = format!(
        "<root xmlns:ac=\"{AC_NAMESPACE}\" xmlns:ri=\"{RI_NAMESPACE}\">{}</root>",
        numeric_entities(&payload.storage)
    );
    let xml = roxmltree::Document::parse(&source)
        .map_err(|err| SyncError::MalformedPayload(format!("storage format: {err}")))?;

    let front_matter = payload.title.as_ref().map(|title| {
        let mut front_matter = FrontMatter::new();
        front_matter.set_key(FrontMatterKey::Title, title);
        front_matter
    });
    Ok(Document {
        front_matter,
        blocks: flow(xml.root_element()),
    })
}

/// Rewrites HTML named entities that XML does not predefine.
fn numeric_entities(storage: &str) -> String {
    NAMED_ENTITY
        .replace_all(storage, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match name {
                "amp" | "lt" | "gt" | "quot" | "apos" => caps[0].to_string(),
                _ => match html_entity(name) {
                    Some(code) => format!("&#{code};"),
                    // Unknown entities stay visible as text.
                    None => format!("&amp;{name};"),
                },
            }
        })
        .into_owned()
}

fn html_entity(name: &str) -> Option<u32> {
    Some(match name {
        "nbsp" => 160,
        "copy" => 169,
        "reg" => 174,
        "laquo" => 171,
        "raquo" => 187,
        "middot" => 183,
        "ndash" => 8211,
        "mdash" => 8212,
        "lsquo" => 8216,
        "rsquo" => 8217,
        "ldquo" => 8220,
        "rdquo" => 8221,
        "bull" => 8226,
        "hellip" => 8230,
        "trade" => 8482,
        _ => return None,
    })
}

fn is_ac(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(AC_NAMESPACE)
        && node.tag_name().name() == name
}

fn ac_attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((AC_NAMESPACE, name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, ac_name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_ac(*c, ac_name))
}

fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Text of the macro parameter named `name`.
fn parameter(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|c| is_ac(*c, "parameter") && ac_attribute(*c, "name") == Some(name))
        .map(text_content)
}

/// Reads children of `node` as blocks, wrapping loose inline content in paragraphs.
fn flow(node: Node<'_, '_>) -> Vec<Block> {
    let mut builder = FlowBuilder::default();
    for child in node.children() {
        builder.node(child);
    }
    builder.finish()
}

#[derive(Default)]
struct FlowBuilder {
    blocks: Vec<Block>,
    pending: Vec<InlineRun>,
}

impl FlowBuilder {
    fn node(&mut self, node: Node<'_, '_>) {
        if node.is_text() {
            let text = node.text().unwrap_or_default();
            if !(self.pending.is_empty() && text.trim().is_empty()) {
                self.pending.push(InlineRun::text(text));
            }
            return;
        }
        if !node.is_element() {
            return;
        }

        if let Some(block) = block_element(node) {
            self.flush();
            self.blocks.extend(block);
        } else if contains_blocks(node) {
            self.flush();
            for child in node.children() {
                self.node(child);
            }
        } else {
            inline_node(node, &mut self.pending);
        }
    }

    fn flush(&mut self) {
        let content = normalize_inlines(std::mem::take(&mut self.pending));
        if !plain_text(&content).trim().is_empty() {
            self.blocks.push(Block::Paragraph(Paragraph { content }));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

fn is_block_name(node: Node<'_, '_>) -> bool {
    if !node.is_element() {
        return false;
    }
    if node.tag_name().namespace() == Some(AC_NAMESPACE) {
        return node.tag_name().name() == "structured-macro"
            && child(node, "rich-text-body").is_some();
    }
    matches!(
        node.tag_name().name(),
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "table"
            | "blockquote"
            | "hr"
            | "pre"
            | "div"
    )
}

fn contains_blocks(node: Node<'_, '_>) -> bool {
    node.descendants().skip(1).any(is_block_name)
}

/// Converts a block-level element. `None` means the element is not block-level.
fn block_element(node: Node<'_, '_>) -> Option<Vec<Block>> {
    if is_ac(node, "structured-macro") {
        return structured_macro(node);
    }
    if node.tag_name().namespace().is_some() {
        return None;
    }

    let name = node.tag_name().name();
    let block = match name {
        "p" => Block::Paragraph(Paragraph {
            content: inline_content(node),
        }),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => heading(node, name),
        "ul" | "ol" => return Some(list(node, name == "ol")),
        "table" => Block::Table(table(node)),
        "hr" => Block::Rule,
        "blockquote" => Block::BlockQuote(BlockQuote {
            children: flow(node),
        }),
        "pre" => Block::CodeFence(CodeFence {
            language: None,
            text: text_content(node),
        }),
        _ => return None,
    };
    Some(vec![block])
}

fn heading(node: Node<'_, '_>, name: &str) -> Block {
    let level = name[1..]
        .parse::<usize>()
        .map(HeadingLevel::clamped)
        .unwrap_or(HeadingLevel::TOP);

    let mut anchor = None;
    let mut content = Vec::new();
    for child in node.children() {
        let is_anchor = is_ac(child, "structured-macro")
            && ac_attribute(child, "name") == Some(ANCHOR_MACRO);
        if is_anchor && anchor.is_none() {
            anchor = child
                .children()
                .find(|c| is_ac(*c, "parameter"))
                .map(text_content)
                .filter(|id| !id.is_empty());
        } else if is_anchor {
            debug!("extra anchor macro in heading ignored");
        } else {
            inline_node(child, &mut content);
        }
    }

    let mut heading = Heading::new(level, normalize_inlines(content));
    heading.anchor = anchor;
    Block::Heading(heading)
}

fn list(node: Node<'_, '_>, ordered: bool) -> Vec<Block> {
    let mut blocks = Vec::new();
    for child in node.children().filter(|c| c.is_element()) {
        if child.tag_name().name() == "li" && child.tag_name().namespace().is_none() {
            blocks.push(Block::ListItem(ListItem {
                ordered,
                children: flow(child),
            }));
        } else {
            blocks.extend(flow(child));
        }
    }
    blocks
}

fn table(node: Node<'_, '_>) -> Table {
    let rows: Vec<Vec<TableCell>> = node
        .children()
        .filter(|c| c.is_element())
        .flat_map(|section| match section.tag_name().name() {
            "tr" => vec![section],
            "thead" | "tbody" | "tfoot" => section
                .children()
                .filter(|row| row.is_element() && row.tag_name().name() == "tr")
                .collect(),
            _ => Vec::new(),
        })
        .map(|row| {
            row.children()
                .filter(|cell| cell.is_element() && matches!(cell.tag_name().name(), "th" | "td"))
                .map(|cell| TableCell {
                    content: inline_content(cell),
                })
                .collect()
        })
        .collect();

    let mut rows = rows.into_iter();
    Table {
        header: rows.next().unwrap_or_default(),
        rows: rows.collect(),
    }
}

fn structured_macro(node: Node<'_, '_>) -> Option<Vec<Block>> {
    let name = ac_attribute(node, "name").unwrap_or_default();

    if let Some(kind) = CalloutKind::from_keyword(name) {
        let title = parameter(node, TITLE_PARAMETER).filter(|title| !title.is_empty());
        let children = child(node, "rich-text-body").map(flow).unwrap_or_default();
        return Some(vec![Block::Callout(Callout {
            kind,
            title,
            children,
        })]);
    }

    if name == CODE_MACRO || name == "noformat" {
        let language = parameter(node, LANGUAGE_PARAMETER).filter(|lang| !lang.is_empty());
        let text = child(node, "plain-text-body")
            .map(text_content)
            .unwrap_or_default();
        return Some(vec![Block::CodeFence(CodeFence { language, text })]);
    }

    if name == ANCHOR_MACRO {
        debug!("standalone anchor macro dropped");
        return Some(Vec::new());
    }

    debug!(name = %name, "unknown macro, keeping its body");
    if let Some(body) = child(node, "rich-text-body") {
        return Some(flow(body));
    }
    // Macros without a rich body read as inline text.
    None
}

fn inline_content(node: Node<'_, '_>) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    for child in node.children() {
        inline_node(child, &mut runs);
    }
    normalize_inlines(runs)
}

fn inline_node(node: Node<'_, '_>, out: &mut Vec<InlineRun>) {
    if node.is_text() {
        out.push(InlineRun::text(node.text().unwrap_or_default()));
        return;
    }
    if !node.is_element() {
        return;
    }

    if node.tag_name().namespace() == Some(AC_NAMESPACE) {
        ac_inline(node, out);
        return;
    }

    match node.tag_name().name() {
        "strong" | "b" => out.push(InlineRun::Bold(inline_content(node))),
        "em" | "i" => out.push(InlineRun::Italic(inline_content(node))),
        "code" | "tt" => out.push(InlineRun::Code(text_content(node))),
        "br" => out.push(InlineRun::text("\n")),
        "a" => match node.attribute("href") {
            Some(url) => out.push(InlineRun::link(text_content(node), url)),
            None => out.extend(inline_content(node)),
        },
        _ => out.extend(inline_content(node)),
    }
}

fn ac_inline(node: Node<'_, '_>, out: &mut Vec<InlineRun>) {
    match node.tag_name().name() {
        "link" => {
            let body = node
                .children()
                .find(|c| is_ac(*c, "plain-text-link-body") || is_ac(*c, "link-body"))
                .map(text_content);
            match ac_attribute(node, "anchor") {
                Some(anchor) => {
                    out.push(InlineRun::link(body.unwrap_or_default(), format!("#{anchor}")))
                }
                None => {
                    let page_title = node
                        .children()
                        .find(|c| c.tag_name().namespace() == Some(RI_NAMESPACE))
                        .and_then(|page| page.attribute((RI_NAMESPACE, "content-title")));
                    let text = body.or_else(|| page_title.map(str::to_string));
                    out.push(InlineRun::text(text.unwrap_or_default()));
                }
            }
        }
        "structured-macro" => {
            let body = child(node, "plain-text-body").or_else(|| child(node, "rich-text-body"));
            match body {
                Some(body) => out.push(InlineRun::text(text_content(body))),
                None => debug!(
                    name = ac_attribute(node, "name").unwrap_or_default(),
                    "inline macro without body dropped"
                ),
            }
        }
        "parameter" => {}
        other => {
            debug!(element = other, "unknown storage element, keeping its text");
            out.extend(inline_content(node));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::wiki::serializer::render_blocks;

    fn blocks(storage: &str) -> Vec<Block> {
        parse(&WikiPayload::new(storage))
            .map(|doc| doc.blocks)
            .unwrap_or_else(|err| panic!("parse failed: {err}"))
    }

    #[test]
    fn callout_macro_becomes_callout() {
        let parsed = blocks(
            "<ac:structured-macro ac:name=\"warning\"><ac:parameter ac:name=\"title\">Careful</ac:parameter><ac:rich-text-body><p>Do not skip this</p></ac:rich-text-body></ac:structured-macro>",
        );
        assert_eq!(
            parsed,
            vec![Block::Callout(Callout {
                kind: CalloutKind::Warning,
                title: Some("Careful".into()),
                children: vec![Block::text("Do not skip this")],
            })]
        );
    }

    #[test]
    fn unknown_macro_degrades_to_body() {
        let parsed = blocks(
            "<ac:structured-macro ac:name=\"expand\"><ac:parameter ac:name=\"title\">More</ac:parameter><ac:rich-text-body><p>Hidden text</p></ac:rich-text-body></ac:structured-macro>",
        );
        assert_eq!(parsed, vec![Block::text("Hidden text")]);
    }

    #[test]
    fn html_entities_are_understood() {
        let parsed = blocks("<p>a&nbsp;b &mdash; c &amp; d &bogus;</p>");
        assert_eq!(parsed, vec![Block::text("a\u{a0}b \u{2014} c & d &bogus;")]);
    }

    #[test]
    fn loose_text_in_list_items_becomes_paragraphs() {
        let parsed = blocks("<ul><li>one <strong>two</strong></li></ul>");
        assert_eq!(
            parsed,
            vec![Block::ListItem(ListItem {
                ordered: false,
                children: vec![Block::paragraph(vec![
                    InlineRun::text("one "),
                    InlineRun::Bold(vec![InlineRun::text("two")]),
                ])],
            })]
        );
    }

    #[test]
    fn malformed_storage_is_an_error() {
        let err = parse(&WikiPayload::new("<p>open")).unwrap_err();
        assert!(matches!(err, SyncError::MalformedPayload(_)));
    }

    #[test]
    fn rendered_blocks_read_back() {
        let source = vec![
            Block::Heading(Heading::with_text(HeadingLevel::TOP, "Intro").with_anchor("intro")),
            Block::paragraph(vec![
                InlineRun::text("see "),
                InlineRun::link("Intro", "#intro"),
                InlineRun::text("\nand "),
                InlineRun::Code("a < b".into()),
            ]),
            Block::CodeFence(CodeFence {
                language: Some("rust".into()),
                text: "fn main() {}\n// ]]>\n".into(),
            }),
            Block::Table(Table {
                header: vec![TableCell::text("k"), TableCell::text("v")],
                rows: vec![vec![TableCell::text("a"), TableCell::text("1")]],
            }),
            Block::Rule,
            Block::BlockQuote(BlockQuote {
                children: vec![Block::text("quoted")],
            }),
        ];
        assert_eq!(blocks(&render_blocks(&source)), source);
    }
}
