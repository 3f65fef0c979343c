//! Wiki storage-format rendering (document tree → XHTML fragment)

use super::{
    ANCHOR_MACRO, CODE_MACRO, LANGUAGE_PARAMETER, TITLE_PARAMETER,
};
use crate::ir::nodes::{Block, Callout, CodeFence, Heading, InlineRun, ListItem, Table, TableCell};

/// Renders top-level blocks, one per line.
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut writer = Writer::default();
    for (index, group) in group_lists(blocks).into_iter().enumerate() {
        if index > 0 {
            writer.out.push('\n');
        }
        writer.group(group);
    }
    writer.out
}

/// A block, or a run of list items that shares one `<ul>`/`<ol>`.
enum Group<'a> {
    Block(&'a Block),
    List { ordered: bool, items: Vec<&'a ListItem> },
}

fn group_lists(blocks: &[Block]) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for block in blocks {
        match (block, groups.last_mut()) {
            (Block::ListItem(item), Some(Group::List { ordered, items })) if *ordered == item.ordered => {
                items.push(item)
            }
            (Block::ListItem(item), _) => groups.push(Group::List {
                ordered: item.ordered,
                items: vec![item],
            }),
            (block, _) => groups.push(Group::Block(block)),
        }
    }
    groups
}

#[derive(Default)]
struct Writer {
    out: String,
}

impl Writer {
    fn blocks(&mut self, blocks: &[Block]) {
        for group in group_lists(blocks) {
            self.group(group);
        }
    }

    fn group(&mut self, group: Group<'_>) {
        match group {
            Group::Block(block) => self.block(block),
            Group::List { ordered, items } => {
                let tag = if ordered { "ol" } else { "ul" };
                self.out.push_str(&format!("<{tag}>"));
                for item in items {
                    self.out.push_str("<li>");
                    self.blocks(&item.children);
                    self.out.push_str("</li>");
                }
                self.out.push_str(&format!("</{tag}>"));
            }
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Heading(heading) => self.heading(heading),
            Block::Paragraph(paragraph) => {
                self.out.push_str("<p>");
                self.inlines(&paragraph.content);
                self.out.push_str("</p>");
            }
            Block::BlockQuote(quote) => {
                self.out.push_str("<blockquote>");
                self.blocks(&quote.children);
                self.out.push_str("</blockquote>");
            }
            Block::Callout(callout) => self.callout(callout),
            Block::CodeFence(code) => self.code(code),
            // Grouped by `blocks`; a lone item still needs its list.
            Block::ListItem(item) => self.group(Group::List {
                ordered: item.ordered,
                items: vec![item],
            }),
            Block::Table(table) => self.table(table),
            Block::Rule => self.out.push_str("<hr />"),
        }
    }

    fn heading(&mut self, heading: &Heading) {
        let level = heading.level.get();
        self.out.push_str(&format!("<h{level}>"));
        if let Some(anchor) = &heading.anchor {
            self.open_macro(ANCHOR_MACRO);
            self.parameter("", anchor);
            self.out.push_str("</ac:structured-macro>");
        }
        self.inlines(&heading.content);
        self.out.push_str(&format!("</h{level}>"));
    }

    fn callout(&mut self, callout: &Callout) {
        self.open_macro(callout.kind.keyword());
        if let Some(title) = &callout.title {
            self.parameter(TITLE_PARAMETER, title);
        }
        self.out.push_str("<ac:rich-text-body>");
        self.blocks(&callout.children);
        self.out.push_str("</ac:rich-text-body></ac:structured-macro>");
    }

    fn code(&mut self, code: &CodeFence) {
        self.open_macro(CODE_MACRO);
        if let Some(language) = &code.language {
            self.parameter(LANGUAGE_PARAMETER, language);
        }
        self.out.push_str("<ac:plain-text-body>");
        self.out.push_str(&cdata(&code.text));
        self.out.push_str("</ac:plain-text-body></ac:structured-macro>");
    }

    fn table(&mut self, table: &Table) {
        self.out.push_str("<table><tbody>");
        self.row(&table.header, "th");
        for row in &table.rows {
            self.row(row, "td");
        }
        self.out.push_str("</tbody></table>");
    }

    fn row(&mut self, cells: &[TableCell], tag: &str) {
        self.out.push_str("<tr>");
        for cell in cells {
            self.out.push_str(&format!("<{tag}>"));
            self.inlines(&cell.content);
            self.out.push_str(&format!("</{tag}>"));
        }
        self.out.push_str("</tr>");
    }

    fn open_macro(&mut self, name: &str) {
        self.out.push_str(&format!(
            "<ac:structured-macro ac:name=\"{}\">",
            escape_attribute(name)
        ));
    }

    fn parameter(&mut self, name: &str, value: &str) {
        self.out.push_str(&format!(
            "<ac:parameter ac:name=\"{}\">{}</ac:parameter>",
            escape_attribute(name),
            escape_text(value)
        ));
    }

    fn inlines(&mut self, runs: &[InlineRun]) {
        for run in runs {
            match run {
                InlineRun::Text(text) => {
                    let mut lines = text.split('\n');
                    if let Some(first) = lines.next() {
                        self.out.push_str(&escape_text(first));
                    }
                    for line in lines {
                        self.out.push_str("<br />");
                        self.out.push_str(&escape_text(line));
                    }
                }
                InlineRun::Bold(children) => {
                    self.out.push_str("<strong>");
                    self.inlines(children);
                    self.out.push_str("</strong>");
                }
                InlineRun::Italic(children) => {
                    self.out.push_str("<em>");
                    self.inlines(children);
                    self.out.push_str("</em>");
                }
                InlineRun::Code(code) => {
                    self.out.push_str("<code>");
                    self.out.push_str(&escape_text(code));
                    self.out.push_str("</code>");
                }
                InlineRun::Link { text, url } => match url.strip_prefix('#') {
                    Some(anchor) => {
                        self.out.push_str(&format!(
                            "<ac:link ac:anchor=\"{}\"><ac:plain-text-link-body>{}</ac:plain-text-link-body></ac:link>",
                            escape_attribute(anchor),
                            cdata(text)
                        ));
                    }
                    None => {
                        self.out.push_str(&format!(
                            "<a href=\"{}\">{}</a>",
                            escape_attribute(url),
                            escape_text(text)
                        ));
                    }
                },
            }
        }
    }
}

pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Wraps text in CDATA, splitting any `]]>` across two sections.
fn cdata(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}
