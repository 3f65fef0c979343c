//! Rich-document rendering (document tree → structural elements)

use super::{
    Bullet, CodeStyle, NamedStyle, RichCallout, RichCell, RichOptions, RichParagraph, RichPayload,
    RichTable, StructuralElement, TextRun, TextStyle,
};
use crate::ir::nodes::{Block, Callout, Document, InlineRun, ListItem, TableCell};

pub fn render(document: &Document, options: &RichOptions) -> RichPayload {
    let mut renderer = Renderer {
        options,
        out: Vec::new(),
    };
    renderer.blocks(&document.blocks, Context::default());
    RichPayload {
        title: document.declared_title(),
        body: renderer.out,
    }
}

/// Where the next element lands.
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    quote_depth: u8,
    /// Nesting level of the enclosing list item, if any.
    list_level: Option<u8>,
    /// Bullet stamped on paragraphs rendered in this context.
    bullet: Option<Bullet>,
}

impl Context {
    /// Context for content that cannot stay inside a list.
    fn outside_list(self) -> Self {
        Context {
            list_level: None,
            bullet: None,
            ..self
        }
    }

    fn quoted(self) -> Self {
        Context {
            quote_depth: self.quote_depth.saturating_add(1),
            ..self.outside_list()
        }
    }
}

struct Renderer<'o> {
    options: &'o RichOptions,
    out: Vec<StructuralElement>,
}

impl Renderer<'_> {
    fn blocks(&mut self, blocks: &[Block], context: Context) {
        for block in blocks {
            self.block(block, context);
        }
    }

    fn block(&mut self, block: &Block, context: Context) {
        match block {
            Block::Heading(heading) => {
                let mut paragraph = paragraph(
                    NamedStyle::heading(heading.level.get()),
                    inline_runs(&heading.content),
                    context,
                );
                paragraph.heading_id = heading.anchor.clone();
                self.push_paragraph(paragraph);
            }
            Block::Paragraph(p) => {
                let paragraph = paragraph(NamedStyle::NormalText, inline_runs(&p.content), context);
                self.push_paragraph(paragraph);
            }
            Block::CodeFence(code) => {
                let mut paragraph = paragraph(
                    NamedStyle::NormalText,
                    vec![TextRun::plain(code.text.clone())],
                    context,
                );
                paragraph.code = Some(CodeStyle {
                    language: code.language.clone(),
                });
                self.push_paragraph(paragraph);
            }
            Block::ListItem(item) => self.list_item(item, context),
            Block::Table(table) => {
                let context = context.outside_list();
                let mut rows = vec![cells(&table.header)];
                rows.extend(table.rows.iter().map(|row| cells(row)));
                self.out.push(StructuralElement::Table(RichTable {
                    rows,
                    header_rows: 1,
                    quote_depth: context.quote_depth,
                }));
            }
            Block::Rule => self.out.push(StructuralElement::HorizontalRule {
                quote_depth: context.quote_depth,
            }),
            Block::BlockQuote(quote) => self.blocks(&quote.children, context.quoted()),
            Block::Callout(callout) => self.callout(callout, context.outside_list()),
        }
    }

    fn push_paragraph(&mut self, mut paragraph: RichParagraph) {
        // A continuation only holds directly after another list paragraph;
        // after content that left the list it starts a new glyph.
        if let Some(bullet) = paragraph.bullet.as_mut() {
            let follows_list = self.out.last().is_some_and(|previous| {
                previous.bullet().is_some() && previous.quote_depth() == paragraph.quote_depth
            });
            bullet.continuation &= follows_list;
        }
        self.out.push(StructuralElement::Paragraph(paragraph));
    }

    fn list_item(&mut self, item: &ListItem, context: Context) {
        let level = context.list_level.map_or(0, |level| level.saturating_add(1));
        let bullet = |continuation| Bullet {
            ordered: item.ordered,
            nesting_level: level,
            continuation,
        };

        // The first element of an item must carry its glyph.
        let opens_with_paragraph = matches!(
            item.children.first(),
            Some(Block::Paragraph(_) | Block::Heading(_) | Block::CodeFence(_))
        );
        if !opens_with_paragraph {
            let item_context = Context {
                bullet: Some(bullet(false)),
                list_level: Some(level),
                ..context
            };
            self.push_paragraph(paragraph(NamedStyle::NormalText, Vec::new(), item_context));
        }

        for (index, child) in item.children.iter().enumerate() {
            let child_context = Context {
                list_level: Some(level),
                bullet: match child {
                    Block::ListItem(_) => None,
                    _ => Some(bullet(index > 0 || !opens_with_paragraph)),
                },
                ..context
            };
            self.block(child, child_context);
        }
    }

    fn callout(&mut self, callout: &Callout, context: Context) {
        if self.options.native_callouts {
            let mut body = Renderer {
                options: self.options,
                out: Vec::new(),
            };
            body.blocks(&callout.children, Context::default());
            self.out.push(StructuralElement::Callout(RichCallout {
                kind: callout.kind,
                title: callout.title.clone(),
                body: body.out,
                quote_depth: context.quote_depth,
            }));
            return;
        }

        let quoted = context.quoted();
        let title = match &callout.title {
            Some(title) => format!("{}: {title}", callout.kind.label()),
            None => callout.kind.label().to_string(),
        };
        let title_run = TextRun {
            content: title,
            style: TextStyle {
                bold: true,
                ..TextStyle::default()
            },
        };
        self.push_paragraph(paragraph(NamedStyle::NormalText, vec![title_run], quoted));
        self.blocks(&callout.children, quoted);
    }
}

fn paragraph(style: NamedStyle, runs: Vec<TextRun>, context: Context) -> RichParagraph {
    RichParagraph {
        style,
        heading_id: None,
        bullet: context.bullet,
        quote_depth: context.quote_depth,
        code: None,
        runs,
    }
}

fn cells(row: &[TableCell]) -> Vec<RichCell> {
    row.iter()
        .map(|cell| RichCell {
            runs: inline_runs(&cell.content),
        })
        .collect()
}

/// Flattens inline styling into runs, merging neighbours with equal style.
pub(crate) fn inline_runs(content: &[InlineRun]) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();
    push_runs(content, &TextStyle::default(), &mut runs);
    runs
}

fn push_runs(content: &[InlineRun], style: &TextStyle, runs: &mut Vec<TextRun>) {
    for inline in content {
        match inline {
            InlineRun::Text(text) => push_run(runs, text, style.clone()),
            InlineRun::Bold(children) => push_runs(
                children,
                &TextStyle {
                    bold: true,
                    ..style.clone()
                },
                runs,
            ),
            InlineRun::Italic(children) => push_runs(
                children,
                &TextStyle {
                    italic: true,
                    ..style.clone()
                },
                runs,
            ),
            InlineRun::Code(code) => push_run(
                runs,
                code,
                TextStyle {
                    code: true,
                    ..style.clone()
                },
            ),
            InlineRun::Link { text, url } => push_run(
                runs,
                text,
                TextStyle {
                    link: Some(url.clone()),
                    ..style.clone()
                },
            ),
        }
    }
}

fn push_run(runs: &mut Vec<TextRun>, content: &str, style: TextStyle) {
    if content.is_empty() {
        return;
    }
    match runs.last_mut() {
        // Code spans and links stay separate so their boundaries survive.
        Some(last) if last.style == style && !style.code && style.link.is_none() => {
            last.content.push_str(content)
        }
        _ => runs.push(TextRun {
            content: content.to_string(),
            style,
        }),
    }
}
