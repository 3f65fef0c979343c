//! Markdown format implementation
//!
//! This module implements bidirectional conversion between Markdown text and the
//! document tree. Block segmentation is hand-written because two constructs are
//! not CommonMark (`:::kind` callout fences and `{#anchor}` heading attributes);
//! inline styling is tokenized with `comrak`.
//!
//! # Element Mapping Table
//!
//! | Markdown                    | Document tree                         | Notes                                  |
//! |-----------------------------|---------------------------------------|----------------------------------------|
//! | `---` preamble              | FrontMatter                           | Only as first content; raw text kept   |
//! | `#`..`######` + `{#id}`     | Heading (level, anchor)               | 7+ `#` stays paragraph text            |
//! | Paragraph                   | Paragraph                             | Lines joined with `\n`                 |
//! | ``` / ~~~ fence             | CodeFence                             | Content verbatim, first info word = language |
//! | `:::kind Title` … `:::`     | Callout                               | Nestable; unknown kind → note          |
//! | `>` lines                   | Callout(note) / BlockQuote in fences  | `[!KIND] title` marker honored         |
//! | `-`, `*`, `+`, `1.`, `1)`   | ListItem                              | Nested by indentation                  |
//! | Pipe table                  | Table                                 | Separator row required                 |
//! | `---`, `***`, `___`         | Rule                                  |                                        |
//! | `**x**` / `*x*` / `` `x` `` | Bold / Italic / Code                  |                                        |
//! | `[text](url)`               | Link                                  | Link text flattened to plain text      |
//!
//! # Lossy Conversions
//!
//! - Images and raw HTML are kept as literal text
//! - Ordered list start numbers are not kept; every item serializes as `1.`
//! - Block quotes outside fences come back as `:::note` fences
//! - Setext headings are not recognized; a `---` underline reads as a rule

pub mod inlines;
pub mod parser;
pub mod serializer;

pub use parser::{parse, parse_with_report};
pub use serializer::serialize;
