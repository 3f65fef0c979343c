//! Document tree shared by every stage.
//!
//! The parser produces it, the batch assembler transforms it and the targets
//! render it. Stages take a tree by value or by reference and hand back a new
//! one; nothing keeps a reference into another stage's tree.

pub mod frontmatter;
pub mod nodes;

pub use frontmatter::{FrontMatter, FrontMatterEntry, FrontMatterKey};
pub use nodes::*;
