//! Logic shared by the parser, the targets and the batch assembler.

pub mod anchors;
pub mod callouts;
pub mod toc;
