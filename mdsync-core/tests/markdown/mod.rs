//! Markdown source format tests
//!
//! Parsing of the kitchensink, canonical serialization and degradations.

mod degradations;
mod roundtrip;
