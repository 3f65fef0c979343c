//! Anchor identifiers for headings.
//!
//! Anchors are derived from heading text: lower-cased, runs of anything that is
//! not a letter or digit collapsed into a single `-`. Collisions get a numeric
//! suffix in document order: `intro`, `intro-2`, `intro-3`.

use std::collections::{HashMap, HashSet};

/// Used when a heading has no alphanumeric characters at all.
pub const FALLBACK_ANCHOR: &str = "section";

pub fn slugify(text: &str) -> String {
    let slug = slug::slugify(text);
    if slug.is_empty() {
        FALLBACK_ANCHOR.to_string()
    } else {
        slug
    }
}

/// Hands out unique anchors for one document.
///
/// The output only depends on the sequence of requests, so identical input in
/// identical order always yields identical anchors.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    taken: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a unique anchor for `text` and records it.
    pub fn assign(&mut self, text: &str) -> String {
        let base = slugify(text);
        if self.taken.insert(base.clone()) {
            return base;
        }

        let mut suffix = self.next_suffix.get(&base).copied().unwrap_or(2);
        loop {
            let candidate = format!("{base}-{suffix}");
            suffix += 1;
            if self.taken.insert(candidate.clone()) {
                self.next_suffix.insert(base, suffix);
                return candidate;
            }
        }
    }

    pub fn contains(&self, anchor: &str) -> bool {
        self.taken.contains(anchor)
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}
