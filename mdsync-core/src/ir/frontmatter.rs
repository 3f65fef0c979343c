//! Front-matter preamble.
//!
//! Entries keep the exact source text they were parsed from, so keys this crate
//! does not understand survive a parse/serialize round trip byte for byte. Values
//! are only interpreted on demand, through `serde_yaml`.

use serde_yaml::{Mapping, Value};
use std::fmt;
use tracing::debug;

/// Keys with a defined meaning. Anything else is carried opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontMatterKey {
    /// Target service (`gdoc`, `confluence`, ...).
    DestinationType,
    /// Document id / URL or page id / title.
    DestinationId,
    /// Wiki space key, when the id is a bare page reference.
    DestinationSpace,
    Title,
    BatchId,
    BatchTitle,
}

impl FrontMatterKey {
    pub const ALL: [FrontMatterKey; 6] = [
        FrontMatterKey::DestinationType,
        FrontMatterKey::DestinationId,
        FrontMatterKey::DestinationSpace,
        FrontMatterKey::Title,
        FrontMatterKey::BatchId,
        FrontMatterKey::BatchTitle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FrontMatterKey::DestinationType => "destination_type",
            FrontMatterKey::DestinationId => "destination_id",
            FrontMatterKey::DestinationSpace => "destination_space",
            FrontMatterKey::Title => "title",
            FrontMatterKey::BatchId => "batch_id",
            FrontMatterKey::BatchTitle => "batch_title",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for FrontMatterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One top-level key together with its raw source lines.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatterEntry {
    pub key: String,
    pub source: String,
}

impl FrontMatterEntry {
    pub fn is_recognized(&self) -> bool {
        FrontMatterKey::from_key(&self.key).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrontMatter {
    /// Comment or blank lines that precede the first key.
    leading: String,
    entries: Vec<FrontMatterEntry>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits the text between the `---` delimiters into entries.
    pub fn parse(source: &str) -> Self {
        let mut front_matter = FrontMatter::default();

        for line in source.split_inclusive('\n') {
            match top_level_key(line) {
                Some(key) => front_matter.entries.push(FrontMatterEntry {
                    key,
                    source: line.to_string(),
                }),
                None => match front_matter.entries.last_mut() {
                    Some(entry) => entry.source.push_str(line),
                    None => front_matter.leading.push_str(line),
                },
            }
        }

        front_matter
    }

    /// Source text without delimiters; always newline-terminated when non-empty.
    pub fn to_source(&self) -> String {
        let mut out = self.leading.clone();
        for entry in &self.entries {
            out.push_str(&entry.source);
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    pub fn entries(&self) -> &[FrontMatterEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Parsed YAML value of a key, if present and well-formed.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        let entry = self.entries.iter().find(|entry| entry.key == key)?;
        match serde_yaml::from_str::<Mapping>(&entry.source) {
            Ok(mapping) => mapping.get(key).cloned(),
            Err(err) => {
                debug!(key, error = %err, "front-matter value is not valid YAML");
                None
            }
        }
    }

    /// Scalar value of a recognized key as a trimmed, non-empty string.
    pub fn get_str(&self, key: FrontMatterKey) -> Option<String> {
        let text = match self.get_value(key.as_str())? {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => return None,
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Sets a key to a string value, replacing the entry in place or appending it.
    pub fn set(&mut self, key: &str, value: &str) {
        let mut mapping = Mapping::new();
        mapping.insert(Value::String(key.to_string()), Value::String(value.to_string()));
        let source = match serde_yaml::to_string(&mapping) {
            Ok(source) => source,
            Err(err) => {
                debug!(key, error = %err, "could not encode front-matter value");
                return;
            }
        };

        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            entry.source = source;
            return;
        }
        if let Some(last) = self.entries.last_mut() {
            if !last.source.ends_with('\n') {
                last.source.push('\n');
            }
        }
        self.entries.push(FrontMatterEntry {
            key: key.to_string(),
            source,
        });
    }

    pub fn set_key(&mut self, key: FrontMatterKey, value: &str) {
        self.set(key.as_str(), value);
    }

    /// Drops a key with its source lines. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.key != key);
        self.entries.len() != before
    }

    pub fn remove_key(&mut self, key: FrontMatterKey) -> bool {
        self.remove(key.as_str())
    }
}

/// Returns the key of a line that starts a new top-level mapping entry.
fn top_level_key(line: &str) -> Option<String> {
    let first = line.chars().next()?;
    if first.is_whitespace() || first == '#' || first == '-' {
        return None;
    }
    let (key, _) = line.split_once(':')?;
    let key = key.trim().trim_matches('"').trim_matches('\'');
    (!key.is_empty()).then(|| key.to_string())
}
