//! Shared fixtures and an in-memory transport.

use mdsync_core::destination::{Destination, TargetKind};
use mdsync_core::error::TransportError;
use mdsync_core::formats::markdown;
use mdsync_core::sync::{Revision, Transport};
use mdsync_core::{BatchSource, Document, NativePayload};
use std::collections::BTreeMap;

pub const KITCHENSINK: &str = r#"---
title: Release Guide
owner: docs-team
---

# Overview {#overview}

Ship **fast** and *safely*, see [the docs](https://example.com/docs).

:::warning Careful
Do not skip `cargo test`.
:::

> Plain quotes become notes.

- first
- second
  1. nested

| Key | Value |
| --- | --- |
| a | 1 |

```rust
fn main() {}
```

---
"#;

pub fn parse(source: &str) -> Document {
    markdown::parse(source)
}

pub fn source(name: &str, markdown: &str) -> BatchSource {
    BatchSource::new(name, parse(markdown))
}

/// Keeps every written payload, keyed by destination.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub history: BTreeMap<String, Vec<NativePayload>>,
    pub writes: usize,
}

impl MemoryTransport {
    fn key(destination: &Destination) -> String {
        destination.to_string()
    }
}

impl Transport for MemoryTransport {
    fn create(
        &mut self,
        kind: TargetKind,
        _title: &str,
        payload: &NativePayload,
    ) -> Result<Destination, TransportError> {
        let serial = self.history.len() + 1;
        let destination = match kind {
            TargetKind::RichDocument => Destination::rich(format!("doc-{serial:0>24}")),
            TargetKind::WikiPage => Destination::wiki_id(format!("{}", 1000 + serial)),
        };
        self.history
            .insert(Self::key(&destination), vec![payload.clone()]);
        self.writes += 1;
        Ok(destination)
    }

    fn update(
        &mut self,
        destination: &Destination,
        payload: &NativePayload,
    ) -> Result<(), TransportError> {
        let revisions = self
            .history
            .get_mut(&Self::key(destination))
            .ok_or_else(|| TransportError::new(format!("no document at {destination}")))?;
        revisions.push(payload.clone());
        self.writes += 1;
        Ok(())
    }

    fn fetch(&self, destination: &Destination) -> Result<NativePayload, TransportError> {
        self.history
            .get(&Self::key(destination))
            .and_then(|revisions| revisions.last().cloned())
            .ok_or_else(|| TransportError::new(format!("no document at {destination}")))
    }

    fn revisions(&self, destination: &Destination) -> Result<Vec<Revision>, TransportError> {
        let revisions = self
            .history
            .get(&Self::key(destination))
            .ok_or_else(|| TransportError::new(format!("no document at {destination}")))?;
        Ok((1..=revisions.len())
            .map(|number| Revision {
                id: number.to_string(),
                modified_time: None,
                author: Some("tester".into()),
                keep_forever: false,
            })
            .collect())
    }
}
