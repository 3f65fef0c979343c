//! Target tests: snapshots of rendered payloads and round-trip properties.

mod properties;
mod rich;
mod wiki;
