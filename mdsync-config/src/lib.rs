//! Shared configuration loader for mdsync.
//!
//! `defaults/mdsync.default.toml` is embedded into every binary so that the
//! documented defaults and runtime behavior stay in sync. Applications layer
//! user files and flag overrides on top of those defaults via [`Loader`]
//! before deserializing into [`MdsyncConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use mdsync_core::formats::{RichOptions, WikiOptions};
use mdsync_core::{BatchOptions, TargetKind, TargetOptions, TocScope};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/mdsync.default.toml");

/// Name of the per-project file picked up from the working directory.
pub const PROJECT_FILE: &str = "mdsync.toml";

/// Top-level configuration consumed by mdsync applications.
#[derive(Debug, Clone, Deserialize)]
pub struct MdsyncConfig {
    pub batch: BatchConfig,
    pub targets: TargetsConfig,
}

impl MdsyncConfig {
    pub fn batch_options(&self) -> BatchOptions {
        (&self.batch).into()
    }

    pub fn target_options(&self) -> TargetOptions {
        (&self.targets).into()
    }
}

/// Mirrors [`BatchOptions`].
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub use_file_titles_as_headers: bool,
    pub insert_horizontal_separators: bool,
    pub generate_toc: bool,
    #[serde(default)]
    pub batch_title: Option<String>,
    pub toc_scope: TocScope,
    pub toc_title: String,
    pub demote_source_headings: bool,
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        BatchOptions {
            use_file_titles_as_headers: config.use_file_titles_as_headers,
            insert_horizontal_separators: config.insert_horizontal_separators,
            generate_toc: config.generate_toc,
            batch_title: config
                .batch_title
                .clone()
                .filter(|title| !title.trim().is_empty()),
            toc_scope: config.toc_scope,
            toc_title: config.toc_title.clone(),
            demote_source_headings: config.demote_source_headings,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetsConfig {
    /// Service for documents that name none.
    pub default: TargetKind,
    pub rich: RichTargetConfig,
    #[serde(default)]
    pub wiki: WikiTargetConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RichTargetConfig {
    pub native_callouts: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WikiTargetConfig {
    /// Empty means unset.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl From<&TargetsConfig> for TargetOptions {
    fn from(config: &TargetsConfig) -> Self {
        TargetOptions {
            rich: RichOptions {
                native_callouts: config.rich.native_callouts,
            },
            wiki: WikiOptions {
                base_url: config
                    .wiki
                    .base_url
                    .clone()
                    .filter(|url| !url.trim().is_empty()),
            },
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<MdsyncConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<MdsyncConfig, ConfigError> {
    Loader::new().build()
}
