//! Shared configuration loader for emd parsing and writing.
//!
//! `defaults/emd.default.toml` is embedded so that documented defaults and
//! runtime behavior agree. Applications layer their own files on top of those
//! defaults via [`Loader`] before deserializing into [`EmdConfig`], then hand
//! the resulting options to the parser and writer.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use emd_parser::emd::formats::WriterOptions;
use emd_parser::emd::ParserOptions;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/emd.default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmdConfig {
    pub parser: ParserConfig,
    pub writer: WriterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    pub max_include_depth: usize,
    pub max_constant_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriterConfig {
    pub indent: usize,
    pub write_addresses: bool,
}

impl EmdConfig {
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            max_include_depth: self.parser.max_include_depth,
            max_constant_depth: self.parser.max_constant_depth,
        }
    }

    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            indent: self.writer.indent,
            write_addresses: self.writer.write_addresses,
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

    /// Layer an optional configuration file, ignored if absent.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. `("writer.indent", 4)`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<EmdConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// For callers that only need the defaults.
pub fn load_defaults() -> Result<EmdConfig, ConfigError> {
    Loader::new().build()
}
