// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loaded from TOML
//!
//! ```toml
//! [html]
//! default_line_ending = "crlf"
//! allow_dangerous_protocol = false
//!
//! [mdast]
//! tight = true
//! endlinks = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, Result};
use crate::formats::html::CompileOptions;

/// Options for turning mdast into gast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdastOptions {
    /// Do not put `break`s between blocks
    pub tight: bool,
    /// Collect all links at the end of the document instead of before each
    /// heading
    pub endlinks: bool,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub html: CompileOptions,
    pub mdast: MdastOptions,
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| ConversionError::ConfigError(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ConversionError::SerializationError(e.to_string()))
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&input)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}
