// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error type shared by the core and the bridges
//!
//! Gemtext itself has no syntax errors: every line classifies. Errors only
//! come from trees handed in dynamically, from I/O around the stream adapter,
//! and from configuration.

/// Error type for conversions
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Cannot handle value `{0}`, expected node")]
    InvalidValue(String),

    #[error("Cannot handle unknown node `{0}`")]
    UnknownNode(String),

    #[error("Did not expect `write` after `end`")]
    WriteAfterEnd,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
