// SPDX-License-Identifier: AGPL-3.0-or-later
//! Gemtext Core - tokenizer, syntax tree, and compilers for gemtext
//!
//! This crate provides:
//! - An incremental, line-oriented tokenizer that accepts arbitrary chunks
//! - gast, a flat syntax tree for gemtext, and a builder from tokens
//! - An HTML compiler that runs directly on the token stream
//! - A serializer from gast back to gemtext
//! - A chunked stream adapter from gemtext bytes to HTML

pub mod ast;
pub mod builder;
pub mod config;
pub mod error;
pub mod formats;
pub mod stream;
pub mod token;
pub mod tokenizer;

pub use ast::{
    check_tree, Block, Break, Data, Heading, Link, List, ListItem, Node, Point, Position, Pre,
    Quote, Root, Text,
};
pub use builder::{from_gemtext, from_tokens};
pub use config::{Config, MdastOptions};
pub use error::{ConversionError, Result};
pub use formats::{
    sanitize_uri, to_gemtext, to_gemtext_value, to_html, CompileOptions, HtmlCompiler, LineEnding,
};
pub use stream::{pipe, HtmlStream};
pub use token::{Token, TokenKind};
pub use tokenizer::{tokenize, Tokenizer};
