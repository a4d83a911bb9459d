// SPDX-License-Identifier: AGPL-3.0-or-later
//! Output formats compiled or serialized from gemtext

pub mod gemtext;
pub mod html;

pub use gemtext::{to_gemtext, to_gemtext_value};
pub use html::{sanitize_uri, to_html, CompileOptions, HtmlCompiler, LineEnding};
