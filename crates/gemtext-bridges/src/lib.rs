// SPDX-License-Identifier: AGPL-3.0-or-later
//! Gemtext Bridges - conversions between gast and mdast
//!
//! - [`to_mdast`] turns gemtext syntax trees into mdast
//! - [`from_mdast`] flattens mdast into gast, collecting links and footnotes
//! - [`markdown`] parses Markdown with comrak on the way in

pub mod from_mdast;
pub mod markdown;
pub mod mdast;
pub mod to_mdast;

pub use from_mdast::{from_mdast, from_mdast_value, Converted};
pub use markdown::{from_markdown, gemtext_to_mdast, markdown_to_gemtext};
pub use mdast::MdNode;
pub use to_mdast::{to_mdast, to_mdast_value};
