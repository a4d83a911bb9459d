// SPDX-License-Identifier: AGPL-3.0-or-later
//! Concrete syntax tokens produced by the tokenizer

use serde::{Deserialize, Serialize};

use crate::ast::Point;

/// Token kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
    Whitespace,
    Eof,
    Eol,
    PreSequence,
    PreAlt,
    PreText,
    HeadingSequence,
    HeadingText,
    ListSequence,
    ListText,
    LinkSequence,
    LinkUrl,
    LinkText,
    QuoteSequence,
    QuoteText,
    Text,
}

/// One classified span of input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Span text, without the marker it stands for (sequence tokens hold the
    /// marker itself)
    pub value: String,
    /// Only ever set on `eol`: the line it ends was blank outside of pre
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hard: bool,
    pub start: Point,
    pub end: Point,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serde_shape() {
        let token = Token {
            kind: TokenKind::Eol,
            value: "\n".to_string(),
            hard: true,
            start: Point::new(1, 1, 0),
            end: Point::new(2, 1, 1),
        };
        assert!(token.is(TokenKind::Eol));
        assert!(!token.is(TokenKind::Eof));

        let value = serde_json::to_value(&token).unwrap();
        assert_eq!(value["type"], json!("eol"));
        assert_eq!(value["hard"], json!(true));

        let soft = Token { hard: false, ..token };
        assert_eq!(serde_json::to_value(&soft).unwrap().get("hard"), None);
    }
}
