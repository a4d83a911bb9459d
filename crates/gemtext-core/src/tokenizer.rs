// SPDX-License-Identifier: AGPL-3.0-or-later
//! Incremental gemtext tokenizer
//!
//! A [`Tokenizer`] is one session over one document. Chunks may be cut
//! anywhere, including inside a UTF-8 sequence: bytes are buffered until a
//! line feed arrives, and each complete line is decoded and classified on its
//! own. Feeding a document in pieces yields exactly the tokens of feeding it
//! whole.

use crate::ast::Point;
use crate::token::{Token, TokenKind};

/// Stateful line scanner
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Bytes of the current, not yet terminated, line
    buffer: Vec<u8>,
    point: Point,
    preformatted: bool,
    finished: bool,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            point: Point::default(),
            preformatted: false,
            finished: false,
        }
    }

    /// Feed a chunk and return the tokens of every line it completes
    ///
    /// With `done` set, the buffered remainder is flushed as the last line and
    /// an `eof` token closes the stream. The session is finished afterwards:
    /// later calls are ignored and return nothing.
    pub fn feed(&mut self, chunk: &[u8], done: bool) -> Vec<Token> {
        if self.finished {
            tracing::warn!(len = chunk.len(), "tokenizer fed after its final chunk");
            return Vec::new();
        }

        let mut tokens = Vec::new();
        let mut buffer = std::mem::take(&mut self.buffer);
        // Everything buffered so far is known to be free of line feeds.
        let mut from = buffer.len();
        let mut start = 0;
        buffer.extend_from_slice(chunk);

        while let Some(found) = buffer[from..].iter().position(|&byte| byte == b'\n') {
            let end = from + found;
            let (line, eol) = match buffer[start..end].split_last() {
                Some((&b'\r', rest)) => (rest, "\r\n"),
                _ => (&buffer[start..end], "\n"),
            };
            let line = String::from_utf8_lossy(line);

            self.classify(&line, &mut tokens);
            let hard = !self.preformatted && line.is_empty();
            self.push(&mut tokens, TokenKind::Eol, eol, hard);

            start = end + 1;
            from = start;
        }

        buffer.drain(..start);

        if done {
            let line = String::from_utf8_lossy(&buffer).into_owned();
            buffer.clear();
            self.classify(&line, &mut tokens);
            self.push(&mut tokens, TokenKind::Eof, "", false);
            self.finished = true;
        }

        self.buffer = buffer;
        tracing::trace!(
            chunk = chunk.len(),
            tokens = tokens.len(),
            buffered = self.buffer.len(),
            done,
            "tokenized chunk"
        );
        tokens
    }

    /// Feed a chunk that is not the last one
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> Vec<Token> {
        self.feed(chunk.as_ref(), false)
    }

    /// Feed the last chunk
    pub fn end(&mut self, chunk: impl AsRef<[u8]>) -> Vec<Token> {
        self.feed(chunk.as_ref(), true)
    }

    /// Whether the final chunk has been fed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the session is inside a fenced block
    pub fn is_preformatted(&self) -> bool {
        self.preformatted
    }

    fn classify(&mut self, value: &str, tokens: &mut Vec<Token>) {
        let bytes = value.as_bytes();

        if bytes.starts_with(b"```") {
            self.push(tokens, TokenKind::PreSequence, &value[..3], false);
            if value.len() > 3 {
                self.push(tokens, TokenKind::PreAlt, &value[3..], false);
            }
            self.preformatted = !self.preformatted;
        } else if self.preformatted {
            if !value.is_empty() {
                self.push(tokens, TokenKind::PreText, value, false);
            }
        } else if bytes.first() == Some(&b'#') {
            let mut index = 1;
            while index < 3 && bytes.get(index) == Some(&b'#') {
                index += 1;
            }
            self.push(tokens, TokenKind::HeadingSequence, &value[..index], false);

            let index = self.whitespace(tokens, value, index);
            if index < value.len() {
                self.push(tokens, TokenKind::HeadingText, &value[index..], false);
            }
        } else if bytes.first() == Some(&b'*') && bytes.get(1).map_or(true, |&b| is_whitespace(b)) {
            self.push(tokens, TokenKind::ListSequence, "*", false);

            let index = self.whitespace(tokens, value, 1);
            if index < value.len() {
                self.push(tokens, TokenKind::ListText, &value[index..], false);
            }
        } else if bytes.starts_with(b"=>") {
            self.push(tokens, TokenKind::LinkSequence, "=>", false);

            let mut index = self.whitespace(tokens, value, 2);
            let start = index;
            while index < bytes.len() && !is_whitespace(bytes[index]) {
                index += 1;
            }
            if index > start {
                self.push(tokens, TokenKind::LinkUrl, &value[start..index], false);
            }

            let index = self.whitespace(tokens, value, index);
            if index < value.len() {
                self.push(tokens, TokenKind::LinkText, &value[index..], false);
            }
        } else if bytes.first() == Some(&b'>') {
            self.push(tokens, TokenKind::QuoteSequence, ">", false);

            let index = self.whitespace(tokens, value, 1);
            if index < value.len() {
                self.push(tokens, TokenKind::QuoteText, &value[index..], false);
            }
        } else if !value.is_empty() {
            self.push(tokens, TokenKind::Text, value, false);
        }
    }

    /// Emit the tab/space run starting at `from`, returning where it ends
    fn whitespace(&mut self, tokens: &mut Vec<Token>, value: &str, from: usize) -> usize {
        let end = from
            + value.as_bytes()[from..]
                .iter()
                .take_while(|&&byte| is_whitespace(byte))
                .count();
        if end > from {
            self.push(tokens, TokenKind::Whitespace, &value[from..end], false);
        }
        end
    }

    fn push(&mut self, tokens: &mut Vec<Token>, kind: TokenKind, value: &str, hard: bool) {
        let start = self.point;

        self.point.offset += value.len();
        self.point.column += value.chars().count();

        // Only `eol` values end in a line feed.
        if value.ends_with('\n') {
            self.point.line += 1;
            self.point.column = 1;
        }

        tokens.push(Token {
            kind,
            value: value.to_string(),
            hard,
            start,
            end: self.point,
        });
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokenize a whole document in one call
pub fn tokenize(input: &str) -> Vec<Token> {
    Tokenizer::new().end(input)
}

fn is_whitespace(byte: u8) -> bool {
    byte == b'\t' || byte == b' '
}
