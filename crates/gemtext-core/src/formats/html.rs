// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTML compiler
//!
//! Compiles the token stream straight to HTML, without building a tree, so it
//! can run chunk by chunk next to an incremental [`Tokenizer`]. All state that
//! spans lines (an open list, an open fence, the closing tag owed at the end of
//! the line) lives in the [`HtmlCompiler`] and carries across calls.
//!
//! [`Tokenizer`]: crate::Tokenizer

use serde::{Deserialize, Serialize};

use crate::token::{Token, TokenKind};
use crate::tokenizer::tokenize;

/// Protocols allowed in link URLs unless dangerous protocols are enabled
const SAFE_PROTOCOLS: [&str; 7] = ["gemini", "http", "https", "irc", "ircs", "mailto", "xmpp"];

/// Line ending used for markup the document itself has no line ending for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineEnding {
    #[serde(rename = "lf")]
    Lf,
    #[serde(rename = "crlf")]
    CrLf,
}

impl LineEnding {
    pub const fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    fn from_eol(value: &str) -> Self {
        if value == "\r\n" {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

/// Options for [`HtmlCompiler`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Line ending for added markup, such as the ones around `<p>` in a
    /// blockquote. Inferred from the first line ending in the document when
    /// unset, and `\n` until one is seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_line_ending: Option<LineEnding>,
    /// Keep link URLs with any protocol, instead of only `gemini`, `http`,
    /// `https`, `irc`, `ircs`, `mailto` and `xmpp`
    pub allow_dangerous_protocol: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Preformatted {
    #[default]
    Off,
    On,
    /// Inside a fence that opened with an alt, so a `<code>` is open too
    WithAlt,
}

/// Stateful token-to-HTML compiler
#[derive(Debug, Clone)]
pub struct HtmlCompiler {
    line_ending: Option<LineEnding>,
    allow_dangerous_protocol: bool,
    /// Closing markup owed at the end of the current line
    at_eol: Option<&'static str>,
    /// Swallow the next line ending (the one after an opening fence)
    slurp_eol: bool,
    preformatted: Preformatted,
    /// Line ending inside a fence, written only once more content follows
    pending_eol: Option<String>,
    in_list: bool,
}

impl HtmlCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            line_ending: options.default_line_ending,
            allow_dangerous_protocol: options.allow_dangerous_protocol,
            at_eol: None,
            slurp_eol: false,
            preformatted: Preformatted::Off,
            pending_eol: None,
            in_list: false,
        }
    }

    /// Line ending in use, once configured or inferred
    pub fn line_ending(&self) -> Option<LineEnding> {
        self.line_ending
    }

    /// Compile the next run of tokens to an HTML fragment
    ///
    /// Fragments from consecutive calls concatenate into the HTML of the
    /// whole token stream.
    #[tracing::instrument(level = "debug", skip_all, fields(tokens = tokens.len()))]
    pub fn compile(&mut self, tokens: &[Token]) -> String {
        if self.line_ending.is_none() {
            self.line_ending = tokens
                .iter()
                .find(|token| token.is(TokenKind::Eol))
                .map(|token| LineEnding::from_eol(&token.value));
        }

        let mut results = String::new();

        for token in tokens {
            if self.in_list && closes_list(token) {
                // Still owing a closer means the item's line ending was not seen.
                if let Some(close) = self.at_eol {
                    results.push_str(close);
                    results.push_str(self.eol());
                }
                results.push_str("</ul>");
                if self.at_eol.is_none() && self.line_ending.is_some() {
                    results.push_str(self.eol());
                }
                self.in_list = false;
                self.at_eol = None;
            }

            match token.kind {
                TokenKind::Eol => {
                    if let Some(close) = self.at_eol.take() {
                        results.push_str(close);
                    }
                    if token.hard {
                        results.push_str("<br />");
                    }
                    if self.slurp_eol {
                        self.slurp_eol = false;
                    } else if self.preformatted != Preformatted::Off {
                        self.flush_pending_eol(&mut results);
                        self.pending_eol = Some(encode(&token.value));
                    } else {
                        results.push_str(&encode(&token.value));
                    }
                }
                TokenKind::Eof => {
                    if let Some(close) = self.at_eol.take() {
                        results.push_str(close);
                    }
                    self.flush_pending_eol(&mut results);
                    match self.preformatted {
                        Preformatted::WithAlt => results.push_str("</code></pre>"),
                        Preformatted::On => results.push_str("</pre>"),
                        Preformatted::Off => {}
                    }
                }
                TokenKind::QuoteSequence => {
                    results.push_str("<blockquote>");
                    self.at_eol = Some("</blockquote>");
                }
                TokenKind::LinkSequence => {
                    results.push_str("<div><a href=\"");
                    // Closes an empty link when no URL follows.
                    self.at_eol = Some("\"></a></div>");
                }
                TokenKind::LinkUrl => {
                    results.push_str(&sanitize_uri(&token.value, self.allow_dangerous_protocol));
                    results.push_str("\">");
                    self.at_eol = Some("</a></div>");
                }
                TokenKind::ListSequence => {
                    if !self.in_list {
                        results.push_str("<ul>");
                        results.push_str(self.eol());
                        self.in_list = true;
                    }
                    results.push_str("<li>");
                    self.at_eol = Some("</li>");
                }
                TokenKind::HeadingSequence => {
                    let (open, close) = match token.value.len() {
                        1 => ("<h1>", "</h1>"),
                        2 => ("<h2>", "</h2>"),
                        _ => ("<h3>", "</h3>"),
                    };
                    results.push_str(open);
                    self.at_eol = Some(close);
                }
                TokenKind::PreSequence => {
                    self.preformatted = match self.preformatted {
                        Preformatted::Off => {
                            results.push_str("<pre>");
                            self.slurp_eol = true;
                            Preformatted::On
                        }
                        // The line ending before a closing fence is not content.
                        Preformatted::On => {
                            self.pending_eol = None;
                            results.push_str("</pre>");
                            Preformatted::Off
                        }
                        Preformatted::WithAlt => {
                            self.pending_eol = None;
                            results.push_str("</code></pre>");
                            Preformatted::Off
                        }
                    };
                }
                TokenKind::PreAlt => {
                    // Alts on closing fences are dropped.
                    if self.preformatted != Preformatted::Off {
                        results.push_str("<code class=\"language-");
                        results.push_str(&encode(&token.value));
                        results.push_str("\">");
                        self.preformatted = Preformatted::WithAlt;
                    }
                }
                TokenKind::PreText => {
                    self.flush_pending_eol(&mut results);
                    results.push_str(&encode(&token.value));
                }
                TokenKind::HeadingText | TokenKind::LinkText | TokenKind::ListText => {
                    results.push_str(&encode(&token.value));
                }
                TokenKind::QuoteText => {
                    results.push_str(self.eol());
                    results.push_str("<p>");
                    results.push_str(&encode(&token.value));
                    results.push_str("</p>");
                    results.push_str(self.eol());
                }
                TokenKind::Text => {
                    results.push_str("<p>");
                    results.push_str(&encode(&token.value));
                    results.push_str("</p>");
                }
                TokenKind::Whitespace => {}
            }
        }

        results
    }

    fn flush_pending_eol(&mut self, results: &mut String) {
        if let Some(eol) = self.pending_eol.take() {
            results.push_str(&eol);
        }
    }

    fn eol(&self) -> &'static str {
        self.line_ending.unwrap_or(LineEnding::Lf).as_str()
    }
}

impl Default for HtmlCompiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

/// Whether `token` ends an open list
fn closes_list(token: &Token) -> bool {
    match token.kind {
        TokenKind::Eol => token.hard,
        TokenKind::ListSequence | TokenKind::ListText | TokenKind::Whitespace => false,
        _ => true,
    }
}

/// Compile a whole gemtext document to HTML
pub fn to_html(input: &str, options: &CompileOptions) -> String {
    HtmlCompiler::new(options.clone()).compile(&tokenize(input))
}

/// Encode the characters that are unsafe in HTML text and attribute values
pub fn encode(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            c => result.push(c),
        }
    }
    result
}

/// Make a URL safe for an `href` attribute
///
/// Characters outside the URL-safe ASCII set are percent-encoded as UTF-8,
/// existing `%XX` escapes are kept, and the result is HTML-encoded. Unless
/// `allow_dangerous_protocol` is set, a URL with a protocol other than the
/// safe ones becomes empty. Relative URLs always pass.
pub fn sanitize_uri(url: &str, allow_dangerous_protocol: bool) -> String {
    let value = encode(&normalize_uri(url));

    if allow_dangerous_protocol {
        return value;
    }

    let Some(colon) = value.find(':') else {
        return value;
    };

    // A colon after a path, query or fragment start is not a protocol.
    let precedes = |c: char| value.find(c).is_some_and(|index| index < colon);
    let relative = precedes('/') || precedes('?') || precedes('#');

    if relative
        || SAFE_PROTOCOLS
            .iter()
            .any(|protocol| protocol.eq_ignore_ascii_case(&value[..colon]))
    {
        value
    } else {
        String::new()
    }
}

fn normalize_uri(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut result = String::with_capacity(value.len());
    let mut chars = value.char_indices();

    while let Some((index, c)) = chars.next() {
        let escape = c == '%'
            && bytes.get(index + 1).is_some_and(u8::is_ascii_alphanumeric)
            && bytes.get(index + 2).is_some_and(u8::is_ascii_alphanumeric);

        if escape {
            result.push_str(&value[index..index + 3]);
            chars.nth(1);
        } else if c.is_ascii() && is_uri_safe(c as u8) {
            result.push(c);
        } else {
            let mut buffer = [0; 4];
            result.push_str(&urlencoding::encode(c.encode_utf8(&mut buffer)));
        }
    }

    result
}

fn is_uri_safe(byte: u8) -> bool {
    matches!(
        byte,
        b'!' | b'#' | b'$' | b'&'..=b';' | b'=' | b'?'..=b'Z' | b'_' | b'a'..=b'z' | b'~'
    )
}
