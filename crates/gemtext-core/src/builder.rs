// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tree builder: token stream to gast
//!
//! One left-to-right pass with an index cursor and an explicit stack of open
//! nodes. Multi-token constructs (a heading's sequence, whitespace and text)
//! collapse into single nodes, and consecutive list lines share one `list`.
//! The token stream is trusted to have the shape the tokenizer produces.

use crate::ast::{
    Break, Heading, Link, List, ListItem, Node, Position, Pre, Quote, Root, Text,
};
use crate::token::{Token, TokenKind};
use crate::tokenizer::tokenize;

/// Parse a whole gemtext document into gast
pub fn from_gemtext(input: &str) -> Root {
    from_tokens(&tokenize(input))
}

/// Build gast from the complete token stream of a finished document
///
/// `tokens` must be non-empty and end in `eof`, as every stream out of a
/// finished [`Tokenizer`](crate::Tokenizer) does. The root spans from the
/// first token's start to the last token's end.
#[tracing::instrument(level = "debug", skip_all, fields(tokens = tokens.len()))]
pub fn from_tokens(tokens: &[Token]) -> Root {
    debug_assert!(!tokens.is_empty(), "a finished token stream holds at least `eof`");

    let position = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => Some(Position::new(first.start, last.end)),
        _ => None,
    };

    let mut builder = TreeBuilder {
        tokens,
        index: 0,
        stack: vec![Node::Root(Root {
            children: Vec::new(),
            position,
            data: None,
        })],
    };
    builder.run();
    builder.finish()
}

struct TreeBuilder<'a> {
    tokens: &'a [Token],
    /// Last consumed token
    index: usize,
    /// Open nodes; the bottom is always the root
    stack: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn run(&mut self) {
        let tokens = self.tokens;

        while let Some(token) = tokens.get(self.index) {
            match token.kind {
                TokenKind::Eol if token.hard => {
                    self.leaf(Node::Break(Break::default()), token, token);
                }
                TokenKind::HeadingSequence => self.heading(token),
                TokenKind::LinkSequence => self.link(token),
                TokenKind::ListSequence => self.list_item(token),
                TokenKind::PreSequence => self.pre(token),
                TokenKind::QuoteSequence => self.quote(token),
                TokenKind::Text => {
                    let node = Node::Text(Text {
                        value: token.value.clone(),
                        ..Text::default()
                    });
                    self.leaf(node, token, token);
                }
                // Soft EOLs and EOF only matter as lookahead.
                _ => {}
            }

            self.index += 1;
        }
    }

    fn heading(&mut self, open: &'a Token) {
        // The sequence is one to three `#`.
        let rank = open.value.len() as u8;

        self.eat(TokenKind::Whitespace);
        let value = self.eat_value(TokenKind::HeadingText);

        let node = Node::Heading(Heading {
            rank,
            value,
            ..Heading::default()
        });
        let last = self.current();
        self.leaf(node, open, last);
    }

    fn link(&mut self, open: &'a Token) {
        let mut url = None;
        let mut value = String::new();

        self.eat(TokenKind::Whitespace);
        if let Some(token) = self.eat(TokenKind::LinkUrl) {
            url = Some(token.value.clone());

            self.eat(TokenKind::Whitespace);
            value = self.eat_value(TokenKind::LinkText);
        }

        let node = Node::Link(Link {
            url,
            value,
            ..Link::default()
        });
        let last = self.current();
        self.leaf(node, open, last);
    }

    fn list_item(&mut self, open: &'a Token) {
        if !matches!(self.stack.last(), Some(Node::List(_))) {
            self.enter(Node::List(List::default()), open);
        }

        self.eat(TokenKind::Whitespace);
        let value = self.eat_value(TokenKind::ListText);

        let node = Node::ListItem(ListItem {
            value,
            ..ListItem::default()
        });
        let last = self.current();
        self.leaf(node, open, last);

        // The run continues only if the very next line is another item.
        let continues = self.peek(1) == Some(TokenKind::Eol)
            && self.peek(2) == Some(TokenKind::ListSequence);
        if !continues {
            self.exit(last);
        }
    }

    fn pre(&mut self, open: &'a Token) {
        let tokens = self.tokens;
        let alt = self.eat(TokenKind::PreAlt).map(|token| token.value.clone());

        // The line ending of the opening fence is not content.
        self.eat(TokenKind::Eol);

        let mut values: Vec<&str> = Vec::new();
        while let Some(token) = tokens.get(self.index + 1) {
            self.index += 1;

            match token.kind {
                TokenKind::Eol | TokenKind::PreText => values.push(&token.value),
                TokenKind::PreSequence => {
                    // Drop the line ending before the closing fence, and its alt.
                    values.pop();
                    self.eat(TokenKind::PreAlt);
                    break;
                }
                _ => break,
            }
        }

        let node = Node::Pre(Pre {
            alt,
            value: values.concat(),
            ..Pre::default()
        });
        let last = self.current();
        self.leaf(node, open, last);
    }

    fn quote(&mut self, open: &'a Token) {
        self.eat(TokenKind::Whitespace);
        let value = self.eat_value(TokenKind::QuoteText);

        let node = Node::Quote(Quote {
            value,
            ..Quote::default()
        });
        let last = self.current();
        self.leaf(node, open, last);
    }

    fn current(&self) -> &'a Token {
        let tokens = self.tokens;
        &tokens[self.index]
    }

    fn peek(&self, ahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.index + ahead).map(|token| token.kind)
    }

    /// Consume the next token if it is of `kind`
    fn eat(&mut self, kind: TokenKind) -> Option<&'a Token> {
        let tokens = self.tokens;
        let token = tokens.get(self.index + 1).filter(|token| token.is(kind))?;
        self.index += 1;
        Some(token)
    }

    fn eat_value(&mut self, kind: TokenKind) -> String {
        self.eat(kind)
            .map(|token| token.value.clone())
            .unwrap_or_default()
    }

    fn enter(&mut self, mut node: Node, token: &Token) {
        *node.position_mut() = Some(Position::new(token.start, token.start));
        self.stack.push(node);
    }

    fn exit(&mut self, token: &Token) {
        if self.stack.len() < 2 {
            return;
        }

        if let Some(mut node) = self.stack.pop() {
            if let Some(position) = node.position_mut() {
                position.end = token.end;
            }
            self.attach(node);
        }
    }

    fn leaf(&mut self, node: Node, first: &Token, last: &Token) {
        self.enter(node, first);
        self.exit(last);
    }

    fn attach(&mut self, node: Node) {
        match (self.stack.last_mut(), node) {
            (Some(Node::List(list)), Node::ListItem(item)) => list.children.push(item),
            (Some(Node::Root(root)), node) => root.children.extend(node.into_block()),
            (_, node) => {
                tracing::warn!(kind = node.kind(), "dropping node outside the gast grammar");
            }
        }
    }

    fn finish(mut self) -> Root {
        // Only streams missing their `eof` leave a list open here.
        let end = self.tokens.last().map(|token| token.end).unwrap_or_default();
        while self.stack.len() > 1 {
            if let Some(mut node) = self.stack.pop() {
                if let Some(position) = node.position_mut() {
                    position.end = end;
                }
                self.attach(node);
            }
        }

        match self.stack.pop() {
            Some(Node::Root(root)) => root,
            _ => Root::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Point};
    use pretty_assertions::assert_eq;

    fn span(start: (usize, usize, usize), end: (usize, usize, usize)) -> Option<Position> {
        Some(Position::new(
            Point::new(start.0, start.1, start.2),
            Point::new(end.0, end.1, end.2),
        ))
    }

    fn text(value: &str, position: Option<Position>) -> Block {
        Block::Text(Text {
            value: value.to_string(),
            position,
            data: None,
        })
    }

    fn item(value: &str) -> ListItem {
        ListItem {
            value: value.to_string(),
            ..ListItem::default()
        }
    }

    /// Drop positions so structure can be compared on its own
    fn strip(root: Root) -> Vec<Block> {
        root.children
            .into_iter()
            .map(|block| match block {
                Block::Break(_) => Block::Break(Break::default()),
                Block::Heading(node) => Block::Heading(Heading {
                    position: None,
                    ..node
                }),
                Block::Link(node) => Block::Link(Link {
                    position: None,
                    ..node
                }),
                Block::List(node) => Block::List(List {
                    children: node
                        .children
                        .into_iter()
                        .map(|child| ListItem {
                            position: None,
                            ..child
                        })
                        .collect(),
                    position: None,
                    data: None,
                }),
                Block::Pre(node) => Block::Pre(Pre {
                    position: None,
                    ..node
                }),
                Block::Quote(node) => Block::Quote(Quote {
                    position: None,
                    ..node
                }),
                Block::Text(node) => Block::Text(Text {
                    position: None,
                    ..node
                }),
            })
            .collect()
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(
            from_gemtext(""),
            Root {
                children: vec![],
                position: span((1, 1, 0), (1, 1, 0)),
                data: None,
            }
        );
    }

    #[test]
    fn test_text_positions() {
        assert_eq!(
            from_gemtext("a\r\nb\nc"),
            Root {
                children: vec![
                    text("a", span((1, 1, 0), (1, 2, 1))),
                    text("b", span((2, 1, 3), (2, 2, 4))),
                    text("c", span((3, 1, 5), (3, 2, 6))),
                ],
                position: span((1, 1, 0), (3, 2, 6)),
                data: None,
            }
        );
    }

    #[test]
    fn test_breaks() {
        assert_eq!(
            from_gemtext("a\n\n").children,
            vec![
                text("a", span((1, 1, 0), (1, 2, 1))),
                Block::Break(Break {
                    position: span((2, 1, 2), (3, 1, 3)),
                    data: None,
                }),
            ]
        );
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            from_gemtext("### a\n##b\n#").children,
            vec![
                Block::Heading(Heading {
                    rank: 3,
                    value: "a".to_string(),
                    position: span((1, 1, 0), (1, 6, 5)),
                    data: None,
                }),
                Block::Heading(Heading {
                    rank: 2,
                    value: "b".to_string(),
                    position: span((2, 1, 6), (2, 4, 9)),
                    data: None,
                }),
                Block::Heading(Heading {
                    rank: 1,
                    value: String::new(),
                    position: span((3, 1, 10), (3, 2, 11)),
                    data: None,
                }),
            ]
        );
    }

    #[test]
    fn test_links() {
        let link = |url: Option<&str>, value: &str, position| {
            Block::Link(Link {
                url: url.map(str::to_string),
                value: value.to_string(),
                position,
                data: None,
            })
        };

        assert_eq!(
            from_gemtext("=\n=>\n=>a\n=> b\n=>c d\n=> e\t\tf").children,
            vec![
                text("=", span((1, 1, 0), (1, 2, 1))),
                link(None, "", span((2, 1, 2), (2, 3, 4))),
                link(Some("a"), "", span((3, 1, 5), (3, 4, 8))),
                link(Some("b"), "", span((4, 1, 9), (4, 5, 13))),
                link(Some("c"), "d", span((5, 1, 14), (5, 6, 19))),
                link(Some("e"), "f", span((6, 1, 20), (6, 8, 27))),
            ]
        );
    }

    #[test]
    fn test_lists_group_consecutive_items() {
        let root = from_gemtext("*\n* \n*a\n* b\n\nc\n* d\n* e\n*\nf");
        let list = |values: &[&str]| {
            Block::List(List {
                children: values.iter().map(|value| item(value)).collect(),
                ..List::default()
            })
        };

        assert_eq!(
            strip(root),
            vec![
                list(&["", ""]),
                text("*a", None),
                list(&["b"]),
                Block::Break(Break::default()),
                text("c", None),
                list(&["d", "e", ""]),
                text("f", None),
            ]
        );
    }

    #[test]
    fn test_list_position_spans_its_items() {
        let root = from_gemtext("* a\n* b\nc");
        match &root.children[0] {
            Block::List(list) => {
                assert_eq!(list.position, span((1, 1, 0), (2, 4, 7)));
                assert_eq!(list.children[1].position, span((2, 1, 4), (2, 4, 7)));
            }
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn test_hard_break_closes_list() {
        let root = from_gemtext("* a\n\n* b");
        let children = strip(root);
        assert_eq!(children.len(), 3);
        assert!(matches!(children[0], Block::List(_)));
        assert!(matches!(children[1], Block::Break(_)));
        assert!(matches!(children[2], Block::List(_)));
    }

    #[test]
    fn test_pre() {
        let pre = |alt: Option<&str>, value: &str| {
            Block::Pre(Pre {
                alt: alt.map(str::to_string),
                value: value.to_string(),
                ..Pre::default()
            })
        };

        assert_eq!(strip(from_gemtext("```")), vec![pre(None, "")]);
        assert_eq!(strip(from_gemtext("```x")), vec![pre(Some("x"), "")]);
        assert_eq!(strip(from_gemtext("```\na\nb\n\nc")), vec![pre(None, "a\nb\n\nc")]);
        assert_eq!(
            strip(from_gemtext("```\n```\na")),
            vec![pre(None, ""), text("a", None)]
        );
        assert_eq!(
            strip(from_gemtext("```\na\n\nb\n```\na")),
            vec![pre(None, "a\n\nb"), text("a", None)]
        );
        assert_eq!(
            strip(from_gemtext("```a\nb\n```c\nd")),
            vec![pre(Some("a"), "b"), text("d", None)]
        );
        assert_eq!(
            strip(from_gemtext("```\r\na\r\nb\n```")),
            vec![pre(None, "a\r\nb")]
        );
    }

    #[test]
    fn test_pre_position_ends_at_closing_fence() {
        let root = from_gemtext("```a\nb\n```c\nd");
        match &root.children[0] {
            Block::Pre(pre) => assert_eq!(pre.position, span((1, 1, 0), (3, 5, 11))),
            other => panic!("expected pre, got {other:?}"),
        }
    }

    #[test]
    fn test_quotes() {
        let quote = |value: &str| {
            Block::Quote(Quote {
                value: value.to_string(),
                ..Quote::default()
            })
        };

        assert_eq!(
            strip(from_gemtext("> a\n>b\n>")),
            vec![quote("a"), quote("b"), quote("")]
        );
    }
}
