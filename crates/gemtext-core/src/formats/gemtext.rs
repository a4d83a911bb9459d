// SPDX-License-Identifier: AGPL-3.0-or-later
//! Gemtext serializer: gast back to gemtext text

use crate::ast::{Block, Heading, Link, List, ListItem, Node, Pre, Quote, Root};
use crate::error::Result;

/// Serialize any gast node to gemtext
///
/// Headings clamp their rank to 1..=3. Blank values drop the space after a
/// marker, and a link without a URL drops its text.
pub fn to_gemtext(node: &Node) -> String {
    match node {
        Node::Root(node) => root(node),
        Node::ListItem(node) => list_item(node),
        Node::Break(_) => "\n".to_string(),
        Node::Heading(node) => heading(node),
        Node::Link(node) => link(node),
        Node::List(node) => list(node),
        Node::Pre(node) => pre(node),
        Node::Quote(node) => quote(node),
        Node::Text(node) => node.value.clone(),
    }
}

/// Serialize a dynamic JSON tree, validating it as gast first
pub fn to_gemtext_value(value: &serde_json::Value) -> Result<String> {
    let node = Node::from_value(value.clone())?;
    Ok(to_gemtext(&node))
}

fn block(block: &Block) -> String {
    match block {
        Block::Break(_) => "\n".to_string(),
        Block::Heading(node) => heading(node),
        Block::Link(node) => link(node),
        Block::List(node) => list(node),
        Block::Pre(node) => pre(node),
        Block::Quote(node) => quote(node),
        Block::Text(node) => node.value.clone(),
    }
}

fn root(node: &Root) -> String {
    let mut value = parent(node.children.iter().map(block));

    if !value.is_empty() && !value.ends_with('\n') {
        value.push('\n');
    }

    value
}

fn list(node: &List) -> String {
    let value = parent(node.children.iter().map(list_item));
    if value.is_empty() {
        "*".to_string()
    } else {
        value
    }
}

/// Join serialized children with line feeds; a break becomes a blank line
fn parent(children: impl Iterator<Item = String>) -> String {
    children
        .filter(|value| !value.is_empty())
        .map(|value| if value == "\n" { String::new() } else { value })
        .collect::<Vec<_>>()
        .join("\n")
}

fn heading(node: &Heading) -> String {
    let rank = usize::from(node.rank.clamp(1, 3));
    marked(&"#".repeat(rank), &node.value)
}

fn link(node: &Link) -> String {
    let mut value = "=>".to_string();

    if let Some(url) = node.url.as_deref().filter(|url| !url.is_empty()) {
        value.push(' ');
        value.push_str(url);
        if !node.value.is_empty() {
            value.push(' ');
            value.push_str(&node.value);
        }
    }

    value
}

fn list_item(node: &ListItem) -> String {
    marked("*", &node.value)
}

fn pre(node: &Pre) -> String {
    let mut value = "```".to_string();
    value.push_str(node.alt.as_deref().unwrap_or_default());
    if !node.value.is_empty() {
        value.push('\n');
        value.push_str(&node.value);
    }
    value.push_str("\n```");
    value
}

fn quote(node: &Quote) -> String {
    marked(">", &node.value)
}

fn marked(marker: &str, value: &str) -> String {
    if value.is_empty() {
        marker.to_string()
    } else {
        format!("{marker} {value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Break, Text};
    use crate::builder::from_gemtext;
    use crate::error::ConversionError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn text(value: &str) -> Block {
        Block::Text(Text {
            value: value.to_string(),
            ..Text::default()
        })
    }

    fn root(children: Vec<Block>) -> Node {
        Node::Root(Root {
            children,
            ..Root::default()
        })
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(to_gemtext(&root(vec![])), "");
    }

    #[test]
    fn test_root_gets_final_line_feed() {
        assert_eq!(to_gemtext(&root(vec![text("a"), text("b")])), "a\nb\n");
    }

    #[test]
    fn test_breaks_become_blank_lines() {
        let tree = root(vec![text("a"), Block::Break(Break::default()), text("b")]);
        assert_eq!(to_gemtext(&tree), "a\n\nb\n");
        assert_eq!(to_gemtext(&Node::Break(Break::default())), "\n");
    }

    #[test]
    fn test_empty_children_are_skipped() {
        assert_eq!(to_gemtext(&root(vec![text(""), text("a"), text("")])), "a\n");
    }

    #[test]
    fn test_heading_rank_is_clamped() {
        let heading = |rank: u8, value: &str| {
            to_gemtext(&Node::Heading(Heading {
                rank,
                value: value.to_string(),
                ..Heading::default()
            }))
        };

        assert_eq!(heading(0, "a"), "# a");
        assert_eq!(heading(1, ""), "#");
        assert_eq!(heading(2, "b"), "## b");
        assert_eq!(heading(3, "c"), "### c");
        assert_eq!(heading(7, "d"), "### d");
    }

    #[test]
    fn test_links() {
        let link = |url: Option<&str>, value: &str| {
            to_gemtext(&Node::Link(Link {
                url: url.map(str::to_string),
                value: value.to_string(),
                ..Link::default()
            }))
        };

        assert_eq!(link(None, ""), "=>");
        assert_eq!(link(None, "dropped"), "=>");
        assert_eq!(link(Some("a"), ""), "=> a");
        assert_eq!(link(Some("a"), "b c"), "=> a b c");
    }

    #[test]
    fn test_lists() {
        let item = |value: &str| ListItem {
            value: value.to_string(),
            ..ListItem::default()
        };

        assert_eq!(to_gemtext(&Node::List(List::default())), "*");
        assert_eq!(
            to_gemtext(&Node::List(List {
                children: vec![item("a"), item(""), item("b")],
                ..List::default()
            })),
            "* a\n*\n* b"
        );
    }

    #[test]
    fn test_pre() {
        let pre = |alt: Option<&str>, value: &str| {
            to_gemtext(&Node::Pre(Pre {
                alt: alt.map(str::to_string),
                value: value.to_string(),
                ..Pre::default()
            }))
        };

        assert_eq!(pre(None, ""), "```\n```");
        assert_eq!(pre(Some("js"), "a\nb"), "```js\na\nb\n```");
    }

    #[test]
    fn test_quote() {
        assert_eq!(
            to_gemtext(&Node::Quote(Quote {
                value: "a".to_string(),
                ..Quote::default()
            })),
            "> a"
        );
    }

    #[test]
    fn test_reparses() {
        let input = "# a\n\n=> b c\n* d\n* e\n```x\nf\n```\n> g\nh\n";
        let tree = Node::Root(from_gemtext(input));
        assert_eq!(to_gemtext(&tree), input);
    }

    #[test]
    fn test_value_trees() {
        let tree = json!({
            "type": "root",
            "children": [
                {"type": "heading", "rank": 2, "value": "a"},
                {"type": "list", "children": [{"type": "listItem", "value": "b"}]}
            ]
        });
        assert_eq!(to_gemtext_value(&tree).unwrap(), "## a\n* b\n");

        let err = to_gemtext_value(&json!({"type": "blockquote"})).unwrap_err();
        assert!(matches!(err, ConversionError::UnknownNode(kind) if kind == "blockquote"));

        let err = to_gemtext_value(&json!("a")).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidValue(_)));
    }
}
