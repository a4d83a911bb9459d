// SPDX-License-Identifier: AGPL-3.0-or-later
//! gast: the abstract syntax tree for gemtext
//!
//! The tree is flat by construction: a `Root` holds block nodes, and the only
//! nesting is `List` holding `ListItem`s. Positions are copied from the tokens
//! that produced each node; `data` is an opaque bag that bridges may fill and
//! that the core never inspects.

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, Result};

/// Opaque passthrough bag attached to nodes
pub type Data = serde_json::Map<String, serde_json::Value>;

/// A single point in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
    /// 0-based byte offset
    pub offset: usize,
}

impl Point {
    pub const fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

/// Span between two points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

impl Position {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// Document root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Root {
    #[serde(default)]
    pub children: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Explicit hard break (a blank line)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Break {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// `#`, `##` or `###` line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// 1-3 when parsed; serializers clamp anything else
    #[serde(default)]
    pub rank: u8,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Plain paragraph line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Text {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// `>` line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Fenced preformatted block
///
/// `value` keeps the inner line endings verbatim, so `\n` and `\r\n` may be
/// mixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pre {
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// `=>` line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Run of consecutive `*` lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    #[serde(default)]
    pub children: Vec<ListItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// One `*` line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Content allowed directly in a root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Break(Break),
    Heading(Heading),
    Link(Link),
    List(List),
    Pre(Pre),
    Quote(Quote),
    Text(Text),
}

/// Any gast node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Root(Root),
    Break(Break),
    Heading(Heading),
    Link(Link),
    List(List),
    ListItem(ListItem),
    Pre(Pre),
    Quote(Quote),
    Text(Text),
}

/// Every `type` tag that [`Node::from_value`] accepts
const NODE_TYPES: [&str; 9] = [
    "root", "break", "heading", "link", "list", "listItem", "pre", "quote", "text",
];

/// Check the `type` tag of `value` and of every node below it in `children`
///
/// Fails with [`ConversionError::InvalidValue`] for a node that is not an
/// object with a string `type`, and with [`ConversionError::UnknownNode`] for
/// a tag missing from `types`. The first offending node in document order
/// wins.
pub fn check_tree(value: &serde_json::Value, types: &[&str]) -> Result<()> {
    let Some(kind) = value.get("type").and_then(serde_json::Value::as_str) else {
        return Err(ConversionError::InvalidValue(value.to_string()));
    };

    if !types.contains(&kind) {
        return Err(ConversionError::UnknownNode(kind.to_string()));
    }

    if let Some(children) = value.get("children").and_then(serde_json::Value::as_array) {
        for child in children {
            check_tree(child, types)?;
        }
    }

    Ok(())
}

impl Node {
    /// Parse a node from a dynamic JSON tree
    ///
    /// Every node down the `children` is checked with [`check_tree`] first,
    /// so a bad tag at any depth fails with [`ConversionError::InvalidValue`]
    /// or [`ConversionError::UnknownNode`].
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        check_tree(&value, &NODE_TYPES)?;

        serde_json::from_value(value)
            .map_err(|e| ConversionError::SerializationError(e.to_string()))
    }

    /// The `type` tag of this node
    pub const fn kind(&self) -> &'static str {
        match self {
            Node::Root(_) => "root",
            Node::Break(_) => "break",
            Node::Heading(_) => "heading",
            Node::Link(_) => "link",
            Node::List(_) => "list",
            Node::ListItem(_) => "listItem",
            Node::Pre(_) => "pre",
            Node::Quote(_) => "quote",
            Node::Text(_) => "text",
        }
    }

    /// Literal value of the node, if it is a literal
    pub fn value(&self) -> Option<&str> {
        match self {
            Node::Heading(node) => Some(&node.value),
            Node::Link(node) => Some(&node.value),
            Node::ListItem(node) => Some(&node.value),
            Node::Pre(node) => Some(&node.value),
            Node::Quote(node) => Some(&node.value),
            Node::Text(node) => Some(&node.value),
            Node::Root(_) | Node::Break(_) | Node::List(_) => None,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            Node::Root(node) => node.position.as_ref(),
            Node::Break(node) => node.position.as_ref(),
            Node::Heading(node) => node.position.as_ref(),
            Node::Link(node) => node.position.as_ref(),
            Node::List(node) => node.position.as_ref(),
            Node::ListItem(node) => node.position.as_ref(),
            Node::Pre(node) => node.position.as_ref(),
            Node::Quote(node) => node.position.as_ref(),
            Node::Text(node) => node.position.as_ref(),
        }
    }

    pub fn position_mut(&mut self) -> &mut Option<Position> {
        match self {
            Node::Root(node) => &mut node.position,
            Node::Break(node) => &mut node.position,
            Node::Heading(node) => &mut node.position,
            Node::Link(node) => &mut node.position,
            Node::List(node) => &mut node.position,
            Node::ListItem(node) => &mut node.position,
            Node::Pre(node) => &mut node.position,
            Node::Quote(node) => &mut node.position,
            Node::Text(node) => &mut node.position,
        }
    }

    pub fn data(&self) -> Option<&Data> {
        match self {
            Node::Root(node) => node.data.as_ref(),
            Node::Break(node) => node.data.as_ref(),
            Node::Heading(node) => node.data.as_ref(),
            Node::Link(node) => node.data.as_ref(),
            Node::List(node) => node.data.as_ref(),
            Node::ListItem(node) => node.data.as_ref(),
            Node::Pre(node) => node.data.as_ref(),
            Node::Quote(node) => node.data.as_ref(),
            Node::Text(node) => node.data.as_ref(),
        }
    }

    /// Narrow to root content; `Root` and bare `ListItem` are not blocks
    pub fn into_block(self) -> Option<Block> {
        match self {
            Node::Break(node) => Some(Block::Break(node)),
            Node::Heading(node) => Some(Block::Heading(node)),
            Node::Link(node) => Some(Block::Link(node)),
            Node::List(node) => Some(Block::List(node)),
            Node::Pre(node) => Some(Block::Pre(node)),
            Node::Quote(node) => Some(Block::Quote(node)),
            Node::Text(node) => Some(Block::Text(node)),
            Node::Root(_) | Node::ListItem(_) => None,
        }
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        match block {
            Block::Break(node) => Node::Break(node),
            Block::Heading(node) => Node::Heading(node),
            Block::Link(node) => Node::Link(node),
            Block::List(node) => Node::List(node),
            Block::Pre(node) => Node::Pre(node),
            Block::Quote(node) => Node::Quote(node),
            Block::Text(node) => Node::Text(node),
        }
    }
}

impl From<Root> for Node {
    fn from(root: Root) -> Self {
        Node::Root(root)
    }
}

impl From<ListItem> for Node {
    fn from(item: ListItem) -> Self {
        Node::ListItem(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_value_rejects_non_nodes() {
        let err = Node::from_value(json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Cannot handle value `{}`, expected node");

        let err = Node::from_value(json!(1)).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidValue(_)));
    }

    #[test]
    fn test_from_value_rejects_unknown_nodes() {
        let err = Node::from_value(json!({"type": "unknown"})).unwrap_err();
        assert_eq!(err.to_string(), "Cannot handle unknown node `unknown`");
    }

    #[test]
    fn test_from_value_checks_nested_children() {
        let err = Node::from_value(json!({"type": "root", "children": [{"type": "bogus"}]}))
            .unwrap_err();
        assert!(matches!(err, ConversionError::UnknownNode(kind) if kind == "bogus"));

        let err = Node::from_value(json!({"type": "list", "children": [1]})).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidValue(value) if value == "1"));

        let err = Node::from_value(json!({
            "type": "root",
            "children": [{"type": "list", "children": [{"type": "listItem"}, {"value": "a"}]}]
        }))
        .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidValue(_)));
    }

    #[test]
    fn test_from_value_fills_missing_fields() {
        let node = Node::from_value(json!({"type": "heading"})).unwrap();
        assert_eq!(
            node,
            Node::Heading(Heading {
                rank: 0,
                value: String::new(),
                position: None,
                data: None,
            })
        );

        let node = Node::from_value(json!({"type": "list"})).unwrap();
        assert_eq!(node, Node::List(List::default()));
    }

    #[test]
    fn test_serde_shape() {
        let node = Node::Link(Link {
            url: Some("a".to_string()),
            value: "b".to_string(),
            position: Some(Position::new(Point::new(1, 1, 0), Point::new(1, 7, 6))),
            data: None,
        });

        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "type": "link",
                "url": "a",
                "value": "b",
                "position": {
                    "start": {"line": 1, "column": 1, "offset": 0},
                    "end": {"line": 1, "column": 7, "offset": 6}
                }
            })
        );
    }

    #[test]
    fn test_list_item_is_not_a_block() {
        assert!(Node::ListItem(ListItem::default()).into_block().is_none());
        assert!(Node::Root(Root::default()).into_block().is_none());
        assert!(Node::Break(Break::default()).into_block().is_some());
    }

    #[test]
    fn test_data_passthrough() {
        let node = Node::from_value(json!({
            "type": "text",
            "value": "a",
            "data": {"x": "y"}
        }))
        .unwrap();
        assert_eq!(node.data().and_then(|d| d.get("x")), Some(&json!("y")));
    }
}
