// SPDX-License-Identifier: AGPL-3.0-or-later
//! mdast: the Markdown syntax tree, as far as the bridge handles it
//!
//! Node shapes follow the mdast JSON format, so trees produced by other mdast
//! tooling deserialize directly through [`MdNode::from_value`].

use gemtext_core::{check_tree, ConversionError, Data, Position, Result};
use serde::{Deserialize, Serialize};

/// Node holding other nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    #[serde(default)]
    pub children: Vec<MdNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Node holding a string
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Node with no content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Void {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    #[serde(default)]
    pub depth: u8,
    #[serde(default)]
    pub children: Vec<MdNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    #[serde(default)]
    pub ordered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    #[serde(default)]
    pub spread: bool,
    #[serde(default)]
    pub children: Vec<MdNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Task state; `None` for plain items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default)]
    pub spread: bool,
    #[serde(default)]
    pub children: Vec<MdNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Code {
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub meta: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FootnoteDefinition {
    #[serde(default)]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub children: Vec<MdNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub children: Vec<MdNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// How a reference names its definition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    Shortcut,
    Collapsed,
    #[default]
    Full,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReference {
    #[serde(default)]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub reference_type: ReferenceType,
    #[serde(default)]
    pub children: Vec<MdNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    #[serde(default)]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub reference_type: ReferenceType,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FootnoteReference {
    #[serde(default)]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignKind {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub align: Vec<Option<AlignKind>>,
    #[serde(default)]
    pub children: Vec<MdNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Any mdast node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MdNode {
    Root(Parent),
    Paragraph(Parent),
    Heading(Heading),
    ThematicBreak(Void),
    Blockquote(Parent),
    List(List),
    ListItem(ListItem),
    Code(Code),
    Html(Literal),
    Definition(Definition),
    FootnoteDefinition(FootnoteDefinition),
    Text(Literal),
    Emphasis(Parent),
    Strong(Parent),
    Delete(Parent),
    InlineCode(Literal),
    Break(Void),
    Link(Link),
    Image(Image),
    LinkReference(LinkReference),
    ImageReference(ImageReference),
    /// Inline footnote, `^[like this]`
    Footnote(Parent),
    FootnoteReference(FootnoteReference),
    Table(Table),
    TableRow(Parent),
    TableCell(Parent),
    Yaml(Literal),
    Toml(Literal),
}

const MD_TYPES: [&str; 28] = [
    "root",
    "paragraph",
    "heading",
    "thematicBreak",
    "blockquote",
    "list",
    "listItem",
    "code",
    "html",
    "definition",
    "footnoteDefinition",
    "text",
    "emphasis",
    "strong",
    "delete",
    "inlineCode",
    "break",
    "link",
    "image",
    "linkReference",
    "imageReference",
    "footnote",
    "footnoteReference",
    "table",
    "tableRow",
    "tableCell",
    "yaml",
    "toml",
];

impl MdNode {
    /// Parse a node from a dynamic JSON tree
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        check_tree(&value, &MD_TYPES)?;

        serde_json::from_value(value)
            .map_err(|e| ConversionError::SerializationError(e.to_string()))
    }

    pub fn text(value: impl Into<String>) -> Self {
        MdNode::Text(Literal {
            value: value.into(),
            ..Literal::default()
        })
    }

    pub fn paragraph(children: Vec<MdNode>) -> Self {
        MdNode::Paragraph(Parent {
            children,
            ..Parent::default()
        })
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            MdNode::Root(_) => "root",
            MdNode::Paragraph(_) => "paragraph",
            MdNode::Heading(_) => "heading",
            MdNode::ThematicBreak(_) => "thematicBreak",
            MdNode::Blockquote(_) => "blockquote",
            MdNode::List(_) => "list",
            MdNode::ListItem(_) => "listItem",
            MdNode::Code(_) => "code",
            MdNode::Html(_) => "html",
            MdNode::Definition(_) => "definition",
            MdNode::FootnoteDefinition(_) => "footnoteDefinition",
            MdNode::Text(_) => "text",
            MdNode::Emphasis(_) => "emphasis",
            MdNode::Strong(_) => "strong",
            MdNode::Delete(_) => "delete",
            MdNode::InlineCode(_) => "inlineCode",
            MdNode::Break(_) => "break",
            MdNode::Link(_) => "link",
            MdNode::Image(_) => "image",
            MdNode::LinkReference(_) => "linkReference",
            MdNode::ImageReference(_) => "imageReference",
            MdNode::Footnote(_) => "footnote",
            MdNode::FootnoteReference(_) => "footnoteReference",
            MdNode::Table(_) => "table",
            MdNode::TableRow(_) => "tableRow",
            MdNode::TableCell(_) => "tableCell",
            MdNode::Yaml(_) => "yaml",
            MdNode::Toml(_) => "toml",
        }
    }

    /// Child nodes; empty for nodes that cannot have any
    pub fn children(&self) -> &[MdNode] {
        match self {
            MdNode::Root(node)
            | MdNode::Paragraph(node)
            | MdNode::Blockquote(node)
            | MdNode::Emphasis(node)
            | MdNode::Strong(node)
            | MdNode::Delete(node)
            | MdNode::Footnote(node)
            | MdNode::TableRow(node)
            | MdNode::TableCell(node) => &node.children,
            MdNode::Heading(node) => &node.children,
            MdNode::List(node) => &node.children,
            MdNode::ListItem(node) => &node.children,
            MdNode::FootnoteDefinition(node) => &node.children,
            MdNode::Link(node) => &node.children,
            MdNode::LinkReference(node) => &node.children,
            MdNode::Table(node) => &node.children,
            MdNode::ThematicBreak(_)
            | MdNode::Break(_)
            | MdNode::Code(_)
            | MdNode::Html(_)
            | MdNode::Definition(_)
            | MdNode::Text(_)
            | MdNode::InlineCode(_)
            | MdNode::Image(_)
            | MdNode::ImageReference(_)
            | MdNode::FootnoteReference(_)
            | MdNode::Yaml(_)
            | MdNode::Toml(_) => &[],
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.meta().0.as_ref()
    }

    pub fn data(&self) -> Option<&Data> {
        self.meta().1.as_ref()
    }

    fn meta(&self) -> (&Option<Position>, &Option<Data>) {
        match self {
            MdNode::Root(node)
            | MdNode::Paragraph(node)
            | MdNode::Blockquote(node)
            | MdNode::Emphasis(node)
            | MdNode::Strong(node)
            | MdNode::Delete(node)
            | MdNode::Footnote(node)
            | MdNode::TableRow(node)
            | MdNode::TableCell(node) => (&node.position, &node.data),
            MdNode::Html(node)
            | MdNode::Text(node)
            | MdNode::InlineCode(node)
            | MdNode::Yaml(node)
            | MdNode::Toml(node) => (&node.position, &node.data),
            MdNode::ThematicBreak(node) | MdNode::Break(node) => (&node.position, &node.data),
            MdNode::Heading(node) => (&node.position, &node.data),
            MdNode::List(node) => (&node.position, &node.data),
            MdNode::ListItem(node) => (&node.position, &node.data),
            MdNode::Code(node) => (&node.position, &node.data),
            MdNode::Definition(node) => (&node.position, &node.data),
            MdNode::FootnoteDefinition(node) => (&node.position, &node.data),
            MdNode::Link(node) => (&node.position, &node.data),
            MdNode::Image(node) => (&node.position, &node.data),
            MdNode::LinkReference(node) => (&node.position, &node.data),
            MdNode::ImageReference(node) => (&node.position, &node.data),
            MdNode::FootnoteReference(node) => (&node.position, &node.data),
            MdNode::Table(node) => (&node.position, &node.data),
        }
    }
}
