// SPDX-License-Identifier: AGPL-3.0-or-later
//! mdast to gast
//!
//! Gemtext has no inline markup, so phrasing content flattens to plain text.
//! Links and images leave a `[n]` marker in the text and queue a link line,
//! which is emitted before the next heading (or at the end of the document
//! with `endlinks`). Footnotes leave a `[a]` marker and their bodies become
//! text lines at the end of the document.

use std::collections::HashMap;

use gemtext_core::{
    Block, Break, Data, Heading, Link, List, ListItem, MdastOptions, Node, Position, Pre, Quote,
    Result, Root, Text,
};

use crate::mdast::{Definition, FootnoteDefinition, MdNode};

/// Fence alt for tables
const DSV_NAME: &str = "csv";
const DSV_DELIMITER: &str = ",";

/// Result of converting one mdast node
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    /// The node has no gast counterpart
    Nothing,
    /// Inline content, flattened to a string
    Phrasing(String),
    Node(Node),
    /// A heading, preceded by the links queued before it
    Nodes(Vec<Node>),
}

impl Converted {
    /// Unwrap a converted root
    pub fn into_root(self) -> Option<Root> {
        match self {
            Converted::Node(Node::Root(root)) => Some(root),
            _ => None,
        }
    }

    pub fn into_nodes(self) -> Vec<Node> {
        match self {
            Converted::Nothing | Converted::Phrasing(_) => Vec::new(),
            Converted::Node(node) => vec![node],
            Converted::Nodes(nodes) => nodes,
        }
    }
}

/// Turn mdast into gast
#[tracing::instrument(level = "debug", skip_all, fields(kind = tree.kind()))]
pub fn from_mdast(tree: &MdNode, options: &MdastOptions) -> Converted {
    let mut context = Context::new(tree, *options);
    let converted = context.handle(tree);
    tracing::debug!(
        links = context.link_count,
        footnotes = context.footnote_count,
        "converted mdast"
    );
    converted
}

/// Turn a dynamic JSON mdast tree into gast
pub fn from_mdast_value(value: &serde_json::Value, options: &MdastOptions) -> Result<Converted> {
    let tree = MdNode::from_value(value.clone())?;
    Ok(from_mdast(&tree, options))
}

enum Piece {
    Phrasing(String),
    Node(Node),
}

impl Piece {
    fn value(&self) -> &str {
        match self {
            Piece::Phrasing(value) => value,
            Piece::Node(node) => node.value().unwrap_or_default(),
        }
    }
}

/// Link waiting to be emitted as a link line
struct Resource {
    url: String,
    title: String,
    no: usize,
    position: Option<Position>,
    data: Option<Data>,
}

/// Footnote waiting to be emitted at the end
struct Footnote {
    identifier: String,
    children: Vec<MdNode>,
    no: usize,
    position: Option<Position>,
    data: Option<Data>,
}

struct Context<'a> {
    options: MdastOptions,
    definitions: HashMap<String, &'a Definition>,
    footnote_definitions: HashMap<String, &'a FootnoteDefinition>,
    links: Vec<Resource>,
    footnotes: Vec<Footnote>,
    link_count: usize,
    footnote_count: usize,
}

impl<'a> Context<'a> {
    fn new(tree: &'a MdNode, options: MdastOptions) -> Self {
        let mut context = Self {
            options,
            definitions: HashMap::new(),
            footnote_definitions: HashMap::new(),
            links: Vec::new(),
            footnotes: Vec::new(),
            link_count: 0,
            footnote_count: 0,
        };
        context.collect(tree);
        context
    }

    /// Index definitions by normalized identifier; the first one wins
    fn collect(&mut self, node: &'a MdNode) {
        match node {
            MdNode::Definition(definition) => {
                let id = definition.identifier.to_uppercase();
                if !id.is_empty() {
                    self.definitions.entry(id).or_insert(definition);
                }
            }
            MdNode::FootnoteDefinition(definition) => {
                let id = definition.identifier.to_uppercase();
                if !id.is_empty() {
                    self.footnote_definitions.entry(id).or_insert(definition);
                }
            }
            _ => {}
        }

        for child in node.children() {
            self.collect(child);
        }
    }

    fn handle(&mut self, node: &MdNode) -> Converted {
        match node {
            MdNode::Root(node) => {
                let mut children: Vec<Block> = self
                    .parent(&node.children)
                    .into_iter()
                    .filter_map(|piece| match piece {
                        Piece::Node(node) => node.into_block(),
                        // Stray phrasing directly in the root becomes its own line.
                        Piece::Phrasing(value) if !value.is_empty() => Some(Block::Text(Text {
                            value: single_line(&value),
                            ..Text::default()
                        })),
                        Piece::Phrasing(_) => None,
                    })
                    .collect();
                children.extend(self.flush(true).into_iter().filter_map(Node::into_block));

                Converted::Node(Node::Root(Root {
                    children: self.wrap(children),
                    position: node.position,
                    data: node.data.clone(),
                }))
            }
            MdNode::Blockquote(node) => Converted::Node(Node::Quote(Quote {
                value: self.flow(&node.children),
                position: node.position,
                data: node.data.clone(),
            })),
            MdNode::Break(_) => Converted::Phrasing(" ".to_string()),
            MdNode::Code(node) => {
                let alt = node
                    .lang
                    .as_deref()
                    .filter(|lang| !lang.is_empty())
                    .map(|lang| match node.meta.as_deref() {
                        Some(meta) if !meta.is_empty() => format!("{lang} {meta}"),
                        _ => lang.to_string(),
                    });

                Converted::Node(Node::Pre(Pre {
                    alt,
                    value: node.value.clone(),
                    position: node.position,
                    data: node.data.clone(),
                }))
            }
            MdNode::Emphasis(node) | MdNode::Strong(node) => {
                Converted::Phrasing(self.phrasing(&node.children))
            }
            MdNode::Footnote(node) => {
                let children = vec![MdNode::paragraph(node.children.clone())];
                let no = self.call("", children, node.position, node.data.clone());
                Converted::Phrasing(format!("[{}]", to_letter(no)))
            }
            MdNode::FootnoteReference(node) => {
                let id = node.identifier.to_uppercase();
                match self.footnote_definitions.get(&id).copied() {
                    Some(definition) => {
                        let no = self.call(
                            &definition.identifier,
                            definition.children.clone(),
                            definition.position,
                            definition.data.clone(),
                        );
                        Converted::Phrasing(format!("[{}]", to_letter(no)))
                    }
                    None => Converted::Nothing,
                }
            }
            MdNode::Heading(node) => {
                let rank = node.depth.max(1);
                let value = self.phrasing(&node.children);

                let result = if rank <= 3 {
                    Node::Heading(Heading {
                        rank,
                        value,
                        position: node.position,
                        data: node.data.clone(),
                    })
                } else if !value.is_empty() {
                    Node::Text(Text {
                        value,
                        position: node.position,
                        data: node.data.clone(),
                    })
                } else {
                    return Converted::Nothing;
                };

                let mut nodes = self.flush(false);
                nodes.push(result);
                Converted::Nodes(nodes)
            }
            MdNode::Link(node) => {
                let mut value = self.phrasing(&node.children);
                let no = self.resource(&node.url, node.title.as_deref(), node.position, &node.data);
                value.push_str(&format!("[{no}]"));
                Converted::Phrasing(value)
            }
            MdNode::Image(node) => {
                let mut value = node.alt.clone().unwrap_or_default();
                let no = self.resource(&node.url, node.title.as_deref(), node.position, &node.data);
                value.push_str(&format!("[{no}]"));
                Converted::Phrasing(value)
            }
            MdNode::LinkReference(node) => {
                let mut value = self.phrasing(&node.children);
                value.push_str(&self.reference(&node.identifier));
                Converted::Phrasing(value)
            }
            MdNode::ImageReference(node) => {
                let mut value = node.alt.clone().unwrap_or_default();
                value.push_str(&self.reference(&node.identifier));
                Converted::Phrasing(value)
            }
            MdNode::Text(node) | MdNode::InlineCode(node) => {
                Converted::Phrasing(node.value.clone())
            }
            MdNode::List(node) => {
                let children = self
                    .parent(&node.children)
                    .into_iter()
                    .filter_map(|piece| match piece {
                        Piece::Node(Node::ListItem(item)) => Some(item),
                        _ => None,
                    })
                    .collect();

                Converted::Node(Node::List(List {
                    children,
                    position: node.position,
                    data: node.data.clone(),
                }))
            }
            MdNode::ListItem(node) => {
                let mut value = self.flow(&node.children);

                if let Some(checked) = node.checked {
                    let mark = if checked { "✓" } else { "✗" };
                    value = if value.is_empty() {
                        mark.to_string()
                    } else {
                        format!("{mark} {value}")
                    };
                }

                Converted::Node(Node::ListItem(ListItem {
                    value,
                    position: node.position,
                    data: node.data.clone(),
                }))
            }
            MdNode::Paragraph(node) => {
                let value = self.phrasing(&node.children);
                if value.is_empty() {
                    return Converted::Nothing;
                }

                Converted::Node(Node::Text(Text {
                    value,
                    position: node.position,
                    data: node.data.clone(),
                }))
            }
            MdNode::Table(node) => {
                let rows: Vec<String> = self
                    .parent(&node.children)
                    .iter()
                    .map(|piece| piece.value().to_string())
                    .collect();

                Converted::Node(Node::Pre(Pre {
                    alt: Some(DSV_NAME.to_string()),
                    value: rows.join("\n"),
                    position: node.position,
                    data: node.data.clone(),
                }))
            }
            MdNode::TableRow(node) => {
                // Empty cells still take up a column.
                let cells: Vec<String> = node
                    .children
                    .iter()
                    .map(|cell| match self.handle(cell) {
                        Converted::Phrasing(value) => value,
                        _ => String::new(),
                    })
                    .collect();

                Converted::Phrasing(cells.join(DSV_DELIMITER))
            }
            MdNode::TableCell(node) => {
                let value = self.phrasing(&node.children);
                let needs_quotes = value
                    .chars()
                    .any(|c| matches!(c, '\n' | '\r' | '"') || DSV_DELIMITER.contains(c));

                if needs_quotes {
                    Converted::Phrasing(format!("\"{}\"", value.replace('"', "\"\"")))
                } else {
                    Converted::Phrasing(value)
                }
            }
            MdNode::Definition(_)
            | MdNode::Delete(_)
            | MdNode::FootnoteDefinition(_)
            | MdNode::Html(_)
            | MdNode::ThematicBreak(_)
            | MdNode::Yaml(_)
            | MdNode::Toml(_) => Converted::Nothing,
        }
    }

    /// Convert children, dropping what converts to nothing
    fn parent(&mut self, children: &[MdNode]) -> Vec<Piece> {
        let mut results = Vec::new();

        for child in children {
            match self.handle(child) {
                Converted::Nothing => {}
                Converted::Phrasing(value) if value.is_empty() => {}
                Converted::Phrasing(value) => results.push(Piece::Phrasing(value)),
                Converted::Node(node) => results.push(Piece::Node(node)),
                Converted::Nodes(nodes) => results.extend(nodes.into_iter().map(Piece::Node)),
            }
        }

        results
    }

    /// Flatten flow content to one line: block values joined by spaces
    fn flow(&mut self, children: &[MdNode]) -> String {
        let values: Vec<String> = self
            .parent(children)
            .iter()
            .map(|piece| piece.value().to_string())
            .collect();
        single_line(&values.join("\n"))
    }

    /// Flatten phrasing content to one line
    fn phrasing(&mut self, children: &[MdNode]) -> String {
        let value: String = self
            .parent(children)
            .iter()
            .map(Piece::value)
            .collect();
        single_line(&value)
    }

    /// `[n]` for a defined reference, nothing otherwise
    fn reference(&mut self, identifier: &str) -> String {
        let id = identifier.to_uppercase();
        match self.definitions.get(&id).copied() {
            Some(definition) => {
                let no = self.resource(
                    &definition.url,
                    definition.title.as_deref(),
                    definition.position,
                    &definition.data,
                );
                format!("[{no}]")
            }
            None => String::new(),
        }
    }

    /// Number a link, reusing the number of a queued link with the same URL
    /// and title
    fn resource(
        &mut self,
        url: &str,
        title: Option<&str>,
        position: Option<Position>,
        data: &Option<Data>,
    ) -> usize {
        let url = if url.is_empty() { "#" } else { url };
        let title = title.unwrap_or_default();

        if let Some(queued) = self
            .links
            .iter()
            .find(|queued| queued.url == url && queued.title == title)
        {
            return queued.no;
        }

        self.link_count += 1;
        self.links.push(Resource {
            url: url.to_string(),
            title: title.to_string(),
            no: self.link_count,
            position,
            data: data.clone(),
        });
        self.link_count
    }

    /// Number a footnote, reusing the number of a queued one with the same
    /// identifier
    fn call(
        &mut self,
        identifier: &str,
        children: Vec<MdNode>,
        position: Option<Position>,
        data: Option<Data>,
    ) -> usize {
        if !identifier.is_empty() {
            if let Some(queued) = self.footnotes.iter().find(|queued| queued.identifier == identifier) {
                return queued.no;
            }
        }

        self.footnote_count += 1;
        self.footnotes.push(Footnote {
            identifier: identifier.to_string(),
            children,
            no: self.footnote_count,
            position,
            data,
        });
        self.footnote_count
    }

    /// Emit queued links, and at the end also the footnote bodies
    fn flush(&mut self, at_end: bool) -> Vec<Node> {
        // Footnote bodies go first so links inside them are queued in time.
        let mut notes = Vec::new();
        if at_end {
            let mut index = 0;
            while index < self.footnotes.len() {
                let children = self.footnotes[index].children.clone();
                let value = self.flow(&children);

                let footnote = &self.footnotes[index];
                let mut text = format!("[{}]", to_letter(footnote.no));
                if !value.is_empty() {
                    text.push(' ');
                    text.push_str(&value);
                }
                notes.push(Node::Text(Text {
                    value: text,
                    position: footnote.position,
                    data: footnote.data.clone(),
                }));
                index += 1;
            }
        }

        let mut result = Vec::new();
        if !self.options.endlinks || at_end {
            for link in self.links.drain(..) {
                let mut value = format!("[{}]", link.no);
                if !link.title.is_empty() {
                    value.push(' ');
                    value.push_str(&link.title);
                }
                result.push(Node::Link(Link {
                    url: Some(link.url),
                    value,
                    position: link.position,
                    data: link.data,
                }));
            }
        }

        result.extend(notes);
        result
    }

    /// Put breaks between blocks unless tight
    fn wrap(&self, nodes: Vec<Block>) -> Vec<Block> {
        if self.options.tight || nodes.is_empty() {
            return nodes;
        }

        let mut result = Vec::with_capacity(nodes.len() * 2);
        for (index, node) in nodes.into_iter().enumerate() {
            if index > 0 {
                result.push(Block::Break(Break::default()));
            }
            result.push(node);
        }
        result
    }
}

fn single_line(value: &str) -> String {
    value.replace("\r\n", " ").replace('\n', " ")
}

/// 1 -> `a`, 26 -> `z`, 27 -> `aa`, ...
fn to_letter(mut value: usize) -> String {
    let mut letters = Vec::new();

    while value > 0 {
        let digit = (value - 1) % 26;
        letters.push(char::from(b'a' + digit as u8));
        value = (value - digit) / 26;
    }

    letters.into_iter().rev().collect()
}
