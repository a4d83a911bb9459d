// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markdown import using comrak
//!
//! Parses CommonMark with the GFM extensions (tables, task lists,
//! strikethrough, footnotes, autolinks) plus YAML front matter, and maps
//! comrak's AST onto mdast.

use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena, Options};
use gemtext_core::{from_gemtext, to_gemtext, MdastOptions, Node};

use crate::from_mdast::{from_mdast, Converted};
use crate::mdast::{self, Literal, MdNode, Parent, Void};
use crate::to_mdast::to_mdast;

fn comrak_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.front_matter_delimiter = Some("---".to_string());
    options
}

/// Parse Markdown into mdast
///
/// Source positions are not carried over.
#[tracing::instrument(level = "debug", skip_all, fields(len = input.len()))]
pub fn from_markdown(input: &str) -> MdNode {
    let arena = Arena::new();
    let options = comrak_options();
    let root = parse_document(&arena, input, &options);

    MdNode::Root(parent(root))
}

/// Convert Markdown to gemtext
pub fn markdown_to_gemtext(input: &str, options: &MdastOptions) -> String {
    let tree = from_markdown(input);
    match from_mdast(&tree, options) {
        Converted::Node(node) => to_gemtext(&node),
        _ => String::new(),
    }
}

/// Convert gemtext to mdast
pub fn gemtext_to_mdast(input: &str) -> Option<MdNode> {
    to_mdast(&Node::Root(from_gemtext(input)))
}

fn convert_children<'a>(node: &'a AstNode<'a>) -> Vec<MdNode> {
    node.children().filter_map(convert).collect()
}

fn parent<'a>(node: &'a AstNode<'a>) -> Parent {
    Parent {
        children: convert_children(node),
        ..Parent::default()
    }
}

fn literal(value: impl Into<String>) -> Literal {
    Literal {
        value: value.into(),
        ..Literal::default()
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn convert<'a>(node: &'a AstNode<'a>) -> Option<MdNode> {
    let data = node.data.borrow();

    let converted = match &data.value {
        NodeValue::Document => MdNode::Root(parent(node)),

        NodeValue::FrontMatter(raw) => MdNode::Yaml(literal(front_matter_body(raw))),

        NodeValue::BlockQuote => MdNode::Blockquote(parent(node)),

        NodeValue::List(list) => {
            let ordered = list.list_type == ListType::Ordered;
            MdNode::List(mdast::List {
                ordered,
                start: if ordered { Some(list.start as u64) } else { None },
                spread: !list.tight,
                children: convert_children(node),
                ..mdast::List::default()
            })
        }

        NodeValue::Item(_) => MdNode::ListItem(mdast::ListItem {
            children: convert_children(node),
            ..mdast::ListItem::default()
        }),

        NodeValue::TaskItem(symbol) => MdNode::ListItem(mdast::ListItem {
            checked: Some(symbol.is_some()),
            children: convert_children(node),
            ..mdast::ListItem::default()
        }),

        NodeValue::CodeBlock(code) => {
            let info = code.info.trim();
            let (lang, meta) = match info.split_once(char::is_whitespace) {
                Some((lang, meta)) => (non_empty(lang), non_empty(meta.trim_start())),
                None => (non_empty(info), None),
            };
            // mdast code values have no final line ending.
            let value = code.literal.strip_suffix('\n').unwrap_or(&code.literal);

            MdNode::Code(mdast::Code {
                lang,
                meta,
                value: value.to_string(),
                ..mdast::Code::default()
            })
        }

        NodeValue::HtmlBlock(html) => MdNode::Html(literal(html.literal.trim_end_matches('\n'))),

        NodeValue::Paragraph => MdNode::Paragraph(parent(node)),

        NodeValue::Heading(heading) => MdNode::Heading(mdast::Heading {
            depth: heading.level,
            children: convert_children(node),
            ..mdast::Heading::default()
        }),

        NodeValue::ThematicBreak => MdNode::ThematicBreak(Void::default()),

        NodeValue::FootnoteDefinition(definition) => {
            MdNode::FootnoteDefinition(mdast::FootnoteDefinition {
                identifier: definition.name.clone(),
                label: Some(definition.name.clone()),
                children: convert_children(node),
                ..mdast::FootnoteDefinition::default()
            })
        }

        NodeValue::Table(_) => MdNode::Table(mdast::Table {
            children: convert_children(node),
            ..mdast::Table::default()
        }),

        NodeValue::TableRow(_) => MdNode::TableRow(parent(node)),

        NodeValue::TableCell => MdNode::TableCell(parent(node)),

        NodeValue::Text(text) => MdNode::Text(literal(text.as_str())),

        NodeValue::SoftBreak => MdNode::Text(literal("\n")),

        NodeValue::LineBreak => MdNode::Break(Void::default()),

        NodeValue::Code(code) => MdNode::InlineCode(literal(code.literal.as_str())),

        NodeValue::HtmlInline(html) => MdNode::Html(literal(html.as_str())),

        NodeValue::Emph => MdNode::Emphasis(parent(node)),

        NodeValue::Strong => MdNode::Strong(parent(node)),

        NodeValue::Strikethrough => MdNode::Delete(parent(node)),

        NodeValue::Link(link) => MdNode::Link(mdast::Link {
            url: link.url.clone(),
            title: non_empty(&link.title),
            children: convert_children(node),
            ..mdast::Link::default()
        }),

        NodeValue::Image(image) => MdNode::Image(mdast::Image {
            url: image.url.clone(),
            title: non_empty(&image.title),
            alt: non_empty(&text_content(node)),
            ..mdast::Image::default()
        }),

        NodeValue::FootnoteReference(reference) => {
            MdNode::FootnoteReference(mdast::FootnoteReference {
                identifier: reference.name.clone(),
                label: Some(reference.name.clone()),
                ..mdast::FootnoteReference::default()
            })
        }

        _ => return None,
    };

    Some(converted)
}

/// Plain text of everything below `node`
fn text_content<'a>(node: &'a AstNode<'a>) -> String {
    node.descendants()
        .filter_map(|descendant| match &descendant.data.borrow().value {
            NodeValue::Text(text) => Some(text.clone()),
            NodeValue::Code(code) => Some(code.literal.clone()),
            _ => None,
        })
        .collect()
}

/// Front matter without its `---` fences
fn front_matter_body(raw: &str) -> String {
    let body = raw.trim();
    let body = body.strip_prefix("---").unwrap_or(body);
    let body = body.strip_suffix("---").unwrap_or(body);
    body.trim_matches(|c| c == '\n' || c == '\r').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TIGHT: MdastOptions = MdastOptions {
        tight: true,
        endlinks: false,
    };

    #[test]
    fn test_parse_heading() {
        let tree = from_markdown("# Hello World");
        assert_eq!(
            tree.children(),
            &[MdNode::Heading(mdast::Heading {
                depth: 1,
                children: vec![MdNode::text("Hello World")],
                ..mdast::Heading::default()
            })]
        );
    }

    #[test]
    fn test_paragraph_with_link() {
        assert_eq!(
            markdown_to_gemtext(
                "# Title\n\nSome *em* and **strong** text with [a link](https://example.com \"T\").\n",
                &MdastOptions::default()
            ),
            "# Title\n\nSome em and strong text with a link[1].\n\n=> https://example.com [1] T\n"
        );
    }

    #[test]
    fn test_soft_breaks_become_spaces() {
        assert_eq!(markdown_to_gemtext("a\nb\n", &TIGHT), "a b\n");
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            markdown_to_gemtext("- [x] done\n- [ ] todo\n- plain\n", &TIGHT),
            "* ✓ done\n* ✗ todo\n* plain\n"
        );
    }

    #[test]
    fn test_ordered_list() {
        match &from_markdown("3. a\n4. b\n").children()[0] {
            MdNode::List(list) => {
                assert!(list.ordered);
                assert_eq!(list.start, Some(3));
                assert_eq!(list.children.len(), 2);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_code_block() {
        let tree = from_markdown("```rust title\nfn main() {}\n```\n");
        assert_eq!(
            tree.children(),
            &[MdNode::Code(mdast::Code {
                lang: Some("rust".to_string()),
                meta: Some("title".to_string()),
                value: "fn main() {}".to_string(),
                ..mdast::Code::default()
            })]
        );
        assert_eq!(
            markdown_to_gemtext("```rust title\nfn main() {}\n```\n", &TIGHT),
            "```rust title\nfn main() {}\n```\n"
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            markdown_to_gemtext("| a | b |\n|---|---|\n| 1 | 2,3 |\n", &TIGHT),
            "```csv\na,b\n1,\"2,3\"\n```\n"
        );
    }

    #[test]
    fn test_footnotes() {
        assert_eq!(
            markdown_to_gemtext("Text[^1].\n\n[^1]: Note.\n", &MdastOptions::default()),
            "Text[a].\n\n[a] Note.\n"
        );
    }

    #[test]
    fn test_front_matter() {
        let tree = from_markdown("---\ntitle: x\n---\n\n# A\n");
        assert_eq!(tree.children()[0], MdNode::Yaml(literal("title: x")));
        assert_eq!(markdown_to_gemtext("---\ntitle: x\n---\n\n# A\n", &TIGHT), "# A\n");
    }

    #[test]
    fn test_image() {
        assert_eq!(
            markdown_to_gemtext("![alt](i.png)\n", &TIGHT),
            "alt[1]\n=> i.png [1]\n"
        );
    }

    #[test]
    fn test_gemtext_to_mdast() {
        match gemtext_to_mdast("## a") {
            Some(MdNode::Root(root)) => match &root.children[0] {
                MdNode::Heading(heading) => assert_eq!(heading.depth, 2),
                other => panic!("expected heading, got {other:?}"),
            },
            other => panic!("expected root, got {other:?}"),
        }
    }

    #[test]
    fn test_front_matter_body() {
        assert_eq!(front_matter_body("---\na: b\nc: d\n---\n\n"), "a: b\nc: d");
    }
}
