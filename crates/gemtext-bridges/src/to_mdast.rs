// SPDX-License-Identifier: AGPL-3.0-or-later
//! gast to mdast
//!
//! Converted nodes inherit `position` and `data` from their gast source;
//! nodes synthesized around them (a link's paragraph, a heading's text) get
//! the position only.

use gemtext_core::{Data, Node, Position, Result};

use crate::mdast::{self, Literal, MdNode, Parent};

/// Turn a gast node into mdast
///
/// Returns `None` for `break` nodes and for empty `text`, which have no mdast
/// counterpart.
#[tracing::instrument(level = "debug", skip_all, fields(kind = node.kind()))]
pub fn to_mdast(node: &Node) -> Option<MdNode> {
    transform(node)
}

/// Turn a dynamic JSON gast tree into mdast
pub fn to_mdast_value(value: &serde_json::Value) -> Result<Option<MdNode>> {
    let node = Node::from_value(value.clone())?;
    Ok(to_mdast(&node))
}

fn transform(node: &Node) -> Option<MdNode> {
    let position = node.position().copied();
    let data = node.data().cloned();

    match node {
        Node::Break(_) => None,
        Node::Text(node) if node.value.is_empty() => None,
        Node::Text(node) => Some(MdNode::Paragraph(Parent {
            children: vec![text(&node.value, position)],
            position,
            data,
        })),
        Node::Heading(node) => Some(MdNode::Heading(mdast::Heading {
            depth: node.rank.clamp(1, 3),
            children: optional_text(&node.value, position),
            position,
            data,
        })),
        Node::Link(node) => Some(MdNode::Paragraph(Parent {
            children: vec![MdNode::Link(mdast::Link {
                url: node.url.clone().unwrap_or_default(),
                title: None,
                children: optional_text(&node.value, position),
                position,
                data,
            })],
            position,
            data: None,
        })),
        Node::List(node) => {
            let mut children: Vec<MdNode> = node
                .children
                .iter()
                .map(|item| list_item(&item.value, item.position, item.data.clone()))
                .collect();

            if children.is_empty() {
                children.push(MdNode::ListItem(mdast::ListItem::default()));
            }

            Some(MdNode::List(mdast::List {
                ordered: false,
                start: None,
                spread: false,
                children,
                position,
                data,
            }))
        }
        Node::ListItem(node) => Some(list_item(&node.value, position, data)),
        Node::Pre(node) => {
            let (lang, meta) = split_info(node.alt.as_deref());
            Some(MdNode::Code(mdast::Code {
                lang,
                meta,
                value: node.value.clone(),
                position,
                data,
            }))
        }
        Node::Quote(node) => Some(MdNode::Blockquote(Parent {
            children: optional_paragraph(&node.value, position),
            position,
            data,
        })),
        Node::Root(node) => Some(MdNode::Root(Parent {
            children: node
                .children
                .iter()
                .filter_map(|child| transform(&Node::from(child.clone())))
                .collect(),
            position,
            data,
        })),
    }
}

fn list_item(value: &str, position: Option<Position>, data: Option<Data>) -> MdNode {
    MdNode::ListItem(mdast::ListItem {
        checked: None,
        spread: false,
        children: optional_paragraph(value, position),
        position,
        data,
    })
}

/// Split a fence alt into `lang` and `meta` at the first whitespace run
fn split_info(alt: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(alt) = alt.filter(|alt| !alt.is_empty()) else {
        return (None, None);
    };

    let info = alt.trim_matches(is_space_or_tab);
    match info.find(is_space_or_tab) {
        Some(index) => {
            let meta = info[index..].trim_start_matches(is_space_or_tab);
            (Some(info[..index].to_string()), Some(meta.to_string()))
        }
        None => (Some(info.to_string()), None),
    }
}

fn is_space_or_tab(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn text(value: &str, position: Option<Position>) -> MdNode {
    MdNode::Text(Literal {
        value: value.to_string(),
        position,
        data: None,
    })
}

fn optional_text(value: &str, position: Option<Position>) -> Vec<MdNode> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![text(value, position)]
    }
}

fn optional_paragraph(value: &str, position: Option<Position>) -> Vec<MdNode> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![MdNode::Paragraph(Parent {
            children: vec![text(value, position)],
            position,
            data: None,
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemtext_core::{from_gemtext, Block, ConversionError, Heading, List, Pre, Text};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mdast(input: &str) -> serde_json::Value {
        let tree = to_mdast(&Node::Root(from_gemtext(input))).unwrap();
        strip_positions(serde_json::to_value(tree).unwrap())
    }

    fn strip_positions(mut value: serde_json::Value) -> serde_json::Value {
        match &mut value {
            serde_json::Value::Object(map) => {
                map.remove("position");
                for child in map.values_mut() {
                    *child = strip_positions(child.take());
                }
            }
            serde_json::Value::Array(items) => {
                for item in items.iter_mut() {
                    *item = strip_positions(item.take());
                }
            }
            _ => {}
        }
        value
    }

    #[test]
    fn test_document() {
        assert_eq!(
            mdast("# a\n\nb\n=> c d\n* e\n> f\n```x y  z\ng\n```"),
            json!({
                "type": "root",
                "children": [
                    {"type": "heading", "depth": 1, "children": [{"type": "text", "value": "a"}]},
                    {"type": "paragraph", "children": [{"type": "text", "value": "b"}]},
                    {"type": "paragraph", "children": [{
                        "type": "link",
                        "url": "c",
                        "title": null,
                        "children": [{"type": "text", "value": "d"}]
                    }]},
                    {"type": "list", "ordered": false, "spread": false, "children": [{
                        "type": "listItem",
                        "spread": false,
                        "children": [{"type": "paragraph", "children": [{"type": "text", "value": "e"}]}]
                    }]},
                    {"type": "blockquote", "children": [
                        {"type": "paragraph", "children": [{"type": "text", "value": "f"}]}
                    ]},
                    {"type": "code", "lang": "x", "meta": "y  z", "value": "g"}
                ]
            })
        );
    }

    #[test]
    fn test_breaks_and_empty_text_vanish() {
        assert_eq!(to_mdast(&Node::Break(Default::default())), None);
        assert_eq!(to_mdast(&Node::Text(Text::default())), None);
    }

    #[test]
    fn test_empty_values() {
        assert_eq!(
            mdast("#\n=>\n>"),
            json!({
                "type": "root",
                "children": [
                    {"type": "heading", "depth": 1, "children": []},
                    {"type": "paragraph", "children": [
                        {"type": "link", "url": "", "title": null, "children": []}
                    ]},
                    {"type": "blockquote", "children": []}
                ]
            })
        );
    }

    #[test]
    fn test_heading_depth_is_clamped() {
        let node = Node::Heading(Heading {
            rank: 9,
            ..Heading::default()
        });
        match to_mdast(&node) {
            Some(MdNode::Heading(heading)) => assert_eq!(heading.depth, 3),
            other => panic!("expected heading, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_list_gets_an_item() {
        match to_mdast(&Node::List(List::default())) {
            Some(MdNode::List(list)) => {
                assert_eq!(list.children, vec![MdNode::ListItem(mdast::ListItem::default())]);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_pre_info() {
        assert_eq!(split_info(None), (None, None));
        assert_eq!(split_info(Some("")), (None, None));
        assert_eq!(split_info(Some(" \tjs ")), (Some("js".to_string()), None));
        assert_eq!(
            split_info(Some("js\t a b")),
            (Some("js".to_string()), Some("a b".to_string()))
        );
        assert_eq!(split_info(Some("  ")), (Some(String::new()), None));

        let node = Node::Pre(Pre {
            alt: None,
            value: "a".to_string(),
            ..Pre::default()
        });
        assert_eq!(
            to_mdast(&node),
            Some(MdNode::Code(mdast::Code {
                value: "a".to_string(),
                ..mdast::Code::default()
            }))
        );
    }

    #[test]
    fn test_position_and_data_inherited() {
        let root = from_gemtext("=> a b");
        let mut link = match root.children.into_iter().next() {
            Some(Block::Link(link)) => link,
            other => panic!("expected link, got {other:?}"),
        };
        let mut data = Data::new();
        data.insert("x".to_string(), json!(1));
        link.data = Some(data.clone());
        let position = link.position;

        match to_mdast(&Node::Link(link)) {
            Some(MdNode::Paragraph(paragraph)) => {
                assert_eq!(paragraph.position, position);
                assert_eq!(paragraph.data, None);
                match &paragraph.children[0] {
                    MdNode::Link(inner) => {
                        assert_eq!(inner.data, Some(data));
                        assert_eq!(inner.position, position);
                        assert_eq!(inner.children[0].position(), position.as_ref());
                        assert_eq!(inner.children[0].data(), None);
                    }
                    other => panic!("expected link, got {other:?}"),
                }
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn test_value_trees() {
        let tree = json!({"type": "root", "children": [{"type": "text", "value": "a"}]});
        let node = to_mdast_value(&tree).unwrap().unwrap();
        assert_eq!(node.children().len(), 1);

        let err = to_mdast_value(&json!({"type": "paragraph"})).unwrap_err();
        assert!(matches!(err, ConversionError::UnknownNode(_)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use gemtext_core::{from_gemtext, Block};
    use proptest::prelude::*;

    fn gemtext_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just(String::new()),
                "[a-z ]{1,10}",
                "#{1,4}[a-z ]{0,6}",
                "=>[ a-z:/.]{0,12}",
                "\\*[a-z ]{0,6}",
                ">[a-z ]{0,6}",
                "```[a-z]{0,3}",
            ],
            0..12,
        )
        .prop_map(|lines| lines.join("\n"))
    }

    proptest! {
        // Property: every gast block except breaks and empty text maps to one mdast child
        #[test]
        fn prop_block_count_preserved(input in gemtext_strategy()) {
            let root = from_gemtext(&input);
            let expected = root
                .children
                .iter()
                .filter(|block| match block {
                    Block::Break(_) => false,
                    Block::Text(text) => !text.value.is_empty(),
                    _ => true,
                })
                .count();

            match to_mdast(&Node::Root(root)) {
                Some(MdNode::Root(tree)) => prop_assert_eq!(tree.children.len(), expected),
                other => prop_assert!(false, "expected root, got {:?}", other),
            }
        }
    }
}
