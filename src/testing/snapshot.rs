//! Snapshot helpers.
//!
//! Functions for turning a document into plain text suitable for snapshot
//! testing and assertions.

use crate::dom::element::{Document, Element};
use crate::dom::node::NodeId;
use crate::dom::tree::Dom;

/// Serialised markup of the document root, or an empty string for an empty document.
pub fn document_markup(document: &Document) -> String {
    let dom = document.borrow();
    dom.root().map(|root| dom.markup(root)).unwrap_or_default()
}

/// Serialised markup of the subtree at `element`.
pub fn markup_of(element: &Element) -> String {
    element.markup()
}

/// One line per element node, indented two spaces per level, listing the tag,
/// `#id`, and any `data-*` attributes. Text nodes are skipped.
///
/// ```ignore
/// body
///   div data-woven="app/menu"
///     ul
/// ```
pub fn outline(document: &Document) -> String {
    let dom = document.borrow();
    let mut lines = Vec::new();
    if let Some(root) = dom.root() {
        push_outline(&dom, root, 0, &mut lines);
    }
    lines.join("\n")
}

fn push_outline(dom: &Dom, id: NodeId, depth: usize, lines: &mut Vec<String>) {
    let Some(data) = dom.get(id) else {
        return;
    };
    if data.is_text() {
        return;
    }

    let mut line = format!("{:indent$}{}", "", data.tag, indent = depth * 2);
    if let Some(node_id) = &data.id {
        line.push('#');
        line.push_str(node_id);
    }
    for (name, value) in data.attributes.iter().filter(|(n, _)| n.starts_with("data-")) {
        line.push_str(&format!(" {name}={value:?}"));
    }
    lines.push(line);

    for &child in dom.children(id) {
        push_outline(dom, child, depth + 1, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{document, NodeData};

    #[test]
    fn empty_document() {
        let doc = document(Dom::new());
        assert_eq!(document_markup(&doc), "");
        assert_eq!(outline(&doc), "");
    }

    #[test]
    fn outline_skips_text_and_plain_attributes() {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        let div = dom
            .insert_child(
                root,
                NodeData::new("div")
                    .with_id("main")
                    .with_attr("title", "ignored")
                    .with_attr("data-weave", "app/menu"),
            )
            .unwrap();
        dom.insert_child(div, NodeData::text_node("hello")).unwrap();
        dom.insert_child(div, NodeData::new("ul")).unwrap();
        let doc = document(dom);

        insta::assert_snapshot!(outline(&doc), @r#"
        body
          div#main data-weave="app/menu"
            ul
        "#);
        assert!(markup_of(&Element::new(&doc, div)).contains("hello"));
    }
}
