//! HTML parsing into the owned document model

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::{Document, ElementData, Node, NodeType};
use crate::utils::error::{NavError, Result};

/// Parse an HTML string into a document
pub fn parse(html: &str) -> Result<Document> {
    parse_bytes(html.as_bytes())
}

/// Parse HTML bytes into a document
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    let mut input = bytes;
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut input)
        .map_err(|e| NavError::Parse(e.to_string()))?;

    let mut document = Document::new();
    for child in dom.document.children.borrow().iter() {
        if let Some(node) = convert(child) {
            document.root.add_child(node);
        }
    }
    Ok(document)
}

/// Convert an rcdom handle to an owned node.
///
/// Doctype and processing instruction nodes are dropped, as are
/// whitespace-only text runs between elements.
fn convert(handle: &Handle) -> Option<Node> {
    let mut node = match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let mut data = ElementData::new(name.local.to_string());
            for attr in attrs.borrow().iter() {
                data.set_attribute(attr.name.local.to_string(), attr.value.to_string());
            }
            Node::new(NodeType::Element(data))
        }
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            if text.trim().is_empty() {
                return None;
            }
            return Some(Node::text(text));
        }
        NodeData::Comment { contents } => {
            return Some(Node::new(NodeType::Comment(contents.to_string())));
        }
        NodeData::Document => Node::new(NodeType::Document),
        NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => return None,
    };

    for child in handle.children.borrow().iter() {
        if let Some(converted) = convert(child) {
            node.add_child(converted);
        }
    }
    Some(node)
}
