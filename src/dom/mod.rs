//! Owned document model for navigated pages
//!
//! Pages are held as plain owned trees so the engine can read and mutate
//! them without a browser runtime. Nodes are addressed by index paths
//! ([`NodePath`]) from the document root, which keeps cross-references
//! copyable and avoids self-referential structures.

mod html;

pub use html::{parse, parse_bytes};

use std::collections::HashMap;

/// Node types in the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    /// Document root
    Document,
    /// Element node (e.g., <div>)
    Element(ElementData),
    /// Text node
    Text(String),
    /// Comment node
    Comment(String),
}

/// Data for element nodes
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name (e.g., "div", "a")
    pub tag_name: String,
    /// Element attributes
    pub attributes: HashMap<String, String>,
}

impl ElementData {
    /// Create a new element
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&String> {
        self.attributes.get(name)
    }

    /// Set an attribute value
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute
    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    /// Get the ID attribute
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id")
    }

    /// Get class names
    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Check whether a class is present
    pub fn has_class(&self, name: &str) -> bool {
        self.classes().contains(&name)
    }

    /// Add a class if not already present
    pub fn add_class(&mut self, name: &str) {
        if self.has_class(name) {
            return;
        }
        let class = self.attributes.entry("class".to_string()).or_default();
        if !class.is_empty() {
            class.push(' ');
        }
        class.push_str(name);
    }

    /// Remove a class if present
    pub fn remove_class(&mut self, name: &str) {
        let Some(class) = self.attributes.get("class") else {
            return;
        };
        let remaining: Vec<&str> = class.split_whitespace().filter(|c| *c != name).collect();
        if remaining.is_empty() {
            self.attributes.remove("class");
        } else {
            let joined = remaining.join(" ");
            self.attributes.insert("class".to_string(), joined);
        }
    }
}

/// Index path from the document root to a node
pub type NodePath = Vec<usize>;

/// Elements that never carry children and serialize without a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node type and data
    pub node_type: NodeType,
    /// Child nodes
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new node
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            children: Vec::new(),
        }
    }

    /// Create an element node
    pub fn element(tag_name: impl Into<String>) -> Self {
        Self::new(NodeType::Element(ElementData::new(tag_name)))
    }

    /// Create a text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeType::Text(content.into()))
    }

    /// Add a child node
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element(_))
    }

    /// Get element data if this is an element
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Get mutable element data if this is an element
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Find the first matching element in document order, including self.
    ///
    /// The returned path is relative to this node.
    pub fn find_first<F>(&self, pred: F) -> Option<NodePath>
    where
        F: Fn(&ElementData) -> bool,
    {
        let mut stack: Vec<(NodePath, &Node)> = vec![(NodePath::new(), self)];
        while let Some((path, node)) = stack.pop() {
            if let Some(data) = node.as_element() {
                if pred(data) {
                    return Some(path);
                }
            }
            for (index, child) in node.children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                stack.push((child_path, child));
            }
        }
        None
    }

    /// Find all matching elements in document order, including self.
    pub fn find_all<F>(&self, pred: F) -> Vec<NodePath>
    where
        F: Fn(&ElementData) -> bool,
    {
        let mut found = Vec::new();
        let mut stack: Vec<(NodePath, &Node)> = vec![(NodePath::new(), self)];
        while let Some((path, node)) = stack.pop() {
            if let Some(data) = node.as_element() {
                if pred(data) {
                    found.push(path.clone());
                }
            }
            for (index, child) in node.children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                stack.push((child_path, child));
            }
        }
        found
    }

    /// Collect descendant text, whitespace-normalized
    pub fn text_content(&self) -> String {
        fn collect(node: &Node, text: &mut String) {
            match &node.node_type {
                NodeType::Text(content) => {
                    let trimmed = content.trim();
                    if !trimmed.is_empty() {
                        if !text.is_empty() {
                            text.push(' ');
                        }
                        text.push_str(trimmed);
                    }
                }
                _ => {
                    for child in &node.children {
                        collect(child, text);
                    }
                }
            }
        }

        let mut text = String::new();
        collect(self, &mut text);
        text
    }

    /// Serialize this node to markup, attributes sorted by name
    pub fn markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    /// Serialize only the children of this node
    pub fn inner_markup(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_markup(&mut out);
        }
        out
    }

    fn write_markup(&self, out: &mut String) {
        match &self.node_type {
            NodeType::Document => {
                for child in &self.children {
                    child.write_markup(out);
                }
            }
            NodeType::Text(content) => out.push_str(&escape_text(content)),
            NodeType::Comment(content) => {
                out.push_str("<!--");
                out.push_str(content);
                out.push_str("-->");
            }
            NodeType::Element(data) => {
                out.push('<');
                out.push_str(&data.tag_name);
                let mut attrs: Vec<(&String, &String)> = data.attributes.iter().collect();
                attrs.sort_by(|a, b| a.0.cmp(b.0));
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&data.tag_name.as_str()) {
                    return;
                }
                for child in &self.children {
                    child.write_markup(out);
                }
                out.push_str("</");
                out.push_str(&data.tag_name);
                out.push('>');
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// A parsed document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Root node
    pub root: Node,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            root: Node::new(NodeType::Document),
        }
    }

    /// Resolve a path to a node
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let mut node = &self.root;
        for &index in path {
            node = node.children.get(index)?;
        }
        Some(node)
    }

    /// Resolve a path to a mutable node
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = &mut self.root;
        for &index in path {
            node = node.children.get_mut(index)?;
        }
        Some(node)
    }

    /// Find the first matching element in document order
    pub fn find_first<F>(&self, pred: F) -> Option<NodePath>
    where
        F: Fn(&ElementData) -> bool,
    {
        self.root.find_first(pred)
    }

    /// Find all matching elements in document order
    pub fn find_all<F>(&self, pred: F) -> Vec<NodePath>
    where
        F: Fn(&ElementData) -> bool,
    {
        self.root.find_all(pred)
    }

    /// Walk from a node towards the root, returning the nearest element
    /// (including the node itself) that matches.
    pub fn closest<F>(&self, path: &[usize], pred: F) -> Option<NodePath>
    where
        F: Fn(&ElementData) -> bool,
    {
        for len in (0..=path.len()).rev() {
            let prefix = &path[..len];
            if let Some(data) = self.node_at(prefix).and_then(Node::as_element) {
                if pred(data) {
                    return Some(prefix.to_vec());
                }
            }
        }
        None
    }

    /// The text of the document's <title> element
    pub fn title(&self) -> Option<String> {
        let path = self.find_first(|el| el.tag_name == "title")?;
        let node = self.node_at(&path)?;
        Some(node.text_content())
    }

    /// Path to the document's <head> element
    pub fn head(&self) -> Option<NodePath> {
        self.find_first(|el| el.tag_name == "head")
    }

    /// Path to the document's <body> element
    pub fn body(&self) -> Option<NodePath> {
        self.find_first(|el| el.tag_name == "body")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
