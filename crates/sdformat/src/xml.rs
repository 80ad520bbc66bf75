//! Generic XML element tree
//!
//! SDF documents are navigated, not deserialized into rigid structs: callers
//! walk elements by tag name and read attributes and text on demand. This
//! module builds an arena-backed tree from quick-xml events. Nodes reference
//! each other by index, so parent links never create ownership cycles.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("failed to parse XML: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Index of a node within its [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct NodeData {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// A parsed XML document. Immutable after construction.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Document {
    /// Parse a document from an XML string.
    pub fn parse_str(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut nodes: Vec<NodeData> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let id = push_node(&mut nodes, e, stack.last().copied())?;
                    if root.is_none() && stack.is_empty() {
                        root = Some(id);
                    }
                    stack.push(id);
                }
                Ok(Event::Empty(ref e)) => {
                    let id = push_node(&mut nodes, e, stack.last().copied())?;
                    if root.is_none() && stack.is_empty() {
                        root = Some(id);
                    }
                }
                Ok(Event::End(_)) => {
                    if stack.pop().is_none() {
                        return Err(XmlError::Parse("unbalanced end tag".into()));
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(&id) = stack.last() {
                        let text = e
                            .unescape()
                            .map_err(|e| XmlError::Parse(e.to_string()))?;
                        append_text(&mut nodes[id.0].text, &text);
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if let Some(&id) = stack.last() {
                        let text = String::from_utf8_lossy(e.as_ref());
                        append_text(&mut nodes[id.0].text, &text);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(XmlError::Parse(e.to_string())),
            }
        }

        if !stack.is_empty() {
            return Err(XmlError::Parse("unexpected EOF inside element".into()));
        }
        let root = root.ok_or_else(|| XmlError::Parse("no root element".into()))?;
        Ok(Self { nodes, root })
    }

    /// Read and parse a document from a file.
    pub fn from_file(path: &Path) -> Result<Self, XmlError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0]
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text content of the element itself (not descendants).
    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    /// Direct children in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Direct children with the given tag name, in document order.
    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |&c| self.nodes[c.0].name == name)
    }

    pub fn first_child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children_named(id, name).next()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }
}

fn push_node(
    nodes: &mut Vec<NodeData>,
    start: &quick_xml::events::BytesStart<'_>,
    parent: Option<NodeId>,
) -> Result<NodeId, XmlError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Parse(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    let id = NodeId(nodes.len());
    nodes.push(NodeData {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
        parent,
    });
    if let Some(p) = parent {
        nodes[p.0].children.push(id);
    }
    Ok(id)
}

fn append_text(buf: &mut String, text: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text);
}
