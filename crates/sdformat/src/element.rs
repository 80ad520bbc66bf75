//! Typed wrappers over parsed SDF elements
//!
//! Wrappers are thin views: the parsed [`Document`] is the single source of
//! truth and wrappers hold an `Arc` to it plus a node index. Each wrapper
//! remembers the node that constructed it, so navigation is bidirectional
//! while ownership stays a tree.

use std::sync::Arc;

use crate::convert::{self, ConversionError, Pose};
use crate::xml::{Document, NodeId};

/// A reference to one element of a parsed document.
///
/// Equality is structural: two refs are equal when they point at the same
/// node of the same document, regardless of how they were constructed.
#[derive(Debug, Clone)]
pub struct ElementRef {
    doc: Arc<Document>,
    node: NodeId,
    parent: Option<NodeId>,
}

impl PartialEq for ElementRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.doc, &other.doc) && self.node == other.node
    }
}

impl Eq for ElementRef {}

impl ElementRef {
    /// Wrap the root element of a document. The result has no parent.
    pub fn root(doc: Arc<Document>) -> Self {
        let node = doc.root();
        Self {
            doc,
            node,
            parent: None,
        }
    }

    pub(crate) fn new(doc: Arc<Document>, node: NodeId, parent: Option<NodeId>) -> Self {
        Self { doc, node, parent }
    }

    pub fn name(&self) -> &str {
        self.doc.name(self.node)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.doc.attribute(self.node, name)
    }

    pub fn text(&self) -> &str {
        self.doc.text(self.node)
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    /// The element that constructed this one, `None` for ad hoc roots.
    pub fn parent(&self) -> Option<ElementRef> {
        self.parent
            .map(|p| ElementRef::new(self.doc.clone(), p, self.doc.parent(p)))
    }

    /// Fresh iterator over direct children with the given tag name, in
    /// document order. Children report this element as their parent.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = ElementRef> + 'a {
        self.doc
            .children_named(self.node, name)
            .map(move |c| ElementRef::new(self.doc.clone(), c, Some(self.node)))
    }

    pub fn first_child(&self, name: &str) -> Option<ElementRef> {
        self.children_named(name).next()
    }

    /// Text content of the first child with the given tag name.
    pub fn first_child_text(&self, name: &str) -> Option<&str> {
        self.doc
            .first_child_named(self.node, name)
            .map(|c| self.doc.text(c))
    }
}

/// Elements that may carry a `<pose>` child.
///
/// The original pose-bearing element types share this accessor verbatim, so
/// it lives in a trait with a provided implementation.
pub trait Posed {
    fn element(&self) -> &ElementRef;

    /// The element's pose relative to its parent.
    ///
    /// Only the first `<pose>` child is considered when several exist; a
    /// missing `<pose>` yields the identity transform. Rotation components
    /// in the element text are interpreted as degrees, unlike the standalone
    /// [`pose_from_str`](crate::convert::pose_from_str) converter which
    /// expects radians. Both conventions are load-bearing for their
    /// respective callers.
    fn pose(&self) -> Result<Pose, ConversionError> {
        convert::pose_from_degrees_str(self.element().first_child_text("pose"))
    }
}

/// A `<model>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    element: ElementRef,
}

impl Model {
    pub fn new(element: ElementRef) -> Self {
        Self { element }
    }

    /// The model name attribute.
    pub fn name(&self) -> Option<&str> {
        self.element.attribute("name")
    }

    /// Iterate over the model's direct `<link>` children. Restartable:
    /// each call re-scans the children.
    pub fn each_link(&self) -> impl Iterator<Item = Link> + '_ {
        self.element.children_named("link").map(|e| Link { element: e })
    }

    /// Iterate over the model's direct `<joint>` children.
    pub fn each_joint(&self) -> impl Iterator<Item = Joint> + '_ {
        self.element
            .children_named("joint")
            .map(|e| Joint { element: e })
    }

    /// Whether the model is static. `false` when no `<static>` child
    /// exists; otherwise the boolean conversion of the child's text,
    /// conversion errors included.
    pub fn is_static(&self) -> Result<bool, ConversionError> {
        match self.element.first_child_text("static") {
            Some(text) => convert::to_boolean(text),
            None => Ok(false),
        }
    }
}

impl Posed for Model {
    fn element(&self) -> &ElementRef {
        &self.element
    }
}

/// A `<link>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    element: ElementRef,
}

impl Link {
    pub fn new(element: ElementRef) -> Self {
        Self { element }
    }

    pub fn name(&self) -> Option<&str> {
        self.element.attribute("name")
    }
}

impl Posed for Link {
    fn element(&self) -> &ElementRef {
        &self.element
    }
}

/// A `<joint>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joint {
    element: ElementRef,
}

impl Joint {
    pub fn new(element: ElementRef) -> Self {
        Self { element }
    }

    pub fn name(&self) -> Option<&str> {
        self.element.attribute("name")
    }

    /// Name of the parent link, from the `<parent>` child's text.
    pub fn parent_link(&self) -> Option<&str> {
        self.element.first_child_text("parent")
    }

    /// Name of the child link, from the `<child>` child's text.
    pub fn child_link(&self) -> Option<&str> {
        self.element.first_child_text("child")
    }
}

impl Posed for Joint {
    fn element(&self) -> &ElementRef {
        &self.element
    }
}
