//! Element handles: a shared document plus a node id.
//!
//! [`Element`] is the handle a widget attaches to. It is cheap to clone and
//! every operation borrows the shared [`Document`] only for its own duration,
//! so handlers invoked from [`Element::trigger`] may freely mutate the tree.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::content::Content;
use super::node::NodeId;
use super::query::Selector;
use super::tree::{Dom, DomError};
use crate::event::dispatch;
use crate::event::handler::{EventError, Handler, Listener, Value};

/// A DOM shared between every element handle that points into it.
pub type Document = Rc<RefCell<Dom>>;

/// Wrap a [`Dom`] into a shareable [`Document`].
pub fn document(dom: Dom) -> Document {
    Rc::new(RefCell::new(dom))
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// Handle to one node of a [`Document`].
#[derive(Clone)]
pub struct Element {
    document: Document,
    node: NodeId,
}

impl Element {
    /// Create a handle for `node` in `document`.
    pub fn new(document: &Document, node: NodeId) -> Self {
        Self {
            document: Rc::clone(document),
            node,
        }
    }

    /// The node this handle points to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The document this handle points into.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Whether the node is still part of the document.
    pub fn exists(&self) -> bool {
        self.document.borrow().contains(self.node)
    }

    /// Attribute value, if the node exists and carries it.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.document
            .borrow()
            .get(self.node)
            .and_then(|data| data.attr(name).map(str::to_owned))
    }

    /// Set an attribute on the node.
    pub fn set_attr(&self, name: &str, value: impl Into<String>) -> Result<(), DomError> {
        self.document
            .borrow_mut()
            .node_mut(self.node)?
            .set_attr(name, value);
        Ok(())
    }

    /// Remove an attribute from the node, returning its previous value.
    pub fn remove_attr(&self, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.document.borrow_mut().node_mut(self.node)?.remove_attr(name))
    }

    /// Whether the node matches `selector`.
    pub fn is(&self, selector: &Selector) -> bool {
        self.document.borrow().matches(self.node, selector)
    }

    /// Descendants matching `selector`, in document order.
    pub fn find(&self, selector: &Selector) -> ElementSet {
        let nodes = self.document.borrow().find(self.node, selector);
        ElementSet::from_nodes(&self.document, nodes)
    }

    /// Serialised subtree.
    pub fn markup(&self) -> String {
        self.document.borrow().markup(self.node)
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self) -> String {
        self.document.borrow().text_content(self.node)
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Register `handler` for `event_type`, optionally delegated to descendants
    /// matching `features`.
    pub fn on(
        &self,
        event_type: &str,
        features: Option<Selector>,
        handler: Handler,
    ) -> Result<(), DomError> {
        let mut dom = self.document.borrow_mut();
        dom.node(self.node)?;
        dom.events
            .register(self.node, Listener::new(event_type, features, handler));
        Ok(())
    }

    /// Unregister the listener registered with exactly this handler.
    ///
    /// Returns `false` (and does nothing) when no such listener exists.
    pub fn off(&self, event_type: &str, features: Option<&Selector>, handler: &Handler) -> bool {
        self.document
            .borrow_mut()
            .events
            .unregister(self.node, event_type, features, handler)
    }

    /// Number of listeners registered on this node.
    pub fn listener_count(&self) -> usize {
        self.document.borrow().events().count(self.node)
    }

    /// Dispatch `event_type` to this node, then bubble to its ancestors.
    ///
    /// Returns the values returned by every handler that ran, in order.
    pub fn trigger(&self, event_type: &str, args: &[Value]) -> Result<Vec<Value>, EventError> {
        dispatch::dispatch(&self.document, self.node, event_type, args)
    }

    // ── Content ──────────────────────────────────────────────────────

    /// See [`Dom::before`].
    pub fn before(&self, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.document.borrow_mut().before(self.node, content)
    }

    /// See [`Dom::after`].
    pub fn after(&self, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.document.borrow_mut().after(self.node, content)
    }

    /// See [`Dom::html`].
    pub fn html(&self, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.document.borrow_mut().html(self.node, content)
    }

    /// See [`Dom::text`].
    pub fn text(&self, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.document.borrow_mut().text(self.node, content)
    }

    /// See [`Dom::append`].
    pub fn append(&self, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.document.borrow_mut().append(self.node, content)
    }

    /// See [`Dom::prepend`].
    pub fn prepend(&self, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.document.borrow_mut().prepend(self.node, content)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && Rc::ptr_eq(&self.document, &other.document)
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.document).hash(state);
        self.node.hash(state);
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Element").field(&self.node).finish()
    }
}

// ---------------------------------------------------------------------------
// ElementSet
// ---------------------------------------------------------------------------

/// An ordered, duplicate-free set of elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSet {
    elements: Vec<Element>,
}

impl ElementSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from node ids of one document, keeping their order.
    pub fn from_nodes(document: &Document, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut set = Self::new();
        for node in nodes {
            let element = Element::new(document, node);
            if !set.contains(&element) {
                set.elements.push(element);
            }
        }
        set
    }

    /// Add `element` to the set, keeping document order. No-op if already present.
    pub fn add_back(mut self, element: Element) -> Self {
        if self.contains(&element) {
            return self;
        }
        self.elements.push(element);
        self.elements.sort_by_cached_key(|e| {
            let dom = e.document.borrow();
            (Rc::as_ptr(&e.document) as usize, dom.order_key(e.node))
        });
        self
    }

    /// Whether `element` is in the set.
    pub fn contains(&self, element: &Element) -> bool {
        self.elements.contains(element)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// Node ids, in order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.elements.iter().map(Element::node).collect()
    }
}

impl IntoIterator for ElementSet {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a ElementSet {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl FromIterator<Element> for ElementSet {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        let mut set = Self::new();
        for element in iter {
            if !set.contains(&element) {
                set.elements.push(element);
            }
        }
        set
    }
}

impl Dom {
    /// Sort key giving document order: the topmost ancestor, then the child
    /// index at every level below it.
    pub(crate) fn order_key(&self, id: NodeId) -> (NodeId, Vec<usize>) {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let index = self
                .children(parent)
                .iter()
                .position(|&c| c == current)
                .unwrap_or(0);
            path.push(index);
            current = parent;
        }
        path.reverse();
        (current, path)
    }
}
