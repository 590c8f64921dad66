//! Tree operations: insert, remove, walk.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{NodeData, NodeId};
use crate::event::handler::EventRegistry;

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// Errors raised by tree operations and selector parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0:?} is not in the document")]
    NodeNotFound(NodeId),
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// The central DOM tree, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that node removal is O(subtree size) and lookup is O(1).
/// Event listeners are keyed by node and are dropped together with the node.
#[derive(Debug)]
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    root: Option<NodeId>,
    pub(crate) events: EventRegistry,
}

impl Dom {
    /// Create an empty DOM.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
            events: EventRegistry::new(),
        }
    }

    /// Insert a root-level node (no parent).
    ///
    /// If no root has been set yet, this node becomes the root.
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Insert a node as the last child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, DomError> {
        let index = self.child_count(parent)?;
        self.insert_at(parent, index, data)
    }

    /// Insert a node as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, DomError> {
        self.insert_at(parent, 0, data)
    }

    /// Insert a node as the sibling immediately before `sibling`.
    ///
    /// Returns `Ok(None)` when `sibling` has no parent.
    pub fn insert_before(
        &mut self,
        sibling: NodeId,
        data: NodeData,
    ) -> Result<Option<NodeId>, DomError> {
        let Some((parent, index)) = self.position(sibling)? else {
            return Ok(None);
        };
        self.insert_at(parent, index, data).map(Some)
    }

    /// Insert a node as the sibling immediately after `sibling`.
    ///
    /// Returns `Ok(None)` when `sibling` has no parent.
    pub fn insert_after(
        &mut self,
        sibling: NodeId,
        data: NodeData,
    ) -> Result<Option<NodeId>, DomError> {
        let Some((parent, index)) = self.position(sibling)? else {
            return Ok(None);
        };
        self.insert_at(parent, index + 1, data).map(Some)
    }

    /// Insert a node at `index` in the children of `parent`.
    ///
    /// `index` is clamped to the number of children.
    pub fn insert_at(
        &mut self,
        parent: NodeId,
        index: usize,
        data: NodeData,
    ) -> Result<NodeId, DomError> {
        let siblings = self
            .children
            .get(parent)
            .ok_or(DomError::NodeNotFound(parent))?;
        let index = index.min(siblings.len());
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.insert(index, id);
        }
        Ok(id)
    }

    /// Remove a node and all its descendants recursively.
    ///
    /// Returns the `NodeData` for the removed node, or `None` if it didn't exist.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        if !self.nodes.contains_key(id) {
            return None;
        }

        // Detach from parent's children list.
        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != id);
            }
        }

        if self.root == Some(id) {
            self.root = None;
        }

        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        let mut removed_root_data = None;

        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            self.events.clear_node(current);
            let data = self.nodes.remove(current);
            if current == id {
                removed_root_data = data;
            }
        }

        removed_root_data
    }

    /// Remove every child subtree of `id`, keeping `id` itself.
    pub fn clear_children(&mut self, id: NodeId) -> Result<(), DomError> {
        let kids = self
            .children
            .get(id)
            .ok_or(DomError::NodeNotFound(id))?
            .clone();
        for child in kids {
            self.remove(child);
        }
        Ok(())
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no children
    /// or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent and ends at the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// Like [`get`](Self::get) but reports a missing node as an error.
    pub fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(id).ok_or(DomError::NodeNotFound(id))
    }

    /// Like [`get_mut`](Self::get_mut) but reports a missing node as an error.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(id).ok_or(DomError::NodeNotFound(id))
    }

    /// The current root node, if set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Listeners registered on nodes of this DOM.
    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    /// Number of nodes in the DOM.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the DOM is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the DOM contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            stack.extend(self.children(current).iter().rev());
        }
        result
    }

    /// Breadth-first traversal starting from `start`.
    pub fn walk_breadth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            queue.extend(self.children(current));
        }
        result
    }

    fn child_count(&self, id: NodeId) -> Result<usize, DomError> {
        self.children
            .get(id)
            .map(Vec::len)
            .ok_or(DomError::NodeNotFound(id))
    }

    /// Parent and index of `id` within its siblings.
    fn position(&self, id: NodeId) -> Result<Option<(NodeId, usize)>, DomError> {
        if !self.contains(id) {
            return Err(DomError::NodeNotFound(id));
        }
        Ok(self.parent(id).and_then(|parent| {
            self.children(parent)
                .iter()
                .position(|&c| c == id)
                .map(|index| (parent, index))
        }))
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small test tree:
    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Dom, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body").with_id("root"));
        let a = dom.insert_child(root, NodeData::new("div").with_id("a")).unwrap();
        let b = dom.insert_child(root, NodeData::new("div").with_id("b")).unwrap();
        let c = dom.insert_child(a, NodeData::new("span").with_id("c")).unwrap();
        let d = dom.insert_child(a, NodeData::new("span").with_id("d")).unwrap();
        (dom, root, a, b, c, d)
    }

    #[test]
    fn insert_sets_root() {
        let mut dom = Dom::new();
        let first = dom.insert(NodeData::new("first"));
        let _second = dom.insert(NodeData::new("second"));
        assert_eq!(dom.root(), Some(first));
    }

    #[test]
    fn insert_child_parent_relationship() {
        let (dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.parent(a), Some(root));
        assert_eq!(dom.parent(c), Some(a));
        assert_eq!(dom.parent(root), None);
    }

    #[test]
    fn insert_child_missing_parent() {
        let (mut dom, _root, _a, _b, c, _d) = build_tree();
        dom.remove(c);
        assert_eq!(
            dom.insert_child(c, NodeData::new("x")),
            Err(DomError::NodeNotFound(c))
        );
    }

    #[test]
    fn prepend_child_goes_first() {
        let (mut dom, _root, a, _b, c, d) = build_tree();
        let e = dom.prepend_child(a, NodeData::new("em")).unwrap();
        assert_eq!(dom.children(a), &[e, c, d]);
    }

    #[test]
    fn insert_before_and_after() {
        let (mut dom, _root, a, _b, c, d) = build_tree();
        let before = dom.insert_before(d, NodeData::new("i")).unwrap().unwrap();
        let after = dom.insert_after(d, NodeData::new("b")).unwrap().unwrap();
        assert_eq!(dom.children(a), &[c, before, d, after]);
    }

    #[test]
    fn insert_before_root_is_noop() {
        let (mut dom, root, ..) = build_tree();
        assert_eq!(dom.insert_before(root, NodeData::new("x")).unwrap(), None);
        assert_eq!(dom.len(), 5);
    }

    #[test]
    fn ancestors() {
        let (dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.ancestors(c), vec![a, root]);
        assert!(dom.ancestors(root).is_empty());
    }

    #[test]
    fn remove_subtree() {
        let (mut dom, root, a, b, c, d) = build_tree();
        let removed = dom.remove(a).unwrap();
        assert_eq!(removed.id.as_deref(), Some("a"));
        assert!(!dom.contains(c));
        assert!(!dom.contains(d));
        assert_eq!(dom.children(root), &[b]);
        assert_eq!(dom.len(), 2);
    }

    #[test]
    fn remove_root() {
        let (mut dom, root, ..) = build_tree();
        dom.remove(root);
        assert!(dom.is_empty());
        assert_eq!(dom.root(), None);
    }

    #[test]
    fn remove_nonexistent() {
        let mut dom = Dom::new();
        let id = dom.insert(NodeData::new("x"));
        dom.remove(id);
        assert!(dom.remove(id).is_none());
    }

    #[test]
    fn clear_children_keeps_node() {
        let (mut dom, _root, a, _b, c, _d) = build_tree();
        dom.clear_children(a).unwrap();
        assert!(dom.contains(a));
        assert!(!dom.contains(c));
        assert!(dom.children(a).is_empty());
    }

    #[test]
    fn walk_depth_first() {
        let (dom, root, a, b, c, d) = build_tree();
        assert_eq!(dom.walk_depth_first(root), vec![root, a, c, d, b]);
        assert_eq!(dom.walk_depth_first(a), vec![a, c, d]);
    }

    #[test]
    fn walk_breadth_first() {
        let (dom, root, a, b, c, d) = build_tree();
        assert_eq!(dom.walk_breadth_first(root), vec![root, a, b, c, d]);
    }

    #[test]
    fn node_reports_missing() {
        let (mut dom, _root, _a, _b, c, _d) = build_tree();
        dom.remove(c);
        assert_eq!(dom.node(c), Err(DomError::NodeNotFound(c)));
    }
}
