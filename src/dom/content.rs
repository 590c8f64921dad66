//! Insertable content and the six insertion primitives.
//!
//! [`Content`] is what gets placed into the tree: plain text or a list of
//! [`Fragment`] subtrees. The primitives on [`Dom`] (`before`, `after`, `html`,
//! `text`, `append`, `prepend`) place content relative to an existing node and
//! return the ids of the top-level nodes they created.

use tracing::warn;

use super::node::{NodeData, NodeId};
use super::tree::{Dom, DomError};

// ---------------------------------------------------------------------------
// Fragment
// ---------------------------------------------------------------------------

/// A detached subtree waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Data for the fragment's root node.
    pub data: NodeData,
    /// Child fragments, in order.
    pub children: Vec<Fragment>,
}

impl Fragment {
    /// An element fragment with the given tag and no children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self::from_data(NodeData::new(tag))
    }

    /// A text fragment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_data(NodeData::text_node(text))
    }

    /// Wrap existing node data.
    pub fn from_data(data: NodeData) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    /// Set the id (builder).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.data = self.data.with_id(id);
        self
    }

    /// Add a class (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.data = self.data.with_class(class);
        self
    }

    /// Set an attribute (builder).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.set_attr(name, value);
        self
    }

    /// Append a child fragment (builder).
    pub fn with_child(mut self, child: Fragment) -> Self {
        self.children.push(child);
        self
    }

    /// Append a text child (builder).
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Fragment::text(text))
    }

    fn push_text(&self, out: &mut String) {
        if self.data.is_text() {
            out.push_str(&self.data.text);
        }
        for child in &self.children {
            child.push_text(out);
        }
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Content accepted by the insertion primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Inserted as a single text node. Empty text inserts nothing.
    Text(String),
    /// Inserted as one subtree per fragment, in order.
    Nodes(Vec<Fragment>),
}

impl Content {
    /// Content that inserts nothing.
    pub fn empty() -> Self {
        Self::Nodes(Vec::new())
    }

    /// Concatenated text of all text nodes in this content.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Nodes(fragments) => {
                let mut out = String::new();
                for fragment in fragments {
                    fragment.push_text(&mut out);
                }
                out
            }
        }
    }

    fn into_fragments(self) -> Vec<Fragment> {
        match self {
            Self::Text(text) if text.is_empty() => Vec::new(),
            Self::Text(text) => vec![Fragment::text(text)],
            Self::Nodes(fragments) => fragments,
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Fragment> for Content {
    fn from(fragment: Fragment) -> Self {
        Self::Nodes(vec![fragment])
    }
}

impl From<Vec<Fragment>> for Content {
    fn from(fragments: Vec<Fragment>) -> Self {
        Self::Nodes(fragments)
    }
}

// ---------------------------------------------------------------------------
// Insertion primitives
// ---------------------------------------------------------------------------

impl Dom {
    /// Insert `content` as siblings before `id`.
    ///
    /// Inserts nothing when `id` has no parent.
    pub fn before(&mut self, id: NodeId, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.node(id)?;
        let Some(parent) = self.parent(id) else {
            warn!(node = ?id, "before: node has no parent, nothing inserted");
            return Ok(Vec::new());
        };
        let index = self.index_of(parent, id);
        self.insert_fragments(parent, index, content.into_fragments())
    }

    /// Insert `content` as siblings after `id`.
    ///
    /// Inserts nothing when `id` has no parent.
    pub fn after(&mut self, id: NodeId, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.node(id)?;
        let Some(parent) = self.parent(id) else {
            warn!(node = ?id, "after: node has no parent, nothing inserted");
            return Ok(Vec::new());
        };
        let index = self.index_of(parent, id) + 1;
        self.insert_fragments(parent, index, content.into_fragments())
    }

    /// Replace the children of `id` with `content`.
    pub fn html(&mut self, id: NodeId, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.clear_children(id)?;
        self.insert_fragments(id, 0, content.into_fragments())
    }

    /// Replace the children of `id` with a single text node holding the text of `content`.
    pub fn text(&mut self, id: NodeId, content: Content) -> Result<Vec<NodeId>, DomError> {
        let text = content.to_text();
        self.html(id, Content::Text(text))
    }

    /// Insert `content` after the last child of `id`.
    pub fn append(&mut self, id: NodeId, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.node(id)?;
        let index = self.children(id).len();
        self.insert_fragments(id, index, content.into_fragments())
    }

    /// Insert `content` before the first child of `id`.
    pub fn prepend(&mut self, id: NodeId, content: Content) -> Result<Vec<NodeId>, DomError> {
        self.node(id)?;
        self.insert_fragments(id, 0, content.into_fragments())
    }

    /// Text of all text-node descendants of `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        self.walk_depth_first(id)
            .into_iter()
            .filter_map(|n| self.get(n))
            .filter(|data| data.is_text())
            .map(|data| data.text.as_str())
            .collect()
    }

    fn index_of(&self, parent: NodeId, child: NodeId) -> usize {
        self.children(parent)
            .iter()
            .position(|&c| c == child)
            .unwrap_or(0)
    }

    fn insert_fragments(
        &mut self,
        parent: NodeId,
        index: usize,
        fragments: Vec<Fragment>,
    ) -> Result<Vec<NodeId>, DomError> {
        let mut inserted = Vec::with_capacity(fragments.len());
        for (offset, fragment) in fragments.into_iter().enumerate() {
            inserted.push(self.insert_fragment(parent, index + offset, fragment)?);
        }
        Ok(inserted)
    }

    fn insert_fragment(
        &mut self,
        parent: NodeId,
        index: usize,
        fragment: Fragment,
    ) -> Result<NodeId, DomError> {
        let id = self.insert_at(parent, index, fragment.data)?;
        for child in fragment.children {
            self.insert_child_fragment(id, child)?;
        }
        Ok(id)
    }

    fn insert_child_fragment(&mut self, parent: NodeId, fragment: Fragment) -> Result<(), DomError> {
        let index = self.children(parent).len();
        self.insert_fragment(parent, index, fragment).map(|_| ())
    }
}
