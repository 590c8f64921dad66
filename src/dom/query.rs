//! DOM queries: simple selectors, descendant search, arena-wide lookups.

use std::fmt;
use std::str::FromStr;

use super::node::{NodeData, NodeId};
use super::tree::{Dom, DomError};

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// A single simple selector.
///
/// Supported forms: `*`, `tag`, `#id`, `.class`, `[attr]`, `[attr=value]`
/// (value optionally quoted). Text nodes never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `*`
    Any,
    /// `tag`
    Tag(String),
    /// `#id`
    Id(String),
    /// `.class`
    Class(String),
    /// `[name]` or `[name=value]`
    Attr { name: String, value: Option<String> },
}

impl Selector {
    /// Attribute-presence selector, e.g. `[data-weave]`.
    pub fn attr(name: impl Into<String>) -> Self {
        Self::Attr {
            name: name.into(),
            value: None,
        }
    }

    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let s = input.trim();
        let invalid = |message: &str| DomError::InvalidSelector {
            selector: input.to_owned(),
            message: message.to_owned(),
        };

        if s.is_empty() {
            return Err(invalid("empty selector"));
        }
        if s == "*" {
            return Ok(Self::Any);
        }
        if let Some(id) = s.strip_prefix('#') {
            return non_empty(id).map(Self::Id).ok_or_else(|| invalid("missing id"));
        }
        if let Some(class) = s.strip_prefix('.') {
            return non_empty(class)
                .map(Self::Class)
                .ok_or_else(|| invalid("missing class"));
        }
        if let Some(rest) = s.strip_prefix('[') {
            let body = rest
                .strip_suffix(']')
                .ok_or_else(|| invalid("unterminated attribute selector"))?;
            let (name, value) = match body.split_once('=') {
                Some((name, value)) => (name.trim(), Some(unquote(value.trim()).to_owned())),
                None => (body.trim(), None),
            };
            if name.is_empty() {
                return Err(invalid("missing attribute name"));
            }
            return Ok(Self::Attr {
                name: name.to_owned(),
                value,
            });
        }
        if s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Ok(Self::Tag(s.to_owned()));
        }
        Err(invalid("unsupported selector"))
    }

    /// Whether `data` matches this selector.
    pub fn matches(&self, data: &NodeData) -> bool {
        if data.is_text() {
            return false;
        }
        match self {
            Self::Any => true,
            Self::Tag(tag) => data.tag.eq_ignore_ascii_case(tag),
            Self::Id(id) => data.id.as_deref() == Some(id.as_str()),
            Self::Class(class) => data.has_class(class),
            Self::Attr { name, value: None } => data.has_attr(name),
            Self::Attr {
                name,
                value: Some(value),
            } => data.attr(name) == Some(value.as_str()),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

fn unquote(s: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|&q| s.strip_prefix(q).and_then(|inner| inner.strip_suffix(q)))
        .unwrap_or(s)
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Tag(tag) => write!(f, "{tag}"),
            Self::Id(id) => write!(f, "#{id}"),
            Self::Class(class) => write!(f, ".{class}"),
            Self::Attr { name, value: None } => write!(f, "[{name}]"),
            Self::Attr {
                name,
                value: Some(value),
            } => write!(f, "[{name}={value:?}]"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dom queries
// ---------------------------------------------------------------------------

impl Dom {
    /// Descendants of `start` matching `selector`, in document order.
    ///
    /// Never includes `start` itself or any of its ancestors.
    pub fn find(&self, start: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.walk_depth_first(start)
            .into_iter()
            .skip(1)
            .filter(|&id| self.matches(id, selector))
            .collect()
    }

    /// Whether node `id` exists and matches `selector`.
    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        self.get(id).is_some_and(|data| selector.matches(data))
    }

    /// Find the first node whose `id` field matches the given string.
    ///
    /// Iterates all nodes in the arena (not just the tree rooted at `root`).
    pub fn query_by_id(&self, id: &str) -> Option<NodeId> {
        self.iter_nodes()
            .find(|(_, data)| data.id.as_deref() == Some(id))
            .map(|(node_id, _)| node_id)
    }

    /// Find all nodes that have the given class.
    pub fn query_by_class(&self, class: &str) -> Vec<NodeId> {
        self.query_all(|data| data.has_class(class))
    }

    /// Find all nodes whose tag matches the given string.
    pub fn query_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.query_all(|data| data.tag == tag)
    }

    /// Find all nodes matching an arbitrary predicate.
    pub fn query_all(&self, predicate: impl Fn(&NodeData) -> bool) -> Vec<NodeId> {
        self.iter_nodes()
            .filter(|(_, data)| predicate(data))
            .map(|(node_id, _)| node_id)
            .collect()
    }

    /// Iterate over all `(NodeId, &NodeData)` pairs in the arena.
    ///
    /// Slotmap insertion order: deterministic but not tree-order.
    fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// ```text
    ///       root (body)
    ///      /    \
    ///    nav     main [data-weave="app/main"]
    ///    / \
    ///  a     a [data-weave="app/link"]
    /// ```
    fn build_query_tree() -> (Dom, Vec<NodeId>) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body").with_id("root"));
        let nav = dom
            .insert_child(root, NodeData::new("nav").with_id("sidebar").with_class("nav"))
            .unwrap();
        let main = dom
            .insert_child(root, NodeData::new("main").with_attr("data-weave", "app/main"))
            .unwrap();
        let first = dom
            .insert_child(nav, NodeData::new("a").with_class("btn"))
            .unwrap();
        let second = dom
            .insert_child(
                nav,
                NodeData::new("a")
                    .with_class("btn")
                    .with_attr("data-weave", "app/link"),
            )
            .unwrap();
        (dom, vec![root, nav, main, first, second])
    }

    #[test]
    fn parse_forms() {
        assert_eq!(Selector::parse("*").unwrap(), Selector::Any);
        assert_eq!(Selector::parse("div").unwrap(), Selector::Tag("div".into()));
        assert_eq!(Selector::parse("#main").unwrap(), Selector::Id("main".into()));
        assert_eq!(Selector::parse(".btn").unwrap(), Selector::Class("btn".into()));
        assert_eq!(
            Selector::parse("[data-weave]").unwrap(),
            Selector::attr("data-weave")
        );
        assert_eq!(
            Selector::parse("[type='submit']").unwrap(),
            Selector::Attr {
                name: "type".into(),
                value: Some("submit".into())
            }
        );
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "#", ".", "[", "[data-weave", "[]", "a b"] {
            assert!(
                matches!(Selector::parse(bad), Err(DomError::InvalidSelector { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn display_roundtrips_simple_forms() {
        for s in ["*", "li", "#x", ".y", "[data-woven]"] {
            assert_eq!(Selector::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn find_excludes_start() {
        let (dom, ids) = build_query_tree();
        let (root, main, second) = (ids[0], ids[2], ids[4]);
        let found = dom.find(root, &Selector::attr("data-weave"));
        assert_eq!(found, vec![second, main]);
        assert!(dom.find(main, &Selector::attr("data-weave")).is_empty());
    }

    #[test]
    fn find_is_scoped_to_subtree() {
        let (dom, ids) = build_query_tree();
        let (nav, first, second) = (ids[1], ids[3], ids[4]);
        assert_eq!(dom.find(nav, &Selector::Class("btn".into())), vec![first, second]);
    }

    #[test]
    fn text_nodes_never_match() {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("p"));
        dom.insert_child(root, NodeData::text_node("hi")).unwrap();
        assert!(dom.find(root, &Selector::Any).is_empty());
    }

    #[test]
    fn arena_queries() {
        let (dom, ids) = build_query_tree();
        assert_eq!(dom.query_by_id("sidebar"), Some(ids[1]));
        assert!(dom.query_by_id("nonexistent").is_none());
        assert_eq!(dom.query_by_class("btn").len(), 2);
        assert_eq!(dom.query_by_tag("a").len(), 2);
        assert_eq!(dom.query_all(|d| d.has_attr("data-weave")).len(), 2);
    }

    #[test]
    fn query_on_empty_dom() {
        let dom = Dom::new();
        assert!(dom.query_by_id("x").is_none());
        assert!(dom.query_by_class("x").is_empty());
        assert!(dom.query_all(|_| true).is_empty());
    }
}
