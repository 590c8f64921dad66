//! Handlers, listeners and the per-node listener registry.
//!
//! A [`Handler`] is a reference-counted closure; its *identity* (the `Rc`
//! allocation) is the key used to unregister it. [`EventRegistry`] keeps one
//! ordered listener list per node.

use std::fmt;
use std::rc::Rc;

use slotmap::SecondaryMap;

use crate::dom::node::NodeId;
use crate::dom::query::Selector;

/// Arguments and return values flowing through handlers.
pub type Value = serde_json::Value;

/// What a handler returns.
pub type HandlerResult = Result<Value, EventError>;

/// A registered event handler.
pub type Handler = Rc<dyn Fn(&[Value]) -> HandlerResult>;

/// Errors raised while dispatching to a handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("handler owner has been dropped")]
    Detached,
    #[error("handler owner is already in use")]
    Busy,
    #[error("{topic} handler failed: {message}")]
    Failed { topic: String, message: String },
}

impl EventError {
    /// Convenience constructor for handler-raised failures.
    pub fn failed(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            topic: topic.into(),
            message: message.into(),
        }
    }
}

/// Whether two handlers are the same allocation.
pub fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// A handler registered for one event type on one node.
#[derive(Clone)]
pub struct Listener {
    /// Event type, e.g. `"click"`.
    pub event_type: String,
    /// Delegation filter: only events originating at a matching descendant fire.
    pub features: Option<Selector>,
    /// The handler itself.
    pub handler: Handler,
}

impl Listener {
    /// Create a listener.
    pub fn new(event_type: impl Into<String>, features: Option<Selector>, handler: Handler) -> Self {
        Self {
            event_type: event_type.into(),
            features,
            handler,
        }
    }

    fn is(&self, event_type: &str, features: Option<&Selector>, handler: &Handler) -> bool {
        self.event_type == event_type
            && self.features.as_ref() == features
            && same_handler(&self.handler, handler)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("event_type", &self.event_type)
            .field("features", &self.features)
            .field("handler", &Rc::as_ptr(&self.handler).cast::<()>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventRegistry
// ---------------------------------------------------------------------------

/// Listener lists keyed by node.
#[derive(Debug, Default)]
pub struct EventRegistry {
    listeners: SecondaryMap<NodeId, Vec<Listener>>,
}

impl EventRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: SecondaryMap::new(),
        }
    }

    /// Append a listener to `node`'s list.
    pub fn register(&mut self, node: NodeId, listener: Listener) {
        match self.listeners.get_mut(node) {
            Some(list) => list.push(listener),
            None => {
                self.listeners.insert(node, vec![listener]);
            }
        }
    }

    /// Remove the first listener on `node` matching type, features and handler identity.
    ///
    /// Returns whether a listener was removed.
    pub fn unregister(
        &mut self,
        node: NodeId,
        event_type: &str,
        features: Option<&Selector>,
        handler: &Handler,
    ) -> bool {
        let Some(list) = self.listeners.get_mut(node) else {
            return false;
        };
        let Some(pos) = list.iter().position(|l| l.is(event_type, features, handler)) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.listeners.remove(node);
        }
        true
    }

    /// Snapshot of `node`'s listeners for `event_type`, in registration order.
    pub fn listeners(&self, node: NodeId, event_type: &str) -> Vec<Listener> {
        self.listeners
            .get(node)
            .map(|list| {
                list.iter()
                    .filter(|l| l.event_type == event_type)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of listeners registered on `node`.
    pub fn count(&self, node: NodeId) -> usize {
        self.listeners.get(node).map_or(0, Vec::len)
    }

    /// Total number of listeners across all nodes.
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every listener on `node`.
    pub fn clear_node(&mut self, node: NodeId) {
        self.listeners.remove(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slotmap::SlotMap;

    fn make_ids(n: usize) -> Vec<NodeId> {
        let mut sm: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    fn handler(tag: &'static str) -> Handler {
        Rc::new(move |_args: &[Value]| -> HandlerResult { Ok(json!(tag)) })
    }

    #[test]
    fn new_registry_is_empty() {
        let reg = EventRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn register_preserves_order() {
        let ids = make_ids(1);
        let mut reg = EventRegistry::new();
        let (a, b) = (handler("a"), handler("b"));
        reg.register(ids[0], Listener::new("click", None, a.clone()));
        reg.register(ids[0], Listener::new("click", None, b.clone()));
        reg.register(ids[0], Listener::new("focus", None, a.clone()));

        let clicks = reg.listeners(ids[0], "click");
        assert_eq!(clicks.len(), 2);
        assert!(same_handler(&clicks[0].handler, &a));
        assert!(same_handler(&clicks[1].handler, &b));
        assert_eq!(reg.count(ids[0]), 3);
    }

    #[test]
    fn unregister_by_identity() {
        let ids = make_ids(1);
        let mut reg = EventRegistry::new();
        let a = handler("same");
        let b = handler("same");
        reg.register(ids[0], Listener::new("click", None, a.clone()));
        reg.register(ids[0], Listener::new("click", None, b.clone()));

        assert!(reg.unregister(ids[0], "click", None, &a));
        let left = reg.listeners(ids[0], "click");
        assert_eq!(left.len(), 1);
        assert!(same_handler(&left[0].handler, &b));
    }

    #[test]
    fn unregister_unknown_is_noop() {
        let ids = make_ids(2);
        let mut reg = EventRegistry::new();
        let a = handler("a");
        reg.register(ids[0], Listener::new("click", None, a.clone()));

        assert!(!reg.unregister(ids[0], "click", None, &handler("a")));
        assert!(!reg.unregister(ids[0], "focus", None, &a));
        assert!(!reg.unregister(ids[1], "click", None, &a));
        let sel = Selector::Class("x".into());
        assert!(!reg.unregister(ids[0], "click", Some(&sel), &a));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn features_are_part_of_the_key() {
        let ids = make_ids(1);
        let mut reg = EventRegistry::new();
        let a = handler("a");
        let sel = Selector::Tag("li".into());
        reg.register(ids[0], Listener::new("click", Some(sel.clone()), a.clone()));
        assert!(!reg.unregister(ids[0], "click", None, &a));
        assert!(reg.unregister(ids[0], "click", Some(&sel), &a));
        assert!(reg.is_empty());
    }

    #[test]
    fn clear_node_drops_listeners() {
        let ids = make_ids(2);
        let mut reg = EventRegistry::new();
        reg.register(ids[0], Listener::new("click", None, handler("a")));
        reg.register(ids[1], Listener::new("click", None, handler("b")));
        reg.clear_node(ids[0]);
        assert_eq!(reg.count(ids[0]), 0);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn failed_display() {
        let err = EventError::failed("click", "boom");
        assert_eq!(err.to_string(), "click handler failed: boom");
    }
}
