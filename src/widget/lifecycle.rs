//! Widget lifecycle: the object-safe lifecycle surface and weave bookkeeping.
//!
//! [`Lifecycle`] lets a loom drive widgets of any component type through
//! `initialize`, `finalize`, `weave` and `unweave`. The [`LifecycleTracker`]
//! records how many widgets are woven onto each element and accumulates
//! lifecycle events (`Woven`, `Unwoven`) that can be drained by the caller.

use std::collections::HashMap;

use super::base::WidgetError;
use super::component::Component;
use super::handle::WidgetHandle;
use crate::dom::element::Element;
use crate::dom::node::NodeId;
use crate::event::handler::Value;
use crate::loom::completion::Completion;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// A widget instance as seen by a loom, independent of its component type.
pub trait Lifecycle {
    /// Instance display name.
    fn display_name(&self) -> String;

    /// The attached element, or `None` once finalized.
    fn element(&self) -> Option<Element>;

    /// Register the declared bindings.
    fn initialize(&self) -> Result<(), WidgetError>;

    /// Unregister the bindings and release the element.
    fn finalize(&self) -> Result<(), WidgetError>;

    /// Weave pending descendants.
    fn weave(&self, args: &[Value]) -> Completion;

    /// Unweave active descendants and the element itself.
    fn unweave(&self, args: &[Value]) -> Completion;
}

impl<C: Component> Lifecycle for WidgetHandle<C> {
    fn display_name(&self) -> String {
        WidgetHandle::display_name(self)
    }

    fn element(&self) -> Option<Element> {
        WidgetHandle::element(self)
    }

    fn initialize(&self) -> Result<(), WidgetError> {
        WidgetHandle::initialize(self)
    }

    fn finalize(&self) -> Result<(), WidgetError> {
        WidgetHandle::finalize(self)
    }

    fn weave(&self, args: &[Value]) -> Completion {
        WidgetHandle::weave(self, args)
    }

    fn unweave(&self, args: &[Value]) -> Completion {
        WidgetHandle::unweave(self, args)
    }
}

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// Events recorded while weaving and unweaving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A widget was constructed and initialized on a node.
    Woven { node_id: NodeId, name: String },
    /// A widget was finalized and removed from a node.
    Unwoven { node_id: NodeId, name: String },
}

// ---------------------------------------------------------------------------
// LifecycleTracker
// ---------------------------------------------------------------------------

/// Counts woven widgets per element and queues lifecycle events.
///
/// Counts are keyed by [`Element`], so nodes from different documents never
/// share a count even when their ids coincide.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    woven: HashMap<Element, usize>,
    pending: Vec<LifecycleEvent>,
}

impl LifecycleTracker {
    /// Create a new, empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that widget `name` was woven onto `element`.
    pub fn on_weave(&mut self, element: &Element, name: impl Into<String>) {
        *self.woven.entry(element.clone()).or_default() += 1;
        self.pending.push(LifecycleEvent::Woven {
            node_id: element.node(),
            name: name.into(),
        });
    }

    /// Record that widget `name` was unwoven from `element`.
    ///
    /// A no-op if nothing is woven onto `element`.
    pub fn on_unweave(&mut self, element: &Element, name: impl Into<String>) {
        let Some(count) = self.woven.get_mut(element) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.woven.remove(element);
        }
        self.pending.push(LifecycleEvent::Unwoven {
            node_id: element.node(),
            name: name.into(),
        });
    }

    /// Whether any widget is woven onto `element`.
    pub fn is_woven(&self, element: &Element) -> bool {
        self.woven.contains_key(element)
    }

    /// Number of widgets woven onto `element`.
    pub fn woven_count(&self, element: &Element) -> usize {
        self.woven.get(element).copied().unwrap_or(0)
    }

    /// Number of elements with at least one woven widget.
    pub fn woven_nodes(&self) -> usize {
        self.woven.len()
    }

    /// Drain and return all pending events.
    pub fn pending_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Whether there are any pending events.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Clear counts and pending events.
    pub fn clear(&mut self) {
        self.woven.clear();
        self.pending.clear();
    }
}
