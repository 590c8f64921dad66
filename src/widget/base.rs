//! The widget base: one element, its handler registry, and the injected loom.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::dom::element::Element;
use crate::dom::query::Selector;
use crate::dom::tree::DomError;
use crate::event::handler::{EventError, Handler};
use crate::loom::Loom;

/// Display name used when neither the instance nor its type supplies one.
pub const DEFAULT_DISPLAY_NAME: &str = "browser/component/widget";

/// Errors raised by widget construction and lifecycle calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    #[error("No element provided")]
    NoElement,
    #[error("widget is already initialized")]
    AlreadyInitialized,
    #[error("widget is already in use")]
    Busy,
    #[error("loom has been dropped")]
    LoomGone,
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Event(#[from] EventError),
}

// ---------------------------------------------------------------------------
// HandlerRecord
// ---------------------------------------------------------------------------

/// One binding registered during activation.
///
/// `proxied_handler` is the exact handler given to the element; it is the key
/// used to unregister the binding again.
#[derive(Clone)]
pub struct HandlerRecord {
    /// Event type the proxy listens to.
    pub event_type: String,
    /// Delegation filter passed through unchanged.
    pub features: Option<Selector>,
    /// The registered proxy.
    pub proxied_handler: Handler,
}

impl fmt::Debug for HandlerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRecord")
            .field("event_type", &self.event_type)
            .field("features", &self.features)
            .field("proxied_handler", &Rc::as_ptr(&self.proxied_handler).cast::<()>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

/// State shared by every component: the attached element and its bindings.
///
/// The element is required at construction and released on finalize. The
/// handler registry is filled by initialize and drained by finalize.
pub struct Widget {
    pub(crate) element: Option<Element>,
    pub(crate) handlers: Vec<HandlerRecord>,
    display_name: Option<String>,
    loom: Weak<dyn Loom>,
}

impl Widget {
    /// Attach to `element`, weaving through `loom`.
    ///
    /// Fails with [`WidgetError::NoElement`] when no element is supplied.
    pub fn new(element: Option<Element>, loom: Rc<dyn Loom>) -> Result<Self, WidgetError> {
        let element = element.ok_or(WidgetError::NoElement)?;
        Ok(Self {
            element: Some(element),
            handlers: Vec::new(),
            display_name: None,
            loom: Rc::downgrade(&loom),
        })
    }

    /// Set the display name (builder).
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// The instance display name, if one was set.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The attached element. Fails once the widget has been finalized.
    pub fn element(&self) -> Result<&Element, WidgetError> {
        self.element.as_ref().ok_or(WidgetError::NoElement)
    }

    /// Whether an element is still attached.
    pub fn is_attached(&self) -> bool {
        self.element.is_some()
    }

    /// Bindings registered by the current activation, in registration order.
    pub fn handlers(&self) -> &[HandlerRecord] {
        &self.handlers
    }

    /// The injected loom.
    pub fn loom(&self) -> Result<Rc<dyn Loom>, WidgetError> {
        self.loom.upgrade().ok_or(WidgetError::LoomGone)
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("element", &self.element)
            .field("handlers", &self.handlers)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{document, Dom, NodeData};
    use crate::testing::ManualLoom;

    #[test]
    fn construction_requires_element() {
        let loom = ManualLoom::new();
        let err = Widget::new(None, loom).unwrap_err();
        assert_eq!(err, WidgetError::NoElement);
        assert_eq!(err.to_string(), "No element provided");
    }

    #[test]
    fn construction_stores_element() {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("div"));
        let doc = document(dom);
        let loom = ManualLoom::new();

        let widget = Widget::new(Some(Element::new(&doc, root)), loom.clone())
            .unwrap()
            .with_display_name("app/panel");
        assert_eq!(widget.element().unwrap(), &Element::new(&doc, root));
        assert!(widget.is_attached());
        assert!(widget.handlers().is_empty());
        assert_eq!(widget.display_name(), Some("app/panel"));
        assert!(widget.loom().is_ok());
    }

    #[test]
    fn loom_is_held_weakly() {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("div"));
        let doc = document(dom);
        let loom = ManualLoom::new();
        let widget = Widget::new(Some(Element::new(&doc, root)), loom).unwrap();
        assert_eq!(widget.loom().err(), Some(WidgetError::LoomGone));
    }
}
