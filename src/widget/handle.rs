//! Shared component handles: activation, deactivation, weaving, content helpers.
//!
//! [`WidgetHandle`] owns a component behind `Rc<RefCell<_>>` so that proxied
//! event handlers can reach it weakly. No borrow of the component is held
//! while the element dispatches events or while the loom runs, so handlers and
//! nested lifecycles never observe a borrowed component.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::base::{HandlerRecord, WidgetError};
use super::component::Component;
use crate::dom::content::{Content, Fragment};
use crate::dom::element::Element;
use crate::dom::node::NodeId;
use crate::dom::query::Selector;
use crate::dom::tree::DomError;
use crate::event::handler::{EventError, Handler, Value};
use crate::event::proxy::event_proxy;
use crate::loom::completion::Completion;

// ---------------------------------------------------------------------------
// Contents
// ---------------------------------------------------------------------------

/// What a content helper inserts: a literal, or a producer run against the component.
pub enum Contents<C> {
    /// Inserted as is.
    Literal(Content),
    /// Called with the component and the helper's extra arguments.
    Producer(Box<dyn FnOnce(&mut C, &[Value]) -> Content>),
}

impl<C> Contents<C> {
    /// Wrap a producer.
    pub fn with(producer: impl FnOnce(&mut C, &[Value]) -> Content + 'static) -> Self {
        Self::Producer(Box::new(producer))
    }

    fn resolve(self, component: &mut C, args: &[Value]) -> Content {
        match self {
            Self::Literal(content) => content,
            Self::Producer(producer) => producer(component, args),
        }
    }
}

impl<C> From<Content> for Contents<C> {
    fn from(content: Content) -> Self {
        Self::Literal(content)
    }
}

impl<C> From<&str> for Contents<C> {
    fn from(text: &str) -> Self {
        Self::Literal(text.into())
    }
}

impl<C> From<String> for Contents<C> {
    fn from(text: String) -> Self {
        Self::Literal(text.into())
    }
}

impl<C> From<Fragment> for Contents<C> {
    fn from(fragment: Fragment) -> Self {
        Self::Literal(fragment.into())
    }
}

impl<C> From<Vec<Fragment>> for Contents<C> {
    fn from(fragments: Vec<Fragment>) -> Self {
        Self::Literal(fragments.into())
    }
}

impl<C> fmt::Debug for Contents<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(content) => f.debug_tuple("Literal").field(content).finish(),
            Self::Producer(_) => f.write_str("Producer(<fn>)"),
        }
    }
}

type Insert = fn(&Element, Content) -> Result<Vec<NodeId>, DomError>;

// ---------------------------------------------------------------------------
// WidgetHandle
// ---------------------------------------------------------------------------

/// A component instance, shared.
pub struct WidgetHandle<C> {
    inner: Rc<RefCell<C>>,
}

impl<C> Clone for WidgetHandle<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: Component> WidgetHandle<C> {
    /// Wrap a component.
    pub fn new(component: C) -> Self {
        Self {
            inner: Rc::new(RefCell::new(component)),
        }
    }

    /// Borrow the component.
    ///
    /// # Panics
    ///
    /// Panics if the component is currently borrowed mutably.
    pub fn borrow(&self) -> Ref<'_, C> {
        self.inner.borrow()
    }

    /// Borrow the component mutably.
    ///
    /// # Panics
    ///
    /// Panics if the component is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, C> {
        self.inner.borrow_mut()
    }

    /// Run `f` with the component borrowed mutably.
    ///
    /// Fails with [`EventError::Busy`] if the component is already borrowed.
    pub fn update<R>(&self, f: impl FnOnce(&mut C) -> R) -> Result<R, EventError> {
        let mut component = self.inner.try_borrow_mut().map_err(|_| EventError::Busy)?;
        Ok(f(&mut component))
    }

    /// Run `f` with the component borrowed.
    ///
    /// Fails with [`EventError::Busy`] if the component is borrowed mutably.
    pub fn read<R>(&self, f: impl FnOnce(&C) -> R) -> Result<R, EventError> {
        let component = self.inner.try_borrow().map_err(|_| EventError::Busy)?;
        Ok(f(&component))
    }

    /// Instance display name, falling back to the type's.
    pub fn display_name(&self) -> String {
        self.inner
            .try_borrow()
            .ok()
            .and_then(|c| c.widget().display_name().map(str::to_owned))
            .unwrap_or_else(|| C::DISPLAY_NAME.to_owned())
    }

    /// The attached element, or `None` once finalized.
    pub fn element(&self) -> Option<Element> {
        self.inner
            .try_borrow()
            .ok()
            .and_then(|c| c.widget().element.clone())
    }

    fn try_borrow(&self) -> Result<Ref<'_, C>, WidgetError> {
        self.inner.try_borrow().map_err(|_| WidgetError::Busy)
    }

    fn try_borrow_mut(&self) -> Result<RefMut<'_, C>, WidgetError> {
        self.inner.try_borrow_mut().map_err(|_| WidgetError::Busy)
    }

    fn attached(&self) -> Result<Element, WidgetError> {
        Ok(self.try_borrow()?.widget().element()?.clone())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Activate: register a proxy for every declared binding, in declaration order.
    ///
    /// Each proxy calls its handler with a handle to this instance and holds no
    /// borrow of the component while the handler runs.
    ///
    /// A registration failure is returned as is; bindings registered before it
    /// stay registered and recorded.
    pub fn initialize(&self) -> Result<(), WidgetError> {
        let mut component = self.try_borrow_mut()?;
        let widget = component.widget_mut();
        let element = widget.element()?.clone();
        if !widget.handlers.is_empty() {
            return Err(WidgetError::AlreadyInitialized);
        }

        for special in C::DOM_SPECIALS {
            let features = special.features.map(Selector::parse).transpose()?;
            let handler = special.handler;
            let proxied = event_proxy(
                special.event_type,
                Rc::downgrade(&self.inner),
                move |inner: Rc<RefCell<C>>, topic: &str, args: &[Value]| {
                    handler(&WidgetHandle { inner }, topic, args)
                },
            );
            widget.handlers.push(HandlerRecord {
                event_type: special.event_type.to_owned(),
                features: features.clone(),
                proxied_handler: Rc::clone(&proxied),
            });
            element.on(special.event_type, features, proxied)?;
        }

        debug!(
            node = ?element.node(),
            bindings = widget.handlers.len(),
            "widget initialized"
        );
        Ok(())
    }

    /// Deactivate: unregister every recorded binding in registration order, then
    /// release the element.
    ///
    /// Fails with [`WidgetError::NoElement`] if the widget was already finalized.
    pub fn finalize(&self) -> Result<(), WidgetError> {
        let mut component = self.try_borrow_mut()?;
        let widget = component.widget_mut();
        let element = widget.element()?.clone();

        let handlers = std::mem::take(&mut widget.handlers);
        for record in &handlers {
            element.off(
                &record.event_type,
                record.features.as_ref(),
                &record.proxied_handler,
            );
        }
        widget.element = None;

        debug!(
            node = ?element.node(),
            bindings = handlers.len(),
            "widget finalized"
        );
        Ok(())
    }

    /// Weave every descendant pending activation. The element itself is excluded.
    pub fn weave(&self, args: &[Value]) -> Completion {
        let request = || -> Result<Completion, WidgetError> {
            let (element, loom) = {
                let component = self.try_borrow()?;
                let widget = component.widget();
                (widget.element()?.clone(), widget.loom()?)
            };
            let pending = element.find(&loom.config().weave_selector());
            Ok(loom.weave(pending, args))
        };
        request().unwrap_or_else(Completion::rejected)
    }

    /// Unweave every active descendant and the element itself.
    pub fn unweave(&self, args: &[Value]) -> Completion {
        let request = || -> Result<Completion, WidgetError> {
            let (element, loom) = {
                let component = self.try_borrow()?;
                let widget = component.widget();
                (widget.element()?.clone(), widget.loom()?)
            };
            let active = element
                .find(&loom.config().woven_selector())
                .add_back(element);
            Ok(loom.unweave(active, args))
        };
        request().unwrap_or_else(Completion::rejected)
    }

    // ── Element pass-through ─────────────────────────────────────────

    /// Register a handler on the element.
    pub fn on(
        &self,
        event_type: &str,
        features: Option<Selector>,
        handler: Handler,
    ) -> Result<&Self, WidgetError> {
        self.attached()?.on(event_type, features, handler)?;
        Ok(self)
    }

    /// Unregister a handler from the element.
    pub fn off(
        &self,
        event_type: &str,
        features: Option<&Selector>,
        handler: &Handler,
    ) -> Result<&Self, WidgetError> {
        self.attached()?.off(event_type, features, handler);
        Ok(self)
    }

    /// Trigger an event on the element.
    pub fn trigger(&self, event_type: &str, args: &[Value]) -> Result<Vec<Value>, WidgetError> {
        Ok(self.attached()?.trigger(event_type, args)?)
    }

    // ── Content helpers ──────────────────────────────────────────────

    /// Insert content before the element, then weave.
    pub fn before(&self, contents: impl Into<Contents<C>>, args: &[Value]) -> Completion {
        self.render("before", Element::before, contents.into(), args)
    }

    /// Insert content after the element, then weave.
    pub fn after(&self, contents: impl Into<Contents<C>>, args: &[Value]) -> Completion {
        self.render("after", Element::after, contents.into(), args)
    }

    /// Replace the element's children, then weave.
    pub fn html(&self, contents: impl Into<Contents<C>>, args: &[Value]) -> Completion {
        self.render("html", Element::html, contents.into(), args)
    }

    /// Replace the element's children with text, then weave.
    pub fn text(&self, contents: impl Into<Contents<C>>, args: &[Value]) -> Completion {
        self.render("text", Element::text, contents.into(), args)
    }

    /// Append to the element's children, then weave.
    pub fn append(&self, contents: impl Into<Contents<C>>, args: &[Value]) -> Completion {
        self.render("append", Element::append, contents.into(), args)
    }

    /// Prepend to the element's children, then weave.
    pub fn prepend(&self, contents: impl Into<Contents<C>>, args: &[Value]) -> Completion {
        self.render("prepend", Element::prepend, contents.into(), args)
    }

    fn render(&self, op: &str, insert: Insert, contents: Contents<C>, args: &[Value]) -> Completion {
        let inserted = || -> Result<Vec<NodeId>, WidgetError> {
            let (element, content) = {
                let mut component = self.try_borrow_mut()?;
                let element = component.widget().element()?.clone();
                (element, contents.resolve(&mut component, args))
            };
            Ok(insert(&element, content)?)
        };
        match inserted() {
            Ok(nodes) => {
                debug!(op, inserted = nodes.len(), "content rendered");
                self.weave(&[])
            }
            Err(err) => Completion::rejected(err),
        }
    }
}

impl<C: Component + fmt::Debug> fmt::Debug for WidgetHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WidgetHandle").field(&self.inner).finish()
    }
}
