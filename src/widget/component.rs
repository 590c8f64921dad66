//! Component trait and per-type declared event bindings.
//!
//! A component type embeds a [`Widget`] and declares its DOM event bindings
//! once, as an associated constant:
//!
//! ```ignore
//! struct Menu { widget: Widget, opened: usize }
//!
//! impl Menu {
//!     fn on_click(menu: &WidgetHandle<Self>, _topic: &str, _args: &[Value]) -> HandlerResult {
//!         menu.update(|m| m.opened += 1)?;
//!         Ok(Value::Null)
//!     }
//!
//!     fn on_close(menu: &WidgetHandle<Self>, _topic: &str, _args: &[Value]) -> HandlerResult {
//!         drop(menu.unweave(&[]));
//!         Ok(Value::Null)
//!     }
//! }
//!
//! impl Component for Menu {
//!     const DISPLAY_NAME: &'static str = "app/menu";
//!     const DOM_SPECIALS: &'static [DomSpecial<Self>] =
//!         &[
//!             DomSpecial::delegated("click", "li", Self::on_click),
//!             DomSpecial::new("close", Self::on_close),
//!         ];
//!
//!     fn widget(&self) -> &Widget { &self.widget }
//!     fn widget_mut(&mut self) -> &mut Widget { &mut self.widget }
//! }
//! ```

use std::fmt;

use super::base::{Widget, DEFAULT_DISPLAY_NAME};
use super::handle::WidgetHandle;
use crate::event::handler::{HandlerResult, Value};

/// A declared handler: receives the owning instance, the event topic, then the
/// call arguments.
///
/// No borrow of the component is held while it runs; use
/// [`WidgetHandle::update`] or [`WidgetHandle::read`] for state, and the
/// handle's lifecycle and content methods for everything else.
pub type BoundHandler<C> = fn(&WidgetHandle<C>, &str, &[Value]) -> HandlerResult;

/// A declared binding: event type, optional delegation selector, handler.
pub struct DomSpecial<C> {
    /// Event type, e.g. `"click"`.
    pub event_type: &'static str,
    /// Delegation selector source, parsed at activation.
    pub features: Option<&'static str>,
    /// Handler called with the owning instance and the event topic.
    pub handler: BoundHandler<C>,
}

impl<C> DomSpecial<C> {
    /// A binding on the element itself.
    pub const fn new(event_type: &'static str, handler: BoundHandler<C>) -> Self {
        Self {
            event_type,
            features: None,
            handler,
        }
    }

    /// A binding delegated to descendants matching `features`.
    pub const fn delegated(
        event_type: &'static str,
        features: &'static str,
        handler: BoundHandler<C>,
    ) -> Self {
        Self {
            event_type,
            features: Some(features),
            handler,
        }
    }
}

impl<C> fmt::Debug for DomSpecial<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomSpecial")
            .field("event_type", &self.event_type)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}

/// A widget variant.
///
/// Implementors own a [`Widget`] and expose it; lifecycle behaviour comes from
/// [`WidgetHandle`](super::handle::WidgetHandle).
pub trait Component: Sized + 'static {
    /// Display name for instances that were not given one.
    const DISPLAY_NAME: &'static str = DEFAULT_DISPLAY_NAME;

    /// Event bindings shared by every instance of this type.
    const DOM_SPECIALS: &'static [DomSpecial<Self>] = &[];

    /// The embedded widget base.
    fn widget(&self) -> &Widget;

    /// The embedded widget base, mutably.
    fn widget_mut(&mut self) -> &mut Widget;
}

/// The plain widget is a component with no declared bindings.
impl Component for Widget {
    fn widget(&self) -> &Widget {
        self
    }

    fn widget_mut(&mut self) -> &mut Widget {
        self
    }
}
