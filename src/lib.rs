//! # loom-widget
//!
//! Element-bound widgets with declarative event bindings and recursive
//! weave/unweave propagation over a retained DOM.
//!
//! A widget attaches to exactly one element. Activation registers one proxied
//! handler per declared binding, each proxy injecting its event topic ahead of
//! the call arguments; deactivation unregisters exactly those proxies and
//! releases the element. Weaving activates descendants marked with the weave
//! attribute through an injected [`Loom`](loom::Loom); unweaving deactivates
//! active descendants and the element itself. Content helpers insert content
//! and then weave, so freshly inserted widgets come alive in the same call.
//!
//! ## Core Systems
//!
//! - **[`dom`]**: Slotmap-backed DOM arena, selectors, content insertion, element handles
//! - **[`event`]**: Listener registry, bubbling dispatch with delegation, topic-injecting proxies
//! - **[`widget`]**: Widget base, `Component` trait, shared handles, lifecycle tracking
//! - **[`loom`]**: `Loom` trait, completions and deferreds, weave attribute parsing, `Weaver`
//! - **[`testing`]**: `ManualLoom` and snapshot helpers
//!
//! ## Example
//!
//! ```ignore
//! use loom_widget::prelude::*;
//!
//! let weaver = Weaver::new();
//! weaver.register("app/menu", |widget, _args| Ok(Menu { widget, opened: 0 }));
//!
//! let pending = Element::new(&doc, body).find(&weaver.config().weave_selector());
//! let woven = weaver.weave(pending, &[]).await?;
//! ```

// Core systems
pub mod dom;
pub mod event;

// Widget system
pub mod widget;

// Tree propagation
pub mod loom;

// Headless testing
pub mod testing;

/// Commonly used types.
pub mod prelude {
    pub use crate::dom::{
        document, Content, Document, Dom, DomError, Element, ElementSet, Fragment, NodeData,
        NodeId, Selector,
    };
    pub use crate::event::{EventError, Handler, HandlerResult, Value};
    pub use crate::loom::{Completion, Deferred, Loom, LoomConfig, LoomError, Weaver, Woven};
    pub use crate::widget::{
        Component, Contents, DomSpecial, Lifecycle, Widget, WidgetError, WidgetHandle,
    };
}
