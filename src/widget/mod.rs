//! Widget system: base, component trait, shared handles, lifecycle.

pub mod base;
pub mod component;
pub mod handle;
pub mod lifecycle;

pub use base::{HandlerRecord, Widget, WidgetError, DEFAULT_DISPLAY_NAME};
pub use component::{BoundHandler, Component, DomSpecial};
pub use handle::{Contents, WidgetHandle};
pub use lifecycle::{Lifecycle, LifecycleEvent, LifecycleTracker};
