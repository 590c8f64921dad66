//! Event system: handlers, per-node registry, bubbling dispatch, topic proxies.

pub mod dispatch;
pub mod handler;
pub mod proxy;

pub use dispatch::{bubble_path, dispatch};
pub use handler::{same_handler, EventError, EventRegistry, Handler, HandlerResult, Listener, Value};
pub use proxy::event_proxy;
