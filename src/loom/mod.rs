//! Tree propagation: weaving widgets onto marked elements and unweaving them.
//!
//! A [`Loom`] is handed to every widget at construction. Widgets ask it to
//! weave the descendants marked with the weave attribute, or to unweave the
//! descendants (and themselves) marked with the woven attribute. [`Weaver`]
//! is the default implementation; tests usually substitute
//! [`ManualLoom`](crate::testing::ManualLoom).

pub mod completion;
pub mod config;
pub mod entry;
pub mod weaver;

pub use completion::{Completion, Deferred, LoomError, Woven};
pub use config::LoomConfig;
pub use entry::WeaveEntry;
pub use weaver::{WovenWidget, Weaver};

use crate::dom::element::ElementSet;
use crate::event::handler::Value;

/// Runs activation and deactivation over sets of elements.
pub trait Loom {
    /// Attribute names this loom reads and writes.
    fn config(&self) -> &LoomConfig;

    /// Activate every widget pending on `elements`, forwarding `args` to each
    /// widget factory. Resolves once all of them are active.
    fn weave(&self, elements: ElementSet, args: &[Value]) -> Completion;

    /// Deactivate the widgets active on `elements`. Resolves once all of them
    /// are finalized.
    fn unweave(&self, elements: ElementSet, args: &[Value]) -> Completion;
}
