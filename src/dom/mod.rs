//! DOM arena: slotmap-backed element tree, selectors, content insertion, element handles.

pub mod content;
pub mod element;
pub mod markup;
pub mod node;
pub mod query;
pub mod tree;

pub use content::{Content, Fragment};
pub use element::{document, Document, Element, ElementSet};
pub use node::{NodeData, NodeId};
pub use query::Selector;
pub use tree::{Dom, DomError};
