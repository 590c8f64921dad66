//! Headless testing helpers: ManualLoom, snapshot helpers.
//!
//! Use the [`ManualLoom`] to observe the weave/unweave requests a widget makes
//! and to settle them at a chosen moment. Use [`outline`] and [`document_markup`]
//! to capture a document as plain text for snapshot-style assertions.

pub mod manual;
pub mod snapshot;

pub use manual::{ManualLoom, Request, RequestKind};
pub use snapshot::{document_markup, markup_of, outline};
