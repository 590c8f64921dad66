//! ManualLoom: a loom that records requests and lets the test settle them.
//!
//! Every `weave`/`unweave` call is queued as a [`Request`] holding the elements,
//! the forwarded arguments and the [`Deferred`] behind the returned completion.
//! Nothing happens to the elements until the test decides what should.
//!
//! ```ignore
//! let loom = ManualLoom::new();
//! let completion = handle.weave(&[]);
//! let request = loom.take_requests().remove(0);
//! assert_eq!(request.kind, RequestKind::Weave);
//! request.resolve(vec!["app/child".into()]);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::element::ElementSet;
use crate::event::handler::Value;
use crate::loom::completion::{Completion, Deferred, LoomError, Woven};
use crate::loom::config::LoomConfig;
use crate::loom::Loom;

/// Which propagation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Weave,
    Unweave,
}

/// One recorded weave or unweave call.
#[derive(Debug)]
pub struct Request {
    /// Weave or unweave.
    pub kind: RequestKind,
    /// The element set handed to the loom.
    pub elements: ElementSet,
    /// Forwarded arguments.
    pub args: Vec<Value>,
    deferred: Deferred,
}

impl Request {
    /// Resolve the completion returned for this request.
    pub fn resolve(self, woven: Woven) {
        self.deferred.resolve(woven);
    }

    /// Reject the completion returned for this request.
    pub fn reject(self, error: impl Into<LoomError>) {
        self.deferred.reject(error);
    }
}

/// A [`Loom`] under test control.
#[derive(Debug, Default)]
pub struct ManualLoom {
    config: LoomConfig,
    requests: RefCell<Vec<Request>>,
}

impl ManualLoom {
    /// A manual loom with the default attribute names.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// A manual loom with custom attribute names.
    pub fn with_config(config: LoomConfig) -> Rc<Self> {
        Rc::new(Self {
            config,
            requests: RefCell::new(Vec::new()),
        })
    }

    /// Drain the recorded requests, oldest first.
    pub fn take_requests(&self) -> Vec<Request> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }

    /// Number of requests not yet taken.
    pub fn requests_len(&self) -> usize {
        self.requests.borrow().len()
    }

    fn record(&self, kind: RequestKind, elements: ElementSet, args: &[Value]) -> Completion {
        let (deferred, completion) = Deferred::new();
        self.requests.borrow_mut().push(Request {
            kind,
            elements,
            args: args.to_vec(),
            deferred,
        });
        completion
    }
}

impl Loom for ManualLoom {
    fn config(&self) -> &LoomConfig {
        &self.config
    }

    fn weave(&self, elements: ElementSet, args: &[Value]) -> Completion {
        self.record(RequestKind::Weave, elements, args)
    }

    fn unweave(&self, elements: ElementSet, args: &[Value]) -> Completion {
        self.record(RequestKind::Unweave, elements, args)
    }
}
