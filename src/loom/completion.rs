//! Completion values for weave/unweave and the deferreds that settle them.
//!
//! A [`Completion`] resolves with the display names of the widgets a weave or
//! unweave touched, or rejects with a [`LoomError`]. Dropping a completion only
//! stops observing the result: work already started on elements carries on.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, LocalBoxFuture};
use futures::{FutureExt, TryFutureExt};
use tokio::sync::oneshot;

use crate::dom::tree::DomError;
use crate::widget::base::WidgetError;

/// Display names of the widgets a weave/unweave touched, in order.
pub type Woven = Vec<String>;

/// Errors surfaced through completions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoomError {
    #[error("no widget registered as {0:?}")]
    UnknownWidget(String),
    #[error("invalid weave entry {entry:?}: {message}")]
    InvalidEntry { entry: String, message: String },
    #[error(transparent)]
    Widget(#[from] WidgetError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("completion was dropped before it settled")]
    Abandoned,
    #[error("rejected: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Aggregate result of a weave or unweave.
#[must_use = "completions do nothing unless awaited or polled"]
pub struct Completion {
    inner: LocalBoxFuture<'static, Result<Woven, LoomError>>,
}

impl Completion {
    /// Wrap any future with the right output.
    pub fn new(future: impl Future<Output = Result<Woven, LoomError>> + 'static) -> Self {
        Self {
            inner: future.boxed_local(),
        }
    }

    /// An already-resolved completion.
    pub fn resolved(woven: Woven) -> Self {
        Self::new(future::ready(Ok(woven)))
    }

    /// An already-rejected completion.
    pub fn rejected(error: impl Into<LoomError>) -> Self {
        Self::new(future::ready(Err(error.into())))
    }

    /// A settled completion from a result.
    pub fn from_result(result: Result<Woven, LoomError>) -> Self {
        Self::new(future::ready(result))
    }

    /// Resolve once every completion has resolved, concatenating their names in
    /// input order. Rejects with the first rejection.
    pub fn all(completions: impl IntoIterator<Item = Completion>) -> Self {
        let joined = future::try_join_all(completions)
            .map_ok(|parts| parts.into_iter().flatten().collect::<Woven>());
        Self::new(joined)
    }

    /// Chain `next` after a successful resolution.
    pub fn then(self, next: impl FnOnce(Woven) -> Completion + 'static) -> Self {
        Self::new(self.and_then(next))
    }
}

impl Future for Completion {
    type Output = Result<Woven, LoomError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Deferred
// ---------------------------------------------------------------------------

/// The settling side of a [`Completion`].
///
/// Dropping a deferred without settling it rejects the completion with
/// [`LoomError::Abandoned`].
#[derive(Debug)]
pub struct Deferred {
    tx: oneshot::Sender<Result<Woven, LoomError>>,
}

impl Deferred {
    /// Create a deferred and the completion it settles.
    pub fn new() -> (Self, Completion) {
        let (tx, rx) = oneshot::channel();
        let completion =
            Completion::new(async move { rx.await.unwrap_or(Err(LoomError::Abandoned)) });
        (Self { tx }, completion)
    }

    /// Resolve the completion.
    pub fn resolve(self, woven: Woven) {
        // The receiver may already be gone; nobody is listening then.
        let _ = self.tx.send(Ok(woven));
    }

    /// Reject the completion.
    pub fn reject(self, error: impl Into<LoomError>) {
        let _ = self.tx.send(Err(error.into()));
    }
}
