use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_channel::oneshot;
use futures_util::future::{FutureExt, Shared};

use crate::api::CurtainState;
use crate::delivery::Subscription;
use crate::{Error, Result};

/// The capability set every curtain driver exposes.
///
/// Positions run from 0 (fully open) to 100 (fully closed). Commands are
/// fire-and-forget: they never block and never fail, and their effect is
/// observed through [`position`](Curtain::position) and
/// [`state`](Curtain::state).
pub trait Curtain: Send + Sync {
    /// Starts the controller. Calling it again returns the same signal.
    ///
    /// The returned [`Completion`] resolves once, at the end of the
    /// controller's life: `Err` when the device or its connection is lost,
    /// `Ok(())` after a requested [`shutdown`](Curtain::shutdown). Either
    /// way the controller is done and a new one has to be built.
    fn init(&self) -> Completion;

    /// Moves the curtain toward `position`. The latest call wins.
    fn set_target_position(&self, position: i32);

    /// Pushes the current position and state to the subscriptions, whether
    /// or not they changed.
    fn query(&self);

    fn position(&self) -> Subscription<i32>;

    fn state(&self) -> Subscription<CurtainState>;

    /// Requests a graceful stop. Safe to call from any thread.
    fn shutdown(&self);
}

/// Creates a completion signal and the half a backend resolves it with.
pub fn completion() -> (Completer, Completion) {
    let (tx, rx) = oneshot::channel();
    (
        Completer { tx },
        Completion {
            inner: rx.shared(),
        },
    )
}

/// Resolves a [`Completion`]. Dropping it counts as a graceful finish.
#[derive(Debug)]
pub struct Completer {
    tx: oneshot::Sender<Error>,
}

impl Completer {
    /// Reports that the controller stopped working.
    pub fn fail(self, err: Error) {
        let _ = self.tx.send(err);
    }

    /// Reports a graceful end of life.
    pub fn finish(self) {}
}

/// One-shot outcome of a controller's life, shared by all of its clones.
#[derive(Clone)]
pub struct Completion {
    inner: Shared<oneshot::Receiver<Error>>,
}

impl Completion {
    /// True when both handles observe the same controller.
    pub fn same_signal(&self, other: &Completion) -> bool {
        self.inner.ptr_eq(&other.inner)
    }

    /// The outcome, if the controller has already finished.
    pub fn peek(&self) -> Option<Result<()>> {
        self.inner.peek().map(|r| outcome(r.clone()))
    }
}

impl Future for Completion {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx).map(outcome)
    }
}

// A closed channel carries no error: that is the graceful outcome.
fn outcome(received: std::result::Result<Error, oneshot::Canceled>) -> Result<()> {
    match received {
        Ok(err) => Err(err),
        Err(oneshot::Canceled) => Ok(()),
    }
}
