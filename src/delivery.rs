//! Best-effort delivery of worker updates to subscribers.
//!
//! The worker never waits on a subscriber. [`Publisher::publish`] only
//! enqueues; a [`Relay`] task per subscription drains the queue into a
//! single-slot channel read through [`Subscription`], racing every send
//! against the exit signal so a slow or absent reader cannot hold up
//! shutdown. Values reach the subscriber in the order they were published.
//!
//! With [`Backlog::Bounded`] the queue is a ring: once it is full the
//! oldest waiting values are overwritten, so the latest value always
//! arrives.

use std::sync::Arc;

use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::select;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream};
use tracing::{debug, warn};

use crate::config::Backlog;

/// Creates the three ends of one subscription pipe.
pub(crate) fn channel<T: Clone + Send + 'static>(
    name: &'static str,
    backlog: Backlog,
) -> (Publisher<T>, Relay<T>, Subscription<T>) {
    let (out, rx) = mpsc::channel(1);

    let (queue_tx, queue) = match backlog {
        Backlog::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (Queue::Unbounded(tx), UnboundedReceiverStream::new(rx).boxed())
        }
        Backlog::Bounded(n) => {
            let (tx, rx) = broadcast::channel(n.max(1));
            let ring = BroadcastStream::new(rx).filter_map(move |next| async move {
                match next {
                    Ok(value) => Some(value),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(
                            subscription = name,
                            skipped,
                            "delivery backlog full, dropped oldest updates"
                        );
                        None
                    }
                }
            });
            (Queue::Bounded(tx), ring.boxed())
        }
    };

    (
        Publisher { queue: queue_tx },
        Relay { name, queue, out },
        Subscription {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Resolves once shutdown has been requested, or the requester is gone.
pub(crate) async fn exited(exit: &mut watch::Receiver<bool>) {
    let _ = exit.wait_for(|&requested| requested).await;
}

enum Queue<T> {
    Unbounded(mpsc::UnboundedSender<T>),
    Bounded(broadcast::Sender<T>),
}

/// Worker side of a subscription. Dropping it ends the relay.
pub(crate) struct Publisher<T> {
    queue: Queue<T>,
}

impl<T> Publisher<T> {
    /// Never blocks and never fails; usable from any thread. A full bounded
    /// queue makes room by overwriting its oldest value.
    pub fn publish(&self, value: T) {
        match &self.queue {
            Queue::Unbounded(tx) => {
                let _ = tx.send(value);
            }
            Queue::Bounded(tx) => {
                let _ = tx.send(value);
            }
        }
    }
}

pub(crate) struct Relay<T> {
    name: &'static str,
    queue: BoxStream<'static, T>,
    out: mpsc::Sender<T>,
}

impl<T: Send + 'static> Relay<T> {
    pub async fn run(self, mut exit: watch::Receiver<bool>) {
        let Relay {
            name,
            mut queue,
            out,
        } = self;

        loop {
            let value = select! {
                biased;
                _ = exited(&mut exit) => break,
                next = queue.next() => match next {
                    Some(value) => value,
                    None => break,
                },
            };

            select! {
                biased;
                _ = exited(&mut exit) => break,
                sent = out.send(value) => if sent.is_err() {
                    break;
                },
            }
        }

        debug!(subscription = name, "relay exiting");
    }
}

/// A stream of updates from a curtain controller.
///
/// Clones share one underlying channel: each value goes to exactly one
/// reader. Once the controller shuts down, [`recv`](Self::recv) returns
/// `None`.
pub struct Subscription<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T: Send + 'static> Subscription<T> {
    /// Waits for the next update.
    pub async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }

    /// Takes an update that is ready right now, if any.
    ///
    /// Returns `None` while another clone is parked in [`recv`](Self::recv),
    /// even when a value is ready; that reader gets it instead.
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    pub fn into_stream(self) -> BoxStream<'static, T> {
        stream::unfold(self, |sub| async move {
            let value = sub.recv().await?;
            Some((value, sub))
        })
        .boxed()
    }
}
