//! Single-shot completion handles.
//!
//! A host call that cannot answer immediately gets a [`Pending`] back while
//! the matching [`Completion`] is parked in a [`Slot`] until the SDK calls
//! back. The pair is a one-shot channel, so a completion can be settled at
//! most once and settling consumes it.
//!
//! ```rust
//! use core_tracking::completion::Completion;
//!
//! # core_async::runtime::block_on(async {
//! let (completion, pending) = Completion::<bool>::new("request_permissions");
//! completion.resolve(true);
//! assert_eq!(pending.await, Ok(true));
//! # });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use core_async::sync::oneshot;
use core_async::time::{self, Duration};
use tracing::debug;
use uuid::Uuid;

use crate::error::TrackingError;

/// What a host caller eventually receives.
pub type CompletionResult<T> = std::result::Result<T, TrackingError>;

/// Resolving side of a host-visible completion.
#[derive(Debug)]
pub struct Completion<T> {
    id: Uuid,
    operation: &'static str,
    sender: oneshot::Sender<CompletionResult<T>>,
}

impl<T> Completion<T> {
    /// Create a linked completion/pending pair for `operation`.
    pub fn new(operation: &'static str) -> (Self, Pending<T>) {
        let id = Uuid::new_v4();
        let (sender, receiver) = oneshot::channel();

        (
            Self {
                id,
                operation,
                sender,
            },
            Pending {
                id,
                operation,
                receiver,
            },
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// `true` once the caller has dropped its [`Pending`].
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }

    pub fn resolve(self, value: T) -> bool {
        self.settle(Ok(value))
    }

    pub fn reject(self, error: TrackingError) -> bool {
        self.settle(Err(error))
    }

    /// Deliver `result` to the waiting caller.
    ///
    /// Returns `false` when nobody is waiting any more; the result is
    /// discarded in that case.
    pub fn settle(self, result: CompletionResult<T>) -> bool {
        let delivered = self.sender.send(result).is_ok();
        if !delivered {
            debug!(
                operation = self.operation,
                request_id = %self.id,
                "Caller stopped waiting before the completion settled"
            );
        }
        delivered
    }
}

/// Waiting side of a completion; resolves exactly once.
#[derive(Debug)]
pub struct Pending<T> {
    id: Uuid,
    operation: &'static str,
    receiver: oneshot::Receiver<CompletionResult<T>>,
}

impl<T> Pending<T> {
    /// A pending that is already resolved with `value`.
    pub fn resolved(operation: &'static str, value: T) -> Self {
        let (completion, pending) = Completion::new(operation);
        completion.resolve(value);
        pending
    }

    /// A pending that is already rejected with `error`.
    pub fn rejected(operation: &'static str, error: TrackingError) -> Self {
        let (completion, pending) = Completion::new(operation);
        completion.reject(error);
        pending
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Take the result if the completion has already settled.
    ///
    /// Returns `None` while the completion is still outstanding. Once this
    /// returns `Some`, the handle is spent and must not be awaited.
    pub fn try_result(&mut self) -> Option<CompletionResult<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(self.dropped())),
        }
    }

    /// Wait for the result, giving up after `timeout`.
    ///
    /// Only the caller stops waiting; the slot holding the completion stays
    /// occupied until the SDK answers or the module is invalidated.
    pub async fn wait_timeout(self, timeout: Duration) -> CompletionResult<T> {
        let operation = self.operation;
        match time::timeout(timeout, self).await {
            Ok(result) => result,
            Err(_) => Err(TrackingError::TimedOut {
                operation: operation.to_string(),
            }),
        }
    }

    fn dropped(&self) -> TrackingError {
        TrackingError::Dropped {
            operation: self.operation.to_string(),
        }
    }
}

impl<T> Future for Pending<T> {
    type Output = CompletionResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(this.dropped())),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Holds at most one outstanding completion for one operation kind.
///
/// Every access goes through a mutex so host calls and SDK callbacks on
/// other threads observe store/take atomically.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    operation: &'static str,
    handle: Mutex<Option<Completion<T>>>,
}

impl<T> Slot<T> {
    pub(crate) fn new(operation: &'static str) -> Self {
        Self {
            operation,
            handle: Mutex::new(None),
        }
    }

    pub(crate) fn operation(&self) -> &'static str {
        self.operation
    }

    // Slot contents are valid after any panic, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Option<Completion<T>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `completion`, returning the one it displaced, if any.
    pub(crate) fn replace(&self, completion: Completion<T>) -> Option<Completion<T>> {
        self.lock().replace(completion)
    }

    /// Store `completion` only if the slot is empty; otherwise hand it back.
    pub(crate) fn store_vacant(&self, completion: Completion<T>) -> Result<(), Completion<T>> {
        let mut guard = self.lock();
        match *guard {
            Some(_) => Err(completion),
            None => {
                *guard = Some(completion);
                Ok(())
            }
        }
    }

    pub(crate) fn take(&self) -> Option<Completion<T>> {
        self.lock().take()
    }

    /// Take the stored completion only if it is the one identified by `id`.
    pub(crate) fn take_if(&self, id: Uuid) -> Option<Completion<T>> {
        let mut guard = self.lock();
        if guard.as_ref().map(Completion::id) == Some(id) {
            guard.take()
        } else {
            None
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.lock().is_some()
    }
}
