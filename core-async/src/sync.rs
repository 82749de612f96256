//! Synchronization primitives.
//!
//! Re-exports `tokio::sync` so that the completion plumbing (`oneshot`), the
//! internal event bus (`broadcast`) and the simulated SDK dispatch queue
//! (`mpsc`) all come from the same place.
//!
//! All primitives are `Send + Sync` and can be shared across threads, which
//! matters here: the external SDK delivers callbacks from its own threads.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::Mutex;
//!
//! # core_async::runtime::block_on(async {
//! let mutex = Mutex::new(42);
//! let mut guard = mutex.lock().await;
//! *guard += 1;
//! assert_eq!(*guard, 43);
//! # });
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard,
};
