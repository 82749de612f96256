//! Runtime abstraction layer for the telematics bridge.
//!
//! Every other crate in the workspace reaches the async runtime through this
//! crate instead of depending on Tokio directly. Mobile hosts embed the core
//! as a native library, so the runtime underneath is always Tokio; keeping
//! the indirection means the executor can be swapped in one place.
//!
//! # Modules
//!
//! - `task`: Task spawning and execution
//! - `time`: Sleep, timeouts and instants
//! - `sync`: Channels and locks (`oneshot`, `mpsc`, `broadcast`, `Mutex`)
//! - `runtime`: `block_on` for synchronous entry points
//! - `future`: Combinators for awaiting several futures together
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::oneshot;
//! use core_async::task;
//!
//! # core_async::runtime::block_on(async {
//! let (tx, rx) = oneshot::channel();
//! task::spawn(async move {
//!     let _ = tx.send(42);
//! });
//! assert_eq!(rx.await.unwrap(), 42);
//! # });
//! ```

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use core_async_macros::{main, test};

pub mod future;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
