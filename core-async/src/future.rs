//! Future combinators.
//!
//! Re-exported from `futures` so callers can await several pending
//! completions together without depending on it directly.

pub use futures::future::{join, join3, join_all, select, BoxFuture, Either, FutureExt};
