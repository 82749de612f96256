//! Time-related abstractions.
//!
//! `timeout` backs the opt-in wait deadline on pending completions; `sleep`
//! paces the simulated SDK's callback delivery.

pub use tokio::time::{error::Elapsed, interval, sleep, timeout, Interval, Sleep, Timeout};

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
