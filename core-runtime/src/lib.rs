//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the telematics bridge:
//! - Logging and tracing infrastructure
//! - Bridge configuration with fail-fast capability checks
//! - Internal event bus
//!
//! Nothing here knows about tags or permissions; `core-tracking` builds the
//! domain on top of these pieces.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
