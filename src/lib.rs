//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates. Host applications can depend on
//! `telematics-bridge-workspace` and enable `desktop-shims` to get the
//! simulated SDK and host bridges without wiring each crate individually.

pub use core_tracking::*;
