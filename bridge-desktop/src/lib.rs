//! # Desktop Bridge Implementations
//!
//! Stand-ins for the native tracking SDK and the host application, for
//! desktop builds, demos and integration tests.
//!
//! ## Overview
//!
//! - [`SimulatedTrackingSdk`] implements `TrackingSdk` and `ActivityLauncher`
//!   over in-memory state, answering through the same callback traits the
//!   native SDK uses
//! - [`LoggingEventSink`] writes host events to the log
//! - [`RecordingEventSink`] keeps host events for assertions
//! - [`RecordingActivityLauncher`] records wizard launches and lets the
//!   caller deliver activity results by hand
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use bridge_desktop::{RecordingEventSink, SimulatedTrackingSdk};
//! use core_runtime::config::BridgeConfig;
//!
//! let sdk = Arc::new(SimulatedTrackingSdk::new());
//! let config = BridgeConfig::builder()
//!     .tracking_sdk(sdk.clone())
//!     .activity_launcher(sdk.clone())
//!     .event_sink(Arc::new(RecordingEventSink::new()))
//!     .build()?;
//! ```

mod host;
mod sdk;

pub use host::{LoggingEventSink, RecordingActivityLauncher, RecordingEventSink};
pub use sdk::{SimulatedTrackingSdk, WIZARD_ALL_GRANTED};
