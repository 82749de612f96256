//! # Host Bridge Traits
//!
//! Contracts between the telematics bridge core and the two worlds it sits
//! between: the host application's scripting layer and the external native
//! tracking SDK.
//!
//! ## Overview
//!
//! The core never talks to a platform API directly. Each trait in this crate
//! represents a capability the core requires but that every platform
//! implements differently (Android, iOS, desktop stand-ins).
//!
//! ## Traits
//!
//! ### Tracking SDK
//! - [`TrackingSdk`](tracking::TrackingSdk) - Lifecycle, permissions, device ID, tags
//! - [`TagsProcessingCallback`](tracking::TagsProcessingCallback) - Async tag operation results
//! - [`LocationListener`](tracking::LocationListener) - Continuous location updates
//!
//! ### Host Integration
//! - [`HostEventSink`](host::HostEventSink) - Named events to the scripting layer
//! - [`ActivityLauncher`](host::ActivityLauncher) - Launch the permission wizard
//! - [`ActivityEventListener`](host::ActivityEventListener) - Activity results back into the core
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation | Status |
//! |----------|----------------|--------|
//! | Desktop  | `bridge-desktop` (simulated SDK) | ✅ Available |
//! | Android  | JNI adapter over `TrackingApi` | 📋 Planned |
//! | iOS      | Swift adapter over the SDK manager | 📋 Planned |
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`. The SDK invokes callbacks from its
//! own threads, concurrently with host calls into the core.
//!
//! ## Error Handling
//!
//! Bridge implementations convert their platform failures into
//! [`BridgeError`](error::BridgeError). Failures of asynchronous tag
//! operations are not bridge errors: they travel as
//! [`SdkFailure`](tracking::SdkFailure) payloads through the callback traits.

pub mod error;
pub mod host;
pub mod time;
pub mod tracking;

pub use error::BridgeError;

pub use host::{ActivityEventListener, ActivityLauncher, HostEventSink, WizardOptions};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
pub use tracking::{
    Location, LocationAccuracy, LocationListener, SdkFailure, Tag, TagsProcessingCallback,
    TrackingSdk, TrackingSettings,
};
