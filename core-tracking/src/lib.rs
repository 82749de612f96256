//! # Telematics Tracking Core
//!
//! Bridges the host application's scripting layer to the native telematics
//! SDK.
//!
//! ## Overview
//!
//! The SDK reports results through callback objects registered once, with
//! no way to tell which host request a result belongs to. This crate keeps
//! one pending [`Completion`] per operation kind and settles it when the
//! matching callback arrives:
//!
//! - [`TagsProcessor`] - the four future-track-tag operations
//! - [`PermissionsRouter`] - the permission wizard's activity result
//! - [`LocationForwarder`] - location updates re-emitted as host events
//! - [`TelematicsModule`] - the facade the host calls into
//!
//! ## Pending Semantics
//!
//! Each tag kind holds at most one outstanding completion. A request of a
//! kind that is still in flight is refused with [`TrackingError::Busy`]; a
//! newer permission request rejects the older one with
//! [`TrackingError::Superseded`]. Callbacks with nothing pending are
//! dropped. Slots never expire on their own, but hosts can bound their wait
//! with [`TelematicsModule::await_pending`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_runtime::config::BridgeConfig;
//! use core_tracking::TelematicsModule;
//!
//! let config = BridgeConfig::builder()
//!     .tracking_sdk(sdk)
//!     .event_sink(sink)
//!     .activity_launcher(launcher)
//!     .build()?;
//!
//! let module = TelematicsModule::new(config)?;
//! module.initialize();
//! let tags = module.get_future_track_tags().await?;
//! ```

pub mod completion;
pub mod error;
pub mod location;
pub mod module;
pub mod permissions;
pub mod tags;

pub use completion::{Completion, CompletionResult, Pending};
pub use error::{Result, TrackingError};
pub use location::{LocationForwarder, LocationSample};
pub use module::TelematicsModule;
pub use permissions::{ActivityResult, PermissionsRouter, WizardResult};
pub use tags::{TagOperation, TagsOutcome, TagsProcessor};
