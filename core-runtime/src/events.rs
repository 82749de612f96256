//! # Event Bus System
//!
//! In-process event broadcasting for the telematics bridge, built on
//! `broadcast` channels from `core_async::sync`.
//!
//! ## Overview
//!
//! The host event sink is the outward channel to the scripting layer and only
//! carries `onLocationChanged`. The event bus is the inward-facing one: every
//! state transition the façade drives (SDK lifecycle, permission outcomes,
//! tag completions, location samples) is published here as a typed
//! [`CoreEvent`] so in-process Rust consumers can observe the bridge.
//!
//! ```text
//! ┌──────────────────┐   emit    ┌───────────┐  subscribe  ┌────────────┐
//! │ TelematicsModule ├──────────>│ EventBus  ├────────────>│ Subscriber │
//! └──────────────────┘           │ (broadcast│             └────────────┘
//! ┌──────────────────┐   emit    │  channel) │  subscribe  ┌────────────┐
//! │ LocationForwarder├──────────>│           ├────────────>│ Subscriber │
//! └──────────────────┘           └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SdkEvent};
//!
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Sdk(SdkEvent::Initialized)).ok();
//! assert_eq!(rx.try_recv().unwrap(), CoreEvent::Sdk(SdkEvent::Initialized));
//! ```
//!
//! ## Error Handling
//!
//! Publishing with no subscribers returns `SendError`; publishers ignore it.
//! Slow subscribers receive `RecvError::Lagged(n)` and may keep reading;
//! `RecvError::Closed` means the bus was dropped.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Location updates arrive roughly once per second while tracking, so this
/// holds well over a minute of backlog for a stalled subscriber.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// SDK lifecycle events
    Sdk(SdkEvent),
    /// Permission flow events
    Permissions(PermissionEvent),
    /// Tag completion events
    Tags(TagsEvent),
    /// Location samples
    Location(LocationEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Sdk(e) => e.description(),
            CoreEvent::Permissions(e) => e.description(),
            CoreEvent::Tags(e) => e.description(),
            CoreEvent::Location(_) => "Location changed",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Sdk(SdkEvent::EnableRefused { .. }) => EventSeverity::Warning,
            CoreEvent::Tags(TagsEvent::Refused { .. }) => EventSeverity::Warning,
            CoreEvent::Tags(TagsEvent::Resolved { success: false, .. }) => EventSeverity::Error,
            CoreEvent::Sdk(SdkEvent::Initialized | SdkEvent::Enabled) => EventSeverity::Info,
            CoreEvent::Permissions(PermissionEvent::Resolved { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// SDK Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SdkEvent {
    /// The SDK was initialized by this call.
    Initialized,
    /// `initialize` found the SDK already initialized.
    AlreadyInitialized,
    /// A device token was set and the SDK enabled.
    Enabled,
    /// `enable` resolved `false` without touching SDK state.
    EnableRefused {
        /// Why the SDK could not be enabled
        reason: String,
    },
    /// Disable-with-upload was requested.
    DisableRequested,
    /// Persistent tracking was requested.
    PersistentTrackingStarted {
        /// What the SDK reported
        started: bool,
    },
}

impl SdkEvent {
    fn description(&self) -> &str {
        match self {
            SdkEvent::Initialized => "Tracking SDK initialized",
            SdkEvent::AlreadyInitialized => "Tracking SDK already initialized",
            SdkEvent::Enabled => "Tracking SDK enabled",
            SdkEvent::EnableRefused { .. } => "Tracking SDK could not be enabled",
            SdkEvent::DisableRequested => "Tracking SDK disable requested",
            SdkEvent::PersistentTrackingStarted { .. } => "Persistent tracking requested",
        }
    }
}

// ============================================================================
// Permission Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PermissionEvent {
    /// The permission wizard was launched.
    WizardLaunched { request_code: i32 },
    /// A pending permission request was resolved.
    Resolved { granted: bool },
}

impl PermissionEvent {
    fn description(&self) -> &str {
        match self {
            PermissionEvent::WizardLaunched { .. } => "Permission wizard launched",
            PermissionEvent::Resolved { .. } => "Permission request resolved",
        }
    }
}

// ============================================================================
// Tags Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TagsEvent {
    /// A tag operation's pending completion was resolved.
    Resolved {
        /// Operation kind, e.g. "add_tag"
        operation: String,
        /// Whether the SDK reported success
        success: bool,
    },
    /// A request was refused because one of the same kind is still in flight.
    Refused { operation: String },
}

impl TagsEvent {
    fn description(&self) -> &str {
        match self {
            TagsEvent::Resolved { .. } => "Tag operation resolved",
            TagsEvent::Refused { .. } => "Tag operation refused while busy",
        }
    }
}

// ============================================================================
// Location Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum LocationEvent {
    /// A location sample was forwarded to the host.
    Changed {
        latitude: f64,
        longitude: f64,
        altitude: f64,
        speed: f64,
        timestamp: f64,
    },
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to bridge events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. `BridgeConfig` validates this before
    /// the bus is built.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let locations = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Location(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events, `RecvError::Closed` once the bus is dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching events are currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
