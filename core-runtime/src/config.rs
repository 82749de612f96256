//! # Bridge Configuration
//!
//! Collects the host/SDK bridges and the implicit settings the telematics
//! bridge runs with.
//!
//! ## Overview
//!
//! `BridgeConfig` is built with a builder that validates everything up front
//! and fails fast with an actionable error when a required bridge is missing.
//!
//! ## Required Dependencies
//!
//! - `TrackingSdk` - the external tracking SDK handle
//! - `HostEventSink` - where `onLocationChanged` events go
//! - `ActivityLauncher` - launches the permission wizard
//!
//! When the `desktop-shims` feature is enabled, a shared
//! `bridge_desktop::SimulatedTrackingSdk` (which doubles as the activity
//! launcher) and a `bridge_desktop::LoggingEventSink` are injected for any
//! bridge that was not provided.
//!
//! ## Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | `settings` | [`TrackingSettings::default()`] |
//! | `permissions_request_code` | `50005` |
//! | `location_event_name` | `"onLocationChanged"` |
//! | `wizard_options` | both flags off |
//! | `event_buffer_size` | [`DEFAULT_EVENT_BUFFER_SIZE`] |
//! | `completion_timeout` | none |
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::BridgeConfig;
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .tracking_sdk(Arc::new(AndroidTrackingSdk::new(env)))
//!     .event_sink(Arc::new(ReactEventEmitter::new(context)))
//!     .activity_launcher(Arc::new(ReactActivityLauncher::new(context)))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{ActivityLauncher, HostEventSink, TrackingSdk, TrackingSettings, WizardOptions};
use std::sync::Arc;
use std::time::Duration;

/// Request code identifying the permission wizard's activity result.
pub const DEFAULT_PERMISSIONS_REQUEST_CODE: i32 = 50005;

/// Host event carrying location samples.
pub const DEFAULT_LOCATION_EVENT_NAME: &str = "onLocationChanged";

/// Configuration for the telematics bridge.
///
/// Use [`BridgeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct BridgeConfig {
    /// External tracking SDK (required)
    pub tracking_sdk: Arc<dyn TrackingSdk>,

    /// Host event emitter (required)
    pub event_sink: Arc<dyn HostEventSink>,

    /// Permission wizard launcher (required)
    pub activity_launcher: Arc<dyn ActivityLauncher>,

    /// Settings handed to the SDK on first initialization
    pub settings: TrackingSettings,

    /// Permission wizard presentation flags
    pub wizard_options: WizardOptions,

    /// Request code the permission wizard result is matched against
    pub permissions_request_code: i32,

    /// Name of the host event carrying location samples
    pub location_event_name: String,

    /// Capacity of the internal event bus
    pub event_buffer_size: usize,

    /// Host-side wait deadline for pending completions. Slots themselves are
    /// never expired.
    pub completion_timeout: Option<Duration>,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("tracking_sdk", &"TrackingSdk { ... }")
            .field("event_sink", &"HostEventSink { ... }")
            .field("activity_launcher", &"ActivityLauncher { ... }")
            .field("settings", &self.settings)
            .field("wizard_options", &self.wizard_options)
            .field("permissions_request_code", &self.permissions_request_code)
            .field("location_event_name", &self.location_event_name)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("completion_timeout", &self.completion_timeout)
            .finish()
    }
}

impl BridgeConfig {
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - The location event name is not empty
    /// - The event bus capacity is non-zero
    /// - The completion timeout, when set, is non-zero
    /// - The SDK stop-tracking timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.location_event_name.trim().is_empty() {
            return Err(Error::Config(
                "Location event name cannot be empty".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.completion_timeout == Some(Duration::ZERO) {
            return Err(Error::Config(
                "Completion timeout must be greater than 0. \
                 Leave it unset to wait indefinitely."
                    .to_string(),
            ));
        }

        if self.settings.stop_tracking_timeout.is_zero() {
            return Err(Error::Config(
                "Stop tracking timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, purpose: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required {}. \
             Desktop: enable the 'desktop-shims' feature to use the simulated bridges. \
             Mobile: inject the platform adapter.",
            capability, purpose
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_bridges(
    tracking_sdk: Option<Arc<dyn TrackingSdk>>,
    event_sink: Option<Arc<dyn HostEventSink>>,
    activity_launcher: Option<Arc<dyn ActivityLauncher>>,
) -> Result<(
    Arc<dyn TrackingSdk>,
    Arc<dyn HostEventSink>,
    Arc<dyn ActivityLauncher>,
)> {
    use bridge_desktop::{LoggingEventSink, SimulatedTrackingSdk};

    let simulated = Arc::new(SimulatedTrackingSdk::new());
    let tracking_sdk =
        tracking_sdk.unwrap_or_else(|| simulated.clone() as Arc<dyn TrackingSdk>);
    let activity_launcher =
        activity_launcher.unwrap_or_else(|| simulated.clone() as Arc<dyn ActivityLauncher>);
    let event_sink =
        event_sink.unwrap_or_else(|| Arc::new(LoggingEventSink::new()) as Arc<dyn HostEventSink>);

    Ok((tracking_sdk, event_sink, activity_launcher))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_bridges(
    tracking_sdk: Option<Arc<dyn TrackingSdk>>,
    event_sink: Option<Arc<dyn HostEventSink>>,
    activity_launcher: Option<Arc<dyn ActivityLauncher>>,
) -> Result<(
    Arc<dyn TrackingSdk>,
    Arc<dyn HostEventSink>,
    Arc<dyn ActivityLauncher>,
)> {
    let tracking_sdk = tracking_sdk
        .ok_or_else(|| capability_missing("TrackingSdk", "to drive the tracking SDK"))?;
    let event_sink = event_sink
        .ok_or_else(|| capability_missing("HostEventSink", "to deliver location events"))?;
    let activity_launcher = activity_launcher.ok_or_else(|| {
        capability_missing("ActivityLauncher", "to launch the permission wizard")
    })?;

    Ok((tracking_sdk, event_sink, activity_launcher))
}

/// Builder for [`BridgeConfig`].
#[derive(Default)]
pub struct BridgeConfigBuilder {
    tracking_sdk: Option<Arc<dyn TrackingSdk>>,
    event_sink: Option<Arc<dyn HostEventSink>>,
    activity_launcher: Option<Arc<dyn ActivityLauncher>>,
    settings: Option<TrackingSettings>,
    wizard_options: WizardOptions,
    permissions_request_code: Option<i32>,
    location_event_name: Option<String>,
    event_buffer_size: Option<usize>,
    completion_timeout: Option<Duration>,
}

impl BridgeConfigBuilder {
    /// Sets the tracking SDK handle (required).
    pub fn tracking_sdk(mut self, sdk: Arc<dyn TrackingSdk>) -> Self {
        self.tracking_sdk = Some(sdk);
        self
    }

    /// Sets the host event sink (required).
    pub fn event_sink(mut self, sink: Arc<dyn HostEventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Sets the activity launcher used for the permission wizard (required).
    pub fn activity_launcher(mut self, launcher: Arc<dyn ActivityLauncher>) -> Self {
        self.activity_launcher = Some(launcher);
        self
    }

    /// Overrides the SDK settings used on first initialization.
    pub fn settings(mut self, settings: TrackingSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn wizard_options(mut self, options: WizardOptions) -> Self {
        self.wizard_options = options;
        self
    }

    /// Overrides the permission wizard request code.
    ///
    /// Default: 50005
    pub fn permissions_request_code(mut self, code: i32) -> Self {
        self.permissions_request_code = Some(code);
        self
    }

    /// Overrides the host event name for location samples.
    ///
    /// Default: "onLocationChanged"
    pub fn location_event_name(mut self, name: impl Into<String>) -> Self {
        self.location_event_name = Some(name.into());
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets a wait deadline for callers awaiting pending completions.
    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = Some(timeout);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is missing and
    ///   no desktop default is available
    /// - [`Error::Config`] when a value fails validation
    pub fn build(self) -> Result<BridgeConfig> {
        let (tracking_sdk, event_sink, activity_launcher) = provide_default_bridges(
            self.tracking_sdk,
            self.event_sink,
            self.activity_launcher,
        )?;

        let config = BridgeConfig {
            tracking_sdk,
            event_sink,
            activity_launcher,
            settings: self.settings.unwrap_or_default(),
            wizard_options: self.wizard_options,
            permissions_request_code: self
                .permissions_request_code
                .unwrap_or(DEFAULT_PERMISSIONS_REQUEST_CODE),
            location_event_name: self
                .location_event_name
                .unwrap_or_else(|| DEFAULT_LOCATION_EVENT_NAME.to_string()),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            completion_timeout: self.completion_timeout,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{LocationListener, TagsProcessingCallback};
    use mockall::mock;
    use serde_json::Value;

    mock! {
        pub Sdk {}

        impl TrackingSdk for Sdk {
            fn initialize(&self, settings: &TrackingSettings) -> BridgeResult<()>;
            fn is_initialized(&self) -> bool;
            fn are_all_required_permissions_granted(&self) -> bool;
            fn is_sdk_enabled(&self) -> bool;
            fn device_id(&self) -> String;
            fn set_device_id(&self, device_id: &str);
            fn set_enable_sdk(&self, enabled: bool);
            fn set_disable_with_upload(&self);
            fn start_persistent_tracking(&self) -> bool;
            fn get_future_track_tags(&self);
            fn add_future_track_tag(&self, tag: &str, source: &str);
            fn remove_future_track_tag(&self, tag: &str);
            fn remove_all_future_track_tags(&self);
            fn set_location_listener(&self, listener: Arc<dyn LocationListener>) -> BridgeResult<()>;
            fn add_tags_processing_callback(&self, callback: Arc<dyn TagsProcessingCallback>);
        }
    }

    struct NullSink;

    impl HostEventSink for NullSink {
        fn emit(&self, _event_name: &str, _payload: Value) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct NullLauncher;

    impl ActivityLauncher for NullLauncher {
        fn launch_permissions_wizard(
            &self,
            _options: WizardOptions,
            _request_code: i32,
        ) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn complete_builder() -> BridgeConfigBuilder {
        BridgeConfig::builder()
            .tracking_sdk(Arc::new(MockSdk::new()))
            .event_sink(Arc::new(NullSink))
            .activity_launcher(Arc::new(NullLauncher))
    }

    #[test]
    fn test_defaults() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.permissions_request_code, 50005);
        assert_eq!(config.location_event_name, "onLocationChanged");
        assert_eq!(config.settings, TrackingSettings::default());
        assert_eq!(config.wizard_options, WizardOptions::default());
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert!(config.completion_timeout.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = complete_builder()
            .permissions_request_code(7)
            .location_event_name("onFix")
            .event_buffer_size(8)
            .completion_timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(config.permissions_request_code, 7);
        assert_eq!(config.location_event_name, "onFix");
        assert_eq!(config.event_buffer_size, 8);
        assert_eq!(config.completion_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_empty_event_name_rejected() {
        let result = complete_builder().location_event_name("  ").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let result = complete_builder().event_buffer_size(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = complete_builder().completion_timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_stop_tracking_timeout_rejected() {
        let settings = TrackingSettings::default().with_stop_tracking_timeout(Duration::ZERO);
        let result = complete_builder().settings(settings).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_sdk_is_capability_error() {
        let result = BridgeConfig::builder()
            .event_sink(Arc::new(NullSink))
            .activity_launcher(Arc::new(NullLauncher))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "TrackingSdk")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_launcher_is_capability_error() {
        let result = BridgeConfig::builder()
            .tracking_sdk(Arc::new(MockSdk::new()))
            .event_sink(Arc::new(NullSink))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "ActivityLauncher"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_injected() {
        let config = BridgeConfig::builder().build().unwrap();
        assert!(!config.tracking_sdk.is_initialized());
    }
}
