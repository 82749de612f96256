//! Tracking SDK Contract
//!
//! Describes the external telematics SDK as the core sees it: a process-wide,
//! stateful handle whose calls are either instantaneous reads of cached state
//! or fire-and-forget requests. Results of the fire-and-forget requests come
//! back later through the callback traits defined here, usually on a thread
//! owned by the SDK.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Location accuracy requested from the SDK's location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationAccuracy {
    High,
    Medium,
    Low,
}

/// Settings handed to the SDK on first initialization.
///
/// The defaults are the only implicit configuration the bridge owns:
/// tracking stops after 5 minutes without movement, accuracy is high,
/// tracking auto-starts, high-frequency sensor (accelerometer, gyroscope)
/// recording is on, and both external device (ELM327) recording and
/// accident detection are off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSettings {
    /// Idle time after which an active track is stopped
    pub stop_tracking_timeout: Duration,
    /// Requested location accuracy
    pub accuracy: LocationAccuracy,
    /// Start tracking automatically when movement is detected
    pub auto_start: bool,
    /// Record high-frequency sensor data
    pub high_frequency_sensors: bool,
    /// Record data from external OBD devices
    pub external_device_data: bool,
    /// Run accident detection
    pub accident_detection: bool,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            stop_tracking_timeout: Duration::from_secs(5 * 60),
            accuracy: LocationAccuracy::High,
            auto_start: true,
            high_frequency_sensors: true,
            external_device_data: false,
            accident_detection: false,
        }
    }
}

impl TrackingSettings {
    pub fn with_stop_tracking_timeout(mut self, timeout: Duration) -> Self {
        self.stop_tracking_timeout = timeout;
        self
    }

    pub fn with_accuracy(mut self, accuracy: LocationAccuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_auto_start(mut self, enabled: bool) -> Self {
        self.auto_start = enabled;
        self
    }

    pub fn with_high_frequency_sensors(mut self, enabled: bool) -> Self {
        self.high_frequency_sensors = enabled;
        self
    }

    pub fn with_external_device_data(mut self, enabled: bool) -> Self {
        self.external_device_data = enabled;
        self
    }

    pub fn with_accident_detection(mut self, enabled: bool) -> Self {
        self.accident_detection = enabled;
        self
    }
}

/// A label attached to future tracked trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub tag: String,
    pub source: String,
}

impl Tag {
    pub fn new(tag: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            source: source.into(),
        }
    }
}

/// Failure reported by the SDK for an asynchronous tag operation.
///
/// The bridge never interprets these; code and message are forwarded to the
/// waiting caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkFailure {
    pub code: String,
    pub message: String,
}

impl SdkFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SdkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for SdkFailure {}

/// A native location fix as delivered by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Speed in meters per second
    pub speed: f32,
    /// Fix time, Unix epoch milliseconds
    pub time_millis: i64,
}

/// Receives location updates from the SDK.
///
/// `None` means the SDK fired an update without a location context.
pub trait LocationListener: Send + Sync {
    fn on_location_changed(&self, location: Option<Location>);
}

/// Receives the results of the SDK's asynchronous tag operations.
///
/// Each method corresponds to exactly one request kind on [`TrackingSdk`].
/// The SDK may invoke these from any thread, and may invoke them without a
/// matching request (duplicate or spurious deliveries).
pub trait TagsProcessingCallback: Send + Sync {
    /// Result of [`TrackingSdk::get_future_track_tags`]
    fn on_tags_fetched(&self, result: std::result::Result<Vec<Tag>, SdkFailure>);

    /// Result of [`TrackingSdk::add_future_track_tag`]
    fn on_tag_added(&self, result: std::result::Result<Tag, SdkFailure>);

    /// Result of [`TrackingSdk::remove_future_track_tag`]
    fn on_tag_removed(&self, result: std::result::Result<Tag, SdkFailure>);

    /// Result of [`TrackingSdk::remove_all_future_track_tags`]
    fn on_all_tags_removed(&self, result: std::result::Result<(), SdkFailure>);
}

/// The external tracking SDK.
///
/// Implementations wrap the platform SDK singleton (obtained lazily, never
/// created or destroyed by the core). The init-once flag lives inside the
/// SDK; the core only reads it through [`is_initialized`](Self::is_initialized).
///
/// # Platform Support
///
/// - **Android**: JNI wrapper over the SDK's `TrackingApi` instance
/// - **iOS**: wrapper over the SDK's shared manager
/// - **Desktop**: `bridge_desktop::SimulatedTrackingSdk` for demos and tests
pub trait TrackingSdk: Send + Sync {
    /// Initialize the SDK with the given settings.
    fn initialize(&self, settings: &TrackingSettings) -> Result<()>;

    fn is_initialized(&self) -> bool;

    fn are_all_required_permissions_granted(&self) -> bool;

    fn is_sdk_enabled(&self) -> bool;

    /// Current device identifier; empty when none has been set.
    fn device_id(&self) -> String;

    fn set_device_id(&self, device_id: &str);

    fn set_enable_sdk(&self, enabled: bool);

    /// Stop tracking after uploading any pending data.
    fn set_disable_with_upload(&self);

    fn start_persistent_tracking(&self) -> bool;

    /// Request the stored tags; the answer arrives via
    /// [`TagsProcessingCallback::on_tags_fetched`].
    fn get_future_track_tags(&self);

    fn add_future_track_tag(&self, tag: &str, source: &str);

    fn remove_future_track_tag(&self, tag: &str);

    fn remove_all_future_track_tags(&self);

    /// Replace the SDK's location listener.
    fn set_location_listener(&self, listener: Arc<dyn LocationListener>) -> Result<()>;

    /// Register a sink for tag operation results.
    fn add_tags_processing_callback(&self, callback: Arc<dyn TagsProcessingCallback>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = TrackingSettings::default();

        assert_eq!(settings.stop_tracking_timeout, Duration::from_secs(300));
        assert_eq!(settings.accuracy, LocationAccuracy::High);
        assert!(settings.auto_start);
        assert!(settings.high_frequency_sensors);
        assert!(!settings.external_device_data);
        assert!(!settings.accident_detection);
    }

    #[test]
    fn test_settings_builder() {
        let settings = TrackingSettings::default()
            .with_accuracy(LocationAccuracy::Low)
            .with_accident_detection(true)
            .with_stop_tracking_timeout(Duration::from_secs(60));

        assert_eq!(settings.accuracy, LocationAccuracy::Low);
        assert!(settings.accident_detection);
        assert_eq!(settings.stop_tracking_timeout, Duration::from_secs(60));
        assert!(settings.auto_start);
    }

    #[test]
    fn test_sdk_failure_display() {
        let failure = SdkFailure::new("STORAGE", "disk full");
        assert_eq!(failure.to_string(), "STORAGE: disk full");
    }

    #[test]
    fn test_tag_serializes_with_field_names() {
        let tag = Tag::new("business", "app");
        let value = serde_json::to_value(&tag).unwrap();

        assert_eq!(value["tag"], "business");
        assert_eq!(value["source"], "app");
    }
}
