//! Host-side stand-ins: event sinks and an activity launcher.

use std::sync::{Mutex, MutexGuard, PoisonError, Weak};

use bridge_traits::{
    error::{BridgeError, Result},
    host::{ActivityEventListener, ActivityLauncher, HostEventSink, WizardOptions},
};
use serde_json::Value;
use tracing::{debug, info};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes every host event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventSink;

impl LoggingEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl HostEventSink for LoggingEventSink {
    fn emit(&self, event_name: &str, payload: Value) -> Result<()> {
        info!(event = event_name, %payload, "Host event");
        Ok(())
    }
}

/// Keeps every emitted event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<(String, Value)>>,
    failure: Mutex<Option<String>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every emission with `reason` until cleared with `None`.
    pub fn fail_with(&self, reason: Option<&str>) {
        *lock(&self.failure) = reason.map(str::to_string);
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        lock(&self.events).clone()
    }

    /// Payloads of events emitted under `event_name`, oldest first.
    pub fn payloads(&self, event_name: &str) -> Vec<Value> {
        lock(&self.events)
            .iter()
            .filter(|(name, _)| name == event_name)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl HostEventSink for RecordingEventSink {
    fn emit(&self, event_name: &str, payload: Value) -> Result<()> {
        if let Some(reason) = lock(&self.failure).clone() {
            return Err(BridgeError::EventEmission(reason));
        }
        lock(&self.events).push((event_name.to_string(), payload));
        Ok(())
    }
}

/// Records wizard launches; results are delivered by hand.
#[derive(Default)]
pub struct RecordingActivityLauncher {
    launches: Mutex<Vec<(WizardOptions, i32)>>,
    listener: Mutex<Option<Weak<dyn ActivityEventListener>>>,
    unavailable: Mutex<bool>,
}

impl RecordingActivityLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }

    pub fn launches(&self) -> Vec<(WizardOptions, i32)> {
        lock(&self.launches).clone()
    }

    /// Hand an activity result to the registered listener.
    ///
    /// Returns `false` if no live listener is registered.
    pub fn deliver_result(&self, request_code: i32, result_code: i32) -> bool {
        let listener = lock(&self.listener).as_ref().and_then(Weak::upgrade);
        match listener {
            Some(listener) => {
                listener.on_activity_result(request_code, result_code);
                true
            }
            None => {
                debug!(request_code, "No activity result listener registered");
                false
            }
        }
    }
}

impl ActivityLauncher for RecordingActivityLauncher {
    fn launch_permissions_wizard(&self, options: WizardOptions, request_code: i32) -> Result<()> {
        if *lock(&self.unavailable) {
            return Err(BridgeError::NotAvailable(
                "no activity to host the permission wizard".to_string(),
            ));
        }
        lock(&self.launches).push((options, request_code));
        Ok(())
    }

    fn register_result_listener(&self, listener: Weak<dyn ActivityEventListener>) {
        *lock(&self.listener) = Some(listener);
    }
}

impl std::fmt::Debug for RecordingActivityLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingActivityLauncher")
            .field("launches", &lock(&self.launches).len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    struct Capture(AtomicI32);

    impl ActivityEventListener for Capture {
        fn on_activity_result(&self, _request_code: i32, result_code: i32) {
            self.0.store(result_code, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingEventSink::new();
        sink.emit("onLocationChanged", json!({ "speed": 1.0 })).unwrap();
        sink.emit("other", json!(null)).unwrap();
        sink.emit("onLocationChanged", json!({ "speed": 2.0 })).unwrap();

        assert_eq!(sink.events().len(), 3);
        assert_eq!(
            sink.payloads("onLocationChanged"),
            vec![json!({ "speed": 1.0 }), json!({ "speed": 2.0 })]
        );

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_recording_sink_failure() {
        let sink = RecordingEventSink::new();
        sink.fail_with(Some("bridge torn down"));

        let result = sink.emit("onLocationChanged", json!({}));
        assert_eq!(
            result,
            Err(BridgeError::EventEmission("bridge torn down".to_string()))
        );
        assert!(sink.events().is_empty());

        sink.fail_with(None);
        assert!(sink.emit("onLocationChanged", json!({})).is_ok());
    }

    #[test]
    fn test_logging_sink_accepts_everything() {
        assert!(LoggingEventSink::new()
            .emit("onLocationChanged", json!({ "latitude": 1.0 }))
            .is_ok());
    }

    #[test]
    fn test_launcher_records_and_delivers() {
        let launcher = RecordingActivityLauncher::new();
        let capture = Arc::new(Capture(AtomicI32::new(42)));
        assert!(!launcher.deliver_result(50005, -1));

        let weak = Arc::downgrade(&capture);
        launcher.register_result_listener(weak);
        launcher
            .launch_permissions_wizard(WizardOptions::default(), 50005)
            .unwrap();

        assert_eq!(launcher.launches(), vec![(WizardOptions::default(), 50005)]);
        assert!(launcher.deliver_result(50005, 1));
        assert_eq!(capture.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_launcher_drops_dead_listener() {
        let launcher = RecordingActivityLauncher::new();
        let capture = Arc::new(Capture(AtomicI32::new(0)));
        let weak = Arc::downgrade(&capture);
        launcher.register_result_listener(weak);
        drop(capture);

        assert!(!launcher.deliver_result(50005, -1));
    }

    #[test]
    fn test_launcher_unavailable() {
        let launcher = RecordingActivityLauncher::new();
        launcher.set_unavailable(true);

        assert!(launcher
            .launch_permissions_wizard(WizardOptions::default(), 50005)
            .is_err());
        assert!(launcher.launches().is_empty());
    }
}
