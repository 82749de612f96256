//! Host Integration
//!
//! Capabilities the host application (the scripting layer that loads the
//! bridge) provides: an event emitter, an activity launcher for the
//! permission wizard, and the activity-result channel back into the core.

use std::sync::Weak;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Sink for named events delivered to the host's scripting layer.
///
/// - **React Native (Android)**: `RCTDeviceEventEmitter.emit`
/// - **React Native (iOS)**: `RCTEventEmitter.sendEvent`
/// - **Desktop**: recording or logging sinks from `bridge-desktop`
///
/// # Example
///
/// ```ignore
/// use bridge_traits::host::HostEventSink;
/// use serde_json::json;
///
/// fn notify(sink: &dyn HostEventSink) -> bridge_traits::error::Result<()> {
///     sink.emit("onLocationChanged", json!({ "latitude": 52.5 }))
/// }
/// ```
pub trait HostEventSink: Send + Sync {
    fn emit(&self, event_name: &str, payload: Value) -> Result<()>;
}

/// Options for the SDK's permission wizard screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardOptions {
    /// Keep re-prompting for permissions the user declined
    pub aggressive_wizard: bool,
    /// Show the dedicated settings page when permissions are declined
    pub aggressive_wizard_page: bool,
}

/// Launches external activities whose outcome comes back through
/// [`ActivityEventListener::on_activity_result`].
pub trait ActivityLauncher: Send + Sync {
    /// Start the permission wizard, tagging its result with `request_code`.
    fn launch_permissions_wizard(&self, options: WizardOptions, request_code: i32) -> Result<()>;

    /// Register the listener that receives activity results.
    ///
    /// Hosts that route results themselves keep the default no-op. The
    /// listener is held weakly so the host never keeps the core alive.
    fn register_result_listener(&self, _listener: Weak<dyn ActivityEventListener>) {}
}

/// Receives the outcomes of activities launched through [`ActivityLauncher`].
///
/// The host registers the listener once; every activity result the host
/// observes is forwarded here, including results for activities the core did
/// not launch.
pub trait ActivityEventListener: Send + Sync {
    fn on_activity_result(&self, request_code: i32, result_code: i32);

    /// A new intent was delivered to the host activity.
    fn on_new_intent(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::*;
    use serde_json::json;

    mock! {
        pub Sink {}

        impl HostEventSink for Sink {
            fn emit(&self, event_name: &str, payload: Value) -> Result<()>;
        }
    }

    #[test]
    fn test_wizard_options_default_off() {
        let options = WizardOptions::default();
        assert!(!options.aggressive_wizard);
        assert!(!options.aggressive_wizard_page);
    }

    #[test]
    fn test_event_sink_object_safe() {
        let mut sink = MockSink::new();
        sink.expect_emit()
            .with(eq("onLocationChanged"), eq(json!({ "speed": 1.0 })))
            .times(1)
            .returning(|_, _| Ok(()));

        let sink: Box<dyn HostEventSink> = Box::new(sink);
        sink.emit("onLocationChanged", json!({ "speed": 1.0 }))
            .unwrap();
    }
}
