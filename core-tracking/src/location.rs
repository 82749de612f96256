//! Location forwarding from the SDK to the host event channel.

use std::sync::Arc;

use bridge_traits::{HostEventSink, Location, LocationListener};
use core_runtime::events::{CoreEvent, EventBus, LocationEvent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{trace, warn};

/// Flat numeric view of a location fix as the host sees it.
///
/// A missing fix becomes all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub speed: f64,
    /// Unix epoch milliseconds
    pub timestamp: f64,
}

impl LocationSample {
    pub fn to_payload(&self) -> Value {
        json!({
            "latitude": self.latitude,
            "longitude": self.longitude,
            "altitude": self.altitude,
            "speed": self.speed,
            "timestamp": self.timestamp,
        })
    }
}

impl From<Option<Location>> for LocationSample {
    fn from(location: Option<Location>) -> Self {
        location.map_or_else(Self::default, |location| Self {
            latitude: location.latitude,
            longitude: location.longitude,
            altitude: location.altitude,
            speed: f64::from(location.speed),
            timestamp: location.time_millis as f64,
        })
    }
}

impl From<LocationSample> for LocationEvent {
    fn from(sample: LocationSample) -> Self {
        LocationEvent::Changed {
            latitude: sample.latitude,
            longitude: sample.longitude,
            altitude: sample.altitude,
            speed: sample.speed,
            timestamp: sample.timestamp,
        }
    }
}

/// SDK location listener that re-emits every update to the host.
///
/// Emission failures are logged; the SDK never sees them.
pub struct LocationForwarder {
    sink: Arc<dyn HostEventSink>,
    event_name: String,
    events: EventBus,
}

impl LocationForwarder {
    pub fn new(
        sink: Arc<dyn HostEventSink>,
        event_name: impl Into<String>,
        events: EventBus,
    ) -> Self {
        Self {
            sink,
            event_name: event_name.into(),
            events,
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Forward one update; returns the sample that was emitted.
    pub fn forward(&self, location: Option<Location>) -> LocationSample {
        let sample = LocationSample::from(location);
        trace!(has_fix = location.is_some(), "Forwarding location update");

        if let Err(e) = self.sink.emit(&self.event_name, sample.to_payload()) {
            warn!(event = %self.event_name, "Failed to emit location update: {}", e);
        }
        let _ = self.events.emit(CoreEvent::Location(sample.into()));

        sample
    }
}

impl LocationListener for LocationForwarder {
    fn on_location_changed(&self, location: Option<Location>) {
        self.forward(location);
    }
}

impl std::fmt::Debug for LocationForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationForwarder")
            .field("event_name", &self.event_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use core_runtime::events::EventStream;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        pub Sink {}

        impl HostEventSink for Sink {
            fn emit(&self, event_name: &str, payload: Value) -> BridgeResult<()>;
        }
    }

    fn fix() -> Location {
        Location {
            latitude: 52.52,
            longitude: 13.405,
            altitude: 34.0,
            speed: 12.5,
            time_millis: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_sample_from_fix() {
        let sample = LocationSample::from(Some(fix()));

        assert_eq!(sample.latitude, 52.52);
        assert_eq!(sample.longitude, 13.405);
        assert_eq!(sample.altitude, 34.0);
        assert_eq!(sample.speed, 12.5);
        assert_eq!(sample.timestamp, 1_700_000_000_000.0);
    }

    #[test]
    fn test_missing_fix_is_all_zeros() {
        let sample = LocationSample::from(None);
        assert_eq!(sample, LocationSample::default());
        assert_eq!(
            sample.to_payload(),
            json!({
                "latitude": 0.0,
                "longitude": 0.0,
                "altitude": 0.0,
                "speed": 0.0,
                "timestamp": 0.0,
            })
        );
    }

    #[test]
    fn test_forward_emits_named_event() {
        let expected = LocationSample::from(Some(fix())).to_payload();
        let mut sink = MockSink::new();
        sink.expect_emit()
            .with(eq("onLocationChanged"), eq(expected))
            .times(1)
            .returning(|_, _| Ok(()));

        let forwarder =
            LocationForwarder::new(Arc::new(sink), "onLocationChanged", EventBus::default());
        forwarder.on_location_changed(Some(fix()));
    }

    #[test]
    fn test_emission_failure_is_swallowed() {
        let mut sink = MockSink::new();
        sink.expect_emit()
            .times(2)
            .returning(|_, _| Err(BridgeError::EventEmission("bridge torn down".to_string())));

        let bus = EventBus::new(4);
        let mut stream = EventStream::new(bus.subscribe());
        let forwarder = LocationForwarder::new(Arc::new(sink), "onLocationChanged", bus);

        forwarder.on_location_changed(None);
        let sample = forwarder.forward(Some(fix()));

        assert_eq!(sample.speed, 12.5);
        assert!(matches!(
            stream.try_recv(),
            Some(Ok(CoreEvent::Location(LocationEvent::Changed { latitude, .. })))
                if latitude == 0.0
        ));
    }
}
