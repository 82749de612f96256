//! In-memory stand-in for the native tracking SDK.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use bridge_traits::{
    error::{BridgeError, Result},
    host::{ActivityEventListener, ActivityLauncher, WizardOptions},
    time::{Clock, SystemClock},
    tracking::{
        Location, LocationListener, SdkFailure, Tag, TagsProcessingCallback, TrackingSdk,
        TrackingSettings,
    },
};
use tracing::{debug, info, warn};

/// Result code the simulated wizard reports when everything is granted.
pub const WIZARD_ALL_GRANTED: i32 = -1;

/// Simulated tracking SDK for desktop builds and tests.
///
/// Mirrors the native SDK's observable behavior: tag operations answer
/// through every registered [`TagsProcessingCallback`], location updates go
/// to the single registered [`LocationListener`], and the permission wizard
/// answers through the registered [`ActivityEventListener`].
///
/// Callbacks run on a spawned task when a runtime is available, otherwise
/// inline on the calling thread.
pub struct SimulatedTrackingSdk {
    state: Mutex<SimulatedState>,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct SimulatedState {
    initialized: bool,
    init_calls: usize,
    settings: Option<TrackingSettings>,
    permissions_granted: bool,
    enabled: bool,
    device_id: String,
    persistent_tracking: bool,
    tags: Vec<Tag>,
    callbacks: Vec<Arc<dyn TagsProcessingCallback>>,
    location_listener: Option<Arc<dyn LocationListener>>,
    reject_location_listener: bool,
    result_listener: Option<Weak<dyn ActivityEventListener>>,
    wizard_result: Option<i32>,
    wizard_unavailable: bool,
    wizard_launches: usize,
    next_tag_failure: Option<SdkFailure>,
}

impl SimulatedTrackingSdk {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                wizard_result: Some(WIZARD_ALL_GRANTED),
                ..SimulatedState::default()
            }),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pretend the user granted (or revoked) every required permission.
    pub fn grant_permissions(&self, granted: bool) {
        self.lock().permissions_granted = granted;
    }

    /// Result code the next wizard run reports. Defaults to
    /// [`WIZARD_ALL_GRANTED`]; `None` means the wizard never answers.
    pub fn set_wizard_result(&self, result_code: Option<i32>) {
        self.lock().wizard_result = result_code;
    }

    /// Make the next wizard launches fail as if no activity were attached.
    pub fn set_wizard_unavailable(&self, unavailable: bool) {
        self.lock().wizard_unavailable = unavailable;
    }

    /// Fail the next tag operation with `failure`.
    pub fn fail_next_tag_operation(&self, failure: SdkFailure) {
        self.lock().next_tag_failure = Some(failure);
    }

    /// Refuse location listener registration.
    pub fn reject_location_listener(&self, reject: bool) {
        self.lock().reject_location_listener = reject;
    }

    pub fn init_calls(&self) -> usize {
        self.lock().init_calls
    }

    pub fn settings(&self) -> Option<TrackingSettings> {
        self.lock().settings.clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.lock().tags.clone()
    }

    /// Number of tag callbacks registered, duplicates included.
    pub fn callback_count(&self) -> usize {
        self.lock().callbacks.len()
    }

    pub fn has_location_listener(&self) -> bool {
        self.lock().location_listener.is_some()
    }

    pub fn wizard_launches(&self) -> usize {
        self.lock().wizard_launches
    }

    /// Deliver a location update to the registered listener.
    ///
    /// Returns `false` if no listener is registered.
    pub fn emit_location(&self, location: Option<Location>) -> bool {
        let listener = self.lock().location_listener.clone();
        match listener {
            Some(listener) => {
                deliver(move || listener.on_location_changed(location));
                true
            }
            None => false,
        }
    }

    /// Deliver a fix at the given coordinates, stamped with the SDK clock.
    pub fn emit_fix(&self, latitude: f64, longitude: f64, speed: f32) -> bool {
        let location = Location {
            latitude,
            longitude,
            altitude: 0.0,
            speed,
            time_millis: self.clock.unix_timestamp_millis(),
        };
        self.emit_location(Some(location))
    }

    /// Replay a tag result to every registered callback without a request,
    /// the way the native SDK occasionally does.
    pub fn replay_tags_fetched(&self) {
        let (callbacks, tags) = {
            let state = self.lock();
            (state.callbacks.clone(), state.tags.clone())
        };
        for callback in callbacks {
            let tags = tags.clone();
            deliver(move || callback.on_tags_fetched(Ok(tags)));
        }
    }

    // Resolve the next tag result: an injected failure wins over `op`.
    fn tag_operation<T>(
        &self,
        op: impl FnOnce(&mut SimulatedState) -> std::result::Result<T, SdkFailure>,
    ) -> (Vec<Arc<dyn TagsProcessingCallback>>, std::result::Result<T, SdkFailure>) {
        let mut state = self.lock();
        let result = match state.next_tag_failure.take() {
            Some(failure) => Err(failure),
            None => op(&mut *state),
        };
        if state.callbacks.is_empty() {
            warn!("Tag operation finished with no callback registered");
        }
        (state.callbacks.clone(), result)
    }
}

impl Default for SimulatedTrackingSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimulatedTrackingSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SimulatedTrackingSdk")
            .field("initialized", &state.initialized)
            .field("enabled", &state.enabled)
            .field("permissions_granted", &state.permissions_granted)
            .field("tags", &state.tags.len())
            .field("callbacks", &state.callbacks.len())
            .finish_non_exhaustive()
    }
}

fn deliver<F>(callback: F)
where
    F: FnOnce() + Send + 'static,
{
    if core_async::task::in_runtime() {
        core_async::spawn(async move { callback() });
    } else {
        callback();
    }
}

fn tag_not_found(tag: &str) -> SdkFailure {
    SdkFailure::new("TAG_NOT_FOUND", format!("Tag '{}' does not exist", tag))
}

impl TrackingSdk for SimulatedTrackingSdk {
    fn initialize(&self, settings: &TrackingSettings) -> Result<()> {
        let mut state = self.lock();
        state.init_calls += 1;
        state.initialized = true;
        state.settings = Some(settings.clone());
        info!(?settings, "Simulated SDK initialized");
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    fn are_all_required_permissions_granted(&self) -> bool {
        self.lock().permissions_granted
    }

    fn is_sdk_enabled(&self) -> bool {
        self.lock().enabled
    }

    fn device_id(&self) -> String {
        self.lock().device_id.clone()
    }

    fn set_device_id(&self, device_id: &str) {
        self.lock().device_id = device_id.to_string();
    }

    fn set_enable_sdk(&self, enabled: bool) {
        self.lock().enabled = enabled;
        debug!(enabled, "Simulated SDK enable flag changed");
    }

    fn set_disable_with_upload(&self) {
        let mut state = self.lock();
        state.enabled = false;
        state.persistent_tracking = false;
        debug!("Simulated SDK disabled after upload");
    }

    fn start_persistent_tracking(&self) -> bool {
        let mut state = self.lock();
        state.persistent_tracking = state.initialized && state.enabled;
        state.persistent_tracking
    }

    fn get_future_track_tags(&self) {
        let (callbacks, result) = self.tag_operation(|state| Ok(state.tags.clone()));
        for callback in callbacks {
            let result = result.clone();
            deliver(move || callback.on_tags_fetched(result));
        }
    }

    fn add_future_track_tag(&self, tag: &str, source: &str) {
        let added = Tag::new(tag, source);
        let (callbacks, result) = self.tag_operation(|state| {
            if tag.is_empty() {
                return Err(SdkFailure::new("TAG_INVALID", "Tag name is empty"));
            }
            state.tags.retain(|existing| existing.tag != added.tag);
            state.tags.push(added.clone());
            Ok(added.clone())
        });
        for callback in callbacks {
            let result = result.clone();
            deliver(move || callback.on_tag_added(result));
        }
    }

    fn remove_future_track_tag(&self, tag: &str) {
        let (callbacks, result) = self.tag_operation(|state| {
            let index = state
                .tags
                .iter()
                .position(|existing| existing.tag == tag)
                .ok_or_else(|| tag_not_found(tag))?;
            Ok(state.tags.remove(index))
        });
        for callback in callbacks {
            let result = result.clone();
            deliver(move || callback.on_tag_removed(result));
        }
    }

    fn remove_all_future_track_tags(&self) {
        let (callbacks, result) = self.tag_operation(|state| {
            state.tags.clear();
            Ok(())
        });
        for callback in callbacks {
            let result = result.clone();
            deliver(move || callback.on_all_tags_removed(result));
        }
    }

    fn set_location_listener(&self, listener: Arc<dyn LocationListener>) -> Result<()> {
        let mut state = self.lock();
        if state.reject_location_listener {
            return Err(BridgeError::ListenerRegistration(
                "location services unavailable".to_string(),
            ));
        }
        state.location_listener = Some(listener);
        Ok(())
    }

    fn add_tags_processing_callback(&self, callback: Arc<dyn TagsProcessingCallback>) {
        self.lock().callbacks.push(callback);
    }
}

impl ActivityLauncher for SimulatedTrackingSdk {
    fn launch_permissions_wizard(&self, options: WizardOptions, request_code: i32) -> Result<()> {
        let (listener, result_code) = {
            let mut state = self.lock();
            if state.wizard_unavailable {
                return Err(BridgeError::NotAvailable(
                    "no activity to host the permission wizard".to_string(),
                ));
            }
            state.wizard_launches += 1;
            let result_code = state.wizard_result;
            if result_code == Some(WIZARD_ALL_GRANTED) {
                state.permissions_granted = true;
            }
            (state.result_listener.clone(), result_code)
        };
        debug!(?options, request_code, "Simulated permission wizard launched");

        let (Some(listener), Some(result_code)) = (listener, result_code) else {
            return Ok(());
        };
        deliver(move || match listener.upgrade() {
            Some(listener) => listener.on_activity_result(request_code, result_code),
            None => debug!("Activity result listener is gone"),
        });
        Ok(())
    }

    fn register_result_listener(&self, listener: Weak<dyn ActivityEventListener>) {
        self.lock().result_listener = Some(listener);
    }
}
