//! Host-facing facade over the tracking SDK.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use bridge_traits::{
    ActivityEventListener, ActivityLauncher, LocationListener, Tag, TrackingSdk, TrackingSettings,
    WizardOptions,
};
use core_async::time::Duration;
use core_runtime::config::BridgeConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream, PermissionEvent, SdkEvent};
use tracing::{debug, error, info, instrument, warn};

use crate::completion::{Completion, CompletionResult, Pending};
use crate::error::TrackingError;
use crate::location::LocationForwarder;
use crate::permissions::{ActivityResult, PermissionsRouter};
use crate::tags::TagsProcessor;

/// Primary facade exposed to the host's scripting layer.
///
/// Every asynchronous method returns a [`Pending`] that settles exactly
/// once. Methods that can answer from SDK state return an already-settled
/// pending; tag operations and the permission wizard settle when the SDK or
/// the host calls back.
///
/// ```rust,ignore
/// let module = TelematicsModule::new(config)?;
/// module.initialize();
/// if module.request_permissions().await? {
///     module.enable("device-token").await?;
/// }
/// ```
pub struct TelematicsModule {
    sdk: Arc<dyn TrackingSdk>,
    launcher: Arc<dyn ActivityLauncher>,
    tags: Arc<TagsProcessor>,
    permissions: PermissionsRouter,
    location: Arc<LocationForwarder>,
    settings: TrackingSettings,
    wizard_options: WizardOptions,
    completion_timeout: Option<Duration>,
    events: EventBus,
    listener_count: AtomicUsize,
}

impl TelematicsModule {
    /// Name the module is registered under in the host.
    pub const NAME: &'static str = "TelematicsSdk";

    /// Build the module and register it for activity results.
    ///
    /// Fails if `config` does not pass [`BridgeConfig::validate`].
    pub fn new(config: BridgeConfig) -> core_runtime::Result<Arc<Self>> {
        config.validate()?;

        let events = EventBus::new(config.event_buffer_size);
        let module = Arc::new(Self {
            tags: Arc::new(TagsProcessor::new(events.clone())),
            permissions: PermissionsRouter::new(config.permissions_request_code, events.clone()),
            location: Arc::new(LocationForwarder::new(
                config.event_sink,
                config.location_event_name,
                events.clone(),
            )),
            sdk: config.tracking_sdk,
            launcher: config.activity_launcher,
            settings: config.settings,
            wizard_options: config.wizard_options,
            completion_timeout: config.completion_timeout,
            events,
            listener_count: AtomicUsize::new(0),
        });

        let listener: Weak<Self> = Arc::downgrade(&module);
        module.launcher.register_result_listener(listener);

        Ok(module)
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// The callback object registered with the SDK for tag results.
    pub fn tags_processor(&self) -> Arc<TagsProcessor> {
        Arc::clone(&self.tags)
    }

    /// Initialize the SDK if needed, then (re)register the tag callback and
    /// the location listener.
    ///
    /// The SDK is only initialized once; registration happens on every call.
    #[instrument(skip(self))]
    pub fn initialize(&self) {
        debug!("Initializing tracking module");

        if self.sdk.is_initialized() {
            debug!("Tracking api already initialized");
            self.publish(CoreEvent::Sdk(SdkEvent::AlreadyInitialized));
        } else {
            match self.sdk.initialize(&self.settings) {
                Ok(()) => {
                    info!("Tracking api is initialized");
                    self.publish(CoreEvent::Sdk(SdkEvent::Initialized));
                }
                Err(e) => error!("Failed to initialize tracking api: {}", e),
            }
        }

        self.sdk.add_tags_processing_callback(self.tags_processor());
        self.start_location_listener();
    }

    fn start_location_listener(&self) {
        let listener: Arc<dyn LocationListener> = self.location.clone();
        if let Err(e) = self.sdk.set_location_listener(listener) {
            warn!("Failed to register location listener: {}", e);
        }
    }

    pub fn start_persistent_tracking(&self) -> Pending<bool> {
        let started = self.sdk.start_persistent_tracking();
        info!(started, "Persistent tracking requested");
        self.publish(CoreEvent::Sdk(SdkEvent::PersistentTrackingStarted { started }));
        Pending::resolved("start_persistent_tracking", started)
    }

    /// Resolve `true` when every required permission is granted.
    ///
    /// Otherwise launch the permission wizard and resolve with its outcome.
    /// A request still waiting on an earlier wizard is superseded.
    #[instrument(skip(self))]
    pub fn request_permissions(&self) -> Pending<bool> {
        if self.sdk.are_all_required_permissions_granted() {
            debug!("All required permissions already granted");
            return Pending::resolved("request_permissions", true);
        }

        let (completion, pending) = Completion::new("request_permissions");
        let request_id = completion.id();
        self.permissions.store(completion);

        let request_code = self.permissions.request_code();
        match self
            .launcher
            .launch_permissions_wizard(self.wizard_options, request_code)
        {
            Ok(()) => {
                info!(request_code, "Permission wizard launched");
                self.publish(CoreEvent::Permissions(PermissionEvent::WizardLaunched {
                    request_code,
                }));
            }
            Err(e) => {
                error!("Failed to launch permission wizard: {}", e);
                if let Some(completion) = self.permissions.withdraw(request_id) {
                    completion.reject(e.into());
                }
            }
        }

        pending
    }

    pub fn get_status(&self) -> Pending<bool> {
        Pending::resolved("get_status", self.sdk.is_sdk_enabled())
    }

    pub fn get_device_token(&self) -> Pending<String> {
        Pending::resolved("get_device_token", self.sdk.device_id())
    }

    /// Set the device token and enable the SDK.
    ///
    /// An empty token is rejected with [`TrackingError::MissingToken`].
    /// Without permissions or initialization this resolves `false` and
    /// leaves the SDK untouched.
    #[instrument(skip_all)]
    pub fn enable(&self, device_token: &str) -> Pending<bool> {
        if device_token.is_empty() {
            warn!("Refusing to enable SDK without a device token");
            return Pending::rejected("enable", TrackingError::MissingToken);
        }

        let permissions_granted = self.sdk.are_all_required_permissions_granted();
        let initialized = self.sdk.is_initialized();
        if !permissions_granted || !initialized {
            let reason = if !initialized {
                "tracking api is not initialized"
            } else {
                "required permissions are not granted"
            };
            warn!(reason, "Failed to start SDK");
            self.publish(CoreEvent::Sdk(SdkEvent::EnableRefused {
                reason: reason.to_string(),
            }));
            return Pending::resolved("enable", false);
        }

        self.sdk.set_device_id(device_token);
        self.sdk.set_enable_sdk(true);
        info!(token_len = device_token.len(), "SDK started");
        self.publish(CoreEvent::Sdk(SdkEvent::Enabled));
        Pending::resolved("enable", true)
    }

    /// Disable the SDK, uploading buffered data first. No-op when the SDK is
    /// not initialized.
    pub fn disable(&self) {
        if !self.sdk.is_initialized() {
            warn!("Failed to stop SDK: tracking api is not initialized");
            return;
        }

        self.sdk.set_disable_with_upload();
        info!("SDK is stopped");
        self.publish(CoreEvent::Sdk(SdkEvent::DisableRequested));
    }

    pub fn get_future_track_tags(&self) -> Pending<Vec<Tag>> {
        let Some((completion, pending)) = self.tag_request("fetch_tags") else {
            return Pending::rejected("fetch_tags", TrackingError::NotInitialized);
        };

        if self.tags.store_fetch_tags(completion) {
            self.sdk.get_future_track_tags();
        }
        pending
    }

    pub fn add_future_track_tag(&self, tag: &str, source: &str) -> Pending<Tag> {
        let Some((completion, pending)) = self.tag_request("add_tag") else {
            return Pending::rejected("add_tag", TrackingError::NotInitialized);
        };

        if self.tags.store_add_tag(completion) {
            debug!(tag, source, "Adding future track tag");
            self.sdk.add_future_track_tag(tag, source);
        }
        pending
    }

    /// Remove a future track tag. The SDK matches on `tag` alone; `source`
    /// is only logged.
    pub fn remove_future_track_tag(&self, tag: &str, source: &str) -> Pending<Tag> {
        let Some((completion, pending)) = self.tag_request("remove_tag") else {
            return Pending::rejected("remove_tag", TrackingError::NotInitialized);
        };

        if self.tags.store_remove_tag(completion) {
            debug!(tag, source, "Removing future track tag");
            self.sdk.remove_future_track_tag(tag);
        }
        pending
    }

    pub fn remove_all_future_track_tags(&self) -> Pending<bool> {
        let Some((completion, pending)) = self.tag_request("remove_all_tags") else {
            return Pending::rejected("remove_all_tags", TrackingError::NotInitialized);
        };

        if self.tags.store_remove_all_tags(completion) {
            self.sdk.remove_all_future_track_tags();
        }
        pending
    }

    // `None` when the SDK cannot accept tag operations yet.
    fn tag_request<T>(&self, operation: &'static str) -> Option<(Completion<T>, Pending<T>)> {
        if !self.sdk.is_initialized() {
            warn!(operation, "Tracking api is not initialized");
            return None;
        }
        Some(Completion::new(operation))
    }

    /// Host bookkeeping for event subscriptions. Events are emitted
    /// regardless of the count.
    pub fn add_listener(&self, event_name: &str) {
        let count = self.listener_count.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(event_name, count, "Host listener added");
    }

    pub fn remove_listeners(&self, count: usize) {
        let previous = self
            .listener_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_sub(count))
            })
            .unwrap_or_else(|current| current);
        debug!(
            removed = count,
            remaining = previous.saturating_sub(count),
            "Host listeners removed"
        );
    }

    pub fn listener_count(&self) -> usize {
        self.listener_count.load(Ordering::SeqCst)
    }

    /// Reject every outstanding completion with [`TrackingError::Cancelled`].
    ///
    /// Called when the host tears the module down.
    pub fn invalidate(&self) {
        let tags = self.tags.cancel_all();
        let permissions = self.permissions.cancel();
        info!(
            cancelled = tags + usize::from(permissions),
            "Tracking module invalidated"
        );
    }

    /// Await `pending`, applying the configured completion timeout if any.
    pub async fn await_pending<T>(&self, pending: Pending<T>) -> CompletionResult<T> {
        match self.completion_timeout {
            Some(timeout) => pending.wait_timeout(timeout).await,
            None => pending.await,
        }
    }

    fn publish(&self, event: CoreEvent) {
        let _ = self.events.emit(event);
    }
}

impl ActivityEventListener for TelematicsModule {
    fn on_activity_result(&self, request_code: i32, result_code: i32) {
        self.permissions
            .apply(ActivityResult::new(request_code, result_code));
    }
}

impl std::fmt::Debug for TelematicsModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelematicsModule")
            .field("settings", &self.settings)
            .field("wizard_options", &self.wizard_options)
            .field("completion_timeout", &self.completion_timeout)
            .field("listener_count", &self.listener_count())
            .finish_non_exhaustive()
    }
}
