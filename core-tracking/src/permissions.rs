//! Permission wizard result routing.
//!
//! The host forwards every activity result it receives. Only results
//! carrying the wizard's request code and one of the wizard's result codes
//! touch the pending permission request; everything else passes through.

use core_runtime::events::{CoreEvent, EventBus, PermissionEvent};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::completion::{Completion, Slot};
use crate::error::TrackingError;

const OPERATION: &str = "request_permissions";

/// Outcome reported by the permission wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardResult {
    AllGranted,
    Canceled,
    NotAllGranted,
}

impl WizardResult {
    pub const ALL_GRANTED_CODE: i32 = -1;
    pub const CANCELED_CODE: i32 = 0;
    pub const NOT_ALL_GRANTED_CODE: i32 = 1;

    /// Map a wizard result code; unknown codes yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::ALL_GRANTED_CODE => Some(WizardResult::AllGranted),
            Self::CANCELED_CODE => Some(WizardResult::Canceled),
            Self::NOT_ALL_GRANTED_CODE => Some(WizardResult::NotAllGranted),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            WizardResult::AllGranted => Self::ALL_GRANTED_CODE,
            WizardResult::Canceled => Self::CANCELED_CODE,
            WizardResult::NotAllGranted => Self::NOT_ALL_GRANTED_CODE,
        }
    }

    pub fn granted(self) -> bool {
        self == WizardResult::AllGranted
    }
}

/// An activity result as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityResult {
    pub request_code: i32,
    pub result_code: i32,
}

impl ActivityResult {
    pub fn new(request_code: i32, result_code: i32) -> Self {
        Self {
            request_code,
            result_code,
        }
    }
}

/// Holds the single outstanding permission request.
#[derive(Debug)]
pub struct PermissionsRouter {
    request_code: i32,
    pending: Slot<bool>,
    events: EventBus,
}

impl PermissionsRouter {
    pub fn new(request_code: i32, events: EventBus) -> Self {
        Self {
            request_code,
            pending: Slot::new(OPERATION),
            events,
        }
    }

    /// Request code the wizard is launched with.
    pub fn request_code(&self) -> i32 {
        self.request_code
    }

    /// Park `completion` until the wizard reports back.
    ///
    /// A request already waiting is rejected with
    /// [`TrackingError::Superseded`].
    pub fn store(&self, completion: Completion<bool>) {
        let request_id = completion.id();
        if let Some(displaced) = self.pending.replace(completion) {
            warn!(
                request_id = %displaced.id(),
                superseded_by = %request_id,
                "Permission request superseded before the wizard finished"
            );
            displaced.reject(TrackingError::Superseded {
                operation: OPERATION.to_string(),
            });
        }
    }

    /// Take back the request identified by `id`, if it is still the one
    /// waiting. Used when the wizard could not be launched.
    pub fn withdraw(&self, id: Uuid) -> Option<Completion<bool>> {
        self.pending.take_if(id)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Route one activity result.
    ///
    /// Returns `Some(granted)` when a pending request was resolved. Results
    /// for other request codes, unknown result codes, and results with no
    /// request waiting leave the router untouched and return `None`.
    pub fn apply(&self, result: ActivityResult) -> Option<bool> {
        if result.request_code != self.request_code {
            return None;
        }

        let Some(wizard) = WizardResult::from_code(result.result_code) else {
            debug!(
                result_code = result.result_code,
                "Ignoring unrecognized permission wizard result"
            );
            return None;
        };

        let Some(completion) = self.pending.take() else {
            debug!(?wizard, "Permission wizard result with no pending request");
            return None;
        };

        let granted = wizard.granted();
        match wizard {
            WizardResult::AllGranted => info!("All permissions are granted"),
            WizardResult::Canceled => info!("Permission wizard was canceled"),
            WizardResult::NotAllGranted => info!("Not all permissions were granted"),
        }

        completion.resolve(granted);
        let _ = self
            .events
            .emit(CoreEvent::Permissions(PermissionEvent::Resolved { granted }));
        Some(granted)
    }

    /// Reject the waiting request, if any, with [`TrackingError::Cancelled`].
    pub fn cancel(&self) -> bool {
        match self.pending.take() {
            Some(completion) => {
                completion.reject(TrackingError::Cancelled {
                    operation: OPERATION.to_string(),
                });
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_runtime::config::DEFAULT_PERMISSIONS_REQUEST_CODE;

    const CODE: i32 = DEFAULT_PERMISSIONS_REQUEST_CODE;

    fn router() -> PermissionsRouter {
        PermissionsRouter::new(CODE, EventBus::default())
    }

    fn parked(router: &PermissionsRouter) -> crate::completion::Pending<bool> {
        let (completion, pending) = Completion::new(OPERATION);
        router.store(completion);
        pending
    }

    #[test]
    fn test_result_code_mapping() {
        assert_eq!(WizardResult::from_code(-1), Some(WizardResult::AllGranted));
        assert_eq!(WizardResult::from_code(0), Some(WizardResult::Canceled));
        assert_eq!(WizardResult::from_code(1), Some(WizardResult::NotAllGranted));
        assert_eq!(WizardResult::from_code(2), None);
        assert_eq!(WizardResult::from_code(-2), None);

        assert!(WizardResult::AllGranted.granted());
        assert!(!WizardResult::Canceled.granted());
        assert_eq!(WizardResult::NotAllGranted.code(), 1);
    }

    #[core_async::test]
    async fn test_all_granted_resolves_true() {
        let router = router();
        let pending = parked(&router);

        assert_eq!(router.apply(ActivityResult::new(CODE, -1)), Some(true));
        assert_eq!(pending.await, Ok(true));
        assert!(!router.is_pending());
    }

    #[core_async::test]
    async fn test_canceled_and_partial_resolve_false() {
        for result_code in [0, 1] {
            let router = router();
            let pending = parked(&router);

            assert_eq!(
                router.apply(ActivityResult::new(CODE, result_code)),
                Some(false)
            );
            assert_eq!(pending.await, Ok(false));
        }
    }

    #[test]
    fn test_foreign_request_code_ignored() {
        let router = router();
        let mut pending = parked(&router);

        assert_eq!(router.apply(ActivityResult::new(CODE + 1, -1)), None);
        assert!(router.is_pending());
        assert!(pending.try_result().is_none());
    }

    #[test]
    fn test_unknown_result_code_keeps_request() {
        let router = router();
        let mut pending = parked(&router);

        assert_eq!(router.apply(ActivityResult::new(CODE, 7)), None);
        assert!(router.is_pending());
        assert!(pending.try_result().is_none());

        assert_eq!(router.apply(ActivityResult::new(CODE, -1)), Some(true));
        assert_eq!(pending.try_result(), Some(Ok(true)));
    }

    #[test]
    fn test_result_without_request_is_dropped() {
        let router = router();
        assert_eq!(router.apply(ActivityResult::new(CODE, -1)), None);
    }

    #[test]
    fn test_second_request_supersedes_first() {
        let router = router();
        let mut first = parked(&router);
        let mut second = parked(&router);

        assert!(matches!(
            first.try_result(),
            Some(Err(TrackingError::Superseded { .. }))
        ));

        router.apply(ActivityResult::new(CODE, 0));
        assert_eq!(second.try_result(), Some(Ok(false)));
    }

    #[test]
    fn test_withdraw_only_takes_matching_request() {
        let router = router();
        let first = parked(&router);
        let second = parked(&router);

        assert!(router.withdraw(first.id()).is_none());
        assert!(router.withdraw(second.id()).is_some());
        assert!(!router.is_pending());
    }

    #[test]
    fn test_cancel_rejects_waiting_request() {
        let router = router();
        let mut pending = parked(&router);

        assert!(router.cancel());
        assert!(!router.cancel());
        assert_eq!(
            pending.try_result(),
            Some(Err(TrackingError::Cancelled {
                operation: OPERATION.to_string()
            }))
        );
    }
}
