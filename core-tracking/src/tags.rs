//! Tag operation correlation.
//!
//! The SDK reports tag results through a single registered callback object,
//! with no request identifiers. [`TagsProcessor`] keeps one pending
//! completion per operation kind and settles it when the matching callback
//! arrives. Callbacks with nothing pending are dropped.
//!
//! Because answers carry no identity, a second request of a kind that is
//! still in flight is refused with [`TrackingError::Busy`] instead of being
//! parked. Otherwise the first request's answer would settle the second.

use std::fmt;

use bridge_traits::{SdkFailure, Tag, TagsProcessingCallback};
use core_runtime::events::{CoreEvent, EventBus, TagsEvent};
use tracing::{debug, info, warn};

use crate::completion::{Completion, Slot};
use crate::error::TrackingError;

/// The four asynchronous tag operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagOperation {
    FetchTags,
    AddTag,
    RemoveTag,
    RemoveAllTags,
}

impl TagOperation {
    pub const ALL: [TagOperation; 4] = [
        TagOperation::FetchTags,
        TagOperation::AddTag,
        TagOperation::RemoveTag,
        TagOperation::RemoveAllTags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagOperation::FetchTags => "fetch_tags",
            TagOperation::AddTag => "add_tag",
            TagOperation::RemoveTag => "remove_tag",
            TagOperation::RemoveAllTags => "remove_all_tags",
        }
    }
}

impl fmt::Display for TagOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One SDK tag callback, reduced to a value.
#[derive(Debug, Clone, PartialEq)]
pub enum TagsOutcome {
    Fetched(Result<Vec<Tag>, SdkFailure>),
    Added(Result<Tag, SdkFailure>),
    Removed(Result<Tag, SdkFailure>),
    AllRemoved(Result<(), SdkFailure>),
}

impl TagsOutcome {
    pub fn operation(&self) -> TagOperation {
        match self {
            TagsOutcome::Fetched(_) => TagOperation::FetchTags,
            TagsOutcome::Added(_) => TagOperation::AddTag,
            TagsOutcome::Removed(_) => TagOperation::RemoveTag,
            TagsOutcome::AllRemoved(_) => TagOperation::RemoveAllTags,
        }
    }
}

/// Correlates tag callbacks with the host requests waiting on them.
///
/// Each `store_*` method returns `false` when the completion was refused
/// because a request of that kind is already waiting; the refused completion
/// has been rejected with [`TrackingError::Busy`] and the SDK must not be
/// called for it.
#[derive(Debug)]
pub struct TagsProcessor {
    fetch: Slot<Vec<Tag>>,
    add: Slot<Tag>,
    remove: Slot<Tag>,
    remove_all: Slot<bool>,
    events: EventBus,
}

impl TagsProcessor {
    pub fn new(events: EventBus) -> Self {
        Self {
            fetch: Slot::new(TagOperation::FetchTags.as_str()),
            add: Slot::new(TagOperation::AddTag.as_str()),
            remove: Slot::new(TagOperation::RemoveTag.as_str()),
            remove_all: Slot::new(TagOperation::RemoveAllTags.as_str()),
            events,
        }
    }

    pub fn store_fetch_tags(&self, completion: Completion<Vec<Tag>>) -> bool {
        self.store(&self.fetch, completion)
    }

    pub fn store_add_tag(&self, completion: Completion<Tag>) -> bool {
        self.store(&self.add, completion)
    }

    pub fn store_remove_tag(&self, completion: Completion<Tag>) -> bool {
        self.store(&self.remove, completion)
    }

    pub fn store_remove_all_tags(&self, completion: Completion<bool>) -> bool {
        self.store(&self.remove_all, completion)
    }

    /// Settle the pending completion matching `outcome`.
    ///
    /// Returns `true` if a pending completion was settled, `false` if the
    /// outcome was dropped because nothing of that kind was outstanding.
    pub fn apply(&self, outcome: TagsOutcome) -> bool {
        match outcome {
            TagsOutcome::Fetched(result) => self.settle(&self.fetch, result),
            TagsOutcome::Added(result) => self.settle(&self.add, result),
            TagsOutcome::Removed(result) => self.settle(&self.remove, result),
            TagsOutcome::AllRemoved(result) => {
                self.settle(&self.remove_all, result.map(|()| true))
            }
        }
    }

    pub fn is_pending(&self, operation: TagOperation) -> bool {
        match operation {
            TagOperation::FetchTags => self.fetch.is_pending(),
            TagOperation::AddTag => self.add.is_pending(),
            TagOperation::RemoveTag => self.remove.is_pending(),
            TagOperation::RemoveAllTags => self.remove_all.is_pending(),
        }
    }

    /// Reject every outstanding completion with [`TrackingError::Cancelled`].
    ///
    /// Returns how many completions were cancelled.
    pub fn cancel_all(&self) -> usize {
        [
            cancel(&self.fetch),
            cancel(&self.add),
            cancel(&self.remove),
            cancel(&self.remove_all),
        ]
        .into_iter()
        .filter(|cancelled| *cancelled)
        .count()
    }

    fn store<T>(&self, slot: &Slot<T>, completion: Completion<T>) -> bool {
        let refused = match slot.store_vacant(completion) {
            Ok(()) => return true,
            Err(refused) => refused,
        };

        warn!(
            operation = slot.operation(),
            request_id = %refused.id(),
            "Tag request refused while an earlier one is in flight"
        );
        let operation = slot.operation().to_string();
        refused.reject(TrackingError::Busy {
            operation: operation.clone(),
        });
        let _ = self
            .events
            .emit(CoreEvent::Tags(TagsEvent::Refused { operation }));
        false
    }

    fn settle<T>(&self, slot: &Slot<T>, result: Result<T, SdkFailure>) -> bool {
        let Some(completion) = slot.take() else {
            debug!(
                operation = slot.operation(),
                "Dropping tag callback with no pending request"
            );
            return false;
        };

        let success = result.is_ok();
        match &result {
            Ok(_) => info!(
                operation = slot.operation(),
                request_id = %completion.id(),
                "Tag operation completed"
            ),
            Err(failure) => warn!(
                operation = slot.operation(),
                request_id = %completion.id(),
                code = %failure.code,
                "Tag operation failed: {}",
                failure.message
            ),
        }

        completion.settle(result.map_err(TrackingError::from));
        let _ = self.events.emit(CoreEvent::Tags(TagsEvent::Resolved {
            operation: slot.operation().to_string(),
            success,
        }));
        true
    }
}

impl Default for TagsProcessor {
    fn default() -> Self {
        Self::new(EventBus::default())
    }
}

fn cancel<T>(slot: &Slot<T>) -> bool {
    match slot.take() {
        Some(completion) => {
            completion.reject(TrackingError::Cancelled {
                operation: slot.operation().to_string(),
            });
            true
        }
        None => false,
    }
}

impl TagsProcessingCallback for TagsProcessor {
    fn on_tags_fetched(&self, result: Result<Vec<Tag>, SdkFailure>) {
        self.apply(TagsOutcome::Fetched(result));
    }

    fn on_tag_added(&self, result: Result<Tag, SdkFailure>) {
        self.apply(TagsOutcome::Added(result));
    }

    fn on_tag_removed(&self, result: Result<Tag, SdkFailure>) {
        self.apply(TagsOutcome::Removed(result));
    }

    fn on_all_tags_removed(&self, result: Result<(), SdkFailure>) {
        self.apply(TagsOutcome::AllRemoved(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_runtime::events::EventStream;

    fn failure() -> SdkFailure {
        SdkFailure::new("NETWORK_ERROR", "Unable to reach tag service")
    }

    #[core_async::test]
    async fn test_fetch_resolves_with_tags() {
        let processor = TagsProcessor::default();
        let (completion, pending) = Completion::new("fetch_tags");
        processor.store_fetch_tags(completion);

        let tags = vec![Tag::new("business", "app"), Tag::new("commute", "app")];
        assert!(processor.apply(TagsOutcome::Fetched(Ok(tags.clone()))));

        assert_eq!(pending.await, Ok(tags));
        assert!(!processor.is_pending(TagOperation::FetchTags));
    }

    #[core_async::test]
    async fn test_failure_rejects_with_sdk_code() {
        let processor = TagsProcessor::default();
        let (completion, pending) = Completion::new("add_tag");
        processor.store_add_tag(completion);

        processor.on_tag_added(Err(failure()));

        let error = pending.await.unwrap_err();
        assert_eq!(error.code(), "NETWORK_ERROR");
        assert_eq!(error.to_string(), "Unable to reach tag service");
    }

    #[core_async::test]
    async fn test_remove_all_resolves_true() {
        let processor = TagsProcessor::default();
        let (completion, pending) = Completion::new("remove_all_tags");
        processor.store_remove_all_tags(completion);

        processor.on_all_tags_removed(Ok(()));

        assert_eq!(pending.await, Ok(true));
    }

    #[test]
    fn test_orphan_callback_is_dropped() {
        let processor = TagsProcessor::default();

        assert!(!processor.apply(TagsOutcome::Removed(Ok(Tag::new("x", "y")))));
        assert!(!processor.apply(TagsOutcome::AllRemoved(Err(failure()))));
    }

    #[test]
    fn test_second_callback_after_settle_is_dropped() {
        let processor = TagsProcessor::default();
        let (completion, mut pending) = Completion::new("remove_tag");
        processor.store_remove_tag(completion);

        let tag = Tag::new("business", "app");
        assert!(processor.apply(TagsOutcome::Removed(Ok(tag.clone()))));
        assert!(!processor.apply(TagsOutcome::Removed(Err(failure()))));

        assert_eq!(pending.try_result(), Some(Ok(tag)));
    }

    #[test]
    fn test_kinds_are_independent() {
        let processor = TagsProcessor::default();
        let (add, mut add_pending) = Completion::new("add_tag");
        let (remove, mut remove_pending) = Completion::new("remove_tag");
        processor.store_add_tag(add);
        processor.store_remove_tag(remove);

        let tag = Tag::new("commute", "app");
        processor.apply(TagsOutcome::Removed(Ok(tag.clone())));

        assert!(add_pending.try_result().is_none());
        assert!(processor.is_pending(TagOperation::AddTag));
        assert_eq!(remove_pending.try_result(), Some(Ok(tag)));
    }

    #[test]
    fn test_request_in_flight_refuses_newer() {
        let bus = EventBus::new(8);
        let mut stream = EventStream::new(bus.subscribe());
        let processor = TagsProcessor::new(bus);

        let (first, mut first_pending) = Completion::new("add_tag");
        let (second, mut second_pending) = Completion::new("add_tag");
        assert!(processor.store_add_tag(first));
        assert!(!processor.store_add_tag(second));

        assert_eq!(
            second_pending.try_result(),
            Some(Err(TrackingError::Busy {
                operation: "add_tag".to_string()
            }))
        );
        assert!(first_pending.try_result().is_none());
        assert_eq!(
            stream.try_recv().unwrap().unwrap(),
            CoreEvent::Tags(TagsEvent::Refused {
                operation: "add_tag".to_string()
            })
        );
    }

    #[test]
    fn test_answer_settles_only_its_own_request() {
        let processor = TagsProcessor::default();
        let business = Tag::new("business", "app");
        let commute = Tag::new("commute", "app");

        let (first, mut first_pending) = Completion::new("add_tag");
        let (second, mut second_pending) = Completion::new("add_tag");
        processor.store_add_tag(first);
        processor.store_add_tag(second);

        // The SDK answers the in-flight request, then a stray second answer.
        assert!(processor.apply(TagsOutcome::Added(Ok(business.clone()))));
        assert!(!processor.apply(TagsOutcome::Added(Ok(commute))));

        assert_eq!(first_pending.try_result(), Some(Ok(business)));
        assert!(matches!(
            second_pending.try_result(),
            Some(Err(TrackingError::Busy { .. }))
        ));
    }

    #[test]
    fn test_slot_reopens_after_settle() {
        let processor = TagsProcessor::default();
        let (first, _first_pending) = Completion::new("remove_all_tags");
        processor.store_remove_all_tags(first);
        processor.apply(TagsOutcome::AllRemoved(Ok(())));

        let (second, mut second_pending) = Completion::new("remove_all_tags");
        assert!(processor.store_remove_all_tags(second));
        processor.apply(TagsOutcome::AllRemoved(Ok(())));
        assert_eq!(second_pending.try_result(), Some(Ok(true)));
    }

    #[test]
    fn test_cancel_all_rejects_outstanding() {
        let processor = TagsProcessor::default();
        let (fetch, mut fetch_pending) = Completion::new("fetch_tags");
        let (remove_all, mut remove_all_pending) = Completion::new("remove_all_tags");
        processor.store_fetch_tags(fetch);
        processor.store_remove_all_tags(remove_all);

        assert_eq!(processor.cancel_all(), 2);
        assert!(TagOperation::ALL
            .iter()
            .all(|operation| !processor.is_pending(*operation)));
        assert!(matches!(
            fetch_pending.try_result(),
            Some(Err(TrackingError::Cancelled { .. }))
        ));
        assert!(matches!(
            remove_all_pending.try_result(),
            Some(Err(TrackingError::Cancelled { .. }))
        ));
    }

    #[test]
    fn test_resolution_publishes_event() {
        let bus = EventBus::new(8);
        let mut stream = EventStream::new(bus.subscribe());
        let processor = TagsProcessor::new(bus);
        let (completion, _pending) = Completion::new("fetch_tags");
        processor.store_fetch_tags(completion);

        processor.apply(TagsOutcome::Fetched(Err(failure())));

        let event = stream.try_recv().unwrap().unwrap();
        assert_eq!(
            event,
            CoreEvent::Tags(TagsEvent::Resolved {
                operation: "fetch_tags".to_string(),
                success: false,
            })
        );
    }

    #[test]
    fn test_outcome_operation_mapping() {
        assert_eq!(
            TagsOutcome::Fetched(Ok(vec![])).operation(),
            TagOperation::FetchTags
        );
        assert_eq!(
            TagsOutcome::AllRemoved(Ok(())).operation(),
            TagOperation::RemoveAllTags
        );
        assert_eq!(TagOperation::RemoveTag.to_string(), "remove_tag");
    }
}
