//! Submission Controller.
//!
//! A submission is split in three phases so callers never hold a lock on the
//! wizard while the persistence call is outstanding:
//!
//! 1. [`SubmitFlag::try_acquire`] claims the submitting flag. A second claim
//!    while one is held fails, which drops the duplicate request.
//! 2. [`perform`] issues exactly one `create_listing` call and captures the
//!    outcome. Persistence errors are recovered here and never escalate.
//! 3. The wizard applies the outcome, then the [`SubmitGuard`] is dropped and
//!    the flag is released. Dropping the guard is the only way to release it,
//!    so the flag resets on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::core::types::{ListingDraft, NotificationKind, SubmissionResult};
use crate::io::config::MessagesConfig;
use crate::io::notify::{Notifier, RefreshSignal};
use crate::io::store::ListingStore;

/// Shared "submission outstanding" flag of one wizard instance.
#[derive(Debug, Default)]
pub struct SubmitFlag(Arc<AtomicBool>);

impl SubmitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Claim the flag. Returns `None` if a submission is already outstanding.
    pub fn try_acquire(&self) -> Option<SubmitGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitGuard(Arc::clone(&self.0)))
    }
}

/// Holds the submitting flag; releases it on drop.
#[derive(Debug)]
pub struct SubmitGuard(Arc<AtomicBool>);

impl SubmitGuard {
    /// True if this guard was claimed from `flag`.
    pub fn belongs_to(&self, flag: &SubmitFlag) -> bool {
        Arc::ptr_eq(&self.0, &flag.0)
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A claimed submission waiting for its persistence call.
#[derive(Debug)]
pub struct PendingSubmission {
    draft: ListingDraft,
    guard: SubmitGuard,
}

impl PendingSubmission {
    pub fn new(draft: ListingDraft, guard: SubmitGuard) -> Self {
        Self { draft, guard }
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }
}

/// Outcome of the persistence call; still holds the flag.
#[derive(Debug)]
pub struct CompletedSubmission {
    result: SubmissionResult,
    guard: SubmitGuard,
}

impl CompletedSubmission {
    pub fn result(&self) -> &SubmissionResult {
        &self.result
    }

    pub fn belongs_to(&self, flag: &SubmitFlag) -> bool {
        self.guard.belongs_to(flag)
    }

    /// Release the flag and hand back the result.
    pub fn release(self) -> SubmissionResult {
        let Self { result, guard } = self;
        drop(guard);
        result
    }
}

/// Issue the single persistence call for `pending`.
pub async fn perform<S: ListingStore>(
    store: &S,
    owner_id: &str,
    pending: PendingSubmission,
) -> CompletedSubmission {
    let PendingSubmission { draft, guard } = pending;
    info!(owner_id, title = %draft.title, "submitting listing");
    let result = match store.create_listing(owner_id, draft).await {
        Ok(listing) => {
            info!(listing_id = %listing.id, "listing submitted");
            SubmissionResult::Success(listing)
        }
        Err(err) => {
            let reason = format!("{:#}", err);
            warn!(owner_id, reason = %reason, "listing submission failed");
            SubmissionResult::Failure(reason)
        }
    };
    CompletedSubmission { result, guard }
}

/// Emit the toast for `result` and, on success, request a listing refresh.
pub fn announce<N: Notifier, R: RefreshSignal>(
    result: &SubmissionResult,
    messages: &MessagesConfig,
    notifier: &N,
    refresh: &R,
) {
    match result {
        SubmissionResult::Success(_) => {
            notifier.notify(NotificationKind::Success, &messages.created);
            refresh.request_refresh();
        }
        SubmissionResult::Failure(_) => {
            notifier.notify(NotificationKind::Failure, &messages.failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingNotifier, RecordingRefresh, ScriptedStore, draft};

    #[test]
    fn flag_admits_one_holder_at_a_time() {
        let flag = SubmitFlag::new();
        let guard = flag.try_acquire().expect("first claim");
        assert!(flag.is_set());
        assert!(flag.try_acquire().is_none());
        assert!(guard.belongs_to(&flag));
        assert!(!guard.belongs_to(&SubmitFlag::new()));

        drop(guard);
        assert!(!flag.is_set());
        assert!(flag.try_acquire().is_some());
    }

    #[tokio::test]
    async fn perform_keeps_flag_until_released() {
        let store = ScriptedStore::succeeding();
        let flag = SubmitFlag::new();
        let guard = flag.try_acquire().expect("claim");

        let completed = perform(&store, "u1", PendingSubmission::new(draft(), guard)).await;
        assert!(flag.is_set());
        assert!(completed.result().is_success());

        completed.release();
        assert!(!flag.is_set());
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn perform_recovers_persistence_errors() {
        let store = ScriptedStore::failing("disk full");
        let flag = SubmitFlag::new();
        let guard = flag.try_acquire().expect("claim");

        let result = perform(&store, "u1", PendingSubmission::new(draft(), guard))
            .await
            .release();
        assert_eq!(result, SubmissionResult::Failure("disk full".to_string()));
        assert!(!flag.is_set());
    }

    #[test]
    fn announce_matches_outcome() {
        let messages = MessagesConfig::default();
        let notifier = RecordingNotifier::default();
        let refresh = RecordingRefresh::default();

        announce(
            &SubmissionResult::Failure("x".to_string()),
            &messages,
            &notifier,
            &refresh,
        );
        assert_eq!(
            notifier.events(),
            vec![(NotificationKind::Failure, messages.failed.clone())]
        );
        assert_eq!(refresh.count(), 0);
    }
}
