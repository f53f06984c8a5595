//! Optimistic like toggling.
//!
//! The toggle is applied to [`ViewerState`] before the remote call is made and
//! rolled back to the last-known-good state if that call fails. Only one
//! toggle may be outstanding at a time; a second one is refused with
//! [`AppError::LikeInFlight`] so two racing calls can never leave the count
//! out of step with anything the server acknowledged.

use super::notify::{Notifier, Toast};
use super::Viewer;
use crate::database::Podcast;
use crate::error::AppError;
use crate::remote::PodcastService;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// What the viewer sees on the like button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViewerState {
    pub is_liked: bool,
    pub like_count: i64,
}

impl ViewerState {
    pub fn new(is_liked: bool, like_count: i64) -> Self {
        Self { is_liked, like_count }
    }

    /// Project authoritative podcast data onto the current viewer.
    pub fn project(podcast: &Podcast, viewer: Option<&Viewer>) -> Self {
        Self {
            is_liked: viewer.is_some_and(|v| podcast.is_liked_by(&v.id)),
            like_count: podcast.likes.len() as i64,
        }
    }

    /// The count never goes below zero, even if it drifted from the server.
    fn toggled(self) -> Self {
        let is_liked = !self.is_liked;
        let like_count = if is_liked {
            self.like_count + 1
        } else {
            (self.like_count - 1).max(0)
        };
        Self { is_liked, like_count }
    }
}

/// A toggle applied locally and awaiting the remote verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLike {
    pub actor_id: String,
    /// Exact state before the toggle; restored on failure.
    pub snapshot: ViewerState,
    pub optimistic: ViewerState,
}

impl PendingLike {
    pub fn settle(&self, confirmed: bool) -> ViewerState {
        if confirmed {
            self.optimistic
        } else {
            self.snapshot
        }
    }
}

/// Compute the optimistic state for a like toggle without touching anything.
pub fn toggle_like(
    current: ViewerState,
    actor_id: Option<&str>,
) -> Result<(ViewerState, PendingLike), AppError> {
    let actor_id = actor_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(AppError::Unauthenticated)?;
    let optimistic = current.toggled();
    Ok((
        optimistic,
        PendingLike {
            actor_id: actor_id.to_string(),
            snapshot: current,
            optimistic,
        },
    ))
}

struct LikeSlot {
    in_flight: bool,
    /// Rollback target for the outstanding call.
    last_good: ViewerState,
}

/// Clears the in-flight flag even if the toggle future is dropped mid-call.
struct InFlight<'a> {
    slot: &'a Mutex<LikeSlot>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.in_flight = false;
        }
    }
}

pub struct LikeController<S> {
    podcast_id: i64,
    service: Arc<S>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<ViewerState>,
    slot: Mutex<LikeSlot>,
    cancel: CancellationToken,
}

impl<S: PodcastService> LikeController<S> {
    pub fn new(
        podcast_id: i64,
        service: Arc<S>,
        notifier: Arc<dyn Notifier>,
        initial: ViewerState,
        cancel: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            podcast_id,
            service,
            notifier,
            state,
            slot: Mutex::new(LikeSlot {
                in_flight: false,
                last_good: initial,
            }),
            cancel,
        }
    }

    pub fn state(&self) -> ViewerState {
        *self.state.borrow()
    }

    /// Repaint hook: yields every state the button should show.
    pub fn subscribe(&self) -> watch::Receiver<ViewerState> {
        self.state.subscribe()
    }

    /// True while a toggle is waiting on the service; the button should be disabled.
    pub fn is_busy(&self) -> bool {
        self.slot.lock().unwrap().in_flight
    }

    /// Re-project from fresh podcast data or a viewer change.
    ///
    /// Arriving mid-call, this also becomes the rollback target, since it is
    /// newer than the pre-toggle snapshot.
    pub fn sync(&self, podcast: &Podcast, viewer: Option<&Viewer>) {
        let projected = ViewerState::project(podcast, viewer);
        let mut slot = self.slot.lock().unwrap();
        slot.last_good = projected;
        self.state.send_replace(projected);
    }

    pub async fn toggle(&self, viewer: Option<&Viewer>) -> Result<ViewerState, AppError> {
        let (optimistic, pending, _in_flight) = {
            let mut slot = self.slot.lock().unwrap();
            let current = *self.state.borrow();
            let (optimistic, pending) = match toggle_like(current, viewer.map(|v| v.id.as_str())) {
                Ok(next) => next,
                Err(e) => {
                    log::info!("Like on podcast {} blocked: not signed in", self.podcast_id);
                    self.notifier
                        .notify(Toast::destructive("Please sign in to like podcasts"));
                    return Err(e);
                }
            };
            if slot.in_flight {
                log::debug!("Like on podcast {} ignored, previous call in flight", self.podcast_id);
                return Err(AppError::LikeInFlight);
            }
            slot.in_flight = true;
            slot.last_good = pending.snapshot;
            self.state.send_replace(optimistic);
            (optimistic, pending, InFlight { slot: &self.slot })
        };

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                log::debug!("Like call for podcast {} discarded, view closed", self.podcast_id);
                return Ok(self.state());
            }
            result = self.service.set_like_status(self.podcast_id, &pending.actor_id) => result,
        };

        match result {
            Ok(status) => {
                if status.liked != optimistic.is_liked || status.like_count != optimistic.like_count {
                    log::debug!(
                        "Podcast {} server like state {:?} differs from optimistic {:?}; waiting for refresh",
                        self.podcast_id,
                        status,
                        optimistic
                    );
                }
                Ok(self.state())
            }
            Err(e) => {
                let rollback = {
                    let slot = self.slot.lock().unwrap();
                    slot.last_good
                };
                self.state.send_replace(rollback);
                log::error!("Error liking podcast {}: {}", self.podcast_id, e);
                self.notifier
                    .notify(Toast::destructive("Failed to update like status"));
                Err(AppError::remote(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{LikeStatus, NewReport};
    use crate::detail::notify::{ToastChannel, ToastVariant};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Service whose like calls block on `gate` and answer from a script.
    #[derive(Default)]
    struct ScriptedService {
        gate: Option<Arc<Notify>>,
        like_results: Mutex<VecDeque<Result<LikeStatus, AppError>>>,
        like_calls: AtomicUsize,
    }

    impl ScriptedService {
        fn answering(results: Vec<Result<LikeStatus, AppError>>) -> Self {
            Self {
                like_results: Mutex::new(results.into()),
                ..Default::default()
            }
        }

        fn gated(results: Vec<Result<LikeStatus, AppError>>, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::answering(results)
            }
        }
    }

    impl PodcastService for ScriptedService {
        async fn fetch_podcast(&self, _podcast_id: i64) -> Result<Option<Podcast>, AppError> {
            Ok(None)
        }

        async fn set_like_status(&self, _podcast_id: i64, _actor_id: &str) -> Result<LikeStatus, AppError> {
            self.like_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.like_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(AppError::RemoteCallFailed("unscripted".into())))
        }

        async fn delete_podcast(
            &self,
            _podcast_id: i64,
            _image_storage_id: Option<String>,
            _audio_storage_id: Option<String>,
        ) -> Result<(), AppError> {
            Ok(())
        }

        async fn submit_report(&self, _report: NewReport) -> Result<i64, AppError> {
            Ok(1)
        }
    }

    fn viewer(id: &str) -> Viewer {
        Viewer {
            id: id.to_string(),
            image_url: String::new(),
        }
    }

    fn ok(liked: bool, like_count: i64) -> Result<LikeStatus, AppError> {
        Ok(LikeStatus { liked, like_count })
    }

    fn failed() -> Result<LikeStatus, AppError> {
        Err(AppError::RemoteCallFailed("503".into()))
    }

    fn setup(
        service: ScriptedService,
        initial: ViewerState,
    ) -> (
        Arc<LikeController<ScriptedService>>,
        Arc<ScriptedService>,
        tokio::sync::mpsc::UnboundedReceiver<Toast>,
    ) {
        let service = Arc::new(service);
        let (notifier, toasts) = ToastChannel::new();
        let controller = LikeController::new(
            1,
            service.clone(),
            Arc::new(notifier),
            initial,
            CancellationToken::new(),
        );
        (Arc::new(controller), service, toasts)
    }

    fn podcast_with_likes(likes: &[&str]) -> Podcast {
        Podcast {
            id: 1,
            user_id: 1,
            podcast_title: "Tides".into(),
            podcast_description: String::new(),
            audio_url: None,
            audio_storage_id: None,
            image_url: None,
            image_storage_id: None,
            author: "Mara".into(),
            author_id: "user_mara".into(),
            author_image_url: String::new(),
            voice_prompt: String::new(),
            image_prompt: String::new(),
            voice_type: String::new(),
            audio_duration: 0.0,
            views: 0,
            podcast_type: None,
            likes: likes.iter().map(|s| s.to_string()).collect(),
            like_count: likes.len() as i64,
            average_rating: None,
            rating_count: 0,
            language: None,
            created_at: String::new(),
        }
    }

    // =========================================================================
    // Pure toggle
    // =========================================================================

    #[test]
    fn test_toggle_like_increments_and_keeps_snapshot() {
        let (next, pending) = toggle_like(ViewerState::new(false, 5), Some("user_jo")).unwrap();
        assert_eq!(next, ViewerState::new(true, 6));
        assert_eq!(pending.snapshot, ViewerState::new(false, 5));
        assert_eq!(pending.settle(true), ViewerState::new(true, 6));
        assert_eq!(pending.settle(false), ViewerState::new(false, 5));
    }

    #[test]
    fn test_toggle_like_without_actor_is_unauthenticated() {
        assert!(matches!(
            toggle_like(ViewerState::new(false, 5), None),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            toggle_like(ViewerState::new(false, 5), Some("  ")),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn test_unlike_saturates_at_zero() {
        let (next, _) = toggle_like(ViewerState::new(true, 0), Some("user_jo")).unwrap();
        assert_eq!(next, ViewerState::new(false, 0));
    }

    #[test]
    fn test_project_uses_viewer_membership() {
        let podcast = podcast_with_likes(&["user_jo", "user_kai"]);
        assert_eq!(
            ViewerState::project(&podcast, Some(&viewer("user_jo"))),
            ViewerState::new(true, 2)
        );
        assert_eq!(
            ViewerState::project(&podcast, Some(&viewer("user_sol"))),
            ViewerState::new(false, 2)
        );
        assert_eq!(ViewerState::project(&podcast, None), ViewerState::new(false, 2));
    }

    // =========================================================================
    // Controller
    // =========================================================================

    #[tokio::test]
    async fn test_optimistic_state_visible_before_remote_resolves() {
        let gate = Arc::new(Notify::new());
        let (controller, _service, _toasts) = setup(
            ScriptedService::gated(vec![failed()], gate.clone()),
            ViewerState::new(false, 5),
        );
        let mut rx = controller.subscribe();

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.toggle(Some(&viewer("user_jo"))).await }
        });

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ViewerState::new(true, 6));
        assert!(controller.is_busy());

        gate.notify_one();
        let result = task.await.unwrap();
        assert!(matches!(result, Err(AppError::RemoteCallFailed(_))));
        assert_eq!(controller.state(), ViewerState::new(false, 5));
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_failure_restores_exact_snapshot_and_toasts() {
        let (controller, _service, mut toasts) =
            setup(ScriptedService::answering(vec![failed()]), ViewerState::new(false, 5));

        let err = controller.toggle(Some(&viewer("user_jo"))).await.unwrap_err();
        assert!(matches!(err, AppError::RemoteCallFailed(_)));
        assert_eq!(controller.state(), ViewerState::new(false, 5));

        let toast = toasts.try_recv().unwrap();
        assert_eq!(toast.title, "Failed to update like status");
        assert_eq!(toast.variant, ToastVariant::Destructive);
    }

    #[tokio::test]
    async fn test_success_keeps_optimistic_state() {
        let (controller, _service, mut toasts) = setup(
            ScriptedService::answering(vec![ok(false, 2)]),
            ViewerState::new(true, 3),
        );

        let state = controller.toggle(Some(&viewer("user_jo"))).await.unwrap();
        assert_eq!(state, ViewerState::new(false, 2));
        assert_eq!(controller.state(), ViewerState::new(false, 2));
        assert!(toasts.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unauthenticated_never_mutates_or_calls() {
        let (controller, service, mut toasts) =
            setup(ScriptedService::answering(vec![ok(true, 6)]), ViewerState::new(false, 5));
        let rx = controller.subscribe();

        let err = controller.toggle(None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        assert_eq!(controller.state(), ViewerState::new(false, 5));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(service.like_calls.load(Ordering::SeqCst), 0);

        let toast = toasts.try_recv().unwrap();
        assert_eq!(toast.title, "Please sign in to like podcasts");
    }

    #[tokio::test]
    async fn test_second_toggle_while_in_flight_is_refused() {
        let gate = Arc::new(Notify::new());
        let (controller, service, _toasts) = setup(
            ScriptedService::gated(vec![ok(true, 6)], gate.clone()),
            ViewerState::new(false, 5),
        );
        let mut rx = controller.subscribe();

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.toggle(Some(&viewer("user_jo"))).await }
        });
        rx.changed().await.unwrap();

        let err = controller.toggle(Some(&viewer("user_jo"))).await.unwrap_err();
        assert!(matches!(err, AppError::LikeInFlight));
        assert_eq!(controller.state(), ViewerState::new(true, 6));

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(service.like_calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), ViewerState::new(true, 6));
    }

    #[tokio::test]
    async fn test_rollback_prefers_sync_that_arrived_mid_call() {
        let gate = Arc::new(Notify::new());
        let (controller, _service, _toasts) = setup(
            ScriptedService::gated(vec![failed()], gate.clone()),
            ViewerState::new(false, 5),
        );
        let mut rx = controller.subscribe();

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.toggle(Some(&viewer("user_jo"))).await }
        });
        rx.changed().await.unwrap();

        // Someone else liked it meanwhile; live data now says 7 likes, not ours
        let fresh = podcast_with_likes(&["a", "b", "c", "d", "e", "f", "g"]);
        controller.sync(&fresh, Some(&viewer("user_jo")));

        gate.notify_one();
        assert!(task.await.unwrap().is_err());
        assert_eq!(controller.state(), ViewerState::new(false, 7));
    }

    #[tokio::test]
    async fn test_end_to_end_sequence() {
        let (controller, _service, _toasts) = setup(
            ScriptedService::answering(vec![failed()]),
            ViewerState::new(false, 5),
        );
        assert!(controller.toggle(Some(&viewer("user_jo"))).await.is_err());
        assert_eq!(controller.state(), ViewerState::new(false, 5));

        let (controller, _service, _toasts) = setup(
            ScriptedService::answering(vec![ok(false, 2)]),
            ViewerState::new(true, 3),
        );
        controller.toggle(Some(&viewer("user_jo"))).await.unwrap();
        assert_eq!(controller.state(), ViewerState::new(false, 2));
    }

    #[tokio::test]
    async fn test_cancelled_view_discards_result() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(ScriptedService::gated(vec![failed()], gate.clone()));
        let (notifier, mut toasts) = ToastChannel::new();
        let cancel = CancellationToken::new();
        let controller = Arc::new(LikeController::new(
            1,
            service,
            Arc::new(notifier),
            ViewerState::new(false, 5),
            cancel.clone(),
        ));
        let mut rx = controller.subscribe();

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.toggle(Some(&viewer("user_jo"))).await }
        });
        rx.changed().await.unwrap();

        cancel.cancel();
        let state = task.await.unwrap().unwrap();
        assert_eq!(state, ViewerState::new(true, 6));
        assert!(!controller.is_busy());
        assert!(toasts.try_recv().is_err());
    }
}
