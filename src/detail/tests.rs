use super::*;
use crate::database::{Database, LikeStatus, NewPodcast, NewReport, ReportType};
use crate::detail::notify::{ToastChannel, ToastVariant};
use crate::remote::LocalBackend;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

const PAGE_URL: &str = "https://podtales.example/podcasts/1";

#[derive(Default)]
struct FakePlatform {
    clipboard: Mutex<Vec<String>>,
}

impl SharePlatform for FakePlatform {
    fn native_share_available(&self) -> bool {
        false
    }

    async fn native_share(&self, _payload: &SharePayload) -> Result<(), AppError> {
        Err(AppError::Platform("unsupported".into()))
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), AppError> {
        self.clipboard.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn current_url(&self) -> String {
        PAGE_URL.to_string()
    }
}

/// Backend that is down.
struct DownService;

impl PodcastService for DownService {
    async fn fetch_podcast(&self, _podcast_id: i64) -> Result<Option<Podcast>, AppError> {
        Err(AppError::RemoteCallFailed("503".into()))
    }

    async fn set_like_status(&self, _podcast_id: i64, _actor_id: &str) -> Result<LikeStatus, AppError> {
        Err(AppError::RemoteCallFailed("503".into()))
    }

    async fn delete_podcast(
        &self,
        _podcast_id: i64,
        _image_storage_id: Option<String>,
        _audio_storage_id: Option<String>,
    ) -> Result<(), AppError> {
        Err(AppError::RemoteCallFailed("503".into()))
    }

    async fn submit_report(&self, _report: NewReport) -> Result<i64, AppError> {
        Err(AppError::RemoteCallFailed("503".into()))
    }
}

fn viewer(id: &str) -> Viewer {
    Viewer {
        id: id.to_string(),
        image_url: String::new(),
    }
}

fn seeded_backend() -> (Arc<LocalBackend>, Podcast, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
    let user_id = db
        .upsert_user("user_mara", "mara@example.com", "Mara", "https://img.example/mara.png")
        .unwrap();
    let id = db
        .create_podcast(&NewPodcast {
            user_id,
            podcast_title: "Tides".to_string(),
            author: "Mara".to_string(),
            author_id: "user_mara".to_string(),
            author_image_url: "https://img.example/mara.png".to_string(),
            image_url: Some("https://img.example/tides.png".to_string()),
            audio_url: Some("https://cdn.example/tides.mp3".to_string()),
            ..Default::default()
        })
        .unwrap();
    db.like_podcast(id, "user_kai").unwrap();
    let podcast = db.get_podcast_by_id(id).unwrap().unwrap();
    (Arc::new(LocalBackend::new(Arc::new(db))), podcast, temp_dir)
}

fn open<S: PodcastService>(
    service: Arc<S>,
    props: PodcastDetailProps,
) -> (PodcastDetail<S, FakePlatform>, AudioPlayer, UnboundedReceiver<Toast>) {
    let (notifier, toasts) = ToastChannel::new();
    let player = AudioPlayer::new();
    let ctx = DetailContext {
        service,
        platform: Arc::new(FakePlatform::default()),
        notifier: Arc::new(notifier),
        player: player.clone(),
        config: Arc::new(AppConfig::default()),
    };
    (PodcastDetail::new(props, ctx), player, toasts)
}

#[test]
fn test_props_mark_owner_only_for_author() {
    let (_backend, podcast, _temp) = seeded_backend();
    assert!(PodcastDetailProps::from_podcast(&podcast, Some(&viewer("user_mara"))).is_owner);
    assert!(!PodcastDetailProps::from_podcast(&podcast, Some(&viewer("user_jo"))).is_owner);
    assert!(!PodcastDetailProps::from_podcast(&podcast, None).is_owner);
}

#[tokio::test]
async fn test_ready_only_with_both_images() {
    let (backend, podcast, _temp) = seeded_backend();
    let mut props = PodcastDetailProps::from_podcast(&podcast, None);
    let (detail, _player, _toasts) = open(backend.clone(), props.clone());
    assert!(detail.is_ready());

    props.author_image_url = None;
    let (detail, _player, _toasts) = open(backend, props);
    assert!(!detail.is_ready());
}

#[tokio::test]
async fn test_initial_like_state_counts_props_likes() {
    let (backend, podcast, _temp) = seeded_backend();
    let props = PodcastDetailProps::from_podcast(&podcast, Some(&viewer("user_kai")));
    let (detail, _player, _toasts) = open(backend, props);

    // Membership is only known once live data is projected for the viewer
    assert_eq!(detail.like_state(), ViewerState::new(false, 1));
}

#[tokio::test]
async fn test_like_then_refresh_reconciles_with_server() {
    let (backend, podcast, _temp) = seeded_backend();
    let jo = viewer("user_jo");
    let (detail, _player, _toasts) =
        open(backend.clone(), PodcastDetailProps::from_podcast(&podcast, Some(&jo)));

    let state = detail.like(Some(&jo)).await.unwrap();
    assert_eq!(state, ViewerState::new(true, 2));
    assert!(!detail.is_like_busy());

    let fresh = detail.refresh(Some(&jo)).await.unwrap().unwrap();
    assert!(fresh.is_liked_by("user_jo"));
    assert_eq!(detail.like_state(), ViewerState::new(true, 2));

    // Signing out re-projects without the viewer
    detail.refresh(None).await.unwrap();
    assert_eq!(detail.like_state(), ViewerState::new(false, 2));
}

#[tokio::test]
async fn test_like_failure_rolls_back_and_toasts() {
    let (_backend, podcast, _temp) = seeded_backend();
    let jo = viewer("user_jo");
    let (detail, _player, mut toasts) =
        open(Arc::new(DownService), PodcastDetailProps::from_podcast(&podcast, Some(&jo)));

    let err = detail.like(Some(&jo)).await.unwrap_err();
    assert!(matches!(err, AppError::RemoteCallFailed(_)));
    assert_eq!(detail.like_state(), ViewerState::new(false, 1));
    assert_eq!(toasts.try_recv().unwrap().title, "Failed to update like status");
}

#[tokio::test]
async fn test_play_puts_podcast_in_the_player() {
    let (backend, podcast, _temp) = seeded_backend();
    let (detail, player, _toasts) = open(backend, PodcastDetailProps::from_podcast(&podcast, None));
    assert!(!detail.is_playing());

    detail.play();
    let track = player.now_playing().unwrap();
    assert_eq!(track.podcast_id, podcast.id);
    assert_eq!(track.audio_url, "https://cdn.example/tides.mp3");
    assert_eq!(track.author, "Mara");
    assert!(detail.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_share_copies_page_url() {
    let (_backend, podcast, _temp) = seeded_backend();
    let (detail, _player, mut toasts) =
        open(Arc::new(DownService), PodcastDetailProps::from_podcast(&podcast, None));

    let payload = detail.share_payload();
    assert_eq!(payload.url, PAGE_URL);
    assert_eq!(payload.text, "Listen to Tides by Mara on PodTales!");

    let mut copied = detail.subscribe_copied();
    let start = tokio::time::Instant::now();
    assert_eq!(detail.share().await, ShareOutcome::Copied);
    assert!(detail.is_copied());
    assert_eq!(toasts.try_recv().unwrap().title, "Link Copied!");

    copied.wait_for(|c| !*c).await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_close_drops_copied_timer() {
    let (_backend, podcast, _temp) = seeded_backend();
    let (detail, _player, _toasts) =
        open(Arc::new(DownService), PodcastDetailProps::from_podcast(&podcast, None));

    detail.share().await;
    detail.close();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(detail.is_copied());
}

#[tokio::test]
async fn test_delete_refused_for_non_owner() {
    let (backend, podcast, _temp) = seeded_backend();
    let (detail, _player, _toasts) = open(
        backend.clone(),
        PodcastDetailProps::from_podcast(&podcast, Some(&viewer("user_jo"))),
    );

    assert!(!detail.can_delete());
    assert!(matches!(detail.delete().await, Err(AppError::Invalid(_))));
    assert!(backend.fetch_podcast(podcast.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_owner_delete_removes_podcast_and_stops_playback() {
    let (backend, podcast, _temp) = seeded_backend();
    let (detail, player, _toasts) = open(
        backend.clone(),
        PodcastDetailProps::from_podcast(&podcast, Some(&viewer("user_mara"))),
    );

    detail.play();
    detail.delete().await.unwrap();
    assert!(detail.is_deleting());
    assert!(player.now_playing().is_none());
    assert!(detail.refresh(None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_failure_resets_and_toasts() {
    let (_backend, podcast, _temp) = seeded_backend();
    let (detail, _player, mut toasts) = open(
        Arc::new(DownService),
        PodcastDetailProps::from_podcast(&podcast, Some(&viewer("user_mara"))),
    );

    let err = detail.delete().await.unwrap_err();
    assert!(matches!(err, AppError::RemoteCallFailed(_)));
    assert!(!detail.is_deleting());

    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.title, "Failed to delete podcast");
    assert_eq!(toast.variant, ToastVariant::Destructive);
}

#[tokio::test]
async fn test_owner_cannot_report_own_podcast() {
    let (backend, podcast, _temp) = seeded_backend();
    let mara = viewer("user_mara");
    let (detail, _player, _toasts) =
        open(backend, PodcastDetailProps::from_podcast(&podcast, Some(&mara)));

    let form = ReportForm {
        report_type: Some(ReportType::Offensive),
        ..Default::default()
    };
    assert!(!detail.can_report());
    assert!(matches!(detail.report(form, Some(&mara)).await, Err(AppError::Invalid(_))));
}

#[tokio::test]
async fn test_listener_report_is_stored() {
    let (backend, podcast, _temp) = seeded_backend();
    let jo = viewer("user_jo");
    let (detail, _player, mut toasts) =
        open(backend.clone(), PodcastDetailProps::from_podcast(&podcast, Some(&jo)));

    let form = ReportForm {
        report_type: Some(ReportType::Copyright),
        details: "  Uses my music  ".to_string(),
        contact_email: String::new(),
    };
    detail.report(form, Some(&jo)).await.unwrap();
    assert_eq!(toasts.try_recv().unwrap().title, "Report submitted");

    let reports = backend.database().get_reports_for_podcast(podcast.id).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].report_type, ReportType::Copyright);
    assert_eq!(reports[0].details.as_deref(), Some("Uses my music"));
    assert_eq!(reports[0].reported_by.as_deref(), Some("user_jo"));
}

#[tokio::test]
async fn test_refresh_after_close_is_discarded() {
    let (backend, podcast, _temp) = seeded_backend();
    let (detail, _player, _toasts) = open(backend, PodcastDetailProps::from_podcast(&podcast, None));

    detail.close();
    assert!(detail.refresh(None).await.unwrap().is_none());
}
