//! Controllers behind the podcast detail page.
//!
//! Nothing here reaches for ambient state: the viewer, the data service, the
//! host platform and the toast sink are all handed in, so every piece can be
//! driven from a test.

pub mod like;
pub mod notify;
pub mod player;
pub mod report;
pub mod share;

use crate::config::AppConfig;
use crate::database::Podcast;
use crate::error::AppError;
use crate::remote::PodcastService;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use like::{LikeController, ViewerState};
use notify::{Notifier, Toast};
use player::{AudioPlayer, AudioTrack};
use report::ReportForm;
use share::{ShareController, ShareOutcome, SharePayload, SharePlatform, ShareSettings};

/// The signed-in user, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: String,
    pub image_url: String,
}

/// Everything the page is rendered from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastDetailProps {
    pub podcast_id: i64,
    pub podcast_title: String,
    pub author: String,
    pub author_id: String,
    pub audio_url: String,
    pub image_url: Option<String>,
    pub author_image_url: Option<String>,
    pub image_storage_id: Option<String>,
    pub audio_storage_id: Option<String>,
    pub is_owner: bool,
    pub likes: Vec<String>,
}

impl PodcastDetailProps {
    pub fn from_podcast(podcast: &Podcast, viewer: Option<&Viewer>) -> Self {
        Self {
            podcast_id: podcast.id,
            podcast_title: podcast.podcast_title.clone(),
            author: podcast.author.clone(),
            author_id: podcast.author_id.clone(),
            audio_url: podcast.audio_url.clone().unwrap_or_default(),
            image_url: podcast.image_url.clone(),
            author_image_url: Some(podcast.author_image_url.clone())
                .filter(|url| !url.is_empty()),
            image_storage_id: podcast.image_storage_id.clone(),
            audio_storage_id: podcast.audio_storage_id.clone(),
            is_owner: viewer.is_some_and(|v| v.id == podcast.author_id),
            likes: podcast.likes.clone(),
        }
    }
}

/// Collaborators the page is wired to.
pub struct DetailContext<S, P> {
    pub service: Arc<S>,
    pub platform: Arc<P>,
    pub notifier: Arc<dyn Notifier>,
    pub player: AudioPlayer,
    pub config: Arc<AppConfig>,
}

impl<S, P> Clone for DetailContext<S, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            platform: self.platform.clone(),
            notifier: self.notifier.clone(),
            player: self.player.clone(),
            config: self.config.clone(),
        }
    }
}

pub struct PodcastDetail<S, P> {
    props: PodcastDetailProps,
    service: Arc<S>,
    notifier: Arc<dyn Notifier>,
    player: AudioPlayer,
    config: Arc<AppConfig>,
    like: LikeController<S>,
    share: ShareController<P>,
    deleting: AtomicBool,
    cancel: CancellationToken,
}

impl<S: PodcastService, P: SharePlatform> PodcastDetail<S, P> {
    pub fn new(props: PodcastDetailProps, ctx: DetailContext<S, P>) -> Self {
        let cancel = CancellationToken::new();
        // Until live data arrives all we know is the like list in the props.
        let initial = ViewerState::new(false, props.likes.len() as i64);
        let like = LikeController::new(
            props.podcast_id,
            ctx.service.clone(),
            ctx.notifier.clone(),
            initial,
            cancel.child_token(),
        );
        let share = ShareController::new(
            ctx.platform,
            ctx.notifier.clone(),
            ShareSettings::from(ctx.config.as_ref()),
        );
        Self {
            props,
            service: ctx.service,
            notifier: ctx.notifier,
            player: ctx.player,
            config: ctx.config,
            like,
            share,
            deleting: AtomicBool::new(false),
            cancel,
        }
    }

    pub fn props(&self) -> &PodcastDetailProps {
        &self.props
    }

    /// Images are required before the page is shown; until then it is a spinner.
    pub fn is_ready(&self) -> bool {
        let present = |url: &Option<String>| url.as_deref().is_some_and(|u| !u.is_empty());
        present(&self.props.image_url) && present(&self.props.author_image_url)
    }

    pub fn can_delete(&self) -> bool {
        self.props.is_owner
    }

    pub fn can_report(&self) -> bool {
        !self.props.is_owner
    }

    // ── Playback ──────────────────────────────────────────────────────────

    pub fn play(&self) {
        self.player.play(AudioTrack {
            title: self.props.podcast_title.clone(),
            audio_url: self.props.audio_url.clone(),
            image_url: self.props.image_url.clone().unwrap_or_default(),
            author: self.props.author.clone(),
            podcast_id: self.props.podcast_id,
        });
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing(self.props.podcast_id)
    }

    // ── Likes ─────────────────────────────────────────────────────────────

    pub fn like_state(&self) -> ViewerState {
        self.like.state()
    }

    pub fn subscribe_like(&self) -> watch::Receiver<ViewerState> {
        self.like.subscribe()
    }

    pub fn is_like_busy(&self) -> bool {
        self.like.is_busy()
    }

    pub async fn like(&self, viewer: Option<&Viewer>) -> Result<ViewerState, AppError> {
        self.like.toggle(viewer).await
    }

    /// Pull fresh podcast data and re-project the like state for `viewer`.
    ///
    /// Returns `None` once the podcast no longer exists.
    pub async fn refresh(&self, viewer: Option<&Viewer>) -> Result<Option<Podcast>, AppError> {
        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(None),
            fetched = self.service.fetch_podcast(self.props.podcast_id) => fetched,
        };
        match fetched {
            Ok(Some(podcast)) => {
                self.like.sync(&podcast, viewer);
                Ok(Some(podcast))
            }
            Ok(None) => {
                log::info!("Podcast {} no longer exists", self.props.podcast_id);
                Ok(None)
            }
            Err(e) => {
                log::warn!("Failed to refresh podcast {}: {}", self.props.podcast_id, e);
                Err(AppError::remote(e))
            }
        }
    }

    // ── Sharing ───────────────────────────────────────────────────────────

    pub fn is_copied(&self) -> bool {
        self.share.is_copied()
    }

    pub fn subscribe_copied(&self) -> watch::Receiver<bool> {
        self.share.subscribe()
    }

    pub fn share_payload(&self) -> SharePayload {
        SharePayload::for_podcast(
            &self.config,
            &self.props.podcast_title,
            &self.props.author,
            self.share.platform().current_url(),
        )
    }

    pub async fn share(&self) -> ShareOutcome {
        let payload = self.share_payload();
        self.share.share(&payload).await
    }

    // ── Owner / moderation actions ────────────────────────────────────────

    pub fn is_deleting(&self) -> bool {
        self.deleting.load(Ordering::SeqCst)
    }

    /// Delete the podcast. On success the caller should navigate away.
    pub async fn delete(&self) -> Result<(), AppError> {
        if !self.props.is_owner {
            return Err(AppError::Invalid("only the owner can delete this podcast".to_string()));
        }
        if self.deleting.swap(true, Ordering::SeqCst) {
            return Err(AppError::Invalid("delete already in progress".to_string()));
        }

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                log::debug!("Delete of podcast {} discarded, view closed", self.props.podcast_id);
                return Ok(());
            }
            result = self.service.delete_podcast(
                self.props.podcast_id,
                self.props.image_storage_id.clone(),
                self.props.audio_storage_id.clone(),
            ) => result,
        };

        match result {
            Ok(()) => {
                log::info!("Podcast {} deleted", self.props.podcast_id);
                if self.is_playing() {
                    self.player.stop();
                }
                Ok(())
            }
            Err(e) => {
                self.deleting.store(false, Ordering::SeqCst);
                log::error!("Error deleting podcast {}: {}", self.props.podcast_id, e);
                self.notifier
                    .notify(Toast::destructive("Failed to delete podcast"));
                Err(AppError::remote(e))
            }
        }
    }

    pub async fn report(&self, form: ReportForm, viewer: Option<&Viewer>) -> Result<i64, AppError> {
        if !self.can_report() {
            return Err(AppError::Invalid("you cannot report your own podcast".to_string()));
        }
        report::submit(
            self.service.as_ref(),
            self.notifier.as_ref(),
            form,
            self.props.podcast_id,
            &self.props.podcast_title,
            viewer,
        )
        .await
    }

    /// Tear the page down: outstanding calls are discarded and the
    /// "Copied!" timer is dropped.
    pub fn close(&self) {
        self.cancel.cancel();
        self.share.cancel_reset();
    }
}

impl<S, P> Drop for PodcastDetail<S, P> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests;
