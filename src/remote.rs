//! The remote data service boundary.
//!
//! Detail-page controllers only see [`PodcastService`]; whether it is backed
//! by the local SQLite store or something across the network is invisible to
//! them. Every failure crossing this boundary surfaces as
//! [`AppError::RemoteCallFailed`].

use crate::commands;
use crate::database::{Database, LikeStatus, NewReport, Podcast};
use crate::error::AppError;
use std::future::Future;
use std::sync::Arc;

pub trait PodcastService: Send + Sync + 'static {
    /// Authoritative podcast data, `None` once it has been deleted.
    fn fetch_podcast(
        &self,
        podcast_id: i64,
    ) -> impl Future<Output = Result<Option<Podcast>, AppError>> + Send;

    /// Toggle `actor_id`'s like. The returned status is server truth.
    fn set_like_status(
        &self,
        podcast_id: i64,
        actor_id: &str,
    ) -> impl Future<Output = Result<LikeStatus, AppError>> + Send;

    fn delete_podcast(
        &self,
        podcast_id: i64,
        image_storage_id: Option<String>,
        audio_storage_id: Option<String>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn submit_report(&self, report: NewReport) -> impl Future<Output = Result<i64, AppError>> + Send;
}

/// [`PodcastService`] over the local database, routed through the command layer.
#[derive(Clone)]
pub struct LocalBackend {
    db: Arc<Database>,
}

impl LocalBackend {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

impl PodcastService for LocalBackend {
    #[tracing::instrument(skip(self))]
    async fn fetch_podcast(&self, podcast_id: i64) -> Result<Option<Podcast>, AppError> {
        commands::get_podcast_by_id(&self.db, podcast_id)
            .await
            .map_err(AppError::remote)
    }

    #[tracing::instrument(skip(self))]
    async fn set_like_status(&self, podcast_id: i64, actor_id: &str) -> Result<LikeStatus, AppError> {
        commands::like_podcast(&self.db, podcast_id, actor_id.to_string())
            .await
            .map_err(AppError::remote)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_podcast(
        &self,
        podcast_id: i64,
        image_storage_id: Option<String>,
        audio_storage_id: Option<String>,
    ) -> Result<(), AppError> {
        commands::delete_podcast(&self.db, podcast_id, image_storage_id, audio_storage_id)
            .await
            .map_err(AppError::remote)
    }

    #[tracing::instrument(skip(self, report), fields(podcast_id = report.podcast_id))]
    async fn submit_report(&self, report: NewReport) -> Result<i64, AppError> {
        commands::create_report(&self.db, report)
            .await
            .map_err(AppError::remote)
    }
}
