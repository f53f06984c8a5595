use crate::database::{Database, LikeStatus, NewPodcast, Podcast};
use crate::error::AppError;

/// Fetch a single podcast, `None` if it does not exist
pub async fn get_podcast_by_id(db: &Database, podcast_id: i64) -> Result<Option<Podcast>, AppError> {
    db.get_podcast_by_id(podcast_id).map_err(AppError::from)
}

/// Create a podcast record from already-uploaded media
///
/// The owning user row is resolved from `author_id`; any `user_id` passed in
/// is replaced.
pub async fn create_podcast(db: &Database, mut podcast: NewPodcast) -> Result<i64, AppError> {
    if podcast.podcast_title.trim().is_empty() {
        return Err(AppError::Invalid("podcast title is required".to_string()));
    }
    if podcast.author_id.trim().is_empty() {
        return Err(AppError::Invalid("author id is required".to_string()));
    }
    let user = db
        .get_user_by_clerk_id(&podcast.author_id)?
        .ok_or_else(|| AppError::NotFound(format!("user {}", podcast.author_id)))?;
    podcast.user_id = user.id;
    log::info!(
        "Creating podcast \"{}\" for author {}",
        podcast.podcast_title,
        podcast.author_id
    );
    db.create_podcast(&podcast).map_err(AppError::from)
}

/// Toggle the caller's like on a podcast
pub async fn like_podcast(db: &Database, podcast_id: i64, user_id: String) -> Result<LikeStatus, AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::Unauthenticated);
    }
    let status = db.like_podcast(podcast_id, &user_id)?;
    log::info!(
        "Podcast {} {} by {} (count: {})",
        podcast_id,
        if status.liked { "liked" } else { "unliked" },
        user_id,
        status.like_count
    );
    Ok(status)
}

/// Delete a podcast together with its image and audio blobs
pub async fn delete_podcast(
    db: &Database,
    podcast_id: i64,
    image_storage_id: Option<String>,
    audio_storage_id: Option<String>,
) -> Result<(), AppError> {
    log::info!(
        "Deleting podcast {} (image: {:?}, audio: {:?})",
        podcast_id,
        image_storage_id,
        audio_storage_id
    );
    db.delete_podcast(podcast_id, image_storage_id.as_deref(), audio_storage_id.as_deref())
        .map_err(AppError::from)
}

/// Search by author, title, then description
pub async fn search_podcasts(
    db: &Database,
    query: String,
    limit: Option<i64>,
) -> Result<Vec<Podcast>, AppError> {
    db.search_podcasts(&query, limit.unwrap_or(50))
        .map_err(AppError::from)
}

pub async fn get_podcasts_by_author(db: &Database, author_id: String) -> Result<Vec<Podcast>, AppError> {
    db.get_podcasts_by_author(&author_id).map_err(AppError::from)
}

/// Count a play; returns the new view total
pub async fn increment_views(db: &Database, podcast_id: i64) -> Result<i64, AppError> {
    db.increment_views(podcast_id).map_err(AppError::from)
}
