use crate::database::{Comment, Database, Notification, Rating, SocialLink, User};
use crate::error::AppError;

// =========================================================================
// Users
// =========================================================================

/// Called whenever the identity provider reports a sign-in
pub async fn sync_user(
    db: &Database,
    clerk_id: String,
    email: String,
    name: String,
    image_url: String,
) -> Result<i64, AppError> {
    if clerk_id.trim().is_empty() {
        return Err(AppError::Unauthenticated);
    }
    db.upsert_user(&clerk_id, &email, &name, &image_url)
        .map_err(AppError::from)
}

pub async fn get_user(db: &Database, clerk_id: String) -> Result<User, AppError> {
    db.get_user_by_clerk_id(&clerk_id)?
        .ok_or_else(|| AppError::NotFound(format!("user {}", clerk_id)))
}

pub async fn update_profile(
    db: &Database,
    clerk_id: String,
    bio: Option<String>,
    website: Option<String>,
    social_links: Vec<SocialLink>,
) -> Result<(), AppError> {
    log::info!("Updating profile for {}", clerk_id);
    db.update_user_profile(&clerk_id, bio.as_deref(), website.as_deref(), &social_links)
        .map_err(AppError::from)
}

pub async fn set_verified(db: &Database, clerk_id: String, verified: bool) -> Result<(), AppError> {
    log::info!("Setting verified={} for {}", verified, clerk_id);
    db.set_user_verified(&clerk_id, verified).map_err(AppError::from)
}

// =========================================================================
// Ratings & comments
// =========================================================================

/// Returns the refreshed (average, count)
pub async fn rate_podcast(
    db: &Database,
    podcast_id: i64,
    user_id: String,
    rating: i32,
) -> Result<(f64, i64), AppError> {
    log::info!("User {} rated podcast {}: {}", user_id, podcast_id, rating);
    db.rate_podcast(podcast_id, &user_id, rating)
        .map_err(AppError::from)
}

pub async fn get_user_rating(
    db: &Database,
    podcast_id: i64,
    user_id: String,
) -> Result<Option<Rating>, AppError> {
    db.get_user_rating(podcast_id, &user_id).map_err(AppError::from)
}

pub async fn add_comment(
    db: &Database,
    podcast_id: i64,
    user_id: String,
    user_name: String,
    user_image_url: String,
    content: String,
) -> Result<i64, AppError> {
    log::info!("Comment on podcast {} by {}", podcast_id, user_id);
    db.add_comment(podcast_id, &user_id, &user_name, &user_image_url, &content)
        .map_err(AppError::from)
}

pub async fn get_comments(db: &Database, podcast_id: i64) -> Result<Vec<Comment>, AppError> {
    db.get_comments(podcast_id).map_err(AppError::from)
}

pub async fn delete_comment(db: &Database, comment_id: i64, user_id: String) -> Result<(), AppError> {
    log::info!("Deleting comment {} (requested by {})", comment_id, user_id);
    db.delete_comment(comment_id, &user_id).map_err(AppError::from)
}

// =========================================================================
// Follows
// =========================================================================

pub async fn follow_user(db: &Database, follower: String, following: String) -> Result<bool, AppError> {
    let created = db.follow_user(&follower, &following)?;
    if created {
        log::info!("{} now follows {}", follower, following);
    }
    Ok(created)
}

pub async fn unfollow_user(db: &Database, follower: String, following: String) -> Result<bool, AppError> {
    let removed = db.unfollow_user(&follower, &following)?;
    if removed {
        log::info!("{} unfollowed {}", follower, following);
    }
    Ok(removed)
}

pub async fn is_following(db: &Database, follower: String, following: String) -> Result<bool, AppError> {
    db.is_following(&follower, &following).map_err(AppError::from)
}

// =========================================================================
// Notifications
// =========================================================================

pub async fn get_notifications(
    db: &Database,
    user_id: String,
    limit: Option<i64>,
) -> Result<Vec<Notification>, AppError> {
    db.get_notifications(&user_id, limit.unwrap_or(50))
        .map_err(AppError::from)
}

pub async fn mark_notification_read(db: &Database, notification_id: i64) -> Result<(), AppError> {
    db.mark_notification_read(notification_id).map_err(AppError::from)
}

pub async fn mark_all_notifications_read(db: &Database, user_id: String) -> Result<usize, AppError> {
    db.mark_all_notifications_read(&user_id).map_err(AppError::from)
}

pub async fn get_unread_notification_count(db: &Database, user_id: String) -> Result<i64, AppError> {
    db.count_unread_notifications(&user_id).map_err(AppError::from)
}
