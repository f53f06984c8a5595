pub mod models;


use crate::error::AppError;
use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub use models::*;

const PODCAST_COLUMNS: &str = "id, user_id, podcast_title, podcast_description, audio_url,
    audio_storage_id, image_url, image_storage_id, author, author_id, author_image_url,
    voice_prompt, image_prompt, voice_type, audio_duration, views, podcast_type, likes,
    like_count, average_rating, rating_count, language, created_at";

const USER_COLUMNS: &str = "id, email, image_url, clerk_id, name, followers_count,
    following_count, bio, website, is_verified, social_links, is_admin";

const REPORT_COLUMNS: &str = "id, podcast_id, podcast_title, report_type, details,
    contact_email, reported_by, status, reviewed_by, review_notes, created_at";

const ADMIN_REQUEST_COLUMNS: &str = "id, user_id, reason, status, created_at, reviewed_at,
    reviewed_by, review_notes";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        // Enable WAL mode for concurrent reads
        conn.execute_batch(
            "
            PRAGMA foreign_keys=ON;
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        ",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL,
                image_url TEXT NOT NULL,
                clerk_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                followers_count INTEGER NOT NULL DEFAULT 0,
                following_count INTEGER NOT NULL DEFAULT 0,
                bio TEXT,
                website TEXT,
                is_verified INTEGER DEFAULT 0,
                social_links TEXT, -- JSON array of {platform, url}
                is_admin INTEGER DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS podcasts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                podcast_title TEXT NOT NULL,
                podcast_description TEXT NOT NULL,
                audio_url TEXT,
                audio_storage_id TEXT,
                image_url TEXT,
                image_storage_id TEXT,
                author TEXT NOT NULL,
                author_id TEXT NOT NULL,
                author_image_url TEXT NOT NULL,
                voice_prompt TEXT NOT NULL,
                image_prompt TEXT NOT NULL,
                voice_type TEXT NOT NULL,
                audio_duration REAL NOT NULL DEFAULT 0,
                views INTEGER NOT NULL DEFAULT 0,
                podcast_type TEXT,
                likes TEXT NOT NULL DEFAULT '[]', -- JSON array of clerk ids
                like_count INTEGER NOT NULL DEFAULT 0,
                average_rating REAL,
                rating_count INTEGER NOT NULL DEFAULT 0,
                language TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_podcasts_author_id ON podcasts(author_id);

            -- Full-text search over author, title and description
            CREATE VIRTUAL TABLE IF NOT EXISTS podcasts_fts USING fts5(
                author,
                podcast_title,
                podcast_description,
                content='podcasts',
                content_rowid='id'
            );

            CREATE TRIGGER IF NOT EXISTS podcasts_ai AFTER INSERT ON podcasts BEGIN
                INSERT INTO podcasts_fts(rowid, author, podcast_title, podcast_description)
                VALUES (new.id, new.author, new.podcast_title, new.podcast_description);
            END;
            CREATE TRIGGER IF NOT EXISTS podcasts_ad AFTER DELETE ON podcasts BEGIN
                INSERT INTO podcasts_fts(podcasts_fts, rowid, author, podcast_title, podcast_description)
                VALUES ('delete', old.id, old.author, old.podcast_title, old.podcast_description);
            END;
            CREATE TRIGGER IF NOT EXISTS podcasts_au
            AFTER UPDATE OF author, podcast_title, podcast_description ON podcasts BEGIN
                INSERT INTO podcasts_fts(podcasts_fts, rowid, author, podcast_title, podcast_description)
                VALUES ('delete', old.id, old.author, old.podcast_title, old.podcast_description);
                INSERT INTO podcasts_fts(rowid, author, podcast_title, podcast_description)
                VALUES (new.id, new.author, new.podcast_title, new.podcast_description);
            END;

            CREATE TABLE IF NOT EXISTS ratings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                podcast_id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                rating INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (podcast_id) REFERENCES podcasts(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_ratings_podcast ON ratings(podcast_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_ratings_user_podcast ON ratings(user_id, podcast_id);

            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                podcast_id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                user_name TEXT NOT NULL,
                user_image_url TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (podcast_id) REFERENCES podcasts(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_comments_podcast ON comments(podcast_id);
            CREATE INDEX IF NOT EXISTS idx_comments_user ON comments(user_id);

            CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                follower TEXT NOT NULL,  -- clerk id of the user following
                following TEXT NOT NULL, -- clerk id of the user being followed
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows(follower);
            CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_follows_pair ON follows(follower, following);

            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                creator_id TEXT NOT NULL,
                message TEXT,
                notification_type TEXT NOT NULL,
                podcast_id INTEGER,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id);
            CREATE INDEX IF NOT EXISTS idx_notifications_creator ON notifications(creator_id);
            CREATE INDEX IF NOT EXISTS idx_notifications_podcast ON notifications(podcast_id);

            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                podcast_id INTEGER NOT NULL,
                podcast_title TEXT NOT NULL,
                report_type TEXT NOT NULL, -- inappropriate, copyright, offensive, misinformation, other
                details TEXT,
                contact_email TEXT,
                reported_by TEXT,
                status TEXT NOT NULL DEFAULT 'pending', -- pending, reviewed, resolved, dismissed
                reviewed_by TEXT,
                review_notes TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status);
            CREATE INDEX IF NOT EXISTS idx_reports_podcast ON reports(podcast_id);

            CREATE TABLE IF NOT EXISTS admin_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                reason TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending', -- pending, approved, rejected
                created_at TEXT NOT NULL,
                reviewed_at TEXT,
                reviewed_by TEXT,
                review_notes TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_admin_requests_user ON admin_requests(user_id, status);

            -- Uploaded image/audio blobs referenced by podcasts
            CREATE TABLE IF NOT EXISTS storage_files (
                id TEXT PRIMARY KEY,
                content_type TEXT NOT NULL,
                data BLOB NOT NULL,
                created_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    // =========================================================================
    // Podcasts
    // =========================================================================

    pub fn create_podcast(&self, podcast: &NewPodcast) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO podcasts (user_id, podcast_title, podcast_description, audio_url,
                audio_storage_id, image_url, image_storage_id, author, author_id,
                author_image_url, voice_prompt, image_prompt, voice_type, audio_duration,
                podcast_type, language, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                podcast.user_id,
                podcast.podcast_title,
                podcast.podcast_description,
                podcast.audio_url,
                podcast.audio_storage_id,
                podcast.image_url,
                podcast.image_storage_id,
                podcast.author,
                podcast.author_id,
                podcast.author_image_url,
                podcast.voice_prompt,
                podcast.image_prompt,
                podcast.voice_type,
                podcast.audio_duration,
                podcast.podcast_type,
                podcast.language,
                now
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_podcast_by_id(&self, id: i64) -> Result<Option<Podcast>> {
        let conn = self.conn.lock().unwrap();
        let podcast = conn
            .query_row(
                &format!("SELECT {} FROM podcasts WHERE id = ?", PODCAST_COLUMNS),
                params![id],
                row_to_podcast,
            )
            .optional()?;
        Ok(podcast)
    }

    pub fn get_podcasts_by_author(&self, author_id: &str) -> Result<Vec<Podcast>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM podcasts WHERE author_id = ? ORDER BY id DESC",
            PODCAST_COLUMNS
        ))?;
        let rows = stmt.query_map(params![author_id], row_to_podcast)?;
        let mut podcasts = Vec::new();
        for row in rows {
            podcasts.push(row?);
        }
        Ok(podcasts)
    }

    /// Search podcasts by author, then title, then description.
    ///
    /// Each token is matched as a prefix. An empty query lists everything,
    /// newest first.
    pub fn search_podcasts(&self, query: &str, limit: i64) -> Result<Vec<Podcast>> {
        let conn = self.conn.lock().unwrap();

        let Some(fts_query) = fts_prefix_query(query) else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM podcasts ORDER BY id DESC LIMIT ?",
                PODCAST_COLUMNS
            ))?;
            let rows = stmt.query_map(params![limit], row_to_podcast)?;
            let mut podcasts = Vec::new();
            for row in rows {
                podcasts.push(row?);
            }
            return Ok(podcasts);
        };

        let mut podcasts: Vec<Podcast> = Vec::new();
        for column in ["author", "podcast_title", "podcast_description"] {
            let sql = format!(
                "SELECT {} FROM podcasts WHERE id IN (
                     SELECT rowid FROM podcasts_fts WHERE {} MATCH ?
                 ) ORDER BY id DESC",
                PODCAST_COLUMNS, column
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![fts_query], row_to_podcast)?;
            for row in rows {
                let podcast = row?;
                if !podcasts.iter().any(|p| p.id == podcast.id) {
                    podcasts.push(podcast);
                }
            }
        }
        podcasts.truncate(limit.max(0) as usize);
        Ok(podcasts)
    }

    pub fn increment_views(&self, id: i64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE podcasts SET views = views + 1 WHERE id = ?",
            params![id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("podcast {}", id)).into());
        }
        let views = conn.query_row(
            "SELECT views FROM podcasts WHERE id = ?",
            params![id],
            |row| row.get(0),
        )?;
        Ok(views)
    }

    /// Delete a podcast with its uploaded files and everything hanging off it.
    pub fn delete_podcast(
        &self,
        id: i64,
        image_storage_id: Option<&str>,
        audio_storage_id: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row("SELECT id FROM podcasts WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("podcast {}", id)).into());
        }

        for storage_id in [image_storage_id, audio_storage_id].into_iter().flatten() {
            tx.execute("DELETE FROM storage_files WHERE id = ?", params![storage_id])?;
        }
        tx.execute("DELETE FROM ratings WHERE podcast_id = ?", params![id])?;
        tx.execute("DELETE FROM comments WHERE podcast_id = ?", params![id])?;
        tx.execute("DELETE FROM reports WHERE podcast_id = ?", params![id])?;
        tx.execute("DELETE FROM notifications WHERE podcast_id = ?", params![id])?;
        tx.execute("DELETE FROM podcasts WHERE id = ?", params![id])?;

        tx.commit()?;
        Ok(())
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Toggle `user_id` in the podcast's like list.
    ///
    /// `like_count` is rewritten from the list in the same transaction, so
    /// the two never disagree in storage.
    pub fn like_podcast(&self, podcast_id: i64, user_id: &str) -> Result<LikeStatus> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let row: Option<(String, String, String)> = tx
            .query_row(
                "SELECT likes, author_id, podcast_title FROM podcasts WHERE id = ?",
                params![podcast_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((likes_json, author_id, title)) = row else {
            return Err(AppError::NotFound(format!("podcast {}", podcast_id)).into());
        };

        let mut likes: Vec<String> = serde_json::from_str(&likes_json)
            .with_context(|| format!("corrupt likes list on podcast {}", podcast_id))?;
        let liked = match likes.iter().position(|id| id == user_id) {
            Some(idx) => {
                likes.remove(idx);
                false
            }
            None => {
                likes.push(user_id.to_string());
                true
            }
        };
        let like_count = likes.len() as i64;

        tx.execute(
            "UPDATE podcasts SET likes = ?, like_count = ? WHERE id = ?",
            params![serde_json::to_string(&likes)?, like_count, podcast_id],
        )?;

        if liked && author_id != user_id {
            insert_notification(
                &tx,
                &author_id,
                user_id,
                Some(&format!("liked your podcast \"{}\"", title)),
                NotificationType::Like,
                Some(podcast_id),
            )?;
        }

        tx.commit()?;
        Ok(LikeStatus { liked, like_count })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a user or refresh their identity fields (keyed by clerk id).
    pub fn upsert_user(&self, clerk_id: &str, email: &str, name: &str, image_url: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (clerk_id, email, name, image_url) VALUES (?, ?, ?, ?)
             ON CONFLICT(clerk_id) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                image_url = excluded.image_url",
            params![clerk_id, email, name, image_url],
        )?;
        let id = conn.query_row(
            "SELECT id FROM users WHERE clerk_id = ?",
            params![clerk_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get_user_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE clerk_id = ?", USER_COLUMNS),
                params![clerk_id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn update_user_profile(
        &self,
        clerk_id: &str,
        bio: Option<&str>,
        website: Option<&str>,
        social_links: &[SocialLink],
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE users SET bio = ?, website = ?, social_links = ? WHERE clerk_id = ?",
            params![bio, website, serde_json::to_string(social_links)?, clerk_id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("user {}", clerk_id)).into());
        }
        Ok(())
    }

    pub fn set_user_verified(&self, clerk_id: &str, verified: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE users SET is_verified = ? WHERE clerk_id = ?",
            params![if verified { 1 } else { 0 }, clerk_id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("user {}", clerk_id)).into());
        }
        Ok(())
    }

    // =========================================================================
    // Ratings
    // =========================================================================

    /// Record (or replace) a user's 1-5 rating and refresh the podcast aggregate.
    pub fn rate_podcast(&self, podcast_id: i64, user_id: &str, rating: i32) -> Result<(f64, i64)> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Invalid(format!("rating must be 1-5, got {}", rating)).into());
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row("SELECT id FROM podcasts WHERE id = ?", params![podcast_id], |row| {
                row.get(0)
            })
            .optional()?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("podcast {}", podcast_id)).into());
        }

        let now = chrono::Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO ratings (podcast_id, user_id, rating, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, podcast_id) DO UPDATE SET
                rating = excluded.rating,
                created_at = excluded.created_at",
            params![podcast_id, user_id, rating, now],
        )?;

        let (average, count): (f64, i64) = tx.query_row(
            "SELECT AVG(rating), COUNT(*) FROM ratings WHERE podcast_id = ?",
            params![podcast_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        tx.execute(
            "UPDATE podcasts SET average_rating = ?, rating_count = ? WHERE id = ?",
            params![average, count, podcast_id],
        )?;

        tx.commit()?;
        Ok((average, count))
    }

    pub fn get_user_rating(&self, podcast_id: i64, user_id: &str) -> Result<Option<Rating>> {
        let conn = self.conn.lock().unwrap();
        let rating = conn
            .query_row(
                "SELECT id, podcast_id, user_id, rating, created_at
                 FROM ratings WHERE podcast_id = ? AND user_id = ?",
                params![podcast_id, user_id],
                |row| {
                    Ok(Rating {
                        id: row.get(0)?,
                        podcast_id: row.get(1)?,
                        user_id: row.get(2)?,
                        rating: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(rating)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub fn add_comment(
        &self,
        podcast_id: i64,
        user_id: &str,
        user_name: &str,
        user_image_url: &str,
        content: &str,
    ) -> Result<i64> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Invalid("comment cannot be empty".to_string()).into());
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let author_id: Option<String> = tx
            .query_row(
                "SELECT author_id FROM podcasts WHERE id = ?",
                params![podcast_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(author_id) = author_id else {
            return Err(AppError::NotFound(format!("podcast {}", podcast_id)).into());
        };

        let now = chrono::Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO comments (podcast_id, user_id, user_name, user_image_url, content, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![podcast_id, user_id, user_name, user_image_url, content, now],
        )?;
        let id = tx.last_insert_rowid();

        if author_id != user_id {
            insert_notification(
                &tx,
                &author_id,
                user_id,
                Some(&format!("{} commented on your podcast", user_name)),
                NotificationType::Comment,
                Some(podcast_id),
            )?;
        }

        tx.commit()?;
        Ok(id)
    }

    pub fn get_comments(&self, podcast_id: i64) -> Result<Vec<Comment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, podcast_id, user_id, user_name, user_image_url, content, created_at
             FROM comments WHERE podcast_id = ? ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![podcast_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                podcast_id: row.get(1)?,
                user_id: row.get(2)?,
                user_name: row.get(3)?,
                user_image_url: row.get(4)?,
                content: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    /// Delete a comment; only its author may do so.
    pub fn delete_comment(&self, id: i64, user_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let owner: Option<String> = conn
            .query_row("SELECT user_id FROM comments WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        match owner {
            None => Err(AppError::NotFound(format!("comment {}", id)).into()),
            Some(owner) if owner != user_id => {
                Err(AppError::Invalid("only the author can delete a comment".to_string()).into())
            }
            Some(_) => {
                conn.execute("DELETE FROM comments WHERE id = ?", params![id])?;
                Ok(())
            }
        }
    }

    // =========================================================================
    // Follows
    // =========================================================================

    /// Returns true if this created a new follow.
    pub fn follow_user(&self, follower: &str, following: &str) -> Result<bool> {
        if follower == following {
            return Err(AppError::Invalid("cannot follow yourself".to_string()).into());
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().to_rfc3339();
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO follows (follower, following, created_at) VALUES (?, ?, ?)",
            params![follower, following, now],
        )?;

        if inserted > 0 {
            tx.execute(
                "UPDATE users SET followers_count = followers_count + 1 WHERE clerk_id = ?",
                params![following],
            )?;
            tx.execute(
                "UPDATE users SET following_count = following_count + 1 WHERE clerk_id = ?",
                params![follower],
            )?;
            insert_notification(
                &tx,
                following,
                follower,
                Some("started following you"),
                NotificationType::Follow,
                None,
            )?;
        }

        tx.commit()?;
        Ok(inserted > 0)
    }

    /// Returns true if a follow was removed.
    pub fn unfollow_user(&self, follower: &str, following: &str) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM follows WHERE follower = ? AND following = ?",
            params![follower, following],
        )?;

        if removed > 0 {
            tx.execute(
                "UPDATE users SET followers_count = MAX(followers_count - 1, 0) WHERE clerk_id = ?",
                params![following],
            )?;
            tx.execute(
                "UPDATE users SET following_count = MAX(following_count - 1, 0) WHERE clerk_id = ?",
                params![follower],
            )?;
        }

        tx.commit()?;
        Ok(removed > 0)
    }

    pub fn is_following(&self, follower: &str, following: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower = ? AND following = ?",
            params![follower, following],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub fn create_notification(
        &self,
        user_id: &str,
        creator_id: &str,
        message: Option<&str>,
        notification_type: NotificationType,
        podcast_id: Option<i64>,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        insert_notification(&conn, user_id, creator_id, message, notification_type, podcast_id)
    }

    pub fn get_notifications(&self, user_id: &str, limit: i64) -> Result<Vec<Notification>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, creator_id, message, notification_type, podcast_id, is_read, created_at
             FROM notifications WHERE user_id = ? ORDER BY id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![user_id, limit], |row| {
            Ok(Notification {
                id: row.get(0)?,
                user_id: row.get(1)?,
                creator_id: row.get(2)?,
                message: row.get(3)?,
                notification_type: row.get::<_, String>(4)?.into(),
                podcast_id: row.get(5)?,
                is_read: row.get::<_, i32>(6)? == 1,
                created_at: row.get(7)?,
            })
        })?;
        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?);
        }
        Ok(notifications)
    }

    pub fn mark_notification_read(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?",
            params![id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("notification {}", id)).into());
        }
        Ok(())
    }

    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0",
            params![user_id],
        )?;
        Ok(changed)
    }

    pub fn count_unread_notifications(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub fn create_report(&self, report: &NewReport) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM podcasts WHERE id = ?",
                params![report.podcast_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("podcast {}", report.podcast_id)).into());
        }

        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO reports (podcast_id, podcast_title, report_type, details, contact_email,
                reported_by, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                report.podcast_id,
                report.podcast_title,
                report.report_type.to_string(),
                report.details,
                report.contact_email,
                report.reported_by,
                ReportStatus::Pending.to_string(),
                now
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_reports_by_status(&self, status: ReportStatus) -> Result<Vec<Report>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM reports WHERE status = ? ORDER BY id DESC",
            REPORT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![status.to_string()], row_to_report)?;
        let mut reports = Vec::new();
        for row in rows {
            reports.push(row?);
        }
        Ok(reports)
    }

    pub fn get_reports_for_podcast(&self, podcast_id: i64) -> Result<Vec<Report>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM reports WHERE podcast_id = ? ORDER BY id DESC",
            REPORT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![podcast_id], row_to_report)?;
        let mut reports = Vec::new();
        for row in rows {
            reports.push(row?);
        }
        Ok(reports)
    }

    pub fn review_report(
        &self,
        id: i64,
        status: ReportStatus,
        reviewed_by: &str,
        review_notes: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE reports SET status = ?, reviewed_by = ?, review_notes = ? WHERE id = ?",
            params![status.to_string(), reviewed_by, review_notes, id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("report {}", id)).into());
        }
        Ok(())
    }

    // =========================================================================
    // Admin requests
    // =========================================================================

    pub fn create_admin_request(&self, user_id: &str, reason: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let pending: i64 = conn.query_row(
            "SELECT COUNT(*) FROM admin_requests WHERE user_id = ? AND status = 'pending'",
            params![user_id],
            |row| row.get(0),
        )?;
        if pending > 0 {
            return Err(
                AppError::Invalid("an admin request is already pending".to_string()).into(),
            );
        }

        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO admin_requests (user_id, reason, status, created_at) VALUES (?, ?, 'pending', ?)",
            params![user_id, reason, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_admin_requests(&self, status: Option<AdminRequestStatus>) -> Result<Vec<AdminRequest>> {
        let conn = self.conn.lock().unwrap();
        let status = status.map(|s| s.to_string());
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM admin_requests WHERE (?1 IS NULL OR status = ?1) ORDER BY id DESC",
            ADMIN_REQUEST_COLUMNS
        ))?;
        let rows = stmt.query_map(params![status], |row| {
            Ok(AdminRequest {
                id: row.get(0)?,
                user_id: row.get(1)?,
                reason: row.get(2)?,
                status: row.get::<_, String>(3)?.into(),
                created_at: row.get(4)?,
                reviewed_at: row.get(5)?,
                reviewed_by: row.get(6)?,
                review_notes: row.get(7)?,
            })
        })?;
        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// Approve or reject a pending request. Approval grants the admin flag.
    pub fn review_admin_request(
        &self,
        id: i64,
        approve: bool,
        reviewed_by: &str,
        review_notes: Option<&str>,
    ) -> Result<AdminRequestStatus> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let row: Option<(String, String)> = tx
            .query_row(
                "SELECT user_id, status FROM admin_requests WHERE id = ?",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((user_id, status)) = row else {
            return Err(AppError::NotFound(format!("admin request {}", id)).into());
        };
        if AdminRequestStatus::from(status) != AdminRequestStatus::Pending {
            return Err(AppError::Invalid(format!("admin request {} already reviewed", id)).into());
        }

        let new_status = if approve {
            AdminRequestStatus::Approved
        } else {
            AdminRequestStatus::Rejected
        };
        let now = chrono::Utc::now().to_rfc3339();
        tx.execute(
            "UPDATE admin_requests SET status = ?, reviewed_at = ?, reviewed_by = ?, review_notes = ?
             WHERE id = ?",
            params![new_status.to_string(), now, reviewed_by, review_notes, id],
        )?;
        if approve {
            tx.execute(
                "UPDATE users SET is_admin = 1 WHERE clerk_id = ?",
                params![user_id],
            )?;
        }

        tx.commit()?;
        Ok(new_status)
    }

    // =========================================================================
    // Storage
    // =========================================================================

    pub fn store_file(&self, data: &[u8], content_type: &str) -> Result<String> {
        let conn = self.conn.lock().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO storage_files (id, content_type, data, created_at) VALUES (?, ?, ?, ?)",
            params![id, content_type, data, now],
        )?;
        Ok(id)
    }

    pub fn get_file(&self, id: &str) -> Result<Option<StoredFile>> {
        let conn = self.conn.lock().unwrap();
        let file = conn
            .query_row(
                "SELECT id, content_type, data, created_at FROM storage_files WHERE id = ?",
                params![id],
                |row| {
                    Ok(StoredFile {
                        id: row.get(0)?,
                        content_type: row.get(1)?,
                        data: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(file)
    }
}

fn insert_notification(
    conn: &Connection,
    user_id: &str,
    creator_id: &str,
    message: Option<&str>,
    notification_type: NotificationType,
    podcast_id: Option<i64>,
) -> Result<i64> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO notifications (user_id, creator_id, message, notification_type, podcast_id, is_read, created_at)
         VALUES (?, ?, ?, ?, ?, 0, ?)",
        params![user_id, creator_id, message, notification_type.to_string(), podcast_id, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Turn free text into an FTS5 prefix query, one quoted term per word.
fn fts_prefix_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|t| format!("\"{}\"*", t.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

fn row_to_podcast(row: &Row) -> rusqlite::Result<Podcast> {
    Ok(Podcast {
        id: row.get(0)?,
        user_id: row.get(1)?,
        podcast_title: row.get(2)?,
        podcast_description: row.get(3)?,
        audio_url: row.get(4)?,
        audio_storage_id: row.get(5)?,
        image_url: row.get(6)?,
        image_storage_id: row.get(7)?,
        author: row.get(8)?,
        author_id: row.get(9)?,
        author_image_url: row.get(10)?,
        voice_prompt: row.get(11)?,
        image_prompt: row.get(12)?,
        voice_type: row.get(13)?,
        audio_duration: row.get(14)?,
        views: row.get(15)?,
        podcast_type: row.get(16)?,
        likes: serde_json::from_str(&row.get::<_, String>(17)?)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(17, Type::Text, Box::new(e)))?,
        like_count: row.get(18)?,
        average_rating: row.get(19)?,
        rating_count: row.get(20)?,
        language: row.get(21)?,
        created_at: row.get(22)?,
    })
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        image_url: row.get(2)?,
        clerk_id: row.get(3)?,
        name: row.get(4)?,
        followers_count: row.get(5)?,
        following_count: row.get(6)?,
        bio: row.get(7)?,
        website: row.get(8)?,
        is_verified: row.get::<_, i32>(9).unwrap_or(0) == 1,
        social_links: row
            .get::<_, Option<String>>(10)?
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        is_admin: row.get::<_, i32>(11).unwrap_or(0) == 1,
    })
}

fn row_to_report(row: &Row) -> rusqlite::Result<Report> {
    Ok(Report {
        id: row.get(0)?,
        podcast_id: row.get(1)?,
        podcast_title: row.get(2)?,
        report_type: row.get::<_, String>(3)?.into(),
        details: row.get(4)?,
        contact_email: row.get(5)?,
        reported_by: row.get(6)?,
        status: row.get::<_, String>(7)?.into(),
        reviewed_by: row.get(8)?,
        review_notes: row.get(9)?,
        created_at: row.get(10)?,
    })
}
