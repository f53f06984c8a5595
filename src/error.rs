use thiserror::Error;

/// Typed application error hierarchy shared by the backend commands and the
/// detail-page controllers.
///
/// Serializes as a plain string so a frontend receives the same
/// `"error message"` it would from a hosted query service, while Rust code
/// gets typed variants that can be matched or propagated with `?`.
#[derive(Debug, Error)]
pub enum AppError {
    /// No viewer is signed in; the action was blocked before any mutation.
    #[error("Not signed in")]
    Unauthenticated,

    /// A call across the remote data service boundary failed.
    #[error("Remote call failed: {0}")]
    RemoteCallFailed(String),

    /// A like toggle is already waiting on the remote service.
    #[error("A like update is already in flight")]
    LikeInFlight,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Host platform primitive (share sheet, clipboard) failed.
    #[error("Platform error: {0}")]
    Platform(String),

    #[error("{0}")]
    Database(String),

    #[error("{0}")]
    Io(String),

    #[error("{0}")]
    Json(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Wrap any error that crossed the remote boundary.
    pub fn remote(err: AppError) -> Self {
        match err {
            AppError::RemoteCallFailed(_) => err,
            other => AppError::RemoteCallFailed(other.to_string()),
        }
    }
}

/// Serialize as a plain string.
impl serde::Serialize for AppError {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

// ── From impls ─────────────────────────────────────────────────────────────

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        // Typed errors raised inside the database layer keep their variant.
        match e.downcast::<AppError>() {
            Ok(app) => app,
            Err(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Json(e.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(e: serde_yaml::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

/// Allows `.map_err(|e| format!("…", e))?` and `ok_or_else(|| format!(…))?`
/// to coerce into AppError without changing the call sites.
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Other(s)
    }
}

/// Allows `.ok_or("literal string")?` to coerce into AppError.
impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Other(s.to_string())
    }
}
