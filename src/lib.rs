pub mod commands;
pub mod config;
pub mod database;
pub mod detail;
pub mod error;
pub mod remote;

use config::AppConfig;
use database::Database;
use error::AppError;
use remote::LocalBackend;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `log` records are bridged into it.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("podtales_lib=info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Everything a host needs to serve the app.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<Database>,
    pub backend: Arc<LocalBackend>,
}

impl AppState {
    /// Load configuration from `project_dir` and open the database it points at.
    pub fn open(project_dir: &Path) -> Result<Self, AppError> {
        let config = AppConfig::load(project_dir)?;

        std::fs::create_dir_all(&config.data_dir)?;
        let db_path = config.database_path();
        let db = Arc::new(Database::new(&db_path)?);
        log::info!("Database ready at {}", db_path.display());

        Ok(Self {
            config: Arc::new(config),
            backend: Arc::new(LocalBackend::new(db.clone())),
            db,
        })
    }
}
