use std::sync::Arc;

use tracing::error;

use vows_db::Database;
use vows_mail::{EventDetails, Mailer};

use crate::error::ApiError;
use crate::live::Dispatcher;

pub type AppState = Arc<AppStateInner>;

/// Runtime settings the handlers need, assembled by the binary from env.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub jwt_secret: String,
    /// Argon2 PHC string of the dashboard password.
    pub admin_password_hash: String,
    pub event: EventDetails,
    /// Send a short acknowledgement to guests who decline.
    pub acknowledge_declines: bool,
}

pub struct AppStateInner {
    pub db: Database,
    pub mailer: Arc<dyn Mailer>,
    pub dispatcher: Dispatcher,
    pub settings: ApiSettings,
}

impl AppStateInner {
    pub fn new(db: Database, mailer: Arc<dyn Mailer>, settings: ApiSettings) -> AppState {
        Arc::new(Self {
            db,
            mailer,
            dispatcher: Dispatcher::new(),
            settings,
        })
    }
}

/// Runs a blocking store call off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Store(anyhow::anyhow!("blocking task failed: {}", e))
        })?
        .map_err(ApiError::Store)
}
