use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::error::Result;
use crate::middleware_layer::route_guard::RoutePolicy;
use crate::repositories::{memory::MemoryUserStore, user::PgUserStore, user::UserStore};
use crate::services::session::SessionManager;

/// The application's state.
#[derive(Clone, FromRef)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// The credential store.
    pub users: Arc<dyn UserStore>,
    /// Session issuance and verification.
    pub sessions: SessionManager,
    /// The route guard's rules.
    pub policy: RoutePolicy,
}

impl AppState {
    /// Creates a new `AppState`, connecting to PostgreSQL when a database URL
    /// is configured and falling back to the in-memory store otherwise.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let users: Arc<dyn UserStore> = match &config.database_url {
            Some(url) => {
                let pool = crate::db::create_pool(url)?;
                crate::db::ensure_schema(&pool).await?;
                tracing::info!("✅ PostgreSQL pool initialized");
                Arc::new(PgUserStore::new(pool))
            }
            None => {
                tracing::warn!("⚠️ DATABASE_URL not set, using the in-memory user store");
                Arc::new(MemoryUserStore::new())
            }
        };

        Self::with_store(config, users)
    }

    /// Creates an `AppState` around an existing user store.
    pub fn with_store(config: &Config, users: Arc<dyn UserStore>) -> Result<Self> {
        let sessions = SessionManager::from_config(config)?;
        tracing::info!("✅ Session manager initialized");

        let policy = RoutePolicy {
            sliding: config.sliding_sessions,
            ..RoutePolicy::default()
        };

        Ok(AppState {
            config: config.clone(),
            users,
            sessions,
            policy,
        })
    }
}
