use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, warn};

use crate::auth::{Authenticator, JwtKeys, Passwords};
use crate::config::AppConfig;
use crate::store::{BlogStore, MemoryStore, PgStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub blogs: Arc<dyn BlogStore>,
    pub passwords: Passwords,
    pub keys: JwtKeys,
    pub auth: Authenticator,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        match config.database_url.clone() {
            Some(url) => {
                let store = PgStore::connect(&url).await?;
                Self::with_postgres(config, store).await
            }
            None => {
                warn!("DATABASE_URL not set; data lives in memory only");
                Ok(Self::in_memory(config)?)
            }
        }
    }

    /// Applies pending migrations; startup fails if they do not apply.
    pub async fn with_postgres(config: AppConfig, store: PgStore) -> anyhow::Result<Self> {
        store.migrate().await?;
        info!("using postgres store");
        let store = Arc::new(store);
        Self::from_parts(config, store.clone(), store)
    }

    pub fn in_memory(config: AppConfig) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new());
        Self::from_parts(config, store.clone(), store)
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        blogs: Arc<dyn BlogStore>,
    ) -> anyhow::Result<Self> {
        let passwords = Passwords::new(&config.password)?;
        let keys = JwtKeys::new(&config.jwt.secret);
        let auth = Authenticator::new(users.clone(), passwords.clone(), keys.clone());
        Ok(Self {
            config: Arc::new(config),
            users,
            blogs,
            passwords,
            keys,
            auth,
        })
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}
