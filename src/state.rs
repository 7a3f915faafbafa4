use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::auth::{
    jwt::JwtKeys,
    memory::MemoryUserStore,
    password::PasswordHasher,
    repo::{PgUserStore, UserStore},
    services::AuthService,
};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn UserStore> = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run database migrations")?;
                info!("using postgres user store");
                Arc::new(PgUserStore::new(db))
            }
            None => {
                warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
                Arc::new(MemoryUserStore::new())
            }
        };
        Self::from_parts(store, config)
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: AppConfig) -> anyhow::Result<Self> {
        let hasher = PasswordHasher::new(&config.hashing).context("build password hasher")?;
        let keys = JwtKeys::from_config(&config.jwt);
        Ok(Self {
            auth: Arc::new(AuthService::new(store, hasher, keys)),
            config: Arc::new(config),
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::with_store(Arc::new(MemoryUserStore::new()))
    }

    #[cfg(test)]
    pub fn with_store(store: Arc<dyn UserStore>) -> Self {
        use crate::auth::password::cheap_config;
        use crate::config::JwtConfig;

        let config = AppConfig {
            database_url: None,
            database_max_connections: 1,
            jwt: JwtConfig {
                secret: b"0123456789abcdef0123456789abcdef".to_vec(),
            },
            hashing: cheap_config(),
            cors_allowed_origins: Vec::new(),
            host: "127.0.0.1".into(),
            port: 0,
        };
        Self::from_parts(store, config).expect("fake state")
    }
}
