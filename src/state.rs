use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    auth::{jwt::JwtKeys, services::AuthService},
    config::AppConfig,
    db,
    storage::{self, StorageClient},
    users::{memory::MemoryUserStore, pg::PgUserStore, repo::UserStore, services::ProfileService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub auth: AuthService,
    pub profiles: ProfileService,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let users: Arc<dyn UserStore> = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url, config.database_max_connections).await?;
                db::migrate(&pool).await?;
                Arc::new(PgUserStore::new(pool))
            }
            None => {
                warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
                Arc::new(MemoryUserStore::new())
            }
        };
        let storage = storage::from_config(&config.storage).await?;
        info!("application state ready");
        Ok(Self::from_parts(Arc::new(config), users, storage))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            auth: AuthService::new(users.clone(), keys, &config.auth),
            profiles: ProfileService::new(users),
            config,
            storage,
        }
    }

    /// In-memory users and a storage that only fabricates URLs.
    #[cfg(test)]
    pub fn fake(handle_required: bool) -> Self {
        use async_trait::async_trait;
        use bytes::Bytes;

        use crate::config::{AuthConfig, StorageConfig};

        struct FakeStorage;

        #[async_trait]
        impl StorageClient for FakeStorage {
            async fn upload(&self, key: &str, _body: Bytes, _ct: &str) -> anyhow::Result<String> {
                if key.ends_with(".gif") {
                    anyhow::bail!("fake storage refuses gifs");
                }
                Ok(format!("https://fake.local/{}", key))
            }
        }

        let config = Arc::new(AppConfig {
            database_url: None,
            database_max_connections: 1,
            jwt: crate::testutil::jwt_config(),
            auth: AuthConfig { handle_required },
            storage: StorageConfig::S3 {
                endpoint: "fake".into(),
                region: "us-east-1".into(),
                bucket: "fake".into(),
                access_key: "fake".into(),
                secret_key: "fake".into(),
                public_base_url: "https://fake.local".into(),
            },
            host: "127.0.0.1".into(),
            port: 0,
            request_timeout_secs: 5,
        });
        Self::from_parts(config, Arc::new(MemoryUserStore::new()), Arc::new(FakeStorage))
    }
}
