use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::{AppConfig, StoreBackend};
use crate::memory::MemoryStore;
use crate::todos::repo::{PgTodoStore, TodoStore};

#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<dyn TodoStore>,
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Self::from_config(config).await
    }

    pub async fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        match config.store_backend {
            StoreBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                Ok(Self::in_memory(config))
            }
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres store")?;
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                run_migrations(&db).await?;

                Ok(Self {
                    todos: Arc::new(PgTodoStore::new(db.clone())),
                    users: Arc::new(PgUserStore::new(db)),
                    config,
                })
            }
        }
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        let store = MemoryStore::new();
        Self::from_parts(Arc::new(store.clone()), Arc::new(store), config)
    }

    pub fn from_parts(
        todos: Arc<dyn TodoStore>,
        users: Arc<dyn UserStore>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            todos,
            users,
            config,
        }
    }
}

/// Applies `migrations/`. The server does not start on a schema it can't migrate.
pub async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    tracing::info!("migrations applied");
    Ok(())
}
