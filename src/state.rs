use crate::config::{AppConfig, DatabaseConfig};
use crate::repository::NewsRepository;
use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub news: NewsRepository,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = connect(&config.database).await?;
        run_migrations(&pool).await?;
        Ok(Self::with_pool(pool, config))
    }

    pub fn with_pool(pool: SqlitePool, config: AppConfig) -> Self {
        Self {
            news: NewsRepository::new(pool.clone()),
            db: pool,
            config: Arc::new(config),
        }
    }
}

pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .connect(&config.url)
        .await
        .map_err(|e| anyhow::anyhow!("连接数据库失败（{}）：{}", config.url, e))?;
    tracing::debug!(url = %config.url, "数据库已连接");
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| anyhow::anyhow!("数据库迁移失败：{}", e))
}
