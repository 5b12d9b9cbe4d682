pub mod news;

pub use news::{NewsRecord, NewsRepository, NewsWriteParams};

/// 时间戳统一为固定宽度的 RFC 3339（微秒、Z 结尾），保证按字符串排序即按时间排序
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> sqlx::SqlitePool {
    // 内存库只在单个连接内可见
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    crate::state::run_migrations(&pool).await.unwrap();
    pool
}
