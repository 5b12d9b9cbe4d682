use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};

use crate::state::AppState;

/// 数据库连通时附带新闻总数
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_ok = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    let news_count = if db_ok {
        state
            .news
            .count()
            .await
            .inspect_err(|e| tracing::warn!("健康检查统计新闻失败：{e}"))
            .ok()
    } else {
        None
    };

    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": if db_ok { "connected" } else { "error" },
        "news_count": news_count,
    }))
}
