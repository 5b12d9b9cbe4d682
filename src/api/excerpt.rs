use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::content::ExcerptOptions;
use crate::content::excerpt::{generate_excerpt, generate_excerpt_from_html};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExcerptRequest {
    pub content: String,
    pub max_length: Option<usize>,
    /// html 模式下段落截断固定使用默认下限，不能同时指定
    pub min_length: Option<usize>,
    #[serde(default)]
    pub html: bool,
}

#[derive(Serialize)]
pub struct ExcerptResponse {
    pub excerpt: String,
}

/// 编辑器预览：不读写数据库，直接返回摘要
pub async fn preview_excerpt(
    State(state): State<AppState>,
    payload: Result<Json<ExcerptRequest>, JsonRejection>,
) -> ApiResult<Json<ExcerptResponse>> {
    let Json(body) = payload?;
    let defaults = &state.config.excerpt;

    let max_length = body.max_length.unwrap_or(defaults.max_length);
    if max_length == 0 {
        return Err(ApiError::validation("max_length 必须大于 0"));
    }
    if body.html && body.min_length.is_some() {
        return Err(ApiError::validation("html 模式不支持 min_length"));
    }

    let excerpt = if body.html {
        generate_excerpt_from_html(&body.content, max_length, true)
    } else {
        let options = ExcerptOptions {
            max_length,
            min_length: body.min_length.unwrap_or(defaults.min_length),
            preserve_paragraphs: false,
        };
        generate_excerpt(&body.content, &options)
    };

    Ok(Json(ExcerptResponse { excerpt }))
}
