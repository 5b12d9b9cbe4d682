use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::content;
use crate::error::{ApiError, ApiResult};
use crate::repository::{NewsRecord, NewsWriteParams};
use crate::state::AppState;

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;
const MAX_TITLE_CHARS: usize = 250;
const MAX_IMAGE_CHARS: usize = 2048;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Deserialize)]
pub struct NewsCreate {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
    pub published_date: Option<String>,
    pub preview_text: Option<String>,
}

#[derive(Deserialize)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// 传空字符串清除图片
    pub image: Option<String>,
    pub published_date: Option<String>,
    /// 传空字符串表示按正文重新生成
    pub preview_text: Option<String>,
}

/// 列表项不含正文
#[derive(Serialize)]
pub struct NewsSummary {
    pub id: String,
    pub title: String,
    pub preview_text: String,
    pub image: Option<String>,
    pub published_date: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct NewsDetail {
    pub id: String,
    pub title: String,
    pub content: String,
    pub preview_text: String,
    pub image: Option<String>,
    pub published_date: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<NewsRecord> for NewsSummary {
    fn from(r: NewsRecord) -> Self {
        Self {
            id: r.id,
            title: r.title,
            preview_text: r.preview_text.unwrap_or_default(),
            image: r.image,
            published_date: r.published_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<NewsRecord> for NewsDetail {
    fn from(r: NewsRecord) -> Self {
        Self {
            id: r.id,
            title: r.title,
            content: r.content,
            preview_text: r.preview_text.unwrap_or_default(),
            image: r.image,
            published_date: r.published_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// ── 路由处理 ──

pub async fn list_news(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> ApiResult<(HeaderMap, Json<Vec<NewsSummary>>)> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let mut records = state.news.list(page, per_page).await?;
    let total = state.news.count().await?;
    ensure_previews(&state, &mut records).await;

    let mut headers = HeaderMap::new();
    headers.insert("x-total-count", HeaderValue::from(total));

    Ok((headers, Json(records.into_iter().map(NewsSummary::from).collect())))
}

pub async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<NewsDetail>> {
    let record = state
        .news
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("新闻不存在"))?;

    let mut records = [record];
    ensure_previews(&state, &mut records).await;
    let [record] = records;

    Ok(Json(record.into()))
}

pub async fn create_news(
    State(state): State<AppState>,
    payload: Result<Json<NewsCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<NewsDetail>)> {
    let Json(body) = payload?;

    let title = validate_title(&body.title)?;
    let image = validate_image(body.image.as_deref())?;
    let published_date = match non_blank(body.published_date.as_deref()) {
        Some(date) => parse_published_date(date)?,
        None => chrono::Utc::now().date_naive().format(DATE_FORMAT).to_string(),
    };
    let preview_text = match non_blank(body.preview_text.as_deref()) {
        Some(preview) => preview.to_owned(),
        None => content::preview_text(&body.content, &state.config.excerpt),
    };

    let record = state
        .news
        .create(&NewsWriteParams {
            title,
            content: &body.content,
            preview_text: Some(&preview_text),
            image,
            published_date: &published_date,
        })
        .await?;

    tracing::info!(id = %record.id, "新闻已创建：{}", record.title);
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn update_news(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NewsUpdate>, JsonRejection>,
) -> ApiResult<Json<NewsDetail>> {
    let Json(body) = payload?;

    let existing = state
        .news
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("新闻不存在"))?;

    let title = match body.title.as_deref() {
        Some(title) => validate_title(title)?,
        None => existing.title.as_str(),
    };
    let news_content = body.content.as_deref().unwrap_or(&existing.content);
    let image = match body.image.as_deref() {
        Some(image) => validate_image(Some(image))?,
        None => existing.image.as_deref(),
    };
    let published_date = match body.published_date.as_deref() {
        Some(date) => parse_published_date(date)?,
        None => existing.published_date.clone(),
    };

    let content_changed = news_content != existing.content;
    let preview_text = match body.preview_text.as_deref().map(str::trim) {
        Some(preview) if !preview.is_empty() => preview.to_owned(),
        Some(_) => content::preview_text(news_content, &state.config.excerpt),
        None => match existing.preview_text.as_deref() {
            Some(preview) if !content_changed => preview.to_owned(),
            _ => content::preview_text(news_content, &state.config.excerpt),
        },
    };

    let record = state
        .news
        .update(
            &id,
            &NewsWriteParams {
                title,
                content: news_content,
                preview_text: Some(&preview_text),
                image,
                published_date: &published_date,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("新闻不存在"))?;

    tracing::info!(id = %record.id, "新闻已更新");
    Ok(Json(record.into()))
}

pub async fn delete_news(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.news.delete(&id).await? {
        return Err(ApiError::not_found("新闻不存在"));
    }
    tracing::info!(id = %id, "新闻已删除");
    Ok(StatusCode::NO_CONTENT)
}

// ── 辅助函数 ──

/// 为预览文本为 NULL 的记录生成预览并回填数据库；空字符串视为已生成。回填失败不影响本次响应
async fn ensure_previews(state: &AppState, records: &mut [NewsRecord]) {
    let mut computed = Vec::new();
    for record in records
        .iter_mut()
        .filter(|r| r.preview_text.is_none())
    {
        let preview = content::preview_text(&record.content, &state.config.excerpt);
        computed.push((record.id.clone(), preview.clone()));
        record.preview_text = Some(preview);
    }

    if computed.is_empty() {
        return;
    }

    match state.news.store_previews(&computed).await {
        Ok(()) => tracing::debug!("已回填 {} 条预览文本", computed.len()),
        Err(e) => tracing::warn!("回填预览文本失败：{e}"),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn validate_title(title: &str) -> ApiResult<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("标题不能为空"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::validation(format!(
            "标题不能超过 {MAX_TITLE_CHARS} 个字符"
        )));
    }
    Ok(title)
}

fn validate_image(image: Option<&str>) -> ApiResult<Option<&str>> {
    let Some(image) = non_blank(image) else {
        return Ok(None);
    };
    if image.chars().count() > MAX_IMAGE_CHARS {
        return Err(ApiError::validation(format!(
            "图片地址不能超过 {MAX_IMAGE_CHARS} 个字符"
        )));
    }
    Ok(Some(image))
}

fn parse_published_date(date: &str) -> ApiResult<String> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .map_err(|_| ApiError::validation(format!("发布日期格式无效：{date}（应为 YYYY-MM-DD）")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_trimmed_and_bounded() {
        assert_eq!(validate_title("  Hello  ").unwrap(), "Hello");
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"t".repeat(250)).is_ok());
        assert!(validate_title(&"t".repeat(251)).is_err());
    }

    #[test]
    fn blank_image_is_cleared() {
        assert_eq!(validate_image(Some("  ")).unwrap(), None);
        assert_eq!(validate_image(None).unwrap(), None);
        assert_eq!(
            validate_image(Some(" https://cdn/x.png ")).unwrap(),
            Some("https://cdn/x.png")
        );
        assert!(validate_image(Some(&"i".repeat(2049))).is_err());
    }

    #[test]
    fn published_date_must_be_iso() {
        assert_eq!(parse_published_date(" 2025-03-09 ").unwrap(), "2025-03-09");
        assert!(parse_published_date("09/03/2025").is_err());
        assert!(parse_published_date("2025-02-30").is_err());
        assert!(parse_published_date("").is_err());
    }
}
