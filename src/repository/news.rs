use anyhow::Result;
use sqlx::SqlitePool;

use super::now_rfc3339;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NewsRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub preview_text: Option<String>,
    pub image: Option<String>,
    pub published_date: String,
    pub created_at: String,
    pub updated_at: String,
}

/// 新闻写入参数
pub struct NewsWriteParams<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub preview_text: Option<&'a str>,
    pub image: Option<&'a str>,
    pub published_date: &'a str,
}

const COLUMNS: &str =
    "id, title, content, preview_text, image, published_date, created_at, updated_at";

#[derive(Clone)]
pub struct NewsRepository {
    db: SqlitePool,
}

impl NewsRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// 按创建时间倒序分页，page 从 1 开始
    pub async fn list(&self, page: u32, per_page: u32) -> Result<Vec<NewsRecord>> {
        let offset = (i64::from(page.max(1)) - 1) * i64::from(per_page);

        let rows = sqlx::query_as::<_, NewsRecord>(&format!(
            "SELECT {COLUMNS} FROM news ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM news")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<NewsRecord>> {
        let row = sqlx::query_as::<_, NewsRecord>(&format!(
            "SELECT {COLUMNS} FROM news WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, p: &NewsWriteParams<'_>) -> Result<NewsRecord> {
        let id = ulid::Ulid::new().to_string();
        let now = now_rfc3339();

        sqlx::query(
            "INSERT INTO news (id, title, content, preview_text, image, published_date, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(p.title)
        .bind(p.content)
        .bind(p.preview_text)
        .bind(p.image)
        .bind(p.published_date)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await?;

        Ok(NewsRecord {
            id,
            title: p.title.to_owned(),
            content: p.content.to_owned(),
            preview_text: p.preview_text.map(str::to_owned),
            image: p.image.map(str::to_owned),
            published_date: p.published_date.to_owned(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// 整行覆盖写入，记录不存在时返回 None
    pub async fn update(&self, id: &str, p: &NewsWriteParams<'_>) -> Result<Option<NewsRecord>> {
        let now = now_rfc3339();

        let result = sqlx::query(
            "UPDATE news SET title = ?, content = ?, preview_text = ?, image = ?, published_date = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(p.title)
        .bind(p.content)
        .bind(p.preview_text)
        .bind(p.image)
        .bind(p.published_date)
        .bind(&now)
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM news WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// 回填读取时才生成的预览文本（不改动 updated_at）
    pub async fn store_previews(&self, previews: &[(String, String)]) -> Result<()> {
        if previews.is_empty() {
            return Ok(());
        }

        let mut tx = self.db.begin().await?;
        for (id, preview) in previews {
            sqlx::query("UPDATE news SET preview_text = ? WHERE id = ?")
                .bind(preview)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_pool;

    fn params<'a>(title: &'a str, content: &'a str) -> NewsWriteParams<'a> {
        NewsWriteParams {
            title,
            content,
            preview_text: None,
            image: None,
            published_date: "2025-01-15",
        }
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let repo = NewsRepository::new(memory_pool().await);

        let created = repo
            .create(&NewsWriteParams {
                image: Some("https://cdn.example.com/a.png"),
                preview_text: Some("Preview"),
                ..params("Title", "<p>Body</p>")
            })
            .await
            .unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Title");
        assert_eq!(fetched.content, "<p>Body</p>");
        assert_eq!(fetched.preview_text.as_deref(), Some("Preview"));
        assert_eq!(fetched.image.as_deref(), Some("https://cdn.example.com/a.png"));
        assert_eq!(fetched.published_date, "2025-01-15");
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn missing_id_is_none() {
        let repo = NewsRepository::new(memory_pool().await);
        assert!(repo.get_by_id("nope").await.unwrap().is_none());
        assert!(repo.update("nope", &params("t", "c")).await.unwrap().is_none());
        assert!(!repo.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let repo = NewsRepository::new(memory_pool().await);
        for title in ["one", "two", "three"] {
            repo.create(&params(title, "")).await.unwrap();
        }

        let all = repo.list(1, 10).await.unwrap();
        let titles: Vec<_> = all.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["three", "two", "one"]);

        let second_page = repo.list(2, 2).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].title, "one");

        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn update_and_delete() {
        let repo = NewsRepository::new(memory_pool().await);
        let created = repo.create(&params("old", "old body")).await.unwrap();

        let updated = repo
            .update(&created.id, &params("new", "new body"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.content, "new body");
        assert_eq!(updated.created_at, created.created_at);

        assert!(repo.delete(&created.id).await.unwrap());
        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_previews_backfills() {
        let repo = NewsRepository::new(memory_pool().await);
        let a = repo.create(&params("a", "alpha")).await.unwrap();
        let b = repo.create(&params("b", "beta")).await.unwrap();
        assert!(a.preview_text.is_none());

        repo.store_previews(&[(a.id.clone(), "alpha".into())])
            .await
            .unwrap();

        let a = repo.get_by_id(&a.id).await.unwrap().unwrap();
        let b = repo.get_by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(a.preview_text.as_deref(), Some("alpha"));
        assert!(b.preview_text.is_none());

        repo.store_previews(&[]).await.unwrap();
    }
}
