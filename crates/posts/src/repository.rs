//! Explicit post queries against SQLite.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::entities::{CreatePostRequest, PageRequest, Post, UpdatePostRequest};
use crate::PostError;

#[derive(Clone)]
pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        author_id: i64,
        request: &CreatePostRequest,
    ) -> Result<Post, PostError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO posts (title, description, content, author_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.content)
        .bind(author_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or(PostError::NotFound)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Post>, PostError> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, title, description, content, author_id, created_at, updated_at FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Fetch one page of posts. The sort column and direction come from
    /// validated enums, never from raw client input.
    pub async fn find_page(&self, page: &PageRequest) -> Result<Vec<Post>, PostError> {
        let query = format!(
            "SELECT id, title, description, content, author_id, created_at, updated_at FROM posts ORDER BY {} {} LIMIT ? OFFSET ?",
            page.sort_by.column(),
            page.sort_dir.keyword(),
        );

        let offset = i64::from(page.page_no) * i64::from(page.page_size);
        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(i64::from(page.page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    pub async fn count(&self) -> Result<i64, PostError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn update(&self, id: i64, request: &UpdatePostRequest) -> Result<Post, PostError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE posts SET title = ?, description = ?, content = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.content)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PostError::NotFound);
        }

        self.find_by_id(id).await?.ok_or(PostError::NotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), PostError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostError::NotFound);
        }

        Ok(())
    }

    /// Case-insensitive substring match over title and content, newest
    /// first. `%` and `_` in the query are literals, not wildcards.
    pub async fn search_by_keyword(&self, query: &str) -> Result<Vec<Post>, PostError> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, description, content, author_id, created_at, updated_at
            FROM posts
            WHERE LOWER(title) LIKE ? ESCAPE '\' OR LOWER(content) LIKE ? ESCAPE '\'
            ORDER BY created_at DESC
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
