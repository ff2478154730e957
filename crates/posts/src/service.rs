//! Role-gated post operations over the repository.

use sqlx::SqlitePool;
use tracing::info;

use scribe_auth::Identity;

use crate::entities::{CreatePostRequest, PageRequest, PagedPosts, Post, UpdatePostRequest};
use crate::repository::PostRepository;
use crate::PostError;

pub const MAX_PAGE_SIZE: u32 = 100;

const MIN_TITLE_LEN: usize = 2;

#[derive(Clone)]
pub struct PostService {
    repo: PostRepository,
}

impl PostService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repo: PostRepository::new(pool),
        }
    }

    /// Create a post authored by the requester. Admin only.
    pub async fn create(
        &self,
        requester: &Identity,
        request: CreatePostRequest,
    ) -> Result<Post, PostError> {
        require_admin(requester)?;
        validate_fields(&request.title, &request.content)?;

        let post = self.repo.insert(requester.user_id, &request).await?;
        info!(post_id = post.id, author = requester.user_id, "post created");
        Ok(post)
    }

    pub async fn list(&self, page: PageRequest) -> Result<PagedPosts, PostError> {
        if page.page_size == 0 {
            return Err(PostError::Validation("page_size must be positive".into()));
        }
        if page.page_size > MAX_PAGE_SIZE {
            return Err(PostError::Validation(format!(
                "page_size must not exceed {MAX_PAGE_SIZE}"
            )));
        }

        let total_elements = self.repo.count().await?;
        let posts = self.repo.find_page(&page).await?;

        let total_pages = if total_elements == 0 {
            0
        } else {
            ((total_elements + i64::from(page.page_size) - 1) / i64::from(page.page_size)) as u32
        };
        let last = page.page_no + 1 >= total_pages;

        Ok(PagedPosts {
            posts,
            page_no: page.page_no,
            page_size: page.page_size,
            total_elements,
            total_pages,
            last,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Post, PostError> {
        self.repo.find_by_id(id).await?.ok_or(PostError::NotFound)
    }

    /// Replace a post's title, description and content. Admin only; the
    /// role check runs before the existence check.
    pub async fn update(
        &self,
        requester: &Identity,
        id: i64,
        request: UpdatePostRequest,
    ) -> Result<Post, PostError> {
        require_admin(requester)?;
        validate_fields(&request.title, &request.content)?;

        let post = self.repo.update(id, &request).await?;
        info!(post_id = id, "post updated");
        Ok(post)
    }

    pub async fn delete(&self, requester: &Identity, id: i64) -> Result<(), PostError> {
        require_admin(requester)?;

        self.repo.delete(id).await?;
        info!(post_id = id, "post deleted");
        Ok(())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Post>, PostError> {
        self.repo.search_by_keyword(query).await
    }
}

fn require_admin(requester: &Identity) -> Result<(), PostError> {
    if requester.is_admin() {
        Ok(())
    } else {
        Err(PostError::Forbidden)
    }
}

fn validate_fields(title: &str, content: &str) -> Result<(), PostError> {
    if title.trim().len() < MIN_TITLE_LEN {
        return Err(PostError::Validation(format!(
            "title must have at least {MIN_TITLE_LEN} characters"
        )));
    }
    if content.trim().is_empty() {
        return Err(PostError::Validation("content must not be empty".into()));
    }
    Ok(())
}
