use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use scribe_posts::{CreatePostRequest, PageRequest, PagedPosts, Post, UpdatePostRequest};

use crate::{
    routes::auth::MessageResponse,
    util::{require_admin, require_bearer},
    ApiError, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPostsQuery {
    /// Zero-based page index, defaults to 0.
    pub page_no: Option<u32>,
    /// Page size, defaults to 10.
    pub page_size: Option<u32>,
    /// One of `id`, `title`, `created_at`; defaults to `id`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (case-insensitive); defaults to `asc`.
    pub sort_dir: Option<String>,
}

impl ListPostsQuery {
    fn into_page_request(self) -> Result<PageRequest, ApiError> {
        let mut page = PageRequest {
            page_no: self.page_no.unwrap_or(0),
            page_size: self.page_size.unwrap_or(10),
            ..PageRequest::default()
        };
        if let Some(field) = self.sort_by.as_deref() {
            page.sort_by = field.parse().map_err(ApiError::from)?;
        }
        if let Some(dir) = self.sort_dir.as_deref() {
            page.sort_dir = dir.parse().map_err(ApiError::from)?;
        }
        Ok(page)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    pub query: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    tag = "Posts",
    security(("bearerAuth" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Invalid post payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let token = require_bearer(&headers)?;
    let identity = state.authenticate(&token)?;
    require_admin(&identity)?;

    let post = state.posts().create(&identity, req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts",
    tag = "Posts",
    params(ListPostsQuery),
    responses(
        (status = 200, description = "Paged list of posts", body = PagedPosts),
        (status = 400, description = "Invalid paging or sort parameters", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PagedPosts>, ApiError> {
    let page = query.into_page_request()?;
    let posts = state.posts().list(page).await?;
    Ok(Json(posts))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    params(("id" = i64, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Post fetched", body = Post),
        (status = 404, description = "Post not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    let post = state.posts().get(id).await?;
    Ok(Json(post))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "Post identifier")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = Post),
        (status = 400, description = "Invalid post payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    let token = require_bearer(&headers)?;
    let identity = state.authenticate(&token)?;
    require_admin(&identity)?;

    let post = state.posts().update(&identity, id, req).await?;
    Ok(Json(post))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let identity = state.authenticate(&token)?;
    require_admin(&identity)?;

    state.posts().delete(&identity, id).await?;
    Ok(Json(MessageResponse {
        message: format!("post with id {id} deleted successfully"),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/search",
    tag = "Posts",
    params(SearchQuery),
    responses(
        (status = 200, description = "Posts matching the keyword", body = [Post])
    )
)]
pub async fn search_posts(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.posts().search(&params.query).await?;
    Ok(Json(posts))
}
