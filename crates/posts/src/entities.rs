use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::PostError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Post {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: String,
    pub author_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
}

/// Full replacement of the mutable fields, matching PUT semantics.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
}

/// Columns the listing endpoint may sort by. Only these names ever reach
/// the SQL text, so interpolating `column()` is safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    CreatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::CreatedAt => "created_at",
        }
    }
}

impl Default for SortField {
    fn default() -> Self {
        Self::Id
    }
}

impl FromStr for SortField {
    type Err = PostError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "title" => Ok(Self::Title),
            "created_at" | "createdat" => Ok(Self::CreatedAt),
            other => Err(PostError::InvalidSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl Default for SortDirection {
    fn default() -> Self {
        Self::Asc
    }
}

impl FromStr for SortDirection {
    type Err = PostError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(PostError::InvalidSortDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page_no: u32,
    pub page_size: u32,
    pub sort_by: SortField,
    pub sort_dir: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_no: 0,
            page_size: 10,
            sort_by: SortField::default(),
            sort_dir: SortDirection::default(),
        }
    }
}

/// A page of posts plus the metadata describing its position in the whole.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PagedPosts {
    pub posts: Vec<Post>,
    pub page_no: u32,
    pub page_size: u32,
    pub total_elements: i64,
    pub total_pages: u32,
    pub last: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_parses_case_insensitively() {
        assert_eq!("Title".parse::<SortField>().unwrap(), SortField::Title);
        assert_eq!(
            "CREATED_AT".parse::<SortField>().unwrap(),
            SortField::CreatedAt
        );
        assert!(matches!(
            "author".parse::<SortField>(),
            Err(PostError::InvalidSortField(_))
        ));
    }

    #[test]
    fn sort_direction_parses_case_insensitively() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!(matches!(
            "sideways".parse::<SortDirection>(),
            Err(PostError::InvalidSortDirection(_))
        ));
    }
}
