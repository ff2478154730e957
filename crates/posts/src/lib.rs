mod entities;
mod error;
mod repository;
mod service;

pub use entities::{
    CreatePostRequest, PageRequest, PagedPosts, Post, SortDirection, SortField, UpdatePostRequest,
};
pub use error::PostError;
pub use repository::PostRepository;
pub use service::{PostService, MAX_PAGE_SIZE};
