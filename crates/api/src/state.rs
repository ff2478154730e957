use sqlx::SqlitePool;

use scribe_auth::{Authenticator, Identity};
use scribe_posts::PostService;

use crate::ApiError;

#[derive(Clone)]
pub struct AppState {
    authenticator: Authenticator,
    posts: PostService,
}

impl AppState {
    pub fn new(pool: SqlitePool, authenticator: Authenticator) -> Self {
        let posts = PostService::new(pool);
        Self {
            authenticator,
            posts,
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn posts(&self) -> &PostService {
        &self.posts
    }

    /// Validate a bearer token and return the caller's identity. Token
    /// validation is stateless, so this never touches the database.
    pub fn authenticate(&self, token: &str) -> Result<Identity, ApiError> {
        self.authenticator
            .authenticate(token)
            .map_err(ApiError::from)
    }
}
