mod docs;
mod error;
mod state;
mod util;

pub mod routes;

pub use docs::ApiDoc;
pub use error::ApiError;
pub use state::AppState;

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/auth/signup", post(routes::auth::signup))
        .route("/api/v1/auth/signin", post(routes::auth::signin))
        // Post routes
        .route("/api/v1/posts", get(routes::posts::list_posts))
        .route("/api/v1/posts", post(routes::posts::create_post))
        .route("/api/v1/posts/search", get(routes::posts::search_posts))
        .route("/api/v1/posts/:post_id", get(routes::posts::get_post))
        .route("/api/v1/posts/:post_id", put(routes::posts::update_post))
        .route(
            "/api/v1/posts/:post_id",
            delete(routes::posts::delete_post),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
