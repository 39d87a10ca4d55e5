//! Web layer - HTML handlers and routing
//!
//! - News pages (home, detail with comments)
//! - Comment edit/delete pages (author only)
//! - Account pages (signup, login, logout)

pub mod auth;
pub mod comments;
pub mod middleware;
pub mod news;
pub mod routes;

use axum::{
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

pub use middleware::{AppState, AuthenticatedUser, MaybeUser, WebError};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Comment mutation pages need a logged-in user
    let protected_routes = Router::new()
        .route(
            routes::COMMENT_EDIT,
            get(comments::edit_form).post(comments::edit),
        )
        .route(
            routes::COMMENT_DELETE,
            get(comments::delete_form).post(comments::delete),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_login));

    Router::new()
        .route(routes::HOME, get(news::home))
        .route(routes::NEWS_DETAIL, get(news::detail).post(news::post_comment))
        .route(routes::SIGNUP, get(auth::signup_form).post(auth::signup))
        .route(routes::LOGIN, get(auth::login_form).post(auth::login))
        .route(routes::LOGOUT, get(auth::logout).post(auth::logout))
        .merge(protected_routes)
        .fallback(middleware::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::error_pages,
        ))
        // Runs first so every handler and the error pages see the user
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
