//! Web middleware
//!
//! Contains:
//! - Shared application state
//! - Session cookie authentication (optional and required variants)
//! - The HTML error type and the layer that renders error pages

use anyhow::Result;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tera::Context as TeraContext;

use crate::config::Config;
use crate::db::repositories::{
    SqlxCommentRepository, SqlxNewsRepository, SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DbPool;
use crate::forms::BadWordsFilter;
use crate::models::User;
use crate::services::{
    CommentService, CommentServiceError, NewsService, NewsServiceError, UserService,
    UserServiceError,
};
use crate::theme::ThemeEngine;

use super::routes;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub news_service: Arc<NewsService>,
    pub comment_service: Arc<CommentService>,
    pub user_service: Arc<UserService>,
    pub theme_engine: Arc<ThemeEngine>,
}

impl AppState {
    /// Wire repositories, services and templates for `pool`
    pub fn new(pool: DbPool, config: Config) -> Result<Self> {
        let news_repo = SqlxNewsRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());

        let news_service = NewsService::new(
            news_repo.clone(),
            comment_repo.clone(),
            config.news.news_count_on_home_page,
        );
        let comment_service = CommentService::new(
            comment_repo,
            news_repo,
            BadWordsFilter::from_config(&config.comments),
        );
        let user_service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            config.auth.session_expiration_days,
        );
        let theme_engine = ThemeEngine::new(config.theme.path.as_deref())?;

        Ok(Self {
            pool,
            config: Arc::new(config),
            news_service: Arc::new(news_service),
            comment_service: Arc::new(comment_service),
            user_service: Arc::new(user_service),
            theme_engine: Arc::new(theme_engine),
        })
    }

    /// Render a page. Every page sees `user`, which is null for anonymous visitors.
    pub fn render(
        &self,
        template: &str,
        user: Option<&User>,
        mut context: TeraContext,
    ) -> Result<Html<String>, WebError> {
        context.insert("user", &user);
        let html = self.theme_engine.render(template, &context)?;
        Ok(Html(html))
    }
}

/// Logged-in user, placed in request extensions by [`optional_auth`]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| login_redirect(parts))
    }
}

/// The current user if there is one. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|u| u.0.clone()),
        ))
    }
}

/// Session token from the `session` cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value for a fresh session
pub fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Resolve the session cookie to a user, if valid. Anonymous requests pass
/// through untouched.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(request.headers()) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthenticatedUser(user));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Session validation failed: {}", e),
        }
    }
    next.run(request).await
}

/// Redirect anonymous requests to the login page, remembering where they
/// were going. Must run inside [`optional_auth`].
pub async fn require_login(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        let (parts, _body) = request.into_parts();
        return login_redirect(&parts);
    }
    next.run(request).await
}

fn login_redirect(parts: &Parts) -> Response {
    let next = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(routes::HOME);
    Redirect::to(&routes::login_with_next(next)).into_response()
}

/// Marker left on error responses so [`error_pages`] can render them
#[derive(Debug, Clone, Copy)]
pub struct ErrorPage(pub StatusCode);

/// Error type for HTML handlers
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match self {
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::Internal(e) => {
                tracing::error!("Request failed: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut response = (status, Html(simple_error_page(status))).into_response();
        response.extensions_mut().insert(ErrorPage(status));
        response
    }
}

impl From<NewsServiceError> for WebError {
    fn from(e: NewsServiceError) -> Self {
        match e {
            NewsServiceError::NotFound(_) => WebError::NotFound,
            other => WebError::Internal(other.into()),
        }
    }
}

impl From<CommentServiceError> for WebError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::NotFound => WebError::NotFound,
            other => WebError::Internal(other.into()),
        }
    }
}

impl From<UserServiceError> for WebError {
    fn from(e: UserServiceError) -> Self {
        WebError::Internal(e.into())
    }
}

/// Replace the plain body of error responses with the themed error page
pub async fn error_pages(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.0.clone());
    let response = next.run(request).await;

    let status = match response.extensions().get::<ErrorPage>() {
        Some(ErrorPage(status)) => *status,
        None => return response,
    };
    let template = if status == StatusCode::NOT_FOUND {
        "errors/404.html"
    } else {
        "errors/500.html"
    };

    match state.render(template, user.as_ref(), TeraContext::new()) {
        Ok(html) => (status, html).into_response(),
        Err(_) => response,
    }
}

/// Fallback for unknown paths
pub async fn not_found() -> WebError {
    WebError::NotFound
}

/// Last-resort page when templates are unavailable
fn simple_error_page(status: StatusCode) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{0}</title></head>\
         <body><h1>{0}</h1></body></html>",
        status
    )
}
