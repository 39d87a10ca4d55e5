//! News pages: home listing and the detail page with its comment thread

use axum::{
    extract::{Path, State},
    http::Uri,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::forms::CommentForm;
use crate::models::User;
use crate::services::{CommentServiceError, NewsDetail};

use super::middleware::{AppState, MaybeUser, WebError};
use super::routes;

/// GET / - most recent news
pub async fn home(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>, WebError> {
    let news_list = state.news_service.home_page().await?;

    let mut context = TeraContext::new();
    context.insert("news_list", &news_list);
    state.render("news/home.html", user.as_ref(), context)
}

/// GET /news/{id}/
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    MaybeUser(user): MaybeUser,
    uri: Uri,
) -> Result<Html<String>, WebError> {
    let detail = state.news_service.detail(id).await?;
    let form = user.as_ref().map(|_| CommentForm::default());
    render_detail(&state, user.as_ref(), detail, form, &uri)
}

/// POST /news/{id}/ - add a comment.
///
/// Anonymous submissions are dropped and the page renders as for a GET.
pub async fn post_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    MaybeUser(user): MaybeUser,
    uri: Uri,
    Form(form): Form<CommentForm>,
) -> Result<Response, WebError> {
    let Some(author) = user else {
        tracing::debug!(news_id = id, "Ignoring anonymous comment");
        let detail = state.news_service.detail(id).await?;
        return Ok(render_detail(&state, None, detail, None, &uri)?.into_response());
    };

    match state.comment_service.create(id, &author, form).await {
        Ok(_) => Ok(Redirect::to(&routes::news_comments(id)).into_response()),
        Err(CommentServiceError::Validation(form)) => {
            let detail = state.news_service.detail(id).await?;
            Ok(render_detail(&state, Some(&author), detail, Some(form), &uri)?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

fn render_detail(
    state: &AppState,
    user: Option<&User>,
    detail: NewsDetail,
    form: Option<CommentForm>,
    uri: &Uri,
) -> Result<Html<String>, WebError> {
    let mut context = TeraContext::new();
    context.insert("news", &detail.news);
    context.insert("comments", &detail.comments);
    context.insert("form", &form);
    context.insert("form_action", &routes::news_detail(detail.news.id));
    context.insert("login_next", &routes::encode_next(uri.path()));
    state.render("news/detail.html", user, context)
}
