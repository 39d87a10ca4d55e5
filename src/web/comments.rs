//! Comment edit and delete pages. Author only; everyone else gets 404.

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::forms::CommentForm;
use crate::models::{Comment, User};
use crate::services::CommentServiceError;

use super::middleware::{AppState, AuthenticatedUser, WebError};
use super::routes;

/// GET /edit_comment/{id}/
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Html<String>, WebError> {
    let comment = state.comment_service.get_own(id, &user).await?;
    let form = CommentForm::new(comment.text.clone());
    render_edit(&state, &user, &comment, form).await
}

/// POST /edit_comment/{id}/
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<CommentForm>,
) -> Result<Response, WebError> {
    match state.comment_service.update(id, &user, form).await {
        Ok(comment) => Ok(Redirect::to(&routes::news_comments(comment.news_id)).into_response()),
        Err(CommentServiceError::Validation(form)) => {
            let comment = state.comment_service.get_own(id, &user).await?;
            Ok(render_edit(&state, &user, &comment, form).await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /delete_comment/{id}/ - confirmation page
pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Html<String>, WebError> {
    let comment = state.comment_service.get_own(id, &user).await?;

    let mut context = TeraContext::new();
    context.insert("comment", &comment);
    state.render("news/delete.html", Some(&user), context)
}

/// POST /delete_comment/{id}/
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Redirect, WebError> {
    let comment = state.comment_service.delete(id, &user).await?;
    Ok(Redirect::to(&routes::news_comments(comment.news_id)))
}

async fn render_edit(
    state: &AppState,
    user: &User,
    comment: &Comment,
    form: CommentForm,
) -> Result<Html<String>, WebError> {
    let news = state.news_service.get(comment.news_id).await?;

    let mut context = TeraContext::new();
    context.insert("news", &news);
    context.insert("comment", comment);
    context.insert("form", &form);
    context.insert("form_action", &routes::comment_edit(comment.id));
    state.render("news/edit.html", Some(user), context)
}
