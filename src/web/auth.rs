//! Account pages: signup, login and logout

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tera::Context as TeraContext;

use crate::forms::{LoginForm, SignupForm};
use crate::models::User;
use crate::services::UserServiceError;

use super::middleware::{
    clear_session_cookie, extract_session_token, session_cookie, AppState, MaybeUser, WebError,
};
use super::routes;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// GET /auth/signup/
pub async fn signup_form(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>, WebError> {
    render_signup(&state, user.as_ref(), &SignupForm::default())
}

/// POST /auth/signup/ - create the account, then send the user to log in
pub async fn signup(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<SignupForm>,
) -> Result<Response, WebError> {
    match state.user_service.register(form).await {
        Ok(_) => Ok(Redirect::to(&routes::login()).into_response()),
        Err(UserServiceError::Validation(form)) => {
            Ok(render_signup(&state, user.as_ref(), &form)?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /auth/login/
pub async fn login_form(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, WebError> {
    let form = LoginForm {
        next: query.next,
        ..Default::default()
    };
    render_login(&state, user.as_ref(), &form)
}

/// POST /auth/login/
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(mut form): Form<LoginForm>,
) -> Result<Response, WebError> {
    if !form.validate() {
        return Ok(render_login(&state, user.as_ref(), &form)?.into_response());
    }

    let session = match state.user_service.login(&form.username, &form.password).await {
        Ok(session) => session,
        Err(UserServiceError::AuthenticationError(message)) => {
            form.errors.add_non_field(message);
            return Ok(render_login(&state, user.as_ref(), &form)?.into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let target = form.safe_next().map(str::to_string).unwrap_or_else(routes::home);
    let cookie = session_cookie(&session.id, session.max_age_seconds());
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response())
}

/// GET or POST /auth/logout/
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }

    let html = state.render("users/logged_out.html", None, TeraContext::new())?;
    Ok(([(header::SET_COOKIE, clear_session_cookie())], html).into_response())
}

fn render_signup(
    state: &AppState,
    user: Option<&User>,
    form: &SignupForm,
) -> Result<Html<String>, WebError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    state.render("users/signup.html", user, context)
}

fn render_login(
    state: &AppState,
    user: Option<&User>,
    form: &LoginForm,
) -> Result<Html<String>, WebError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    state.render("users/login.html", user, context)
}
