//! Named routes
//!
//! Path patterns for the router and reverse functions building concrete
//! URLs, so handlers and templates never hand-assemble paths.

pub const HOME: &str = "/";
pub const NEWS_DETAIL: &str = "/news/{id}/";
pub const COMMENT_EDIT: &str = "/edit_comment/{id}/";
pub const COMMENT_DELETE: &str = "/delete_comment/{id}/";
pub const SIGNUP: &str = "/auth/signup/";
pub const LOGIN: &str = "/auth/login/";
pub const LOGOUT: &str = "/auth/logout/";

/// `news:home`
pub fn home() -> String {
    HOME.to_string()
}

/// `news:detail`
pub fn news_detail(id: i64) -> String {
    format!("/news/{}/", id)
}

/// Detail page scrolled to the comment thread
pub fn news_comments(id: i64) -> String {
    format!("{}#comments", news_detail(id))
}

/// `news:edit`
pub fn comment_edit(id: i64) -> String {
    format!("/edit_comment/{}/", id)
}

/// `news:delete`
pub fn comment_delete(id: i64) -> String {
    format!("/delete_comment/{}/", id)
}

/// `users:signup`
pub fn signup() -> String {
    SIGNUP.to_string()
}

/// `users:login`
pub fn login() -> String {
    LOGIN.to_string()
}

/// `users:logout`
pub fn logout() -> String {
    LOGOUT.to_string()
}

/// Percent-encode a path for the `next` parameter, keeping `/` readable
pub fn encode_next(path: &str) -> String {
    urlencoding::encode(path).replace("%2F", "/")
}

/// Login page that sends the user back to `next` afterwards
pub fn login_with_next(next: &str) -> String {
    format!("{}?next={}", LOGIN, encode_next(next))
}
