//! HTML form data and validation
//!
//! Forms deserialize from `application/x-www-form-urlencoded` bodies, carry
//! their own field errors and are rendered back into templates when invalid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::CommentsConfig;

/// Error shown for an empty required field
pub const REQUIRED_FIELD: &str = "Обязательное поле.";

/// Maximum username length
pub const USERNAME_MAX_LEN: usize = 150;

/// Field-level and form-level validation errors.
///
/// Serializes as `{"text": ["..."], "__all__": ["..."]}` so templates can
/// look errors up by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    /// Key used for errors not tied to a field
    pub const NON_FIELD: &'static str = "__all__";

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(Self::NON_FIELD, message);
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        self.field(Self::NON_FIELD)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Forbidden-word filter for comment text.
///
/// Matching is a case-sensitive substring search.
#[derive(Debug, Clone)]
pub struct BadWordsFilter {
    words: Vec<String>,
    warning: String,
}

impl BadWordsFilter {
    pub fn new<I, S>(words: I, warning: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        Self {
            words: words.into_iter().filter(|w| !w.is_empty()).collect(),
            warning: warning.into(),
        }
    }

    pub fn from_config(config: &CommentsConfig) -> Self {
        Self::new(config.bad_words.iter().cloned(), config.warning.clone())
    }

    /// First forbidden word contained in `text`, if any
    pub fn find(&self, text: &str) -> Option<&str> {
        self.words
            .iter()
            .find(|word| text.contains(word.as_str()))
            .map(String::as_str)
    }

    pub fn warning(&self) -> &str {
        &self.warning
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// Comment submission and edit form.
///
/// Extra fields in the body (`news`, `author`) are ignored; both come from
/// the URL and the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
    #[serde(skip_deserializing)]
    pub errors: FormErrors,
}

impl CommentForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            errors: FormErrors::default(),
        }
    }

    /// Validate in place. Returns true when the form has no errors.
    pub fn validate(&mut self, filter: &BadWordsFilter) -> bool {
        self.errors = FormErrors::default();

        if self.text.trim().is_empty() {
            self.errors.add("text", REQUIRED_FIELD);
        } else if filter.find(&self.text).is_some() {
            self.errors.add("text", filter.warning());
        }

        self.errors.is_empty()
    }
}

/// Account registration form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
    #[serde(skip_deserializing)]
    pub errors: FormErrors,
}

impl SignupForm {
    pub fn new(
        username: impl Into<String>,
        password1: impl Into<String>,
        password2: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password1: password1.into(),
            password2: password2.into(),
            errors: FormErrors::default(),
        }
    }

    /// Checks that need no database access. Username uniqueness is checked
    /// by the user service.
    pub fn validate(&mut self) -> bool {
        self.errors = FormErrors::default();
        self.username = self.username.trim().to_string();

        if self.username.is_empty() {
            self.errors.add("username", REQUIRED_FIELD);
        } else if self.username.chars().count() > USERNAME_MAX_LEN {
            self.errors.add(
                "username",
                format!("Не более {} символов.", USERNAME_MAX_LEN),
            );
        }

        if self.password1.is_empty() {
            self.errors.add("password1", REQUIRED_FIELD);
        }
        if self.password2.is_empty() {
            self.errors.add("password2", REQUIRED_FIELD);
        } else if self.password1 != self.password2 {
            self.errors.add("password2", "Введенные пароли не совпадают.");
        }

        self.errors.is_empty()
    }
}

/// Login form. `next` is where to go after a successful login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(skip_deserializing)]
    pub errors: FormErrors,
}

impl LoginForm {
    pub fn validate(&mut self) -> bool {
        self.errors = FormErrors::default();
        if self.username.trim().is_empty() {
            self.errors.add("username", REQUIRED_FIELD);
        }
        if self.password.is_empty() {
            self.errors.add("password", REQUIRED_FIELD);
        }
        self.errors.is_empty()
    }

    /// Local redirect target, rejecting absolute and protocol-relative URLs
    pub fn safe_next(&self) -> Option<&str> {
        self.next
            .as_deref()
            .filter(|next| next.starts_with('/') && !next.starts_with("//"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> BadWordsFilter {
        BadWordsFilter::from_config(&CommentsConfig::default())
    }

    #[test]
    fn test_bad_word_rejected_with_warning() {
        let mut form = CommentForm::new("Какой-то текст, редиска, еще текст");

        assert!(!form.validate(&filter()));
        assert_eq!(form.errors.field("text"), ["Не ругайтесь!".to_string()]);
    }

    #[test]
    fn test_bad_word_match_is_case_sensitive() {
        let mut form = CommentForm::new("РЕДИСКА");
        assert!(form.validate(&filter()));
    }

    #[test]
    fn test_clean_comment_accepted() {
        let mut form = CommentForm::new("Отличная новость");
        assert!(form.validate(&filter()));
        assert!(form.errors.is_empty());
    }

    #[test]
    fn test_blank_comment_required() {
        let mut form = CommentForm::new("   ");
        assert!(!form.validate(&filter()));
        assert_eq!(form.errors.field("text"), [REQUIRED_FIELD.to_string()]);
    }

    #[test]
    fn test_comment_form_ignores_extra_fields() {
        let form: CommentForm = serde_json::from_value(serde_json::json!({
            "news": 1,
            "author": 2,
            "text": "Комментарий формы"
        }))
        .unwrap();
        assert_eq!(form.text, "Комментарий формы");
    }

    #[test]
    fn test_empty_words_dropped_from_filter() {
        let filter = BadWordsFilter::new(["", "плохо"], "warn");
        assert_eq!(filter.words(), ["плохо".to_string()]);
        assert!(filter.find("всё хорошо").is_none());
    }

    #[test]
    fn test_errors_serialize_by_field() {
        let mut errors = FormErrors::default();
        errors.add("text", "a");
        errors.add_non_field("b");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"text": ["a"], "__all__": ["b"]}));
    }

    #[test]
    fn test_signup_password_mismatch() {
        let mut form = SignupForm::new("user", "secret-1", "secret-2");
        assert!(!form.validate());
        assert_eq!(form.errors.field("password2").len(), 1);
        assert!(form.errors.field("username").is_empty());
    }

    #[test]
    fn test_signup_username_too_long() {
        let mut form = SignupForm::new("я".repeat(USERNAME_MAX_LEN + 1), "pw", "pw");
        assert!(!form.validate());
        assert_eq!(form.errors.field("username").len(), 1);
    }

    #[test]
    fn test_login_safe_next() {
        let mut form = LoginForm {
            next: Some("/edit_comment/1/".to_string()),
            ..Default::default()
        };
        assert_eq!(form.safe_next(), Some("/edit_comment/1/"));

        form.next = Some("//evil.example/".to_string());
        assert_eq!(form.safe_next(), None);

        form.next = Some("https://evil.example/".to_string());
        assert_eq!(form.safe_next(), None);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Any text containing a forbidden word is rejected with the warning
        #[test]
        fn bad_word_anywhere_is_rejected(
            prefix in "[a-zA-Z0-9 ,.]{0,20}",
            suffix in "[a-zA-Z0-9 ,.]{0,20}",
            pick in 0usize..2,
        ) {
            let filter = BadWordsFilter::from_config(&CommentsConfig::default());
            let word = filter.words()[pick].clone();
            let mut form = CommentForm::new(format!("{}{}{}", prefix, word, suffix));

            prop_assert!(!form.validate(&filter));
            prop_assert_eq!(form.errors.field("text"), [filter.warning().to_string()]);
        }

        /// Latin text never contains the Cyrillic forbidden words
        #[test]
        fn latin_text_is_accepted(text in "[a-zA-Z][a-zA-Z0-9 ,.]{0,40}") {
            let filter = BadWordsFilter::from_config(&CommentsConfig::default());
            let mut form = CommentForm::new(text);
            prop_assert!(form.validate(&filter));
        }
    }
}
