//! Tests for the template engine

use super::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tera::Context as TeraContext;

const PAGES: &[&str] = &[
    "news/home.html",
    "news/detail.html",
    "news/edit.html",
    "news/delete.html",
    "users/signup.html",
    "users/login.html",
    "users/logged_out.html",
    "errors/404.html",
];

/// Write an override directory containing `news/home.html`
fn create_override_dir(temp: &TempDir) -> PathBuf {
    let dir = temp.path().join("theme");
    fs::create_dir_all(dir.join("news")).unwrap();
    fs::write(
        dir.join("news/home.html"),
        r#"{% extends "base.html" %}{% block content %}<p>custom home</p>{% endblock %}"#,
    )
    .unwrap();
    dir
}

fn anonymous_context() -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("user", &Option::<()>::None);
    context
}

#[test]
fn test_builtin_templates_loaded() {
    let engine = ThemeEngine::new(None).unwrap();
    for page in PAGES {
        assert!(engine.has_template(page), "missing template {}", page);
    }
    assert!(engine.has_template("base.html"));
}

#[test]
fn test_render_home_escapes_titles() {
    let engine = ThemeEngine::new(None).unwrap();
    let mut context = anonymous_context();
    context.insert(
        "news_list",
        &serde_json::json!([{
            "id": 1,
            "title": "<script>alert(1)</script>",
            "text": "Просто текст.",
            "date": "2024-05-01",
            "comment_count": 2
        }]),
    );

    let html = engine.render("news/home.html", &context).unwrap();

    assert!(html.contains("/news/1/"));
    assert!(html.contains("01.05.2024"));
    assert!(!html.contains("<script>alert(1)</script>"));
}

#[test]
fn test_override_replaces_builtin() {
    let temp = TempDir::new().unwrap();
    let dir = create_override_dir(&temp);

    let engine = ThemeEngine::new(Some(dir.as_path())).unwrap();
    let html = engine.render("news/home.html", &anonymous_context()).unwrap();

    assert!(html.contains("custom home"));
    // Untouched pages still come from the binary
    assert!(engine.has_template("news/detail.html"));
}

#[test]
fn test_missing_override_dir_falls_back() {
    let temp = TempDir::new().unwrap();
    let engine = ThemeEngine::new(Some(temp.path().join("nope").as_path())).unwrap();
    assert!(engine.has_template("news/home.html"));
}

#[test]
fn test_render_unknown_template() {
    let engine = ThemeEngine::new(None).unwrap();
    let err = engine
        .render("nope.html", &TeraContext::new())
        .unwrap_err();
    assert!(err.to_string().contains("nope.html"));
}

#[test]
fn test_invalid_template_error() {
    let result = ThemeEngine::from_templates(vec![(
        "broken.html".to_string(),
        "{% if %}".to_string(),
    )]);
    assert!(result.is_err());
}

#[test]
fn test_template_names_sorted() {
    let engine = ThemeEngine::from_templates(vec![
        ("b.html".to_string(), "b".to_string()),
        ("a.html".to_string(), "a".to_string()),
    ])
    .unwrap();
    assert_eq!(engine.template_names(), vec!["a.html", "b.html"]);
}
