//! Template engine
//!
//! Renders HTML pages with Tera. Templates ship inside the binary (the
//! `templates/` directory, embedded with rust-embed); a directory configured
//! under `theme.path` may replace any of them by name, e.g. a file
//! `news/home.html` there overrides the built-in home page.

use anyhow::{Context, Result};
use rust_embed::RustEmbed;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

mod error;

pub use error::ThemeError;

/// Built-in templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct DefaultTemplates;

/// Template engine shared by all handlers
pub struct ThemeEngine {
    tera: Tera,
}

impl ThemeEngine {
    /// Load the built-in templates, then apply overrides from `override_dir`
    pub fn new(override_dir: Option<&Path>) -> Result<Self> {
        let mut templates = embedded_templates()?;

        if let Some(dir) = override_dir {
            if dir.is_dir() {
                let mut overrides = Vec::new();
                collect_templates_from_dir(dir, dir, &mut overrides)?;
                tracing::info!(
                    "Loaded {} template override(s) from {:?}",
                    overrides.len(),
                    dir
                );
                for (name, content) in overrides {
                    templates.retain(|(existing, _)| existing != &name);
                    templates.push((name, content));
                }
            } else {
                tracing::warn!("Template override directory {:?} does not exist", dir);
            }
        }

        Self::from_templates(templates)
    }

    /// Build an engine from raw `(name, source)` pairs
    pub fn from_templates(templates: Vec<(String, String)>) -> Result<Self> {
        let mut tera = Tera::default();
        // add_raw_templates resolves inheritance across the whole batch
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(describe(&e)))?;
        Ok(Self { tera })
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        if !self.has_template(template) {
            return Err(ThemeError::NotFound(template.to_string()).into());
        }
        self.tera.render(template, context).map_err(|e| {
            ThemeError::TemplateError(format!("Failed to render '{}': {}", template, describe(&e)))
                .into()
        })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    /// Registered template names, sorted
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tera.get_template_names().map(str::to_string).collect();
        names.sort();
        names
    }
}

/// Tera errors nest the interesting part in `source()`
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

fn embedded_templates() -> Result<Vec<(String, String)>> {
    let mut templates = Vec::new();
    for name in DefaultTemplates::iter() {
        let file = DefaultTemplates::get(&name)
            .ok_or_else(|| ThemeError::NotFound(name.to_string()))?;
        let content = String::from_utf8(file.data.into_owned())
            .with_context(|| format!("Template is not valid UTF-8: {}", name))?;
        templates.push((name.to_string(), content));
    }
    Ok(templates)
}

/// Recursively read `.html` files, naming them relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<()> {
    for entry in fs::read_dir(current_path).map_err(ThemeError::from)? {
        let path = entry.map_err(ThemeError::from)?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().map_or(false, |ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?;

            // Forward slashes on every platform
            let name = relative_path.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;

            templates.push((name, content));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
