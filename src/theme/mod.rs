//! Page renderer
//!
//! Renders the portal and admin pages with Tera. Templates are embedded in the
//! binary from `templates/`, so the server has no runtime asset directory.
//! Custom filters:
//! - `countdown`: seconds as `MM:SS`
//! - `datetime`: RFC 3339 timestamp as a short local-style date
//! - `duration_label`: package minutes as a human duration
//! - `money`: amount in KES with two decimals

use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera, Value};

use crate::models::format_duration;
use crate::services::format_countdown;

mod error;

pub use error::RenderError;

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct PageTemplates;

/// Tera instance holding every embedded page template
pub struct PageRenderer {
    tera: Tera,
}

impl std::fmt::Debug for PageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer")
            .field("templates", &self.template_names())
            .finish()
    }
}

impl PageRenderer {
    /// Load all embedded templates and register the filters
    pub fn new() -> Result<Self, RenderError> {
        let mut templates = Vec::new();
        for name in PageTemplates::iter() {
            let Some(file) = PageTemplates::get(&name) else {
                continue;
            };
            let content = String::from_utf8(file.data.into_owned())
                .map_err(|_| RenderError::InvalidAsset(name.to_string()))?;
            templates.push((name.to_string(), content));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| RenderError::TemplateError(describe(&e)))?;

        tera.register_filter("countdown", countdown_filter);
        tera.register_filter("datetime", datetime_filter);
        tera.register_filter("duration_label", duration_filter);
        tera.register_filter("money", money_filter);

        tracing::debug!("Loaded {} page templates", tera.get_template_names().count());
        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, RenderError> {
        self.tera.render(template, context).map_err(|e| {
            RenderError::TemplateError(format!("Failed to render '{}': {}", template, describe(&e)))
        })
    }

    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tera.get_template_names().map(String::from).collect();
        names.sort();
        names
    }

    /// Last resort page when a template itself fails
    pub fn error_page(message: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Something went wrong</title>
</head>
<body style="font-family: sans-serif; max-width: 600px; margin: 50px auto;">
    <h1>Something went wrong</h1>
    <p>{}</p>
    <p><a href="/">Back to packages</a></p>
</body>
</html>"#,
            escape_html(message)
        )
    }
}

/// Flatten an error and its sources into one line
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(s) = source {
        message.push_str(&format!(": {}", s));
        source = s.source();
    }
    message
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn countdown_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let seconds = value
        .as_u64()
        .ok_or_else(|| tera::Error::msg("countdown expects a non-negative integer"))?;
    Ok(Value::String(format_countdown(
        u32::try_from(seconds).unwrap_or(u32::MAX),
    )))
}

fn datetime_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let Some(raw) = value.as_str() else {
        return Ok(Value::String("-".to_string()));
    };
    let formatted = chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%b %-d, %Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string());
    Ok(Value::String(formatted))
}

fn duration_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let minutes = value
        .as_i64()
        .or_else(|| value.as_f64().map(|m| m as i64))
        .ok_or_else(|| tera::Error::msg("duration_label expects a number of minutes"))?;
    Ok(Value::String(format_duration(minutes)))
}

fn money_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let amount = value
        .as_f64()
        .ok_or_else(|| tera::Error::msg("money expects a number"))?;
    Ok(Value::String(format!("KES {:.2}", amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(
        filter: fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>,
        value: Value,
    ) -> String {
        filter(&value, &HashMap::new())
            .unwrap()
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_all_pages_are_embedded() {
        let renderer = PageRenderer::new().unwrap();
        let names = renderer.template_names();
        for page in [
            "base.html",
            "portal.html",
            "payment/pending.html",
            "payment/success.html",
            "payment/failure.html",
            "admin/layout.html",
            "admin/login.html",
            "admin/loading.html",
            "admin/dashboard.html",
            "admin/users.html",
            "admin/packages.html",
            "admin/payments.html",
        ] {
            assert!(names.iter().any(|n| n == page), "missing {}", page);
        }
    }

    #[test]
    fn test_countdown_filter() {
        assert_eq!(apply(countdown_filter, json!(120)), "02:00");
        assert_eq!(apply(countdown_filter, json!(5)), "00:05");
        assert!(countdown_filter(&json!("soon"), &HashMap::new()).is_err());
    }

    #[test]
    fn test_datetime_filter() {
        assert_eq!(
            apply(datetime_filter, json!("2025-03-05T14:30:00Z")),
            "Mar 5, 2025 14:30"
        );
        assert_eq!(apply(datetime_filter, json!("yesterday")), "yesterday");
        assert_eq!(apply(datetime_filter, Value::Null), "-");
    }

    #[test]
    fn test_duration_and_money_filters() {
        assert_eq!(apply(duration_filter, json!(90)), "1.5 hour(s)");
        assert_eq!(apply(duration_filter, json!(30)), "30 minutes");
        assert_eq!(apply(money_filter, json!(50)), "KES 50.00");
    }

    #[test]
    fn test_error_page_escapes_message() {
        let page = PageRenderer::error_page("<script>x</script>");
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let renderer = PageRenderer::new().unwrap();
        let err = renderer.render("missing.html", &TeraContext::new()).unwrap_err();
        assert!(matches!(err, RenderError::TemplateError(_)));
    }
}
