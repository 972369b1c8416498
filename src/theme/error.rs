//! Page renderer error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Embedded template is not valid UTF-8
    #[error("Invalid template asset: {0}")]
    InvalidAsset(String),

    /// Template parsing or rendering error
    #[error("Template error: {0}")]
    TemplateError(String),
}
