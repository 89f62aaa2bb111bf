//! Error types and error handling
//!
//! Engine failures are classified by [`TemplateError`] and normalised into a
//! single [`RenderError`] at the resolver boundary, so callers only ever see
//! one error type carrying the canonical template path.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Boxed error from the underlying template engine
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure raised by a template engine while looking up or rendering a template
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template source contains the requested path
    #[error("Template not found for name '{0}'")]
    NotFound(String),

    /// The template failed to compile or evaluate
    ///
    /// Covers syntax errors and references to undefined variables.
    #[error("{0}")]
    Evaluation(#[source] EngineError),

    /// Writing the rendered output failed
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    /// Wrap an engine-specific evaluation failure
    pub fn evaluation(err: impl Into<EngineError>) -> Self {
        Self::Evaluation(err.into())
    }

    /// Whether the template could not be found
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A template view could not be rendered
///
/// The message always names the canonical template path, never the raw
/// view name the handler supplied.
#[derive(Debug, Error)]
#[error("Failed to render template '{path}': {source}")]
pub struct RenderError {
    path: String,
    #[source]
    source: TemplateError,
}

impl RenderError {
    /// Create a render error for the given canonical path
    #[must_use]
    pub fn new(path: impl Into<String>, source: TemplateError) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    /// Canonical path of the template that failed
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The classified engine failure
    #[must_use]
    pub const fn kind(&self) -> &TemplateError {
        &self.source
    }

    /// Whether the failure was a missing template
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        self.source.is_not_found()
    }
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        tracing::error!(template = %self.path, error = %self.source, "Template rendering error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Template rendering failed",
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_message_names_canonical_path() {
        let err = RenderError::new(
            "/ftl/missing.ftl",
            TemplateError::NotFound("/ftl/missing.ftl".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "Failed to render template '/ftl/missing.ftl': Template not found for name '/ftl/missing.ftl'"
        );
        assert!(err.is_not_found());
        assert_eq!(err.path(), "/ftl/missing.ftl");
    }

    #[test]
    fn test_io_error_is_wrapped_verbatim() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "client went away");
        let err = RenderError::new("/basic.ftl", io.into());
        assert_eq!(
            err.to_string(),
            "Failed to render template '/basic.ftl': client went away"
        );
        assert!(matches!(err.kind(), TemplateError::Io(_)));
    }

    #[test]
    fn test_render_error_into_response_is_server_error() {
        let err = RenderError::new("/x.ftl", TemplateError::evaluation("boom"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
