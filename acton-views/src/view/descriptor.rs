//! The template view returned by handlers

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::naming::resolve_view_name;
use crate::model::Model;
use crate::registry::{PendingView, View};
use crate::response::Cookie;

/// Default character encoding of rendered output
pub const DEFAULT_CHARACTER_ENCODING: &str = "UTF-8";

/// A request to render a named template
///
/// Carries the raw view name, the view's local variables and the response
/// metadata to apply before the body is written. A view is built once and
/// not modified afterwards; use [`TemplateView::builder`] to customise the
/// metadata.
///
/// Returning a `TemplateView` from an axum handler defers rendering to the
/// [`ViewLayer`](crate::middleware::ViewLayer), which must be installed on
/// the router.
///
/// # Examples
///
/// ```rust
/// use acton_views::{Cookie, Model, TemplateView};
/// use axum::http::StatusCode;
///
/// let view = TemplateView::builder("users/show")
///     .model(Model::new().with("name", "Ada"))
///     .status(StatusCode::CREATED)
///     .header("X-Frame-Options", "DENY")
///     .cookie(Cookie::new("seen", "1"))
///     .build();
///
/// assert_eq!(view.template_path(), "/ftl/users/show.ftl");
/// assert_eq!(view.to_string(), "users/show (/ftl/users/show.ftl)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateView {
    name: String,
    model: Model,
    status: StatusCode,
    content_type: String,
    character_encoding: String,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie>,
}

impl TemplateView {
    /// A view with an empty model and default metadata
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// A view with the given local model and default metadata
    #[must_use]
    pub fn with_model(name: impl Into<String>, model: Model) -> Self {
        Self::builder(name).model(model).build()
    }

    /// Start building a view with custom response metadata
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TemplateViewBuilder {
        TemplateViewBuilder {
            view: Self {
                name: name.into(),
                model: Model::new(),
                status: StatusCode::OK,
                content_type: mime::TEXT_HTML.to_string(),
                character_encoding: DEFAULT_CHARACTER_ENCODING.to_string(),
                headers: Vec::new(),
                cookies: Vec::new(),
            },
        }
    }

    /// The view name exactly as the handler supplied it
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical template path
    #[must_use]
    pub fn template_path(&self) -> String {
        resolve_view_name(&self.name)
    }

    /// The view's local variables
    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.model
    }

    /// Response status code
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response content type, without charset
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Character encoding of the rendered body
    #[must_use]
    pub fn character_encoding(&self) -> &str {
        &self.character_encoding
    }

    /// Extra response headers, in the order they were added
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Value of the last header with this name, compared case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Cookies to attach to the response
    #[must_use]
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// The last cookie with this name
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().rev().find(|c| c.name() == name)
    }
}

impl fmt::Display for TemplateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.template_path();
        if path == self.name {
            f.write_str(&self.name)
        } else {
            write!(f, "{} ({path})", self.name)
        }
    }
}

impl View for TemplateView {}

impl IntoResponse for TemplateView {
    fn into_response(self) -> Response {
        PendingView::new(self).into_response()
    }
}

/// Builder for a [`TemplateView`]
#[derive(Debug, Clone)]
#[must_use]
pub struct TemplateViewBuilder {
    view: TemplateView,
}

impl TemplateViewBuilder {
    /// Set the local model, replacing any earlier one
    pub fn model(mut self, model: Model) -> Self {
        self.view.model = model;
        self
    }

    /// Set the response status code
    pub const fn status(mut self, status: StatusCode) -> Self {
        self.view.status = status;
        self
    }

    /// Set the response content type
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.view.content_type = content_type.into();
        self
    }

    /// Set the character encoding of the rendered body
    pub fn character_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.view.character_encoding = encoding.into();
        self
    }

    /// Add a response header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.view.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a cookie to the response
    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.view.cookies.push(cookie);
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> TemplateView {
        self.view
    }
}
