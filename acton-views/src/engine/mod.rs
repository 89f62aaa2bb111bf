//! Template engine abstraction
//!
//! The resolver only needs two things from an engine: look a template up by
//! canonical path, compiling it if necessary, and render a compiled template
//! against a model into a writer. [`JinjaEngine`] provides both on top of
//! minijinja.

mod jinja;
mod loader;

pub use jinja::{CacheMode, JinjaEngine, JinjaTemplate};
pub use loader::{LayeredLoader, TemplateSource};

use std::io;

use crate::error::TemplateError;
use crate::model::Model;

/// A template engine that can look up templates by canonical path
///
/// Implementations must be safe to share between concurrently handled
/// requests.
pub trait TemplateEngine: Send + Sync {
    /// A compiled template, possibly borrowing from the engine
    type Template<'a>: CompiledTemplate
    where
        Self: 'a;

    /// Look up the template at `path`, compiling and caching it as needed
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] if no template source has `path`,
    /// or [`TemplateError::Evaluation`] if the template does not compile.
    fn get_or_compile(&self, path: &str) -> Result<Self::Template<'_>, TemplateError>;
}

/// A template ready to be rendered
pub trait CompiledTemplate {
    /// Render against `model`, writing UTF-8 output to `out`
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Evaluation`] if evaluation fails, for example
    /// on an undefined variable, or [`TemplateError::Io`] if writing fails.
    fn render(&self, model: &Model, out: &mut dyn io::Write) -> Result<(), TemplateError>;
}
