//! minijinja-backed template engine with layered sources and dev reloading

use std::fmt;
use std::io;
use std::ops::Deref;

use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use parking_lot::{RwLock, RwLockReadGuard};

use super::loader::{LayeredLoader, TemplateSource};
use super::{CompiledTemplate, TemplateEngine};
use crate::config::AppEnvironment;
use crate::error::TemplateError;
use crate::model::Model;

/// Whether compiled templates are kept between lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Compile each template once and reuse it (production)
    #[default]
    Enabled,
    /// Re-read and recompile templates on every lookup (development)
    Disabled,
}

impl CacheMode {
    /// Caching is disabled in development and enabled everywhere else
    #[must_use]
    pub const fn for_environment(environment: AppEnvironment) -> Self {
        match environment {
            AppEnvironment::Dev => Self::Disabled,
            AppEnvironment::Production => Self::Enabled,
        }
    }
}

/// Thread-safe minijinja engine
///
/// Undefined variables are errors rather than blank output. Templates are
/// loaded lazily from a [`LayeredLoader`] the first time they are requested.
///
/// # Example
///
/// ```rust
/// use acton_views::{CacheMode, CompiledTemplate, JinjaEngine, Model, TemplateEngine, TemplateSource};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = JinjaEngine::from_sources(
///     vec![TemplateSource::embedded([("hello.ftl", "Hello {{ name }}!")])],
///     CacheMode::Enabled,
/// );
///
/// let mut out = Vec::new();
/// engine
///     .get_or_compile("/hello.ftl")?
///     .render(&Model::new().with("name", "world"), &mut out)?;
/// assert_eq!(out, b"Hello world!");
/// # Ok(())
/// # }
/// ```
pub struct JinjaEngine {
    env: RwLock<Environment<'static>>,
    loader: LayeredLoader,
    cache_mode: CacheMode,
}

impl JinjaEngine {
    /// Create an engine loading templates through `loader`
    #[must_use]
    pub fn new(loader: LayeredLoader, cache_mode: CacheMode) -> Self {
        Self {
            env: RwLock::new(Self::create_environment(&loader)),
            loader,
            cache_mode,
        }
    }

    /// Create an engine searching `sources` in order
    #[must_use]
    pub fn from_sources(sources: Vec<TemplateSource>, cache_mode: CacheMode) -> Self {
        Self::new(LayeredLoader::new(sources), cache_mode)
    }

    fn create_environment(loader: &LayeredLoader) -> Environment<'static> {
        let mut env = Environment::new();

        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        let loader = loader.clone();
        env.set_loader(move |name| loader.load(name));
        env
    }

    /// The configured cache mode
    #[must_use]
    pub const fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }

    /// The template sources in search order
    #[must_use]
    pub fn sources(&self) -> &[TemplateSource] {
        self.loader.sources()
    }

    /// Drop every cached template
    ///
    /// Creates a new environment and atomically swaps it with the current
    /// one. With caching enabled every [`JinjaTemplate`] holds a read lock
    /// until it is dropped, so this waits for in-flight renders to finish
    /// and lookups started meanwhile wait for the swap.
    pub fn reload(&self) {
        let new_env = Self::create_environment(&self.loader);

        // Atomic swap
        *self.env.write() = new_env;

        tracing::debug!("Template cache reloaded");
    }
}

impl fmt::Debug for JinjaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JinjaEngine")
            .field("sources", &self.loader.sources().len())
            .field("cache_mode", &self.cache_mode)
            .finish_non_exhaustive()
    }
}

impl TemplateEngine for JinjaEngine {
    type Template<'a> = JinjaTemplate<'a>;

    fn get_or_compile(&self, path: &str) -> Result<JinjaTemplate<'_>, TemplateError> {
        let env = match self.cache_mode {
            CacheMode::Enabled => EnvHandle::Shared(self.env.read()),
            CacheMode::Disabled => {
                EnvHandle::Private(Box::new(Self::create_environment(&self.loader)))
            }
        };

        env.get_template(path).map_err(|err| match err.kind() {
            ErrorKind::TemplateNotFound => TemplateError::NotFound(path.to_string()),
            _ => classify_error(err),
        })?;

        Ok(JinjaTemplate {
            env,
            name: path.to_string(),
        })
    }
}

/// A template compiled by [`JinjaEngine`]
///
/// Holds the engine's environment for as long as it lives, so render it and
/// drop it within one request.
pub struct JinjaTemplate<'a> {
    env: EnvHandle<'a>,
    name: String,
}

impl JinjaTemplate<'_> {
    /// Canonical path of the template
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for JinjaTemplate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CompiledTemplate for JinjaTemplate<'_> {
    fn render(&self, model: &Model, out: &mut dyn io::Write) -> Result<(), TemplateError> {
        self.env
            .get_template(&self.name)
            .and_then(|tmpl| tmpl.render_captured_to(model, out).map(|_| ()))
            .map_err(classify_error)
    }
}

enum EnvHandle<'a> {
    Shared(RwLockReadGuard<'a, Environment<'static>>),
    Private(Box<Environment<'static>>),
}

impl Deref for EnvHandle<'_> {
    type Target = Environment<'static>;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Shared(guard) => guard,
            Self::Private(env) => env,
        }
    }
}

/// Missing includes and parents surface here as evaluation errors naming the
/// template that was not found; only a missing top-level template is
/// [`TemplateError::NotFound`].
fn classify_error(err: minijinja::Error) -> TemplateError {
    match err.kind() {
        ErrorKind::WriteFailure => {
            let io_err = std::error::Error::source(&err)
                .and_then(|source| source.downcast_ref::<io::Error>())
                .map(|source| io::Error::new(source.kind(), source.to_string()));
            TemplateError::Io(io_err.unwrap_or_else(|| io::Error::other(err)))
        }
        _ => TemplateError::evaluation(err),
    }
}
