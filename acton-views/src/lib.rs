//! acton-views: runtime template views for axum applications
//!
//! Handlers return a [`TemplateView`] naming a template and carrying local
//! variables plus response metadata. The [`ViewLayer`] middleware hands that
//! view to the resolver registered for its type, which merges three variable
//! sources into one model and renders the template with
//! [minijinja](https://docs.rs/minijinja):
//!
//! 1. the [`GlobalModel`], configured once at startup
//! 2. the [`RequestAttributes`] stored on the in-flight request
//! 3. the view's own local model
//!
//! Later sources override earlier ones.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use acton_views::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     acton_views::observability::init()?;
//!
//!     let config = ViewsConfig::load_for_service("my-app")?;
//!     let mut global = GlobalModel::new();
//!     global.insert("site_name", "My App");
//!
//!     let mut registry = ViewResolverRegistry::new();
//!     TemplateModule::new(config).start(&mut registry, Arc::new(global));
//!
//!     let app = axum::Router::new()
//!         .route("/", axum::routing::get(index))
//!         .layer(registry.into_layer());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//!
//! async fn index() -> TemplateView {
//!     // Renders /ftl/index.ftl from the configured template roots
//!     TemplateView::with_model("index", Model::new().with("message", "Hello"))
//! }
//! ```
//!
//! # Template names
//!
//! Names without a leading `/` live under `/ftl/`, and names without an
//! extension get `.ftl` appended. See [`resolve_view_name`].

#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod model;
pub mod module;
pub mod observability;
pub mod registry;
pub mod resolver;
pub mod response;
pub mod view;

pub use config::{AppEnvironment, ViewsConfig, ViewsSettings};
pub use engine::{CacheMode, CompiledTemplate, JinjaEngine, TemplateEngine, TemplateSource};
pub use error::{RenderError, TemplateError};
pub use middleware::{ViewLayer, ViewMiddleware};
pub use model::{GlobalModel, Model, RequestAttributes, RequestAttributesSource};
pub use module::TemplateModule;
pub use registry::{View, ViewResolver, ViewResolverRegistry};
pub use resolver::{render_view, TemplateViewResolver};
pub use response::{BufferedResponse, Charset, Cookie, ResponseSink, SameSite};
pub use view::{resolve_view_name, TemplateView, TemplateViewBuilder};

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! # Examples
    //!
    //! ```rust
    //! use acton_views::prelude::*;
    //! ```

    pub use crate::config::{AppEnvironment, ViewsConfig};
    pub use crate::engine::{CacheMode, JinjaEngine, TemplateSource};
    pub use crate::error::{RenderError, TemplateError};
    pub use crate::middleware::ViewLayer;
    pub use crate::model::{GlobalModel, Model, RequestAttributes, RequestAttributesSource};
    pub use crate::module::TemplateModule;
    pub use crate::registry::{View, ViewResolver, ViewResolverRegistry};
    pub use crate::resolver::TemplateViewResolver;
    pub use crate::response::{BufferedResponse, Cookie, ResponseSink, SameSite};
    pub use crate::view::TemplateView;
}
