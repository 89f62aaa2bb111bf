//! Rendering template views with a template engine
//!
//! [`render_view`] is the whole render sequence for one view; the
//! [`TemplateViewResolver`] binds it to an engine and the application's
//! global model so the registry can call it.

use std::fmt;
use std::io;
use std::sync::Arc;

use crate::engine::{CompiledTemplate, TemplateEngine};
use crate::error::{RenderError, TemplateError};
use crate::model::{GlobalModel, Model, RequestAttributesSource};
use crate::registry::ViewResolver;
use crate::response::{Charset, ResponseSink, TranscodingWriter};
use crate::view::TemplateView;

/// Render `view` into `sink`
///
/// Looks the template up under its canonical path, merges the global,
/// request and local variables (later ones win), applies the view's
/// response metadata and renders the body in the view's character encoding.
///
/// A missing or uncompilable template fails before any metadata reaches the
/// sink. Once the template is found, the metadata stays applied even if
/// rendering fails.
///
/// # Errors
///
/// Every failure is a [`RenderError`] whose message starts with
/// `Failed to render template '<canonical path>'`.
///
/// # Examples
///
/// ```rust
/// use acton_views::{render_view, BufferedResponse, CacheMode, GlobalModel, JinjaEngine, Model, TemplateSource, TemplateView};
///
/// # fn example() -> Result<(), acton_views::RenderError> {
/// let engine = JinjaEngine::from_sources(
///     vec![TemplateSource::embedded([("ftl/hello.ftl", "{{ greeting }}, {{ name }}")])],
///     CacheMode::Enabled,
/// );
/// let mut global = GlobalModel::new();
/// global.insert("greeting", "Hello");
///
/// let view = TemplateView::with_model("hello", Model::new().with("name", "Ada"));
/// let mut response = BufferedResponse::new();
/// render_view(&view, &global, &Model::new(), &engine, &mut response)?;
///
/// assert_eq!(response.content(), "Hello, Ada");
/// # Ok(())
/// # }
/// ```
pub fn render_view<E>(
    view: &TemplateView,
    global: &GlobalModel,
    request: &Model,
    engine: &E,
    sink: &mut dyn ResponseSink,
) -> Result<(), RenderError>
where
    E: TemplateEngine + ?Sized,
{
    let path = view.template_path();
    let model = Model::compose(global.as_model(), request, view.model());

    tracing::debug!(
        view = %view,
        template = %path,
        variables = model.len(),
        "Rendering template view"
    );

    render_into(view, &path, &model, engine, sink).map_err(|source| RenderError::new(path, source))
}

fn render_into<E>(
    view: &TemplateView,
    path: &str,
    model: &Model,
    engine: &E,
    sink: &mut dyn ResponseSink,
) -> Result<(), TemplateError>
where
    E: TemplateEngine + ?Sized,
{
    let template = engine.get_or_compile(path)?;

    apply_metadata(view, sink);

    let charset = Charset::from_label(view.character_encoding()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "unsupported character encoding '{}'",
                view.character_encoding()
            ),
        )
    })?;

    let mut writer = TranscodingWriter::new(sink.writer(), charset);
    template.render(model, &mut writer)?;
    writer.finish()?;
    Ok(())
}

fn apply_metadata(view: &TemplateView, sink: &mut dyn ResponseSink) {
    sink.set_status(view.status());
    sink.set_content_type(view.content_type());
    sink.set_character_encoding(view.character_encoding());
    for (name, value) in view.headers() {
        sink.set_header(name, value);
    }
    for cookie in view.cookies() {
        sink.add_cookie(cookie);
    }
}

/// Resolver that renders [`TemplateView`]s with a shared engine
///
/// Holds the engine and the application's global model; both are shared
/// read-only between requests.
pub struct TemplateViewResolver<E> {
    engine: Arc<E>,
    global: Arc<GlobalModel>,
}

impl<E> TemplateViewResolver<E> {
    /// Create a resolver rendering with `engine` and `global` variables
    #[must_use]
    pub const fn new(engine: Arc<E>, global: Arc<GlobalModel>) -> Self {
        Self { engine, global }
    }

    /// The engine templates are rendered with
    #[must_use]
    pub const fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// The global variables merged into every render
    #[must_use]
    pub fn global_model(&self) -> &GlobalModel {
        &self.global
    }
}

impl<E> Clone for TemplateViewResolver<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            global: Arc::clone(&self.global),
        }
    }
}

impl<E> fmt::Display for TemplateViewResolver<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemplateViewResolver")
    }
}

impl<E: fmt::Debug> fmt::Debug for TemplateViewResolver<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateViewResolver")
            .field("engine", &self.engine)
            .field("global", &self.global)
            .finish()
    }
}

impl<E: TemplateEngine> ViewResolver<TemplateView> for TemplateViewResolver<E> {
    fn resolve(
        &self,
        request: &dyn RequestAttributesSource,
        view: &TemplateView,
        response: &mut dyn ResponseSink,
    ) -> Result<(), RenderError> {
        let attributes = request.request_attributes();
        render_view(view, &self.global, &attributes, self.engine.as_ref(), response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CacheMode, JinjaEngine, TemplateSource};
    use crate::model::MockRequestAttributesSource;
    use crate::response::{BufferedResponse, Cookie};
    use axum::http::StatusCode;

    fn engine(templates: &[(&str, &str)]) -> Arc<JinjaEngine> {
        Arc::new(JinjaEngine::from_sources(
            vec![TemplateSource::embedded(templates.iter().copied())],
            CacheMode::Enabled,
        ))
    }

    fn global() -> Arc<GlobalModel> {
        let mut global = GlobalModel::new();
        global.insert("site", "Acton");
        Arc::new(global)
    }

    #[test]
    fn test_resolver_reads_request_attributes_once() {
        let resolver = TemplateViewResolver::new(
            engine(&[("ftl/page.ftl", "{{ site }}/{{ user }}/{{ local }}")]),
            global(),
        );

        let mut request = MockRequestAttributesSource::new();
        request
            .expect_request_attributes()
            .times(1)
            .returning(|| Model::new().with("user", "ada").with("site", "override"));

        let view = TemplateView::with_model("page", Model::new().with("local", "x"));
        let mut response = BufferedResponse::new();
        resolver.resolve(&request, &view, &mut response).unwrap();

        assert_eq!(response.content(), "override/ada/x");
    }

    #[test]
    fn test_missing_template_applies_no_metadata() {
        let resolver = TemplateViewResolver::new(engine(&[]), global());
        let view = TemplateView::builder("gone")
            .status(StatusCode::CREATED)
            .header("x-test", "1")
            .build();
        let mut response = BufferedResponse::new();

        let err = resolver
            .resolve(&Model::new(), &view, &mut response)
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.path(), "/ftl/gone.ftl");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.content_type().is_none());
        assert!(response.header("x-test").is_none());
    }

    #[test]
    fn test_evaluation_failure_keeps_metadata() {
        let resolver =
            TemplateViewResolver::new(engine(&[("ftl/bad.ftl", "{{ missing.field }}")]), global());
        let view = TemplateView::builder("bad")
            .status(StatusCode::ACCEPTED)
            .cookie(Cookie::new("c", "v"))
            .build();
        let mut response = BufferedResponse::new();

        let err = resolver
            .resolve(&Model::new(), &view, &mut response)
            .unwrap_err();

        assert!(err
            .to_string()
            .starts_with("Failed to render template '/ftl/bad.ftl':"));
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.cookies().len(), 1);
    }

    #[test]
    fn test_unknown_encoding_fails_after_metadata() {
        let resolver = TemplateViewResolver::new(engine(&[("ftl/a.ftl", "a")]), global());
        let view = TemplateView::builder("a")
            .character_encoding("EBCDIC-XYZ")
            .build();
        let mut response = BufferedResponse::new();

        let err = resolver
            .resolve(&Model::new(), &view, &mut response)
            .unwrap_err();

        assert!(matches!(err.kind(), TemplateError::Io(e) if e.kind() == io::ErrorKind::InvalidInput));
        assert_eq!(response.character_encoding(), Some("EBCDIC-XYZ"));
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_latin1_output_is_transcoded() {
        let resolver = TemplateViewResolver::new(engine(&[("ftl/e.ftl", "caf{{ e }}")]), global());
        let view = TemplateView::builder("e")
            .model(Model::new().with("e", "é"))
            .character_encoding("ISO-8859-1")
            .build();
        let mut response = BufferedResponse::new();

        resolver.resolve(&Model::new(), &view, &mut response).unwrap();

        assert_eq!(response.body(), b"caf\xE9");
        assert_eq!(
            response.content_type_header().as_deref(),
            Some("text/html; charset=ISO-8859-1")
        );
    }

    #[test]
    fn test_display_and_accessors() {
        let resolver = TemplateViewResolver::new(engine(&[]), global());
        assert_eq!(resolver.to_string(), "TemplateViewResolver");
        assert_eq!(
            resolver.global_model().get("site"),
            Some(&serde_json::json!("Acton"))
        );
        assert!(resolver.engine().sources().len() == 1);
    }
}
