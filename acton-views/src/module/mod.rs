//! Startup wiring for template views
//!
//! [`TemplateModule`] turns a [`ViewsConfig`] into a configured
//! [`JinjaEngine`] and registers a [`TemplateViewResolver`] for
//! [`TemplateView`] with the application's [`ViewResolverRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ViewsConfig;
use crate::engine::{JinjaEngine, TemplateSource};
use crate::model::GlobalModel;
use crate::registry::ViewResolverRegistry;
use crate::resolver::TemplateViewResolver;
use crate::view::TemplateView;

/// Template view module
///
/// # Examples
///
/// ```rust
/// use acton_views::{GlobalModel, TemplateModule, TemplateView, ViewResolverRegistry, ViewsConfig};
/// use std::sync::Arc;
///
/// let module = TemplateModule::new(ViewsConfig::default())
///     .with_embedded([("ftl/index.ftl", "<h1>{{ title }}</h1>")]);
///
/// let mut registry = ViewResolverRegistry::new();
/// let engine = module.start(&mut registry, Arc::new(GlobalModel::new()));
///
/// assert!(registry.has_resolver::<TemplateView>());
/// assert_eq!(engine.sources().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateModule {
    config: ViewsConfig,
    embedded: HashMap<String, String>,
}

impl TemplateModule {
    /// Module configured from `config`
    #[must_use]
    pub fn new(config: ViewsConfig) -> Self {
        Self {
            config,
            embedded: HashMap::new(),
        }
    }

    /// Package templates with the application
    ///
    /// Embedded templates are searched before any configured directory.
    /// Calling this more than once adds to the earlier templates.
    #[must_use]
    pub fn with_embedded<I, K, V>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        if let TemplateSource::Embedded(templates) = TemplateSource::embedded(templates) {
            self.embedded.extend(templates);
        }
        self
    }

    /// The configuration the module was created with
    #[must_use]
    pub const fn config(&self) -> &ViewsConfig {
        &self.config
    }

    /// Template sources in search order
    ///
    /// Embedded templates first, then each configured template directory,
    /// then the webapp directory.
    #[must_use]
    pub fn template_sources(&self) -> Vec<TemplateSource> {
        let mut sources = Vec::new();
        if !self.embedded.is_empty() {
            sources.push(TemplateSource::Embedded(self.embedded.clone()));
        }
        sources.extend(self.config.views.directory_sources());
        sources
    }

    /// Create the template engine
    ///
    /// Caching follows the configured environment: disabled in development,
    /// enabled otherwise.
    #[must_use]
    pub fn create_engine(&self) -> JinjaEngine {
        let sources = self.template_sources();
        let cache_mode = self.config.views.cache_mode();

        tracing::info!(
            environment = ?self.config.views.environment,
            ?cache_mode,
            sources = sources.len(),
            "Template engine initialized"
        );

        JinjaEngine::from_sources(sources, cache_mode)
    }

    /// Create a resolver around an existing engine
    #[must_use]
    pub const fn create_resolver(
        engine: Arc<JinjaEngine>,
        global: Arc<GlobalModel>,
    ) -> TemplateViewResolver<JinjaEngine> {
        TemplateViewResolver::new(engine, global)
    }

    /// Create the engine and register its resolver for [`TemplateView`]
    ///
    /// Returns the engine so the application can keep a handle for
    /// [`JinjaEngine::reload`].
    pub fn start(
        &self,
        registry: &mut ViewResolverRegistry,
        global: Arc<GlobalModel>,
    ) -> Arc<JinjaEngine> {
        let engine = Arc::new(self.create_engine());
        registry.add_resolver::<TemplateView, _>(Self::create_resolver(Arc::clone(&engine), global));
        engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppEnvironment, ViewsSettings};
    use crate::engine::CacheMode;
    use std::path::PathBuf;

    fn config(environment: AppEnvironment) -> ViewsConfig {
        ViewsConfig {
            views: ViewsSettings {
                environment,
                template_dirs: vec![PathBuf::from("templates")],
                webapp_dir: Some(PathBuf::from("WEB-INF")),
            },
        }
    }

    #[test]
    fn test_sources_order_embedded_dirs_webapp() {
        let module = TemplateModule::new(config(AppEnvironment::Production))
            .with_embedded([("a.ftl", "a")]);
        let sources = module.template_sources();

        assert_eq!(sources.len(), 3);
        assert!(matches!(sources[0], TemplateSource::Embedded(_)));
        assert!(matches!(&sources[1], TemplateSource::Directory(p) if p == &PathBuf::from("templates")));
        assert!(matches!(&sources[2], TemplateSource::Directory(p) if p == &PathBuf::from("WEB-INF")));
    }

    #[test]
    fn test_no_embedded_source_without_templates() {
        let module = TemplateModule::new(config(AppEnvironment::Production));
        assert_eq!(module.template_sources().len(), 2);
    }

    #[test]
    fn test_with_embedded_accumulates() {
        let module = TemplateModule::default()
            .with_embedded([("a.ftl", "a")])
            .with_embedded([("/b.ftl", "b")]);
        let TemplateSource::Embedded(templates) = &module.template_sources()[0] else {
            panic!("expected embedded source first");
        };
        assert_eq!(templates.len(), 2);
        assert!(templates.contains_key("b.ftl"));
    }

    #[test]
    fn test_engine_cache_mode_follows_environment() {
        let dev = TemplateModule::new(config(AppEnvironment::Dev)).create_engine();
        let prod = TemplateModule::new(config(AppEnvironment::Production)).create_engine();
        assert_eq!(dev.cache_mode(), CacheMode::Disabled);
        assert_eq!(prod.cache_mode(), CacheMode::Enabled);
    }

    #[test]
    fn test_start_registers_template_view_resolver() {
        let mut registry = ViewResolverRegistry::new();
        let mut global = GlobalModel::new();
        global.insert("site", "Acton");

        let engine = TemplateModule::default().start(&mut registry, Arc::new(global));

        let resolver = registry
            .find_resolver::<TemplateView, TemplateViewResolver<JinjaEngine>>()
            .unwrap();
        assert!(Arc::ptr_eq(resolver.engine(), &engine));
        assert!(resolver.global_model().get("site").is_some());
    }
}
