//! View resolvers and the registry that dispatches views to them
//!
//! Handlers return views, resolvers render them. The registry maps each view
//! type to exactly one resolver and is consulted by the
//! [`ViewLayer`](crate::middleware::ViewLayer) when a handler's response
//! carries a [`PendingView`].

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::RenderError;
use crate::middleware::ViewLayer;
use crate::model::{Model, RequestAttributesSource};
use crate::response::{BufferedResponse, ResponseSink};

/// A value a handler returns to have a resolver render it
pub trait View: Any + Send + Sync + fmt::Debug + fmt::Display {}

/// Renders views of type `V` into a response
pub trait ViewResolver<V: View>: Send + Sync {
    /// Render `view` for the request described by `request`
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] naming the template that failed.
    fn resolve(
        &self,
        request: &dyn RequestAttributesSource,
        view: &V,
        response: &mut dyn ResponseSink,
    ) -> Result<(), RenderError>;
}

/// A view waiting in response extensions to be rendered
///
/// Produced by a view's `IntoResponse` implementation and consumed by the
/// view middleware.
#[derive(Clone)]
pub struct PendingView {
    view: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
    description: String,
}

impl PendingView {
    /// Wrap `view` for deferred rendering
    pub fn new<V: View>(view: V) -> Self {
        Self {
            description: view.to_string(),
            type_id: TypeId::of::<V>(),
            type_name: type_name::<V>(),
            view: Arc::new(view),
        }
    }

    /// The wrapped view if it has type `V`
    #[must_use]
    pub fn downcast_ref<V: View>(&self) -> Option<&V> {
        self.view.downcast_ref::<V>()
    }

    /// Type name of the wrapped view
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for PendingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingView")
            .field("type", &self.type_name)
            .field("view", &self.description)
            .finish()
    }
}

impl fmt::Display for PendingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl IntoResponse for PendingView {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::empty());
        response.extensions_mut().insert(self);
        response
    }
}

type ErasedResolve = dyn Fn(
        &dyn Any,
        &dyn RequestAttributesSource,
        &mut dyn ResponseSink,
    ) -> Option<Result<(), RenderError>>
    + Send
    + Sync;

struct Entry {
    resolver: Arc<dyn Any + Send + Sync>,
    resolve: Box<ErasedResolve>,
    description: String,
}

/// Resolvers keyed by the view type they render
///
/// # Examples
///
/// ```rust
/// use acton_views::{CacheMode, GlobalModel, JinjaEngine, TemplateView, TemplateViewResolver, ViewResolverRegistry};
/// use std::sync::Arc;
///
/// let engine = Arc::new(JinjaEngine::from_sources(Vec::new(), CacheMode::Enabled));
/// let mut registry = ViewResolverRegistry::new();
/// registry.add_resolver::<TemplateView, _>(TemplateViewResolver::new(engine, Arc::new(GlobalModel::new())));
///
/// assert!(registry.has_resolver::<TemplateView>());
/// ```
#[derive(Default)]
pub struct ViewResolverRegistry {
    resolvers: HashMap<TypeId, Entry>,
}

impl ViewResolverRegistry {
    /// An empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resolver` for views of type `V`
    ///
    /// Replaces any resolver previously registered for `V`.
    pub fn add_resolver<V, R>(&mut self, resolver: R) -> &mut Self
    where
        V: View,
        R: ViewResolver<V> + fmt::Display + 'static,
    {
        let description = resolver.to_string();
        let resolver = Arc::new(resolver);
        let handle = Arc::clone(&resolver);
        let resolve: Box<ErasedResolve> = Box::new(
            move |view: &dyn Any,
                  request: &dyn RequestAttributesSource,
                  sink: &mut dyn ResponseSink| {
                view.downcast_ref::<V>()
                    .map(|view| handle.resolve(request, view, sink))
            },
        );

        tracing::debug!(
            view = type_name::<V>(),
            resolver = %description,
            "Registered view resolver"
        );

        let previous = self.resolvers.insert(
            TypeId::of::<V>(),
            Entry {
                resolver,
                resolve,
                description,
            },
        );
        if let Some(previous) = previous {
            tracing::warn!(
                view = type_name::<V>(),
                replaced = %previous.description,
                "Replaced view resolver"
            );
        }
        self
    }

    /// The resolver registered for `V`, if it has concrete type `R`
    #[must_use]
    pub fn find_resolver<V: View, R: ViewResolver<V> + 'static>(&self) -> Option<Arc<R>> {
        self.resolvers
            .get(&TypeId::of::<V>())
            .and_then(|entry| Arc::clone(&entry.resolver).downcast::<R>().ok())
    }

    /// Whether a resolver is registered for `V`
    #[must_use]
    pub fn has_resolver<V: View>(&self) -> bool {
        self.resolvers.contains_key(&TypeId::of::<V>())
    }

    /// Number of registered resolvers
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Whether no resolver is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Render `view` directly
    ///
    /// # Errors
    ///
    /// Fails with a [`RenderError`] from the resolver. Returns `Ok(false)`
    /// without touching `sink` when no resolver is registered for `V`.
    pub fn resolve<V: View>(
        &self,
        request: &dyn RequestAttributesSource,
        view: &V,
        sink: &mut dyn ResponseSink,
    ) -> Result<bool, RenderError> {
        self.resolve_erased(TypeId::of::<V>(), view, request, sink)
    }

    /// Render a pending view into a complete response
    ///
    /// Unregistered view types and render failures both produce a
    /// `500 Internal Server Error`.
    pub fn resolve_pending(&self, pending: &PendingView, request: &Model) -> Response {
        let mut sink = BufferedResponse::new();
        match self.resolve_erased(pending.type_id, &*pending.view, request, &mut sink) {
            Ok(true) => sink.into_response(),
            Ok(false) => {
                tracing::error!(
                    view = %pending,
                    view_type = pending.type_name(),
                    "No view resolver registered"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, "No view resolver registered").into_response()
            }
            Err(err) => err.into_response(),
        }
    }

    fn resolve_erased(
        &self,
        type_id: TypeId,
        view: &dyn Any,
        request: &dyn RequestAttributesSource,
        sink: &mut dyn ResponseSink,
    ) -> Result<bool, RenderError> {
        let Some(entry) = self.resolvers.get(&type_id) else {
            return Ok(false);
        };
        match (entry.resolve)(view, request, sink) {
            Some(result) => result.map(|()| true),
            None => Ok(false),
        }
    }

    /// Wrap the registry in a [`ViewLayer`] for an axum router
    #[must_use]
    pub fn into_layer(self) -> ViewLayer {
        ViewLayer::new(Arc::new(self))
    }
}

impl fmt::Debug for ViewResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.resolvers
                    .values()
                    .map(|entry| ("resolver", entry.description.as_str())),
            )
            .finish()
    }
}
