//! View rendering middleware
//!
//! Handlers that return a view produce a placeholder response carrying a
//! [`PendingView`]. [`ViewLayer`] finds those responses and replaces them
//! with the output of the resolver registered for the view's type.
//!
//! Request attributes are read when the request enters the layer. Middleware
//! that inserts [`RequestAttributes`](crate::model::RequestAttributes) must
//! therefore run before it, which with axum means adding that layer after
//! the view layer:
//!
//! ```rust,no_run
//! use acton_views::{RequestAttributes, TemplateView, ViewResolverRegistry};
//! use axum::{extract::Request, middleware::Next, routing::get, Router};
//!
//! async fn attributes(mut req: Request, next: Next) -> axum::response::Response {
//!     let mut attributes = RequestAttributes::new();
//!     attributes.insert("path", req.uri().path().to_string());
//!     req.extensions_mut().insert(attributes);
//!     next.run(req).await
//! }
//!
//! let registry = ViewResolverRegistry::new();
//! let app: Router<()> = Router::new()
//!     .route("/", get(|| async { TemplateView::new("index") }))
//!     .layer(registry.into_layer())
//!     .layer(axum::middleware::from_fn(attributes));
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::Request,
    http::{response::Parts, HeaderMap},
    response::Response,
};
use tower::{Layer, Service};

use crate::model::RequestAttributesSource;
use crate::registry::{PendingView, ViewResolverRegistry};

/// Layer rendering pending views through a [`ViewResolverRegistry`]
#[derive(Clone, Debug)]
pub struct ViewLayer {
    registry: Arc<ViewResolverRegistry>,
}

impl ViewLayer {
    /// Render with the resolvers in `registry`
    #[must_use]
    pub const fn new(registry: Arc<ViewResolverRegistry>) -> Self {
        Self { registry }
    }

    /// The registry views are dispatched through
    #[must_use]
    pub const fn registry(&self) -> &Arc<ViewResolverRegistry> {
        &self.registry
    }
}

impl<S> Layer<S> for ViewLayer {
    type Service = ViewMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ViewMiddleware {
            inner,
            registry: Arc::clone(&self.registry),
        }
    }
}

/// Middleware service created by [`ViewLayer`]
#[derive(Clone, Debug)]
pub struct ViewMiddleware<S> {
    inner: S,
    registry: Arc<ViewResolverRegistry>,
}

impl<S> Service<Request> for ViewMiddleware<S>
where
    S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let registry = Arc::clone(&self.registry);
        let attributes = req.request_attributes();

        // Take the service that was polled ready, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.call(req).await?;
            let (mut parts, body) = response.into_parts();

            let Some(pending) = parts.extensions.remove::<PendingView>() else {
                return Ok(Response::from_parts(parts, body));
            };

            let rendered = registry.resolve_pending(&pending, &attributes);
            Ok(merge_placeholder(parts, rendered))
        })
    }
}

/// Carry headers and extensions from the placeholder response over
///
/// Headers the rendered response already has take precedence.
fn merge_placeholder(placeholder: Parts, rendered: Response) -> Response {
    let (mut parts, body) = rendered.into_parts();

    let mut headers = placeholder.headers;
    let rendered_names: Vec<_> = parts.headers.keys().cloned().collect();
    for name in &rendered_names {
        headers.remove(name);
    }
    append_all(&mut parts.headers, headers);

    let mut extensions = placeholder.extensions;
    extensions.extend(std::mem::take(&mut parts.extensions));
    parts.extensions = extensions;

    Response::from_parts(parts, body)
}

fn append_all(target: &mut HeaderMap, source: HeaderMap) {
    let mut current = None;
    for (name, value) in source {
        if let Some(name) = name {
            current = Some(name);
        }
        if let Some(name) = &current {
            target.append(name.clone(), value);
        }
    }
}
