//! Method handlers and the per-method dispatch table.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::resource::{ResourceError, ResourceRegistry};

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Option<Response>> + Send + 'a>>;

/// Produces a response for one request.
///
/// Returning `None` makes the worker fall back to the built-in 405 handler.
pub trait RequestHandler: Send + Sync {
    fn handle<'a>(&'a self, ctx: &'a ServerContext, request: &'a Request) -> HandlerFuture<'a>;
}

/// State shared by every connection worker.
///
/// Frozen once the server starts; workers only read it.
#[derive(Debug, Clone, Default)]
pub struct ServerContext {
    pub registry: ResourceRegistry,
    pub handlers: HandlerTable,
}

/// One optional handler slot per [`Method`], in method table order.
#[derive(Clone, Default)]
pub struct HandlerTable {
    slots: [Option<Arc<dyn RequestHandler>>; Method::COUNT],
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, method: Method, handler: Arc<dyn RequestHandler>) {
        self.slots[method.index()] = Some(handler);
    }

    pub fn get(&self, method: Method) -> Option<&Arc<dyn RequestHandler>> {
        self.slots[method.index()].as_ref()
    }

    /// Methods with a registered handler, in table order.
    pub fn allowed_methods(&self) -> Vec<Method> {
        Method::ALL
            .into_iter()
            .filter(|method| self.get(*method).is_some())
            .collect()
    }

    /// Value for the `Allow` header, e.g. `GET, POST`.
    pub fn allow_header(&self) -> String {
        self.allowed_methods()
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("allowed", &self.allowed_methods())
            .finish()
    }
}

/// Adapts a synchronous closure into a [`RequestHandler`].
pub struct FnHandler<F>(F);

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&ServerContext, &Request) -> Option<Response> + Send + Sync,
{
    FnHandler(f)
}

impl<F> RequestHandler for FnHandler<F>
where
    F: Fn(&ServerContext, &Request) -> Option<Response> + Send + Sync,
{
    fn handle<'a>(&'a self, ctx: &'a ServerContext, request: &'a Request) -> HandlerFuture<'a> {
        let response = (self.0)(ctx, request);
        Box::pin(async move { response })
    }
}

/// Fallback for methods without a handler: 405 listing the allowed methods.
pub struct MethodNotAllowed;

impl MethodNotAllowed {
    pub fn response(ctx: &ServerContext) -> Response {
        ResponseBuilder::new(StatusCode::MethodNotAllowed)
            .header("Allow", ctx.handlers.allow_header())
            .content_type("text/plain")
            .body(b"405 Method Not Allowed".to_vec())
            .build()
    }
}

impl RequestHandler for MethodNotAllowed {
    fn handle<'a>(&'a self, ctx: &'a ServerContext, _request: &'a Request) -> HandlerFuture<'a> {
        Box::pin(async move { Some(Self::response(ctx)) })
    }
}

/// Serves registered resources by request path.
pub struct StaticFileHandler;

impl StaticFileHandler {
    async fn serve(ctx: &ServerContext, request: &Request) -> Response {
        let lease = match ctx.registry.acquire(request.path()).await {
            Ok(lease) => lease,
            Err(ResourceError::NotFound(_)) => {
                tracing::debug!(path = request.path(), "No resource registered");
                return Response::not_found();
            }
            Err(e) => {
                tracing::warn!(path = request.path(), error = %e, "Resource could not be loaded");
                return Response::not_found();
            }
        };

        let response = ResponseBuilder::new(StatusCode::Ok)
            .content_type(lease.content_type())
            .body(lease.data().to_vec())
            .build();
        lease.release().await;

        response
    }
}

impl RequestHandler for StaticFileHandler {
    fn handle<'a>(&'a self, ctx: &'a ServerContext, request: &'a Request) -> HandlerFuture<'a> {
        Box::pin(async move { Some(Self::serve(ctx, request).await) })
    }
}
