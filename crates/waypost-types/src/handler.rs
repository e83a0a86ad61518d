//! The opaque handler callable a route resolves to.

use crate::{Params, RouteRequest, RouteResponse};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future used across handler boundaries.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A route handler: externally supplied code invoked with the request and
/// any captured path parameters. The router never inspects its body and
/// awaits whatever it produces without transformation.
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(RouteRequest, Params) -> BoxFuture<RouteResponse> + Send + Sync>);

impl Handler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(RouteRequest, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RouteResponse> + Send + 'static,
    {
        Self(Arc::new(move |req, params| Box::pin(f(req, params))))
    }

    pub fn call(&self, req: RouteRequest, params: Params) -> BoxFuture<RouteResponse> {
        (self.0)(req, params)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}
