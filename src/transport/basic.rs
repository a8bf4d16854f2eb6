//! Context-driven gateway transport.
//!
//! # Responsibilities
//! - Read the target cluster from the request's routing context
//! - Rewrite and delegate to the wrapped transport
//! - Pass responses and transport errors through unchanged
//!
//! # Design Decisions
//! - Implemented as a `tower::Service` decorator so it drops into any
//!   HTTP-capable client that accepts a service, preserving the wrapped
//!   transport's credential and TLS handling
//! - No identifier in context means true pass-through, byte-identical request
//! - Holds no mutable state; safe under unbounded concurrent use

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures_util::future::BoxFuture;
use http::{Request, Response};
use tower::{Layer, Service};

use crate::cluster;
use crate::observability::metrics;
use crate::transport::rewrite::{rewrite_request, GatewayEndpoint};
use crate::transport::BoxError;

/// `tower::Layer` producing [`GatewayTransport`] wrappers.
#[derive(Debug, Clone)]
pub struct GatewayLayer {
    endpoint: Arc<GatewayEndpoint>,
}

impl GatewayLayer {
    /// Create a layer that routes through `endpoint`.
    pub fn new(endpoint: GatewayEndpoint) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
        }
    }
}

impl<S> Layer<S> for GatewayLayer {
    type Service = GatewayTransport<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GatewayTransport {
            inner,
            endpoint: self.endpoint.clone(),
        }
    }
}

/// The basic multi-cluster transport: one shared instance, per-request
/// routing decided by the caller's context.
#[derive(Debug, Clone)]
pub struct GatewayTransport<S> {
    inner: S,
    endpoint: Arc<GatewayEndpoint>,
}

impl<S> GatewayTransport<S> {
    /// Wrap an existing transport.
    pub fn new(inner: S, endpoint: GatewayEndpoint) -> Self {
        Self {
            inner,
            endpoint: Arc::new(endpoint),
        }
    }
}

impl<S, B, RB> Service<Request<B>> for GatewayTransport<S>
where
    S: Service<Request<B>, Response = Response<RB>>,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
    RB: 'static + Send,
{
    type Response = Response<RB>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let cluster = match cluster::cluster_for_request(&req) {
            Some(cluster) => cluster,
            None => {
                // No routing context: pass through untouched.
                tracing::trace!(path = %req.uri().path(), "No cluster in context, passing through");
                let fut = self.inner.call(req);
                return Box::pin(async move { fut.await.map_err(Into::into) });
            }
        };

        let routed = match rewrite_request(&self.endpoint, &cluster, req) {
            Ok(routed) => routed,
            Err(e) => return Box::pin(std::future::ready(Err(e.into()))),
        };

        tracing::debug!(
            cluster = %cluster,
            path = %routed.uri().path(),
            "Routing request through gateway"
        );

        let started = Instant::now();
        let fut = self.inner.call(routed);
        Box::pin(async move {
            let result = fut.await.map_err(Into::into);
            match &result {
                Ok(response) => {
                    metrics::record_route(cluster.as_str(), response.status().as_u16(), started);
                }
                Err(e) => {
                    tracing::debug!(cluster = %cluster, error = %e, "Gateway request failed");
                }
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use tower::{service_fn, ServiceExt};

    use crate::cluster::{with_cluster, ClusterId};

    /// Echoes the request URI back as the response body.
    fn echo_transport(
    ) -> impl Service<Request<String>, Response = Response<String>, Error = Infallible, Future: Send + 'static>
           + Clone {
        service_fn(|req: Request<String>| async move {
            Ok::<_, Infallible>(Response::new(req.uri().to_string()))
        })
    }

    fn transport() -> GatewayTransport<
        impl Service<Request<String>, Response = Response<String>, Error = Infallible, Future: Send + 'static>
            + Clone,
    > {
        let endpoint = GatewayEndpoint::new("http://gateway.local:8443").unwrap();
        GatewayTransport::new(echo_transport(), endpoint)
    }

    fn get(uri: &str) -> Request<String> {
        Request::builder().uri(uri).body(String::new()).unwrap()
    }

    #[tokio::test]
    async fn test_passthrough_without_context() {
        let res = transport()
            .oneshot(get("http://api.local/api/v1/pods"))
            .await
            .unwrap();
        assert_eq!(res.into_body(), "http://api.local/api/v1/pods");
    }

    #[tokio::test]
    async fn test_routes_with_scoped_cluster() {
        let id = ClusterId::new("prod").unwrap();
        let res = with_cluster(id, async {
            transport().oneshot(get("http://api.local/api/v1/pods")).await
        })
        .await
        .unwrap();
        assert_eq!(
            res.into_body(),
            "http://gateway.local:8443/apis/multicluster/v1/clusters/prod/api/v1/pods"
        );
    }

    #[tokio::test]
    async fn test_routes_with_attached_cluster() {
        let mut req = get("http://api.local/healthz");
        crate::cluster::attach_cluster(&mut req, ClusterId::new("west-1").unwrap());
        let res = transport().oneshot(req).await.unwrap();
        assert_eq!(
            res.into_body(),
            "http://gateway.local:8443/apis/multicluster/v1/clusters/west-1/healthz"
        );
    }

    #[tokio::test]
    async fn test_layer_wraps_like_direct_construction() {
        let layer = GatewayLayer::new(GatewayEndpoint::new("http://gateway.local:8443").unwrap());
        let svc = layer.layer(echo_transport());
        let id = ClusterId::new("prod").unwrap();
        let res = with_cluster(id, async { svc.oneshot(get("http://api.local/")).await })
            .await
            .unwrap();
        assert_eq!(
            res.into_body(),
            "http://gateway.local:8443/apis/multicluster/v1/clusters/prod/"
        );
    }
}
