//! Cluster-bound gateway transport.
//!
//! # Responsibilities
//! - Route every request to the one cluster fixed at construction
//! - Run configured header injectors before the rewrite
//! - Run configured response filters after the round trip
//!
//! # Design Decisions
//! - The binding always wins: identifiers in the caller's context are
//!   ignored, so one instance can safely back one cache stack per cluster
//! - Hooks run in registration order; the first failure short-circuits and
//!   surfaces as [`RouteError::Extension`] wrapping the cause
//! - Hooks see request/response `Parts` only, which keeps them object-safe
//!   and keeps bodies streaming untouched

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures_util::future::BoxFuture;
use http::header::{HeaderName, HeaderValue, AUTHORIZATION};
use http::{HeaderMap, Request, Response};
use tower::{Layer, Service};

use crate::cluster::ClusterId;
use crate::config::schema::{ClusterTargetConfig, GatewaySection};
use crate::observability::metrics;
use crate::transport::rewrite::{rewrite_request, GatewayEndpoint};
use crate::transport::{BoxError, RouteError};

/// Pre-send hook: may add or replace request headers.
pub trait HeaderInjector: Send + Sync {
    /// Mutate the outgoing request's parts before rewriting.
    fn inject(&self, parts: &mut http::request::Parts) -> Result<(), BoxError>;
}

/// Post-receive hook: may inspect or adjust response metadata.
pub trait ResponseFilter: Send + Sync {
    /// Mutate the response's parts before it is returned to the caller.
    fn filter(&self, parts: &mut http::response::Parts) -> Result<(), BoxError>;
}

/// Stamps `x-request-id` with a fresh UUID when the caller did not set one,
/// so gateway-side logs correlate with client-side ones.
#[derive(Debug, Clone, Default)]
pub struct RequestIdInjector;

impl HeaderInjector for RequestIdInjector {
    fn inject(&self, parts: &mut http::request::Parts) -> Result<(), BoxError> {
        if !parts.headers.contains_key("x-request-id") {
            let id = uuid::Uuid::new_v4().to_string();
            parts
                .headers
                .insert("x-request-id", HeaderValue::from_str(&id)?);
        }
        Ok(())
    }
}

/// Adds a fixed set of headers to every request, e.g. per-cluster
/// credentials or tenancy markers from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaderInjector {
    headers: HeaderMap,
}

impl StaticHeaderInjector {
    /// Inject the given headers verbatim.
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }
}

impl HeaderInjector for StaticHeaderInjector {
    fn inject(&self, parts: &mut http::request::Parts) -> Result<(), BoxError> {
        for (name, value) in &self.headers {
            parts.headers.insert(name.clone(), value.clone());
        }
        Ok(())
    }
}

/// `tower::Layer` producing [`BoundClusterTransport`] wrappers, all bound to
/// the same cluster and sharing the same hook chain.
#[derive(Clone)]
pub struct BoundClusterLayer {
    endpoint: Arc<GatewayEndpoint>,
    cluster: ClusterId,
    injectors: Vec<Arc<dyn HeaderInjector>>,
    filters: Vec<Arc<dyn ResponseFilter>>,
}

impl BoundClusterLayer {
    /// Create a layer bound to `cluster`, with no hooks configured.
    pub fn new(endpoint: GatewayEndpoint, cluster: ClusterId) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            cluster,
            injectors: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Build a layer from configuration: per-cluster gateway override,
    /// extra headers and bearer credentials become a [`StaticHeaderInjector`].
    pub fn from_config(
        gateway: &GatewaySection,
        target: &ClusterTargetConfig,
    ) -> Result<Self, RouteError> {
        let url = target.url.as_deref().unwrap_or(&gateway.url);
        let endpoint = GatewayEndpoint::with_route_prefix(url, &gateway.route_prefix)?;
        let cluster = ClusterId::new(&target.name)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &target.extra_headers {
            let name: HeaderName = name.parse().map_err(|_| RouteError::Extension {
                stage: "header injector",
                source: format!("invalid header name {name:?}").into(),
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| RouteError::Extension {
                stage: "header injector",
                source: format!("invalid value for header {name}").into(),
            })?;
            headers.insert(name, value);
        }
        if let Some(token) = &target.bearer_token {
            let value =
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    RouteError::Extension {
                        stage: "header injector",
                        source: "bearer token is not a valid header value".into(),
                    }
                })?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut layer = Self::new(endpoint, cluster);
        if !headers.is_empty() {
            layer = layer.with_header_injector(StaticHeaderInjector::new(headers));
        }
        Ok(layer)
    }

    /// Append a header injector; injectors run in registration order.
    pub fn with_header_injector(mut self, injector: impl HeaderInjector + 'static) -> Self {
        self.injectors.push(Arc::new(injector));
        self
    }

    /// Append a response filter; filters run in registration order.
    pub fn with_response_filter(mut self, filter: impl ResponseFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// The cluster this layer is bound to.
    pub fn cluster(&self) -> &ClusterId {
        &self.cluster
    }
}

impl<S> Layer<S> for BoundClusterLayer {
    type Service = BoundClusterTransport<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BoundClusterTransport {
            inner,
            endpoint: self.endpoint.clone(),
            cluster: self.cluster.clone(),
            injectors: self.injectors.clone(),
            filters: self.filters.clone(),
        }
    }
}

/// The enhanced multi-cluster transport: bound to exactly one cluster, with
/// configurable pre/post-processing around the shared rewrite step.
#[derive(Clone)]
pub struct BoundClusterTransport<S> {
    inner: S,
    endpoint: Arc<GatewayEndpoint>,
    cluster: ClusterId,
    injectors: Vec<Arc<dyn HeaderInjector>>,
    filters: Vec<Arc<dyn ResponseFilter>>,
}

impl<S, B, RB> Service<Request<B>> for BoundClusterTransport<S>
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
        let (mut parts, body) = req.into_parts();
        for injector in &self.injectors {
            if let Err(source) = injector.inject(&mut parts) {
                let err = RouteError::Extension {
                    stage: "header injector",
                    source,
                };
                return Box::pin(std::future::ready(Err(err.into())));
            }
        }
        let req = Request::from_parts(parts, body);

        // The binding decides the target; context identifiers are ignored.
        let routed = match rewrite_request(&self.endpoint, &self.cluster, req) {
            Ok(routed) => routed,
            Err(e) => return Box::pin(std::future::ready(Err(e.into()))),
        };

        tracing::debug!(
            cluster = %self.cluster,
            path = %routed.uri().path(),
            "Routing request to bound cluster"
        );

        let cluster = self.cluster.clone();
        let filters = self.filters.clone();
        let started = Instant::now();
        let fut = self.inner.call(routed);
        Box::pin(async move {
            let response = fut.await.map_err(Into::into)?;
            metrics::record_route(cluster.as_str(), response.status().as_u16(), started);

            let (mut parts, body) = response.into_parts();
            for filter in &filters {
                filter.filter(&mut parts).map_err(|source| {
                    BoxError::from(RouteError::Extension {
                        stage: "response filter",
                        source,
                    })
                })?;
            }
            Ok(Response::from_parts(parts, body))
        })
    }
}
