//! Request rewriting.
//!
//! # Responsibilities
//! - Hold the gateway's physical address and routing prefix
//! - Transform a cluster-agnostic request into one deliverable to the gateway
//!
//! # Design Decisions
//! - Rewriting is a pure function of (endpoint, cluster, request); no I/O
//! - Only scheme, authority and path change; method, query, headers and body
//!   pass through verbatim
//! - The cluster identifier lands as the path segment immediately after the
//!   routing prefix, which is the gateway's wire contract

use http::uri::{Authority, PathAndQuery, Scheme};
use http::{Request, Uri};
use thiserror::Error;

use crate::cluster::ClusterId;
use crate::transport::RouteError;

/// Default path prefix under which the gateway exposes downstream clusters.
pub const DEFAULT_ROUTE_PREFIX: &str = "/apis/multicluster/v1/clusters";

/// Error returned when a gateway address cannot be used as a rewrite target.
#[derive(Debug, Error)]
#[error("invalid gateway endpoint {url:?}: {reason}")]
pub struct InvalidEndpoint {
    /// The rejected address, verbatim.
    pub url: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

/// The single physical address all routed requests are sent to.
///
/// Immutable after construction; shared freely across tasks.
#[derive(Debug, Clone)]
pub struct GatewayEndpoint {
    scheme: Scheme,
    authority: Authority,
    route_prefix: String,
}

impl GatewayEndpoint {
    /// Build an endpoint from a base URL, using [`DEFAULT_ROUTE_PREFIX`].
    pub fn new(url: &str) -> Result<Self, InvalidEndpoint> {
        Self::with_route_prefix(url, DEFAULT_ROUTE_PREFIX)
    }

    /// Build an endpoint from a base URL and an explicit routing prefix.
    pub fn with_route_prefix(url: &str, route_prefix: &str) -> Result<Self, InvalidEndpoint> {
        let uri: Uri = url.parse().map_err(|_| InvalidEndpoint {
            url: url.to_string(),
            reason: "not a parseable URL",
        })?;
        let scheme = uri.scheme().cloned().ok_or_else(|| InvalidEndpoint {
            url: url.to_string(),
            reason: "missing scheme",
        })?;
        let authority = uri.authority().cloned().ok_or_else(|| InvalidEndpoint {
            url: url.to_string(),
            reason: "missing authority",
        })?;
        if !route_prefix.starts_with('/') {
            return Err(InvalidEndpoint {
                url: url.to_string(),
                reason: "route prefix must start with '/'",
            });
        }
        Ok(Self {
            scheme,
            authority,
            route_prefix: route_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// The routing prefix, without a trailing slash.
    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    /// The gateway authority (host[:port]).
    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

/// Rewrite `req` to reach `cluster` through the gateway.
///
/// The rewritten request targets the gateway's scheme and authority, with
/// path `{route_prefix}/{cluster}{original_path}` and the original query
/// preserved. Identical inputs always produce identical output.
pub fn rewrite_request<B>(
    endpoint: &GatewayEndpoint,
    cluster: &ClusterId,
    req: Request<B>,
) -> Result<Request<B>, RouteError> {
    let (mut parts, body) = req.into_parts();

    let original = parts
        .uri
        .path_and_query()
        .map(PathAndQuery::as_str)
        .unwrap_or("/");
    if !original.starts_with('/') {
        return Err(RouteError::MalformedRequest(format!(
            "request target {original:?} is not origin-form"
        )));
    }

    let routed = format!(
        "{}/{}{}",
        endpoint.route_prefix,
        cluster.as_str(),
        original
    );
    let routed = routed
        .parse::<PathAndQuery>()
        .map_err(|e| RouteError::MalformedRequest(e.to_string()))?;

    let mut uri_parts = parts.uri.into_parts();
    uri_parts.scheme = Some(endpoint.scheme.clone());
    uri_parts.authority = Some(endpoint.authority.clone());
    uri_parts.path_and_query = Some(routed);
    parts.uri =
        Uri::from_parts(uri_parts).map_err(|e| RouteError::MalformedRequest(e.to_string()))?;

    Ok(Request::from_parts(parts, body))
}
