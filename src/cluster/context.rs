//! Routing context: how a request names its target cluster.
//!
//! Two carriers, resolved in a fixed order:
//!
//! 1. **Request extensions** — a [`RoutingTarget`] inserted into the
//!    request's `http::Extensions`. This is the explicit per-request carrier
//!    and always wins.
//! 2. **Task-local scope** — [`with_cluster`] wraps a future so that every
//!    request issued inside it (including the several HTTP calls of a watch)
//!    routes to the same cluster without touching each request by hand.
//!
//! The transport only ever reads from these carriers; it never mutates them.

use http::Request;

use crate::cluster::ClusterId;

/// Per-request routing carrier stored in `http::Extensions`.
#[derive(Debug, Clone)]
pub struct RoutingTarget(pub ClusterId);

tokio::task_local! {
    static ROUTING_CLUSTER: ClusterId;
}

/// Run `fut` with every request issued inside it routed to `cluster`.
///
/// Scoped to the task: concurrent tasks with different scopes do not
/// observe each other's identifier.
pub async fn with_cluster<F>(cluster: ClusterId, fut: F) -> F::Output
where
    F: std::future::Future,
{
    ROUTING_CLUSTER.scope(cluster, fut).await
}

/// The identifier of the ambient scope, if one is active on this task.
pub fn current_cluster() -> Option<ClusterId> {
    ROUTING_CLUSTER.try_with(|c| c.clone()).ok()
}

/// Attach a routing target directly to a request.
pub fn attach_cluster<B>(req: &mut Request<B>, cluster: ClusterId) {
    req.extensions_mut().insert(RoutingTarget(cluster));
}

/// Resolve the target cluster for a request: extensions first, then the
/// task-local scope, then absent (no multi-cluster routing).
pub fn cluster_for_request<B>(req: &Request<B>) -> Option<ClusterId> {
    if let Some(RoutingTarget(cluster)) = req.extensions().get::<RoutingTarget>() {
        return Some(cluster.clone());
    }
    current_cluster()
}
