//! Routing tests for the multi-cluster transports.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tower::{service_fn, Layer, Service, ServiceExt};

use multicluster_transport::cluster::{attach_cluster, with_cluster, ClusterId};
use multicluster_transport::transport::{
    BoundClusterLayer, GatewayEndpoint, GatewayLayer, GatewayTransport,
};

mod common;

fn echo_transport(
) -> impl Service<Request<String>, Response = Response<String>, Error = Infallible, Future: Send + 'static>
       + Clone
       + Send {
    service_fn(|req: Request<String>| async move {
        Ok::<_, Infallible>(Response::new(req.uri().to_string()))
    })
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

#[tokio::test]
async fn test_routes_through_real_gateway() {
    let gateway = common::start_echo_gateway().await;
    let endpoint = GatewayEndpoint::with_route_prefix(&gateway.url(), "/clusters").unwrap();
    let client: Client<HttpConnector, Empty<Bytes>> =
        Client::builder(TokioExecutor::new()).build(HttpConnector::new());
    let transport = GatewayLayer::new(endpoint).layer(client);

    let request = Request::builder()
        .uri("http://api.internal/api/v1/namespaces?limit=2")
        .body(Empty::<Bytes>::new())
        .unwrap();
    let cluster = ClusterId::new("prod").unwrap();
    let response = with_cluster(cluster, transport.oneshot(request)).await.unwrap();

    assert!(response.status().is_success());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"/clusters/prod/api/v1/namespaces?limit=2");
    assert_eq!(
        gateway.paths(),
        vec!["/clusters/prod/api/v1/namespaces?limit=2".to_string()]
    );
}

#[tokio::test]
async fn test_no_context_means_untouched_request() {
    let gateway = common::start_echo_gateway().await;
    let endpoint = GatewayEndpoint::with_route_prefix(&gateway.url(), "/clusters").unwrap();
    let client: Client<HttpConnector, Empty<Bytes>> =
        Client::builder(TokioExecutor::new()).build(HttpConnector::new());
    let transport = GatewayLayer::new(endpoint).layer(client);

    // Without a cluster in context the request passes through unchanged, so
    // it must target the gateway's own address to be deliverable at all.
    let request = Request::builder()
        .uri(format!("{}/healthz", gateway.url()))
        .body(Empty::<Bytes>::new())
        .unwrap();
    let response = transport.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"/healthz");
}

#[tokio::test]
async fn test_invalid_identifier_fails_before_any_send() {
    // Path separators and whitespace are rejected at construction, before a
    // request can even name the cluster.
    assert!(ClusterId::new("prod/east").is_err());
    assert!(ClusterId::new("prod east").is_err());

    // A malformed request target fails in the rewriter; the wrapped
    // transport must record zero invocations.
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let counting = service_fn(move |_req: Request<String>| {
        seen.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, Infallible>(Response::new(String::new())) }
    });
    let endpoint = GatewayEndpoint::new("http://gateway.local:8443").unwrap();
    let transport = GatewayTransport::new(counting, endpoint);

    let mut request = Request::builder()
        .method("OPTIONS")
        .uri("*")
        .body(String::new())
        .unwrap();
    attach_cluster(&mut request, ClusterId::new("prod").unwrap());
    let result = transport.oneshot(request).await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_bound_transport_ignores_context_identifier() {
    let endpoint = GatewayEndpoint::with_route_prefix("http://gateway.local", "/clusters").unwrap();
    let transport = BoundClusterLayer::new(endpoint, ClusterId::new("west-1").unwrap())
        .layer(echo_transport());

    let scoped = ClusterId::new("east-2").unwrap();
    let response = with_cluster(scoped, async move {
        let mut request = get("http://api.internal/api/v1/pods");
        attach_cluster(&mut request, ClusterId::new("north-3").unwrap());
        transport.oneshot(request).await
    })
    .await
    .unwrap();

    assert_eq!(
        response.into_body(),
        "http://gateway.local/clusters/west-1/api/v1/pods"
    );
}

#[tokio::test]
async fn test_concurrent_sends_stay_with_their_identifier() {
    let endpoint = GatewayEndpoint::with_route_prefix("http://gateway.local", "/clusters").unwrap();
    let transport = GatewayTransport::new(echo_transport(), endpoint);

    let mut tasks = Vec::new();
    for task in 0..1000 {
        let cluster_name = format!("cluster-{}", task % 10);
        let transport = transport.clone();
        tasks.push(tokio::spawn(async move {
            let cluster = ClusterId::new(cluster_name.clone()).unwrap();
            let response = with_cluster(
                cluster,
                transport.oneshot(get("http://api.internal/api/v1/pods")),
            )
            .await
            .unwrap();
            (cluster_name, response.into_body())
        }));
    }

    for task in tasks {
        let (cluster_name, body) = task.await.unwrap();
        assert_eq!(
            body,
            format!("http://gateway.local/clusters/{cluster_name}/api/v1/pods"),
            "response must correlate to its own identifier"
        );
    }
}
