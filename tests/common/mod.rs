//! Shared utilities for integration testing.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;

/// A mock gateway bound to an ephemeral port, recording every path it saw.
pub struct MockGateway {
    pub addr: SocketAddr,
    paths: Arc<Mutex<Vec<String>>>,
}

impl MockGateway {
    /// Gateway base URL.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every path-and-query received, in arrival order.
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a gateway that echoes the request's path-and-query back as the body.
#[allow(dead_code)]
pub async fn start_echo_gateway() -> MockGateway {
    let paths = Arc::new(Mutex::new(Vec::new()));
    let recorded = paths.clone();

    let app = Router::new().fallback(move |req: Request<Body>| {
        let recorded = recorded.clone();
        async move {
            let seen = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_default();
            recorded.lock().unwrap().push(seen.clone());
            seen
        }
    });

    let addr = serve(app).await;
    MockGateway { addr, paths }
}

/// Start a gateway serving a fixed listing, and the given pre-rendered watch
/// event lines whenever the request carries `watch=true`.
#[allow(dead_code)]
pub async fn start_list_watch_gateway(
    list: serde_json::Value,
    watch_lines: Vec<String>,
) -> MockGateway {
    let paths = Arc::new(Mutex::new(Vec::new()));
    let recorded = paths.clone();
    let list = Arc::new(list);
    let watch_lines = Arc::new(watch_lines);

    let app = Router::new().fallback(move |req: Request<Body>| {
        let recorded = recorded.clone();
        let list = list.clone();
        let watch_lines = watch_lines.clone();
        async move {
            let seen = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_default();
            recorded.lock().unwrap().push(seen);

            let watching = req
                .uri()
                .query()
                .is_some_and(|q| q.contains("watch=true"));
            if watching {
                let lines: Vec<Result<String, Infallible>> = watch_lines
                    .iter()
                    .map(|line| Ok(format!("{line}\n")))
                    .collect();
                Response::builder()
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from_stream(futures_util::stream::iter(lines)))
                    .unwrap()
            } else {
                Response::builder()
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(list.to_string()))
                    .unwrap()
            }
        }
    });

    let addr = serve(app).await;
    MockGateway { addr, paths }
}
