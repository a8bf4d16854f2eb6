//! Demonstration client for the multi-cluster gateway transport.
//!
//! Issues one routed request through the context-driven transport, then
//! mirrors a resource collection through a cluster-bound transport and
//! waits for the cache to sync.

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use clap::Parser;
use http::header::ACCEPT;
use http::Request;
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tower::{Layer, ServiceExt};

use multicluster_transport::cache::{CacheEvent, Reflector};
use multicluster_transport::config::ClusterTargetConfig;
use multicluster_transport::observability::{logging, metrics};
use multicluster_transport::transport::RequestIdInjector;
use multicluster_transport::{
    load_config, with_cluster, BoundClusterLayer, ClusterId, GatewayConfig, GatewayEndpoint,
    GatewayLayer, Shutdown,
};

#[derive(Parser)]
#[command(name = "gateway-client")]
#[command(about = "Demonstration client for the multi-cluster gateway transport", long_about = None)]
struct Cli {
    /// TOML configuration file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gateway base URL.
    #[arg(long)]
    gateway_url: Option<String>,

    /// Target cluster name.
    #[arg(long)]
    cluster: ClusterId,

    /// Resource collection to fetch and mirror.
    #[arg(long, default_value = "/api/v1/pods")]
    resource_path: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(url) = cli.gateway_url {
        config.gateway.url = url;
    }

    logging::init_logging(&config.observability.log_level);
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let endpoint =
        GatewayEndpoint::with_route_prefix(&config.gateway.url, &config.gateway.route_prefix)?;
    let client: Client<HttpConnector, Empty<Bytes>> =
        Client::builder(TokioExecutor::new()).build(HttpConnector::new());

    // One context-routed transport serves any cluster; the scope decides.
    let transport = GatewayLayer::new(endpoint).layer(client.clone());

    let request = Request::builder()
        .uri(format!("http://cluster.internal{}", cli.resource_path))
        .header(ACCEPT, "application/json")
        .body(Empty::new())?;
    let response = with_cluster(cli.cluster.clone(), transport.oneshot(request)).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    println!("GET {} via {}: {}", cli.resource_path, cli.cluster, status);
    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", String::from_utf8_lossy(&body)),
    }

    // One cluster-bound transport backs the cache mirror.
    let target = config
        .clusters
        .iter()
        .find(|c| c.name == cli.cluster.as_str())
        .cloned()
        .unwrap_or_else(|| ClusterTargetConfig {
            name: cli.cluster.to_string(),
            ..Default::default()
        });
    let bound = BoundClusterLayer::from_config(&config.gateway, &target)?
        .with_header_injector(RequestIdInjector)
        .layer(client);

    let reflector = Reflector::new(
        bound,
        format!("http://cluster.internal{}", cli.resource_path),
        format!("{}@{}", cli.resource_path, cli.cluster),
        config.cache.clone(),
    );
    reflector.add_event_handler(|event| match event {
        CacheEvent::Added(obj) => println!("added\t{}", obj.key()),
        CacheEvent::Updated { new, .. } => println!("updated\t{}", new.key()),
        CacheEvent::Removed(obj) => println!("removed\t{}", obj.key()),
    });
    let handle = reflector.handle();

    let shutdown = Shutdown::new();
    let task = tokio::spawn(reflector.run(shutdown.subscribe()));

    handle
        .wait_synced(Duration::from_secs(config.cache.sync_timeout_secs))
        .await?;
    println!(
        "cache synced: {} objects from cluster {}",
        handle.store().len(),
        cli.cluster
    );

    shutdown.trigger();
    let _ = task.await;

    Ok(())
}
