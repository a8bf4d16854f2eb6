//! List+watch reflector.
//!
//! # Responsibilities
//! - Populate the store from an initial full listing
//! - Keep it current from a line-delimited JSON watch stream
//! - Signal sync completion and deliver events to registered handlers
//! - Re-list with backoff when the watch breaks
//!
//! # Design Decisions
//! - Generic over any `tower::Service` transport, so the same loop runs over
//!   a context-routed or a cluster-bound transport without knowing which
//! - Watch re-establishment lives here, above the transport; the transport
//!   itself never retries
//! - Sync is signalled through a watch channel; `has_synced` stays poll-able
//!   for compatibility, but `wait_synced` blocks without spinning

use std::sync::{Arc, RwLock};
use std::time::Duration;

use bytes::{Buf, Bytes};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Empty};
use rand::Rng;
use thiserror::Error;
use tokio::sync::watch;
use tower::{Service, ServiceExt};

use crate::cache::object::{ObjectList, WatchEvent};
use crate::cache::store::{CacheEvent, Store};
use crate::config::schema::CacheConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::transport::BoxError;

/// Callback invoked for every cache event, in arrival order.
pub type EventHandler = Box<dyn Fn(&CacheEvent) + Send + Sync>;

/// Error returned by [`CacheHandle::wait_synced`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cache did not sync within {0:?}")]
    Timeout(Duration),

    #[error("cache stopped before sync completed")]
    Stopped,
}

/// Failure of one list+watch cycle; always followed by a backed-off re-list.
#[derive(Debug, Error)]
enum WatchError {
    #[error("transport: {0}")]
    Transport(#[source] BoxError),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("body: {0}")]
    Body(#[source] BoxError),
}

/// State shared between the running loop and its handles.
struct Shared {
    name: String,
    store: Store,
    handlers: RwLock<Vec<EventHandler>>,
    synced: watch::Sender<bool>,
}

impl Shared {
    fn deliver(&self, event: &CacheEvent) {
        metrics::record_cache_event(&self.name, event.kind());
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for handler in handlers.iter() {
            handler(event);
        }
    }

    fn add_handler(&self, handler: EventHandler) {
        self.handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(handler);
    }
}

/// Caller-side view of a running reflector.
#[derive(Clone)]
pub struct CacheHandle {
    shared: Arc<Shared>,
    synced: watch::Receiver<bool>,
}

impl CacheHandle {
    /// The cache's name, as used in logs and metrics.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// True once the initial listing has been fully applied.
    pub fn has_synced(&self) -> bool {
        *self.synced.borrow()
    }

    /// Wait until the initial listing has been applied, up to `limit`.
    pub async fn wait_synced(&self, limit: Duration) -> Result<(), SyncError> {
        let mut synced = self.synced.clone();
        let result = tokio::time::timeout(limit, synced.wait_for(|done| *done)).await;
        match result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(SyncError::Stopped),
            Err(_) => Err(SyncError::Timeout(limit)),
        }
    }

    /// The mirrored objects.
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    /// Register a handler for added/updated/removed notifications.
    pub fn add_event_handler(&self, handler: impl Fn(&CacheEvent) + Send + Sync + 'static) {
        self.shared.add_handler(Box::new(handler));
    }
}

/// Watch-based cache consumer: mirrors one resource collection reached
/// through the given transport.
pub struct Reflector<S> {
    transport: S,
    resource_url: String,
    config: CacheConfig,
    shared: Arc<Shared>,
    synced_rx: watch::Receiver<bool>,
}

impl<S> Reflector<S> {
    /// Create a reflector for the collection at `resource_url` (a logical
    /// base URL without query; the transport decides where it really goes).
    /// `name` labels the cache in logs and metrics.
    pub fn new(
        transport: S,
        resource_url: impl Into<String>,
        name: impl Into<String>,
        config: CacheConfig,
    ) -> Self {
        let (synced_tx, synced_rx) = watch::channel(false);
        Self {
            transport,
            resource_url: resource_url.into(),
            config,
            shared: Arc::new(Shared {
                name: name.into(),
                store: Store::new(),
                handlers: RwLock::new(Vec::new()),
                synced: synced_tx,
            }),
            synced_rx,
        }
    }

    /// A handle usable after `run` consumes the reflector.
    pub fn handle(&self) -> CacheHandle {
        CacheHandle {
            shared: self.shared.clone(),
            synced: self.synced_rx.clone(),
        }
    }

    /// Register a handler for added/updated/removed notifications.
    pub fn add_event_handler(&self, handler: impl Fn(&CacheEvent) + Send + Sync + 'static) {
        self.shared.add_handler(Box::new(handler));
    }
}

impl<S, RB> Reflector<S>
where
    S: Service<Request<Empty<Bytes>>, Response = Response<RB>>,
    S::Error: Into<BoxError>,
    RB: http_body::Body + Unpin,
    RB::Error: Into<BoxError>,
{
    /// Drive the list+watch loop until shutdown triggers.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            cache = %self.shared.name,
            url = %self.resource_url,
            "Reflector starting"
        );

        let mut backoff = RelistBackoff::new(&self.config);
        loop {
            let delay = tokio::select! {
                _ = shutdown.triggered() => break,
                result = self.sync_once() => match result {
                    // Clean end of stream: pause one base interval, then
                    // re-list from scratch.
                    Ok(()) => backoff.after_clean_end(),
                    Err(e) => {
                        let delay = backoff.after_failure();
                        tracing::warn!(
                            cache = %self.shared.name,
                            error = %e,
                            delay = ?delay,
                            "Watch interrupted, re-listing after backoff"
                        );
                        delay
                    }
                },
            };
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.triggered() => break,
            }
        }

        tracing::info!(cache = %self.shared.name, "Reflector stopped");
    }

    /// One full cycle: list, mark synced, then consume the watch stream
    /// until it ends.
    async fn sync_once(&mut self) -> Result<(), WatchError> {
        let req = self.request(&self.resource_url)?;
        let response = self.send(req).await?;
        let (parts, body) = response.into_parts();
        if !parts.status.is_success() {
            return Err(WatchError::Status(parts.status));
        }
        let bytes = body
            .collect()
            .await
            .map_err(|e| WatchError::Body(e.into()))?
            .to_bytes();
        let list: ObjectList = serde_json::from_slice(&bytes)?;
        let resource_version = list.metadata.resource_version;

        let events = self.shared.store.replace(list.items);
        for event in &events {
            self.shared.deliver(event);
        }
        tracing::debug!(
            cache = %self.shared.name,
            objects = self.shared.store.len(),
            "Initial listing applied"
        );
        self.shared.synced.send_replace(true);

        let watch_url = match &resource_version {
            Some(rv) => format!("{}?watch=true&resourceVersion={}", self.resource_url, rv),
            None => format!("{}?watch=true", self.resource_url),
        };
        let req = self.request(&watch_url)?;
        let response = self.send(req).await?;
        let (parts, mut body) = response.into_parts();
        if !parts.status.is_success() {
            return Err(WatchError::Status(parts.status));
        }

        let mut buf: Vec<u8> = Vec::new();
        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(|e| WatchError::Body(e.into()))?;
            let Ok(mut data) = frame.into_data() else {
                continue; // trailers
            };
            let chunk = data.copy_to_bytes(data.remaining());
            buf.extend_from_slice(&chunk);

            while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                let line = &line[..line.len() - 1];
                if line.is_empty() {
                    continue;
                }
                let event: WatchEvent = serde_json::from_slice(line)?;
                if let Some(cache_event) = self.shared.store.apply(event) {
                    self.shared.deliver(&cache_event);
                }
            }
        }
        Ok(())
    }

    fn request(&self, url: &str) -> Result<Request<Empty<Bytes>>, WatchError> {
        Request::builder()
            .uri(url)
            .header(http::header::ACCEPT, "application/json")
            .body(Empty::new())
            .map_err(|e| WatchError::Transport(e.into()))
    }

    async fn send(&mut self, req: Request<Empty<Bytes>>) -> Result<Response<RB>, WatchError> {
        let ready = self
            .transport
            .ready()
            .await
            .map_err(|e| WatchError::Transport(e.into()))?;
        ready
            .call(req)
            .await
            .map_err(|e| WatchError::Transport(e.into()))
    }
}

/// Delay schedule between list+watch cycles.
///
/// Consecutive failures double the delay up to the configured cap, with up
/// to 10% jitter so a fleet of caches does not re-list in lockstep. A clean
/// end of stream resets the schedule.
struct RelistBackoff {
    base_ms: u64,
    max_ms: u64,
    failures: u32,
}

impl RelistBackoff {
    fn new(config: &CacheConfig) -> Self {
        Self {
            base_ms: config.relist_base_delay_ms,
            max_ms: config.relist_max_delay_ms,
            failures: 0,
        }
    }

    /// Delay before re-listing after the watch stream ended normally.
    fn after_clean_end(&mut self) -> Duration {
        self.failures = 0;
        Duration::from_millis(self.base_ms)
    }

    /// Delay before re-listing after a broken cycle.
    fn after_failure(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let doubled = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(self.failures - 1));
        let capped = doubled.min(self.max_ms);
        let jitter = match capped / 10 {
            0 => 0,
            range => rand::thread_rng().gen_range(0..=range),
        };
        Duration::from_millis(capped + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(base_ms: u64, max_ms: u64) -> RelistBackoff {
        RelistBackoff::new(&CacheConfig {
            sync_timeout_secs: 1,
            relist_base_delay_ms: base_ms,
            relist_max_delay_ms: max_ms,
        })
    }

    #[test]
    fn test_relist_delays_double_then_cap() {
        let mut backoff = schedule(100, 1000);
        let first = backoff.after_failure();
        assert!((100..=110).contains(&(first.as_millis() as u64)));

        let second = backoff.after_failure();
        assert!((200..=220).contains(&(second.as_millis() as u64)));

        for _ in 0..10 {
            backoff.after_failure();
        }
        let capped = backoff.after_failure();
        assert!((1000..=1100).contains(&(capped.as_millis() as u64)));
    }

    #[test]
    fn test_clean_end_resets_the_schedule() {
        let mut backoff = schedule(100, 1000);
        backoff.after_failure();
        backoff.after_failure();
        backoff.after_failure();

        assert_eq!(backoff.after_clean_end(), Duration::from_millis(100));
        let next = backoff.after_failure();
        assert!((100..=110).contains(&(next.as_millis() as u64)));
    }

    #[test]
    fn test_handle_reports_unsynced_before_run() {
        let transport = tower::service_fn(|_req: Request<Empty<Bytes>>| async move {
            Ok::<_, std::convert::Infallible>(Response::new(
                http_body_util::Full::new(Bytes::new()),
            ))
        });
        let reflector = Reflector::new(
            transport,
            "http://api.local/api/v1/pods",
            "pods",
            CacheConfig::default(),
        );
        assert!(!reflector.handle().has_synced());
        assert!(reflector.handle().store().is_empty());
    }
}
