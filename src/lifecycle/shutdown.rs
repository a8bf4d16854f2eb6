//! Shutdown signalling for watch loops.

use tokio::sync::watch;

/// Broadcasts a stop request to every running cache loop.
///
/// The request is level-triggered: a loop that subscribes after the trigger
/// observes it immediately, so caches started late stop instead of hanging.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a coordinator with no stop request pending.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// A signal for one consumer, observing triggers past and future.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Ask every subscribed loop to stop at its next await point.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Number of loops still holding a signal.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// One consumer's view of the shutdown state.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// True once shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until shutdown is requested.
    ///
    /// Resolves immediately when it already was. A dropped coordinator
    /// counts as a request, so orphaned loops do not run forever.
    pub async fn triggered(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_existing_and_late_subscribers() {
        let shutdown = Shutdown::new();
        let mut early = shutdown.subscribe();
        assert!(!early.is_triggered());

        shutdown.trigger();
        early.triggered().await;

        let late = shutdown.subscribe();
        assert!(late.is_triggered());
    }

    #[tokio::test]
    async fn test_dropped_coordinator_releases_waiters() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        drop(shutdown);
        signal.triggered().await;
    }
}
