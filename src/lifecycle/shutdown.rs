//! Shutdown coordination for proxy instances.

use tokio::sync::broadcast;

/// Coordinator for shutdown.
///
/// Every proxy instance subscribes before it starts serving; a single
/// [`trigger`](Shutdown::trigger) closes all listeners.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe an instance to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscribed instance to stop.
    pub fn trigger(&self) {
        let receivers = self.tx.send(()).unwrap_or(0);
        tracing::info!(instances = receivers, "Shutdown triggered");
    }

    /// Number of subscribers that have not dropped their receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
