//! Broadcast shutdown signal for a running fanout.

use std::sync::Arc;
use tokio::sync::watch;

/// Receiver side of the shutdown signal, held by each worker.
pub type ShutdownRx = watch::Receiver<()>;

/// Transmitter side of the shutdown signal.
///
/// Cloning shares the same underlying channel, so any clone can stop every worker subscribed to
/// it. Workers check the signal before claiming the next item: the item in flight is always
/// completed, nothing is cancelled halfway.
#[derive(Debug, Clone)]
pub struct ShutdownTx(Arc<watch::Sender<()>>);

impl ShutdownTx {
    /// Signals shutdown to all subscribed receivers.
    ///
    /// Fails only when no receiver is alive, meaning there is nothing left to stop.
    pub fn shutdown(&self) -> Result<(), watch::error::SendError<()>> {
        self.0.send(())
    }

    /// Creates a new receiver that observes shutdowns sent after this call.
    pub fn subscribe(&self) -> ShutdownRx {
        self.0.subscribe()
    }
}

/// Creates a new shutdown channel.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(());
    (ShutdownTx(Arc::new(tx)), rx)
}

/// Returns `true` if shutdown was signaled on `shutdown_rx` since it last observed the channel.
///
/// A dropped transmitter is not a shutdown request.
pub fn is_shutdown_requested(shutdown_rx: &ShutdownRx) -> bool {
    matches!(shutdown_rx.has_changed(), Ok(true))
}
