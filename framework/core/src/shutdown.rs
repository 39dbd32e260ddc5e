use std::sync::Arc;

use tokio::sync::broadcast::{error::RecvError, Receiver, Sender};
use tokio::sync::Mutex;

/// Process wide stop signal for the monitor.
///
/// Triggered by Ctrl-C or when a bounded run reaches its configured duration. Anything that loops
/// until the monitor stops takes a [ShutdownListener] from here.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<()>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
        }
    }

    pub fn shutdown(&self) {
        if let Err(e) = self.sender.send(()) {
            // Nobody is listening, so there is nothing left to stop.
            log::debug!("Shutdown signal had no listeners: {e:?}");
        }
    }

    pub fn new_listener(&self) -> ShutdownListener {
        ShutdownListener::new(self.sender.subscribe())
    }
}

#[derive(Clone, Debug)]
pub struct ShutdownListener {
    receiver: Arc<Mutex<Receiver<()>>>,
}

impl ShutdownListener {
    fn new(receiver: Receiver<()>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Wait until the shutdown signal is received, or until every [ShutdownHandle] is dropped.
    ///
    /// Safe to race against other futures in a `tokio::select!`.
    pub async fn wait_for_shutdown(&mut self) {
        let mut guard = self.receiver.lock().await;
        loop {
            match guard.recv().await {
                Ok(()) | Err(RecvError::Closed) => return,
                Err(RecvError::Lagged(_)) => continue,
            }
        }
    }
}
