/// Threading and Async Integration Helpers
///
/// Channel setup between the egui thread and the backend service task, and
/// a helper for spawning tasks whose failures are logged.

use crate::backend::{BackendEvent, BackendRequest, ChannelBackend};
use tokio::sync::mpsc;

/// Request queue depth; the page only ever has a handful in flight
pub const REQUEST_CHANNEL_CAPACITY: usize = 256;

/// Push event queue depth
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Both ends of the page/service channel pair
pub struct BackendBridge {
    /// Page side: send requests
    pub client: ChannelBackend,

    /// Page side: drained every frame
    pub events_rx: mpsc::Receiver<BackendEvent>,

    /// Service side: incoming requests
    pub requests_rx: mpsc::Receiver<BackendRequest>,

    /// Service side: push events
    pub events_tx: mpsc::Sender<BackendEvent>,
}

impl BackendBridge {
    pub fn new() -> Self {
        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client: ChannelBackend::new(requests_tx),
            events_rx,
            requests_rx,
            events_tx,
        }
    }
}

impl Default for BackendBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to spawn a task that logs its failure instead of vanishing
pub fn spawn_monitored_task<Fut>(name: &'static str, fut: Fut) -> tokio::task::JoinHandle<()>
where
    Fut: std::future::Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>>
        + Send
        + 'static,
{
    tokio::spawn(async move {
        match fut.await {
            Ok(()) => log::debug!("[Task] {} finished", name),
            Err(e) => log::error!("[Task] {} failed: {}", name, e),
        }
    })
}
