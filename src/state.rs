use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::dispatch::DispatchPolicy;
use crate::engine::queue::DispatchRequest;
use crate::notify::BroadcastNotifier;
use crate::observability::metrics::Metrics;
use crate::store::InMemoryStore;

pub struct AppState {
    pub store: Arc<InMemoryStore>,
    pub dispatch_tx: mpsc::Sender<DispatchRequest>,
    pub notifier: BroadcastNotifier,
    pub policy: DispatchPolicy,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        dispatch_queue_size: usize,
        event_buffer_size: usize,
        policy: DispatchPolicy,
    ) -> (Self, mpsc::Receiver<DispatchRequest>) {
        let (dispatch_tx, dispatch_rx) = mpsc::channel(dispatch_queue_size);

        (
            Self {
                store: Arc::new(InMemoryStore::new()),
                dispatch_tx,
                notifier: BroadcastNotifier::new(event_buffer_size),
                policy,
                metrics: Metrics::new(),
            },
            dispatch_rx,
        )
    }
}
