use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::fare::FareBreakdown;
use crate::models::job::JobStatus;

/// One event per job state transition, fanned out to whatever transports
/// subscribe. Delivery bookkeeping and retry belong to the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    JobOpened {
        job_id: Uuid,
        status: JobStatus,
    },
    JobAssigned {
        job_id: Uuid,
        status: JobStatus,
        provider_id: Uuid,
        fare: FareBreakdown,
    },
    JobStatusChanged {
        job_id: Uuid,
        status: JobStatus,
    },
    JobUnserviced {
        job_id: Uuid,
        status: JobStatus,
    },
}

impl JobEvent {
    pub fn opened(job_id: Uuid) -> Self {
        JobEvent::JobOpened {
            job_id,
            status: JobStatus::Requested,
        }
    }

    pub fn assigned(job_id: Uuid, provider_id: Uuid, fare: FareBreakdown) -> Self {
        JobEvent::JobAssigned {
            job_id,
            status: JobStatus::Assigned,
            provider_id,
            fare,
        }
    }

    pub fn status_changed(job_id: Uuid, status: JobStatus) -> Self {
        JobEvent::JobStatusChanged { job_id, status }
    }

    pub fn unserviced(job_id: Uuid) -> Self {
        JobEvent::JobUnserviced {
            job_id,
            status: JobStatus::Unserviced,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn publish(&self, event: JobEvent);
}

/// Notifier backed by a broadcast channel; WebSocket sessions subscribe.
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<JobEvent>,
}

impl BroadcastNotifier {
    pub fn new(buffer: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(buffer);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, event: JobEvent) {
        // A send with no live subscribers is not an error.
        let _ = self.tx.send(event);
    }
}
