pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::fare::FareBreakdown;
use crate::models::job::{Job, JobStatus};
use crate::models::provider::Provider;

pub use memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    JobNotFound(Uuid),

    #[error("provider {0} not found")]
    ProviderNotFound(Uuid),

    #[error("job {job_id} is {actual:?}, expected one of {expected:?}")]
    JobConflict {
        job_id: Uuid,
        actual: JobStatus,
        expected: Vec<JobStatus>,
    },

    #[error("provider {0} is already claimed")]
    ProviderBusy(Uuid),
}

/// Storage contract the dispatch engine depends on. Every mutation is a
/// conditional update: it applies only while the record is still in the
/// expected pre-state, so at most one assignment transition wins per job.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    async fn job(&self, id: Uuid) -> Result<Job, StoreError>;

    /// Compare-and-set on the job status: moves to `next` only while the job
    /// is in one of `expected`.
    async fn transition_job(
        &self,
        id: Uuid,
        expected: &[JobStatus],
        next: JobStatus,
    ) -> Result<Job, StoreError>;

    /// Assigns a provider and fare to a searching, unassigned job, claiming
    /// the provider in the same atomic step.
    async fn assign_job(
        &self,
        id: Uuid,
        provider_id: Uuid,
        fare: FareBreakdown,
    ) -> Result<Job, StoreError>;

    /// Snapshot of online providers with a known location.
    async fn provider_snapshot(&self) -> Result<Vec<Provider>, StoreError>;
}
