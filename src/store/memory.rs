use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::fare::FareBreakdown;
use crate::models::job::{Job, JobStatus};
use crate::models::provider::{GeoPoint, Provider, ProviderStatus};
use crate::store::{DispatchStore, StoreError};

/// Process-local store backing the single-node deployment and the test
/// suite. Conditional updates go through per-entry locks, which gives the
/// same at-most-one-winner semantics a database CAS would.
#[derive(Default)]
pub struct InMemoryStore {
    jobs: DashMap<Uuid, Job>,
    providers: DashMap<Uuid, Provider>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_job(&self, job: Job) {
        self.jobs.insert(job.id, job);
    }

    pub fn insert_provider(&self, provider: Provider) {
        self.providers.insert(provider.id, provider);
    }

    pub fn get_provider(&self, id: Uuid) -> Result<Provider, StoreError> {
        self.providers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::ProviderNotFound(id))
    }

    pub fn list_providers(&self) -> Vec<Provider> {
        self.providers
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn list_jobs(&self) -> Vec<Job> {
        self.jobs.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn online_provider_count(&self) -> usize {
        self.providers
            .iter()
            .filter(|entry| entry.value().status != ProviderStatus::Offline)
            .count()
    }

    /// Presence belongs to the provider's own session. A Busy provider stays
    /// claimed until its assignment is released by the surrounding system.
    pub fn update_presence(
        &self,
        id: Uuid,
        online: bool,
        location: Option<GeoPoint>,
    ) -> Result<Provider, StoreError> {
        let mut provider = self
            .providers
            .get_mut(&id)
            .ok_or(StoreError::ProviderNotFound(id))?;

        if online {
            if provider.status == ProviderStatus::Offline {
                provider.status = ProviderStatus::Available;
            }
        } else {
            provider.status = ProviderStatus::Offline;
        }
        if let Some(location) = location {
            provider.location = Some(location);
        }
        provider.updated_at = Utc::now();

        Ok(provider.clone())
    }
}

#[async_trait]
impl DispatchStore for InMemoryStore {
    async fn job(&self, id: Uuid) -> Result<Job, StoreError> {
        self.jobs
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::JobNotFound(id))
    }

    async fn transition_job(
        &self,
        id: Uuid,
        expected: &[JobStatus],
        next: JobStatus,
    ) -> Result<Job, StoreError> {
        let mut job = self.jobs.get_mut(&id).ok_or(StoreError::JobNotFound(id))?;

        if !expected.contains(&job.status) {
            return Err(StoreError::JobConflict {
                job_id: id,
                actual: job.status,
                expected: expected.to_vec(),
            });
        }

        job.status = next;
        Ok(job.clone())
    }

    async fn assign_job(
        &self,
        id: Uuid,
        provider_id: Uuid,
        fare: FareBreakdown,
    ) -> Result<Job, StoreError> {
        // The provider entry is locked first so competing runs serialize on
        // the claim.
        let mut provider = self
            .providers
            .get_mut(&provider_id)
            .ok_or(StoreError::ProviderNotFound(provider_id))?;

        if provider.status != ProviderStatus::Available {
            return Err(StoreError::ProviderBusy(provider_id));
        }

        let mut job = self.jobs.get_mut(&id).ok_or(StoreError::JobNotFound(id))?;

        if job.status != JobStatus::Searching || job.assigned_provider.is_some() {
            return Err(StoreError::JobConflict {
                job_id: id,
                actual: job.status,
                expected: vec![JobStatus::Searching],
            });
        }

        job.status = JobStatus::Assigned;
        job.assigned_provider = Some(provider_id);
        job.fare = Some(fare);

        provider.status = ProviderStatus::Busy;
        provider.updated_at = Utc::now();

        Ok(job.clone())
    }

    async fn provider_snapshot(&self) -> Result<Vec<Provider>, StoreError> {
        Ok(self
            .providers
            .iter()
            .filter(|entry| {
                entry.value().status == ProviderStatus::Available
                    && entry.value().location.is_some()
            })
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::InMemoryStore;
    use crate::models::fare::FareBreakdown;
    use crate::models::job::{Job, JobStatus, ServiceType};
    use crate::models::provider::{GeoPoint, Provider, ProviderStatus, VehicleClass};
    use crate::store::{DispatchStore, StoreError};

    fn job(id_seed: u128, status: JobStatus) -> Job {
        Job {
            id: Uuid::from_u128(id_seed),
            service_type: ServiceType::RegularTow,
            pickup: GeoPoint {
                lat: 32.7767,
                lon: -96.7970,
            },
            dropoff: None,
            status,
            assigned_provider: None,
            fare: None,
            created_at: Utc::now(),
        }
    }

    fn provider(id_seed: u128, status: ProviderStatus) -> Provider {
        Provider {
            id: Uuid::from_u128(id_seed),
            name: format!("provider-{id_seed}"),
            status,
            location: Some(GeoPoint {
                lat: 32.78,
                lon: -96.80,
            }),
            vehicle_classes: vec![VehicleClass::Flatbed],
            rating: 4.8,
            updated_at: Utc::now(),
        }
    }

    fn fare() -> FareBreakdown {
        FareBreakdown {
            total: dec!(105.00),
            platform_cut: dec!(21.00),
            provider_earning: dec!(84.00),
            included_miles: None,
            extra_miles: None,
            extra_cost: None,
            discount_applied: None,
            billed_minutes: None,
        }
    }

    #[tokio::test]
    async fn assign_claims_the_provider_exactly_once() {
        let store = InMemoryStore::new();
        store.insert_provider(provider(9, ProviderStatus::Available));
        store.insert_job(job(1, JobStatus::Searching));
        store.insert_job(job(2, JobStatus::Searching));

        let first = store
            .assign_job(Uuid::from_u128(1), Uuid::from_u128(9), fare())
            .await
            .unwrap();
        assert_eq!(first.status, JobStatus::Assigned);
        assert_eq!(first.assigned_provider, Some(Uuid::from_u128(9)));

        let second = store
            .assign_job(Uuid::from_u128(2), Uuid::from_u128(9), fare())
            .await;
        assert!(matches!(second, Err(StoreError::ProviderBusy(_))));

        let loser = store.job(Uuid::from_u128(2)).await.unwrap();
        assert_eq!(loser.assigned_provider, None);
    }

    #[tokio::test]
    async fn assign_rejects_a_resolved_job() {
        let store = InMemoryStore::new();
        store.insert_provider(provider(9, ProviderStatus::Available));
        store.insert_job(job(1, JobStatus::Cancelled));

        let result = store
            .assign_job(Uuid::from_u128(1), Uuid::from_u128(9), fare())
            .await;
        assert!(matches!(result, Err(StoreError::JobConflict { .. })));
    }

    #[tokio::test]
    async fn transition_rejects_unexpected_status() {
        let store = InMemoryStore::new();
        store.insert_job(job(1, JobStatus::Assigned));

        let result = store
            .transition_job(
                Uuid::from_u128(1),
                &[JobStatus::Requested, JobStatus::Searching],
                JobStatus::Cancelled,
            )
            .await;
        assert!(matches!(result, Err(StoreError::JobConflict { .. })));
    }

    #[tokio::test]
    async fn snapshot_excludes_offline_busy_and_unlocated_providers() {
        let store = InMemoryStore::new();
        store.insert_provider(provider(1, ProviderStatus::Available));
        store.insert_provider(provider(2, ProviderStatus::Busy));
        store.insert_provider(provider(3, ProviderStatus::Offline));
        let mut unlocated = provider(4, ProviderStatus::Available);
        unlocated.location = None;
        store.insert_provider(unlocated);

        let snapshot = store.provider_snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, Uuid::from_u128(1));
    }

    #[tokio::test]
    async fn presence_update_cannot_free_a_claimed_provider() {
        let store = InMemoryStore::new();
        store.insert_provider(provider(1, ProviderStatus::Busy));

        let updated = store.update_presence(Uuid::from_u128(1), true, None).unwrap();
        assert_eq!(updated.status, ProviderStatus::Busy);

        let updated = store.update_presence(Uuid::from_u128(1), false, None).unwrap();
        assert_eq!(updated.status, ProviderStatus::Offline);
    }
}
