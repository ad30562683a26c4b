use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::matching::find_candidates;
use crate::engine::queue::DispatchRequest;
use crate::error::AppError;
use crate::models::job::JobStatus;
use crate::notify::{JobEvent, Notifier};
use crate::pricing::{self, QuoteContext};
use crate::state::AppState;
use crate::store::{DispatchStore, StoreError};

#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub initial_radius_miles: f64,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            initial_radius_miles: 3.0,
            max_attempts: 4,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

impl DispatchPolicy {
    /// Wall-clock ceiling for one job's whole run: the backoff sleeps plus a
    /// one-second allowance per attempt. A run that overshoots still
    /// converges to a terminal status.
    pub fn overall_budget(&self) -> Duration {
        self.retry_backoff * self.max_attempts
            + Duration::from_secs(u64::from(self.max_attempts))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Assigned { provider_id: Uuid, attempt: u32 },
    Unserviced { attempts: u32 },
    /// The job was cancelled or resolved by another writer mid-run.
    Superseded,
}

/// Engine loop: drains the dispatch queue and gives every job its own task,
/// so one job's backoff never stalls another's search.
pub async fn run_dispatch_engine(
    state: Arc<AppState>,
    mut request_rx: mpsc::Receiver<DispatchRequest>,
) {
    info!("dispatch engine started");

    while let Some(request) = request_rx.recv().await {
        state.metrics.jobs_in_queue.dec();

        let state = state.clone();
        tokio::spawn(async move {
            let job_id = request.job_id;
            let start = Instant::now();
            let result = run_with_budget(&state, request).await;
            let elapsed = start.elapsed().as_secs_f64();

            let outcome = match &result {
                Ok(DispatchOutcome::Assigned { attempt, .. }) => {
                    state.metrics.dispatch_attempts.observe(f64::from(*attempt));
                    "assigned"
                }
                Ok(DispatchOutcome::Unserviced { attempts }) => {
                    state.metrics.dispatch_attempts.observe(f64::from(*attempts));
                    "unserviced"
                }
                Ok(DispatchOutcome::Superseded) => "superseded",
                Err(_) => "error",
            };

            state
                .metrics
                .dispatch_latency_seconds
                .with_label_values(&[outcome])
                .observe(elapsed);
            state
                .metrics
                .dispatch_total
                .with_label_values(&[outcome])
                .inc();

            if let Err(err) = result {
                error!(job_id = %job_id, error = %err, "dispatch run failed");
            }
        });
    }

    warn!("dispatch engine stopped: queue channel closed");
}

async fn run_with_budget(
    state: &AppState,
    request: DispatchRequest,
) -> Result<DispatchOutcome, AppError> {
    let store = state.store.as_ref();
    let notifier = &state.notifier;

    match tokio::time::timeout(
        state.policy.overall_budget(),
        dispatch_job(store, notifier, &state.policy, &request),
    )
    .await
    {
        Ok(result) => result,
        Err(_elapsed) => {
            warn!(job_id = %request.job_id, "dispatch budget exceeded, finalizing as unserviced");
            finalize_unserviced(store, notifier, request.job_id, state.policy.max_attempts).await
        }
    }
}

/// Radius-expansion search for one job: up to `max_attempts` matching passes
/// over a fresh provider snapshot, doubling the radius after each empty
/// attempt, with a backoff sleep in between. Cancellation and concurrent
/// writers are observed at the start of every attempt.
pub async fn dispatch_job(
    store: &dyn DispatchStore,
    notifier: &dyn Notifier,
    policy: &DispatchPolicy,
    request: &DispatchRequest,
) -> Result<DispatchOutcome, AppError> {
    request.pickup.validate().map_err(AppError::InvalidInput)?;

    let job = match store
        .transition_job(request.job_id, &[JobStatus::Requested], JobStatus::Searching)
        .await
    {
        Ok(job) => job,
        Err(StoreError::JobConflict { .. }) => return Ok(DispatchOutcome::Superseded),
        Err(err) => return Err(err.into()),
    };
    notifier.publish(JobEvent::status_changed(job.id, job.status));

    let mut radius_miles = policy.initial_radius_miles;
    for attempt in 1..=policy.max_attempts {
        let current = store.job(request.job_id).await?;
        if current.status != JobStatus::Searching {
            info!(job_id = %current.id, status = ?current.status, "dispatch superseded");
            return Ok(DispatchOutcome::Superseded);
        }

        let snapshot = store.provider_snapshot().await?;
        let candidates =
            find_candidates(&request.pickup, request.service_type, &snapshot, radius_miles);

        info!(
            job_id = %request.job_id,
            attempt,
            radius_miles,
            candidates = candidates.len(),
            "dispatch attempt"
        );

        if let Some(best) = candidates.first() {
            let fare = pricing::quote(
                request.service_type,
                current.trip_miles(),
                &QuoteContext {
                    winch_minutes: Some(pricing::DEFAULT_WINCH_MINUTES),
                },
            )?;

            match store
                .assign_job(request.job_id, best.provider.id, fare.clone())
                .await
            {
                Ok(assigned) => {
                    notifier.publish(JobEvent::assigned(assigned.id, best.provider.id, fare));
                    info!(
                        job_id = %assigned.id,
                        provider_id = %best.provider.id,
                        distance_miles = best.distance_miles,
                        attempt,
                        "job assigned"
                    );
                    return Ok(DispatchOutcome::Assigned {
                        provider_id: best.provider.id,
                        attempt,
                    });
                }
                Err(StoreError::ProviderBusy(provider_id)) => {
                    // Lost the provider to a competing run. The attempt is
                    // abandoned, not retried; the next expansion will see a
                    // fresh snapshot.
                    warn!(
                        job_id = %request.job_id,
                        provider_id = %provider_id,
                        attempt,
                        "provider claimed by competing dispatch"
                    );
                }
                Err(StoreError::JobConflict { .. }) => return Ok(DispatchOutcome::Superseded),
                Err(err) => return Err(err.into()),
            }
        }

        if attempt < policy.max_attempts {
            sleep(policy.retry_backoff).await;
            radius_miles *= 2.0;
        }
    }

    finalize_unserviced(store, notifier, request.job_id, policy.max_attempts).await
}

async fn finalize_unserviced(
    store: &dyn DispatchStore,
    notifier: &dyn Notifier,
    job_id: Uuid,
    attempts: u32,
) -> Result<DispatchOutcome, AppError> {
    match store
        .transition_job(job_id, &[JobStatus::Searching], JobStatus::Unserviced)
        .await
    {
        Ok(job) => {
            notifier.publish(JobEvent::unserviced(job.id));
            info!(job_id = %job.id, attempts, "no providers found, job unserviced");
            Ok(DispatchOutcome::Unserviced { attempts })
        }
        Err(StoreError::JobConflict { .. }) => Ok(DispatchOutcome::Superseded),
        Err(err) => Err(err.into()),
    }
}
