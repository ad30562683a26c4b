use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::queue::{enqueue_dispatch, DispatchRequest};
use crate::error::AppError;
use crate::models::job::{Job, JobStatus, ServiceType};
use crate::models::provider::GeoPoint;
use crate::notify::{JobEvent, Notifier};
use crate::state::AppState;
use crate::store::DispatchStore;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", post(create_job).get(list_jobs))
        .route("/jobs/:id", get(get_job))
        .route("/jobs/:id/cancel", patch(cancel_job))
}

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub service_type: ServiceType,
    pub pickup: GeoPoint,
    pub dropoff: Option<GeoPoint>,
}

async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<Json<Job>, AppError> {
    payload.pickup.validate().map_err(AppError::InvalidInput)?;
    if let Some(dropoff) = &payload.dropoff {
        dropoff.validate().map_err(AppError::InvalidInput)?;
    }

    let job = Job {
        id: Uuid::new_v4(),
        service_type: payload.service_type,
        pickup: payload.pickup,
        dropoff: payload.dropoff,
        status: JobStatus::Requested,
        assigned_provider: None,
        fare: None,
        created_at: Utc::now(),
    };

    state.store.insert_job(job.clone());
    state.notifier.publish(JobEvent::opened(job.id));

    enqueue_dispatch(
        &state,
        DispatchRequest {
            job_id: job.id,
            pickup: job.pickup,
            service_type: job.service_type,
        },
    )
    .await?;

    Ok(Json(job))
}

async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state.store.job(id).await?;
    Ok(Json(job))
}

async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<Job>> {
    Json(state.store.list_jobs())
}

/// Cancellation is owned by the surrounding system; a dispatch run in flight
/// observes the status change at its next attempt and stops.
async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state
        .store
        .transition_job(
            id,
            &[JobStatus::Requested, JobStatus::Searching],
            JobStatus::Cancelled,
        )
        .await?;

    state
        .notifier
        .publish(JobEvent::status_changed(job.id, job.status));

    Ok(Json(job))
}
