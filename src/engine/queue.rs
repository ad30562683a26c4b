use uuid::Uuid;

use crate::error::AppError;
use crate::models::job::ServiceType;
use crate::models::provider::GeoPoint;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub job_id: Uuid,
    pub pickup: GeoPoint,
    pub service_type: ServiceType,
}

/// Fire-and-forget handoff to the dispatch engine. Returns as soon as the
/// request is queued; the search itself runs on its own task.
pub async fn enqueue_dispatch(state: &AppState, request: DispatchRequest) -> Result<(), AppError> {
    state
        .dispatch_tx
        .send(request)
        .await
        .map_err(|err| AppError::Internal(format!("dispatch queue send failed: {err}")))?;

    state.metrics.jobs_in_queue.inc();
    Ok(())
}
