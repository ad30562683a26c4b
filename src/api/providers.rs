use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::provider::{GeoPoint, Provider, ProviderStatus, VehicleClass};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/providers", post(create_provider).get(list_providers))
        .route("/providers/:id/presence", patch(update_presence))
}

#[derive(Deserialize)]
pub struct CreateProviderRequest {
    pub name: String,
    pub vehicle_classes: Vec<VehicleClass>,
    pub rating: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdatePresenceRequest {
    pub online: bool,
    pub location: Option<GeoPoint>,
}

async fn create_provider(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProviderRequest>,
) -> Result<Json<Provider>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::InvalidInput("name cannot be empty".to_string()));
    }

    if payload.vehicle_classes.is_empty() {
        return Err(AppError::InvalidInput(
            "at least one vehicle class is required".to_string(),
        ));
    }

    let provider = Provider {
        id: Uuid::new_v4(),
        name: payload.name,
        status: ProviderStatus::Offline,
        location: None,
        vehicle_classes: payload.vehicle_classes,
        rating: payload.rating.unwrap_or(5.0).clamp(0.0, 5.0),
        updated_at: Utc::now(),
    };

    state.store.insert_provider(provider.clone());
    Ok(Json(provider))
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<Provider>> {
    Json(state.store.list_providers())
}

async fn update_presence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePresenceRequest>,
) -> Result<Json<Provider>, AppError> {
    if let Some(location) = &payload.location {
        location.validate().map_err(AppError::InvalidInput)?;
    }

    if payload.online
        && payload.location.is_none()
        && state.store.get_provider(id)?.location.is_none()
    {
        return Err(AppError::InvalidInput(
            "going online requires a location".to_string(),
        ));
    }

    let provider = state
        .store
        .update_presence(id, payload.online, payload.location)?;
    state
        .metrics
        .providers_online
        .set(state.store.online_provider_count() as i64);

    Ok(Json(provider))
}
