use std::sync::Arc;

use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::fare::FareBreakdown;
use crate::models::job::ServiceType;
use crate::pricing::{self, QuoteContext};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/quotes", post(create_quote))
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub service_type: ServiceType,
    pub trip_miles: f64,
    pub winch_minutes: Option<u32>,
}

/// Side-effect-free fare preview; safe to call before any job exists.
async fn create_quote(
    Json(payload): Json<QuoteRequest>,
) -> Result<Json<FareBreakdown>, AppError> {
    let fare = pricing::quote(
        payload.service_type,
        payload.trip_miles,
        &QuoteContext {
            winch_minutes: payload.winch_minutes,
        },
    )?;

    Ok(Json(fare))
}
