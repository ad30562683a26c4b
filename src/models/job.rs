use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::haversine_miles;
use crate::models::fare::FareBreakdown;
use crate::models::provider::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ServiceType {
    RegularTow,
    AccidentTow,
    MotorcycleTow,
    FlatTireSedan,
    FlatTireTruck,
    FlatTireDually,
    FlatTireSemiRv,
    Jumpstart,
    Lockout,
    WinchOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    Tow,
    Roadside,
}

impl ServiceType {
    pub fn category(self) -> ServiceCategory {
        match self {
            ServiceType::RegularTow | ServiceType::AccidentTow | ServiceType::MotorcycleTow => {
                ServiceCategory::Tow
            }
            _ => ServiceCategory::Roadside,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Requested,
    Searching,
    Assigned,
    Unserviced,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub service_type: ServiceType,
    pub pickup: GeoPoint,
    pub dropoff: Option<GeoPoint>,
    pub status: JobStatus,
    pub assigned_provider: Option<Uuid>,
    pub fare: Option<FareBreakdown>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Distance used for pricing. Candidates are ranked by pickup proximity
    /// instead; a job without a dropoff bills zero towed miles.
    pub fn trip_miles(&self) -> f64 {
        self.dropoff
            .map(|dropoff| haversine_miles(&self.pickup, &dropoff))
            .unwrap_or(0.0)
    }
}
