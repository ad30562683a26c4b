use crate::engine::capability::can_perform;
use crate::geo::haversine_miles;
use crate::models::job::ServiceType;
use crate::models::provider::{GeoPoint, Provider, ProviderStatus};

#[derive(Debug, Clone)]
pub struct Candidate {
    pub provider: Provider,
    pub distance_miles: f64,
}

/// Filters a provider snapshot down to the candidates for one job: online,
/// located, within `radius_miles` of the pickup point, and capable of the
/// service type. Sorted by ascending distance, provider id as tie-break so
/// the ordering is reproducible. An empty result is a normal outcome.
pub fn find_candidates(
    pickup: &GeoPoint,
    service: ServiceType,
    snapshot: &[Provider],
    radius_miles: f64,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = snapshot
        .iter()
        .filter_map(|provider| {
            if provider.status != ProviderStatus::Available {
                return None;
            }
            let location = provider.location.as_ref()?;
            let distance_miles = haversine_miles(location, pickup);
            if distance_miles > radius_miles {
                return None;
            }
            let capable = provider
                .vehicle_classes
                .iter()
                .any(|class| can_perform(*class, service));
            if !capable {
                return None;
            }
            Some(Candidate {
                provider: provider.clone(),
                distance_miles,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.distance_miles
            .total_cmp(&b.distance_miles)
            .then_with(|| a.provider.id.cmp(&b.provider.id))
    });

    candidates
}
