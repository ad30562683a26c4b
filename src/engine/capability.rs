use crate::models::job::{ServiceCategory, ServiceType};
use crate::models::provider::VehicleClass;

/// Service categories each vehicle class may work. The table is the rule:
/// new classes or categories are rows here, not branches in the matcher.
const CAPABILITY_TABLE: &[(VehicleClass, &[ServiceCategory])] = &[
    (
        VehicleClass::Flatbed,
        &[ServiceCategory::Tow, ServiceCategory::Roadside],
    ),
    (
        VehicleClass::WheelLift,
        &[ServiceCategory::Tow, ServiceCategory::Roadside],
    ),
    (VehicleClass::ServiceTruck, &[ServiceCategory::Roadside]),
];

pub fn can_perform(class: VehicleClass, service: ServiceType) -> bool {
    let category = service.category();
    CAPABILITY_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == class)
        .map(|(_, allowed)| allowed.contains(&category))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::can_perform;
    use crate::models::job::ServiceType;
    use crate::models::provider::VehicleClass;

    #[test]
    fn service_truck_cannot_tow() {
        for service in [
            ServiceType::RegularTow,
            ServiceType::AccidentTow,
            ServiceType::MotorcycleTow,
        ] {
            assert!(!can_perform(VehicleClass::ServiceTruck, service));
        }
    }

    #[test]
    fn service_truck_handles_roadside_work() {
        for service in [
            ServiceType::Jumpstart,
            ServiceType::Lockout,
            ServiceType::WinchOut,
            ServiceType::FlatTireSedan,
            ServiceType::FlatTireSemiRv,
        ] {
            assert!(can_perform(VehicleClass::ServiceTruck, service));
        }
    }

    #[test]
    fn tow_trucks_handle_everything() {
        let all_services = [
            ServiceType::RegularTow,
            ServiceType::AccidentTow,
            ServiceType::MotorcycleTow,
            ServiceType::FlatTireSedan,
            ServiceType::FlatTireTruck,
            ServiceType::FlatTireDually,
            ServiceType::FlatTireSemiRv,
            ServiceType::Jumpstart,
            ServiceType::Lockout,
            ServiceType::WinchOut,
        ];
        for class in [VehicleClass::Flatbed, VehicleClass::WheelLift] {
            for service in all_services {
                assert!(can_perform(class, service), "{class:?} {service:?}");
            }
        }
    }
}
