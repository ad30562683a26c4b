use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::AppError;
use crate::models::fare::FareBreakdown;
use crate::models::job::ServiceType;

/// Share of every fare retained by the platform.
pub const PLATFORM_CUT_RATE: Decimal = dec!(0.20);

/// Minutes billed for a winch-out when the elapsed duration is not known yet,
/// i.e. when pricing happens at assignment time.
pub const DEFAULT_WINCH_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteContext {
    pub winch_minutes: Option<u32>,
}

/// How one service type is billed. Adding a service type means adding a row
/// in [`rate_rule`], not new control flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateRule {
    /// Base fee plus a per-mile charge beyond an included allowance.
    Metered {
        base: Decimal,
        included_miles: Decimal,
        per_mile: Decimal,
    },
    /// One fixed fee regardless of distance.
    Flat { amount: Decimal },
    /// Fixed fee, discounted for short trips.
    FlatDiscounted {
        amount: Decimal,
        discount: Decimal,
        max_trip_miles: Decimal,
    },
    /// Billed by elapsed minutes against an hourly rate.
    Hourly { rate: Decimal },
}

pub fn rate_rule(service: ServiceType) -> RateRule {
    match service {
        ServiceType::RegularTow => RateRule::Metered {
            base: dec!(105.00),
            included_miles: dec!(7),
            per_mile: dec!(5.00),
        },
        ServiceType::AccidentTow => RateRule::Metered {
            base: dec!(295.00),
            included_miles: dec!(21),
            per_mile: dec!(5.00),
        },
        ServiceType::MotorcycleTow => RateRule::Metered {
            base: dec!(185.00),
            included_miles: dec!(7),
            per_mile: dec!(4.00),
        },
        ServiceType::FlatTireSedan => RateRule::Flat {
            amount: dec!(75.00),
        },
        ServiceType::FlatTireTruck => RateRule::Flat {
            amount: dec!(85.00),
        },
        ServiceType::FlatTireDually => RateRule::Flat {
            amount: dec!(125.00),
        },
        ServiceType::FlatTireSemiRv => RateRule::Flat {
            amount: dec!(220.00),
        },
        ServiceType::Jumpstart => RateRule::FlatDiscounted {
            amount: dec!(65.00),
            discount: dec!(0.10),
            max_trip_miles: dec!(5),
        },
        ServiceType::Lockout => RateRule::FlatDiscounted {
            amount: dec!(75.00),
            discount: dec!(0.10),
            max_trip_miles: dec!(5),
        },
        ServiceType::WinchOut => RateRule::Hourly {
            rate: dec!(195.00),
        },
    }
}

/// Currency rounding: half-up to two decimal places. Applied to every
/// monetary intermediate, not just the final figures.
fn money(x: Decimal) -> Decimal {
    let mut amount = x.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // pin the scale so exact quotients like 292.5 still read as 292.50
    amount.rescale(2);
    amount
}

fn split(total: Decimal) -> (Decimal, Decimal) {
    let platform_cut = money(total * PLATFORM_CUT_RATE);
    let provider_earning = money(total - platform_cut);
    (platform_cut, provider_earning)
}

fn breakdown(total: Decimal) -> FareBreakdown {
    let (platform_cut, provider_earning) = split(total);
    FareBreakdown {
        total,
        platform_cut,
        provider_earning,
        included_miles: None,
        extra_miles: None,
        extra_cost: None,
        discount_applied: None,
        billed_minutes: None,
    }
}

/// Computes the fare for a service. Pure and side-effect free, so it can
/// also quote a price before any job exists.
pub fn quote(
    service: ServiceType,
    trip_miles: f64,
    ctx: &QuoteContext,
) -> Result<FareBreakdown, AppError> {
    if !trip_miles.is_finite() || trip_miles < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "trip miles must be non-negative, got {trip_miles}"
        )));
    }
    let miles = Decimal::try_from(trip_miles).map_err(|err| {
        AppError::InvalidInput(format!("unrepresentable trip miles {trip_miles}: {err}"))
    })?;

    let fare = match rate_rule(service) {
        RateRule::Metered {
            base,
            included_miles,
            per_mile,
        } => {
            let extra_miles = (miles - included_miles).max(Decimal::ZERO);
            let extra_cost = money(extra_miles * per_mile);
            let total = money(base + extra_cost);
            FareBreakdown {
                included_miles: Some(included_miles),
                extra_miles: Some(extra_miles),
                extra_cost: Some(extra_cost),
                ..breakdown(total)
            }
        }
        RateRule::Flat { amount } => breakdown(money(amount)),
        RateRule::FlatDiscounted {
            amount,
            discount,
            max_trip_miles,
        } => {
            let applied = if miles <= max_trip_miles {
                discount
            } else {
                Decimal::ZERO
            };
            let total = money(amount * (Decimal::ONE - applied));
            FareBreakdown {
                discount_applied: Some(applied),
                ..breakdown(total)
            }
        }
        RateRule::Hourly { rate } => {
            let minutes = ctx.winch_minutes.ok_or_else(|| {
                AppError::InvalidInput("winch-out pricing requires elapsed minutes".to_string())
            })?;
            let total = money(rate * Decimal::from(minutes) / dec!(60));
            FareBreakdown {
                billed_minutes: Some(minutes),
                ..breakdown(total)
            }
        }
    };

    Ok(fare)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{quote, QuoteContext, PLATFORM_CUT_RATE};
    use crate::error::AppError;
    use crate::models::job::ServiceType;

    const ALL_SERVICES: [ServiceType; 10] = [
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

    fn no_ctx() -> QuoteContext {
        QuoteContext::default()
    }

    fn minutes(m: u32) -> QuoteContext {
        QuoteContext {
            winch_minutes: Some(m),
        }
    }

    #[test]
    fn regular_tow_ten_miles() {
        let fare = quote(ServiceType::RegularTow, 10.0, &no_ctx()).unwrap();
        assert_eq!(fare.total, dec!(120.00));
        assert_eq!(fare.platform_cut, dec!(24.00));
        assert_eq!(fare.provider_earning, dec!(96.00));
        assert_eq!(fare.extra_miles, Some(dec!(3)));
        assert_eq!(fare.extra_cost, Some(dec!(15.00)));
        assert_eq!(fare.included_miles, Some(dec!(7)));
    }

    #[test]
    fn regular_tow_within_allowance_charges_base_only() {
        let fare = quote(ServiceType::RegularTow, 5.0, &no_ctx()).unwrap();
        assert_eq!(fare.total, dec!(105.00));
        assert_eq!(fare.platform_cut, dec!(21.00));
        assert_eq!(fare.provider_earning, dec!(84.00));
        assert_eq!(fare.extra_miles, Some(Decimal::ZERO));
    }

    #[test]
    fn accident_tow_allowance_is_twenty_one_miles() {
        let at_allowance = quote(ServiceType::AccidentTow, 21.0, &no_ctx()).unwrap();
        assert_eq!(at_allowance.total, dec!(295.00));

        let beyond = quote(ServiceType::AccidentTow, 25.0, &no_ctx()).unwrap();
        assert_eq!(beyond.total, dec!(315.00));
        assert_eq!(beyond.extra_cost, Some(dec!(20.00)));
    }

    #[test]
    fn motorcycle_tow_bills_four_per_extra_mile() {
        let fare = quote(ServiceType::MotorcycleTow, 10.0, &no_ctx()).unwrap();
        assert_eq!(fare.total, dec!(197.00));
        assert_eq!(fare.platform_cut, dec!(39.40));
        assert_eq!(fare.provider_earning, dec!(157.60));
    }

    #[test]
    fn flat_tire_rates_by_vehicle_size() {
        let expected = [
            (ServiceType::FlatTireSedan, dec!(75.00)),
            (ServiceType::FlatTireTruck, dec!(85.00)),
            (ServiceType::FlatTireDually, dec!(125.00)),
            (ServiceType::FlatTireSemiRv, dec!(220.00)),
        ];
        for (service, total) in expected {
            let fare = quote(service, 40.0, &no_ctx()).unwrap();
            assert_eq!(fare.total, total, "{service:?}");
            assert_eq!(fare.extra_miles, None, "{service:?} has no distance component");
        }

        let dually = quote(ServiceType::FlatTireDually, 0.0, &no_ctx()).unwrap();
        assert_eq!(dually.platform_cut, dec!(25.00));
        assert_eq!(dually.provider_earning, dec!(100.00));
    }

    #[test]
    fn jumpstart_short_trip_discount() {
        let discounted = quote(ServiceType::Jumpstart, 5.0, &no_ctx()).unwrap();
        assert_eq!(discounted.total, dec!(58.50));
        assert_eq!(discounted.platform_cut, dec!(11.70));
        assert_eq!(discounted.provider_earning, dec!(46.80));
        assert_eq!(discounted.discount_applied, Some(dec!(0.10)));

        let full_price = quote(ServiceType::Jumpstart, 5.1, &no_ctx()).unwrap();
        assert_eq!(full_price.total, dec!(65.00));
        assert_eq!(full_price.discount_applied, Some(Decimal::ZERO));
    }

    #[test]
    fn lockout_short_trip_discount() {
        let fare = quote(ServiceType::Lockout, 3.0, &no_ctx()).unwrap();
        assert_eq!(fare.total, dec!(67.50));
        assert_eq!(fare.platform_cut, dec!(13.50));
        assert_eq!(fare.provider_earning, dec!(54.00));
    }

    #[test]
    fn winch_out_bills_by_elapsed_minutes() {
        let ninety = quote(ServiceType::WinchOut, 0.0, &minutes(90)).unwrap();
        assert_eq!(ninety.total, dec!(292.50));
        assert_eq!(ninety.platform_cut, dec!(58.50));
        assert_eq!(ninety.provider_earning, dec!(234.00));
        assert_eq!(ninety.billed_minutes, Some(90));

        let three_quarters = quote(ServiceType::WinchOut, 0.0, &minutes(45)).unwrap();
        assert_eq!(three_quarters.total, dec!(146.25));
        assert_eq!(three_quarters.platform_cut, dec!(29.25));
        assert_eq!(three_quarters.provider_earning, dec!(117.00));
    }

    #[test]
    fn winch_out_without_minutes_is_invalid() {
        let err = quote(ServiceType::WinchOut, 0.0, &no_ctx()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn negative_miles_rejected() {
        let err = quote(ServiceType::RegularTow, -1.0, &no_ctx()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn split_invariant_holds_for_every_service_type() {
        for service in ALL_SERVICES {
            for miles in [0.0, 3.0, 5.0, 8.5, 22.0] {
                let fare = quote(service, miles, &minutes(45)).unwrap();
                assert_eq!(
                    fare.platform_cut + fare.provider_earning,
                    fare.total,
                    "{service:?} at {miles} miles"
                );
                let expected_cut = (fare.total * PLATFORM_CUT_RATE)
                    .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
                assert_eq!(fare.platform_cut, expected_cut, "{service:?} at {miles} miles");
                assert!(fare.total >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn metered_fares_are_monotonic_in_distance() {
        for service in [
            ServiceType::RegularTow,
            ServiceType::AccidentTow,
            ServiceType::MotorcycleTow,
        ] {
            let mut previous = Decimal::ZERO;
            for miles in 0..=40 {
                let fare = quote(service, f64::from(miles), &no_ctx()).unwrap();
                assert!(
                    fare.total >= previous,
                    "{service:?} decreased at {miles} miles"
                );
                previous = fare.total;
            }
        }
    }
}
