use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Itemized fare for one service. `platform_cut + provider_earning` always
/// equals `total`; the optional fields carry the receipt detail for the
/// service types that have it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareBreakdown {
    pub total: Decimal,
    pub platform_cut: Decimal,
    pub provider_earning: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_miles: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_miles: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_applied: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billed_minutes: Option<u32>,
}
