use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values, in the smallest currency unit. Wraps Decimal to
/// prevent accidental f64 usage; computed amounts are kept integral.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Basis points: 1/100 of a percent, out of 10000.
pub type Bps = u32;

/// Seconds since the Unix epoch. Zero means "no active obligation".
pub type Timestamp = i64;

/// Opaque borrower identifier (address-equivalent).
pub type BorrowerId = String;

/// Opaque identifier of whoever is calling a mutating operation.
pub type PrincipalId = String;

pub const BPS_DENOMINATOR: u32 = 10_000;
pub const MAX_BPS: Bps = 10_000;
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const DAYS_PER_YEAR: u32 = 365;
pub const MONTHS_PER_YEAR: u32 = 12;

/// `trunc(base * bps / 10000)`. Rounding favours the protocol.
pub fn apply_bps(base: Money, bps: Bps) -> Money {
    (base * Decimal::from(bps) / Decimal::from(BPS_DENOMINATOR)).trunc()
}

pub fn days_to_seconds(days: u32) -> i64 {
    i64::from(days) * SECONDS_PER_DAY
}

/// Convert basis points to a decimal rate (550 -> 0.055).
pub fn bps_to_rate(bps: Bps) -> Rate {
    Decimal::from(bps) / Decimal::from(BPS_DENOMINATOR)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit_truncated_units".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apply_bps_truncates() {
        // 333 * 15 / 10000 = 0.4995 -> 0
        assert_eq!(apply_bps(dec!(333), 15), dec!(0));
        // 1_000_000 * 250 / 10000 = 25000
        assert_eq!(apply_bps(dec!(1_000_000), 250), dec!(25000));
        // 4 * 10000 / 10000 = 4
        assert_eq!(apply_bps(dec!(4), 10_000), dec!(4));
    }

    #[test]
    fn test_days_to_seconds() {
        assert_eq!(days_to_seconds(30), 2_592_000);
    }
}
