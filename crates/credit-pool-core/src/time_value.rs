use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::CreditPoolError;
use crate::types::{Money, Rate};
use crate::CreditPoolResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MIN_RATE: Decimal = dec!(-0.99);
const MAX_RATE: Decimal = dec!(100);

/// Present value of per-period `cash_flows` at `rate`, with its derivative
/// with respect to the rate. Flow `t` is discounted by `(1 + rate)^t`.
pub fn present_value(rate: Rate, cash_flows: &[Money]) -> CreditPoolResult<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return Err(CreditPoolError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut value = Decimal::ZERO;
    let mut slope = Decimal::ZERO;
    let mut discount = Decimal::ONE;
    for (t, cf) in cash_flows.iter().enumerate() {
        let term = cf / discount;
        value += term;
        slope -= Decimal::from(t as u64) * term / one_plus_r;
        discount *= one_plus_r;
    }
    Ok((value, slope))
}

/// Per-period internal rate of return by Newton-Raphson.
pub fn irr(cash_flows: &[Money], guess: Rate) -> CreditPoolResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(CreditPoolError::InvalidInput {
            field: "cash_flows".into(),
            reason: "IRR requires at least 2 cash flows".into(),
        });
    }
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    if !has_outflow || !has_inflow {
        return Err(CreditPoolError::InvalidInput {
            field: "cash_flows".into(),
            reason: "IRR requires both an outflow and an inflow".into(),
        });
    }

    let mut rate = guess;
    let mut value = Decimal::ZERO;
    for i in 0..MAX_IRR_ITERATIONS {
        let (pv, slope) = present_value(rate, cash_flows)?;
        value = pv;
        if value.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }
        if slope.is_zero() {
            return Err(CreditPoolError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: value,
            });
        }
        rate = (rate - value / slope).clamp(MIN_RATE, MAX_RATE);
    }

    Err(CreditPoolError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: value,
    })
}

/// Level installment that amortizes `principal` over `nper` periods at
/// `rate` per period. Returned as a positive amount, untruncated.
pub fn pmt(rate: Rate, nper: u32, principal: Money) -> CreditPoolResult<Money> {
    if nper == 0 {
        return Err(CreditPoolError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r.powi(i64::from(nper));
    let denominator = factor - Decimal::ONE;

    if denominator.is_zero() {
        return Err(CreditPoolError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(principal * rate * factor / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_present_value_at_zero_rate_is_sum() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let (value, slope) = present_value(Decimal::ZERO, &cfs).unwrap();
        assert_eq!(value, dec!(50));
        // -(1*50 + 2*50 + 3*50)
        assert_eq!(slope, dec!(-300));
    }

    #[test]
    fn test_irr_needs_both_signs() {
        assert!(irr(&[dec!(100), dec!(100)], dec!(0.1)).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_pmt_24_months_at_5_pct() {
        // 1M over 24 months at 5% APR: ~43,871.39 per month
        let payment = pmt(dec!(0.05) / dec!(12), 24, dec!(1_000_000)).unwrap();
        assert!((payment - dec!(43871.39)).abs() < dec!(0.05), "got {payment}");
    }

    #[test]
    fn test_pmt_zero_rate_is_straight_line() {
        let payment = pmt(Decimal::ZERO, 4, dec!(1000)).unwrap();
        assert_eq!(payment, dec!(250));
    }

    #[test]
    fn test_pmt_rejects_zero_periods() {
        assert!(pmt(dec!(0.01), 0, dec!(1000)).is_err());
    }
}
