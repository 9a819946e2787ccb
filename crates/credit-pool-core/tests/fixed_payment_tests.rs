use credit_pool_core::credit::quote::{quote_credit, QuoteInput};
use credit_pool_core::credit::CreditType;
use credit_pool_core::fees::{FeeSchedule, FixedPaymentTable};
use credit_pool_core::{CreditPoolError, Money};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn fixed_quote(table: FixedPaymentTable, principal: Money) -> QuoteInput {
    QuoteInput {
        principal,
        apr_bps: 500,
        payment_interval_days: 30,
        num_periods: 24,
        credit_type: CreditType::FixedPayment,
        fees: FeeSchedule::default(),
        fixed_payments: table,
    }
}

#[test]
fn test_generated_table_amortizes_to_zero() {
    let table = FixedPaymentTable::generate(&[12, 24, 36], &[500, 1000]).unwrap();
    assert_eq!(table.len(), 6);

    let quote = quote_credit(&fixed_quote(table, dec!(1_000_000))).unwrap().result;
    assert_eq!(quote.schedule.len(), 24);

    let principal: Money = quote.schedule.iter().map(|p| p.principal).sum();
    assert_eq!(principal, dec!(1_000_000));
    assert_eq!(quote.schedule.last().unwrap().ending_balance, dec!(0));

    // level installment until the final period sweeps the remainder
    for p in &quote.schedule[..23] {
        assert_eq!(p.payment, dec!(43871));
    }
    assert!(quote.effective_apr > dec!(0.04) && quote.effective_apr < dec!(0.06));
}

#[test]
fn test_registered_table_lookup_by_principal() {
    let mut table = FixedPaymentTable::new();
    table
        .add_batch_of_fixed_payments(&[24], &[500], &[dec!(43871)])
        .unwrap();
    let quote = quote_credit(&fixed_quote(table, dec!(250_000))).unwrap().result;
    // 250,000 * 43,871 / 1,000,000 = 10967.75 -> 10967
    assert_eq!(quote.schedule[0].payment, dec!(10967));
}

#[test]
fn test_quote_without_price_fails() {
    let err = quote_credit(&fixed_quote(FixedPaymentTable::new(), dec!(1000))).unwrap_err();
    assert!(matches!(
        err,
        CreditPoolError::PriceNotFound {
            term_months: 24,
            apr_bps: 500
        }
    ));
}

#[test]
fn test_table_round_trips_through_json_entries() {
    let json = r#"[
        {"term_months": 24, "apr_bps": 1000, "payment": "46145"},
        {"term_months": 12, "apr_bps": 1025, "payment": "87916"}
    ]"#;
    let table: FixedPaymentTable = serde_json::from_str(json).unwrap();
    assert!(table.contains(12, 1025));
    assert_eq!(
        table.get_fixed_payment_amount(dec!(2_000_000), 1000, 24).unwrap(),
        dec!(92290)
    );
}
