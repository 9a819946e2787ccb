use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use credit_pool_core::fees::FixedPaymentTable;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_fees(input_json: String) -> NapiResult<String> {
    let input: credit_pool_core::fees::FeeQuoteInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = credit_pool_core::fees::quote_fees(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[napi]
pub fn next_payment(input_json: String) -> NapiResult<String> {
    let input: credit_pool_core::credit::quote::NextPaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        credit_pool_core::credit::quote::preview_next_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn quote_payoff(input_json: String) -> NapiResult<String> {
    let input: credit_pool_core::credit::quote::PayoffInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = credit_pool_core::credit::quote::quote_payoff(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn quote_credit(input_json: String) -> NapiResult<String> {
    let input: credit_pool_core::credit::quote::QuoteInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = credit_pool_core::credit::quote::quote_credit(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Fixed payments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct FixedPaymentLookup {
    table: FixedPaymentTable,
    principal: Decimal,
    apr_bps: u32,
    term_months: u32,
}

#[derive(Deserialize)]
struct FixedPaymentGrid {
    terms: Vec<u32>,
    aprs: Vec<u32>,
}

#[napi]
pub fn fixed_payment_amount(input_json: String) -> NapiResult<String> {
    let input: FixedPaymentLookup = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let payment = input
        .table
        .get_fixed_payment_amount(input.principal, input.apr_bps, input.term_months)
        .map_err(to_napi_error)?;
    serde_json::to_string(&payment).map_err(to_napi_error)
}

#[napi]
pub fn generate_fixed_payment_table(input_json: String) -> NapiResult<String> {
    let input: FixedPaymentGrid = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let table = FixedPaymentTable::generate(&input.terms, &input.aprs).map_err(to_napi_error)?;
    serde_json::to_string(&table).map_err(to_napi_error)
}
