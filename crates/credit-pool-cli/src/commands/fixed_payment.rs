use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use credit_pool_core::fees::FixedPaymentTable;

use crate::input;

/// Arguments for an installment lookup
#[derive(Args)]
pub struct FixedPaymentArgs {
    /// Fixed-payment table (list of term_months / apr_bps / payment entries)
    #[arg(long)]
    pub table: Option<String>,

    /// Principal, in smallest units
    #[arg(long)]
    pub principal: Decimal,

    /// APR in basis points
    #[arg(long)]
    pub apr_bps: u32,

    /// Term in months
    #[arg(long)]
    pub term_months: u32,
}

/// Arguments for table generation
#[derive(Args)]
pub struct FixedPaymentTableArgs {
    /// Terms in months, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub terms: Vec<u32>,

    /// APRs in basis points, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub aprs: Vec<u32>,
}

pub fn run_fixed_payment(args: FixedPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut warnings: Vec<String> = Vec::new();
    let table: FixedPaymentTable = match args.table {
        Some(ref path) => input::file::read_input(path)?,
        None => {
            warnings.push("No table given; installment generated from the annuity formula".into());
            FixedPaymentTable::generate(&[args.term_months], &[args.apr_bps])?
        }
    };

    let payment = table.get_fixed_payment_amount(args.principal, args.apr_bps, args.term_months)?;
    Ok(json!({
        "result": {
            "principal": args.principal.to_string(),
            "apr_bps": args.apr_bps,
            "term_months": args.term_months,
            "payment": payment.to_string(),
        },
        "warnings": warnings,
    }))
}

pub fn run_fixed_payment_table(
    args: FixedPaymentTableArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let table = FixedPaymentTable::generate(&args.terms, &args.aprs)?;
    Ok(json!({
        "result": {
            "reference_principal": credit_pool_core::fees::fixed_payments::REFERENCE_PRINCIPAL.to_string(),
            "entries": serde_json::to_value(table.entries())?,
        }
    }))
}
