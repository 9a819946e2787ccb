use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use credit_pool_core::credit::quote::{quote_credit, QuoteInput};
use credit_pool_core::credit::CreditType;
use credit_pool_core::fees::{FeeSchedule, FixedPaymentTable};

use super::read_input;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RepaymentKind {
    InterestOnly,
    FixedPayment,
}

impl From<RepaymentKind> for CreditType {
    fn from(kind: RepaymentKind) -> Self {
        match kind {
            RepaymentKind::InterestOnly => CreditType::InterestOnly,
            RepaymentKind::FixedPayment => CreditType::FixedPayment,
        }
    }
}

/// Arguments for a credit quote
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct QuoteArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal, in smallest units
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// APR in basis points
    #[arg(long)]
    pub apr_bps: Option<u32>,

    /// Days between payments
    #[arg(long, default_value_t = 30)]
    pub interval_days: u32,

    /// Number of payment periods
    #[arg(long)]
    pub periods: Option<u32>,

    /// Repayment profile
    #[arg(long, value_enum, default_value = "interest-only")]
    pub credit_type: RepaymentKind,

    /// Fee list as set on a pool (see `fees --help`)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub set_fees: Option<Vec<Decimal>>,

    /// Minimum principal billed per period, in bps
    #[arg(long, default_value_t = 0)]
    pub min_principal_rate_bps: u32,

    /// Fixed-payment table file; generated from the annuity formula if absent
    #[arg(long)]
    pub table: Option<String>,
}

pub fn run_quote(args: QuoteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let quote_input: QuoteInput = match read_input(args.input.as_deref(), "quote")? {
        Some(parsed) => parsed,
        None => {
            let apr_bps = args
                .apr_bps
                .ok_or("--apr-bps is required (or provide --input)")?;
            let num_periods = args
                .periods
                .ok_or("--periods is required (or provide --input)")?;
            let fees = match args.set_fees {
                Some(ref values) => FeeSchedule::from_set_fees_args(values)?,
                None => FeeSchedule::default(),
            }
            .with_min_principal_rate(args.min_principal_rate_bps)?;
            let credit_type = CreditType::from(args.credit_type);
            let fixed_payments = match (credit_type, args.table) {
                (CreditType::FixedPayment, Some(ref path)) => input::file::read_input(path)?,
                (CreditType::FixedPayment, None) => {
                    FixedPaymentTable::generate(&[num_periods], &[apr_bps])?
                }
                (CreditType::InterestOnly, _) => FixedPaymentTable::new(),
            };
            QuoteInput {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                apr_bps,
                payment_interval_days: args.interval_days,
                num_periods,
                credit_type,
                fees,
                fixed_payments,
            }
        }
    };

    let result = quote_credit(&quote_input)?;
    Ok(serde_json::to_value(result)?)
}
