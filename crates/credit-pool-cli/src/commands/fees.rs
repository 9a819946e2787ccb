use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use credit_pool_core::fees::{quote_fees, FeeQuoteInput, FeeSchedule};

use super::read_input;

/// Arguments for fee computation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FeesArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal or drawdown amount, in smallest units
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Amount a late fee is charged on (defaults to principal)
    #[arg(long)]
    pub overdue_amount: Option<Decimal>,

    /// Fee list as set on a pool: origination flat, origination bps, late flat,
    /// late bps, then optionally early-payoff flat and early-payoff bps
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub set_fees: Option<Vec<Decimal>>,

    /// Minimum principal billed per period, in bps of the outstanding principal
    #[arg(long, default_value_t = 0)]
    pub min_principal_rate_bps: u32,
}

pub fn run_fees(args: FeesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fee_input: FeeQuoteInput = match read_input(args.input.as_deref(), "fees")? {
        Some(parsed) => parsed,
        None => {
            let values = args
                .set_fees
                .ok_or("--set-fees is required (or provide --input)")?;
            FeeQuoteInput {
                fees: FeeSchedule::from_set_fees_args(&values)?
                    .with_min_principal_rate(args.min_principal_rate_bps)?,
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                overdue_amount: args.overdue_amount,
            }
        }
    };

    let result = quote_fees(&fee_input)?;
    Ok(serde_json::to_value(result)?)
}
