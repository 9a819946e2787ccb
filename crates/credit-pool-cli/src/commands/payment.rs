use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use credit_pool_core::clock::parse_timestamp;
use credit_pool_core::credit::quote::{
    preview_next_payment, quote_payoff, NextPaymentInput, PayoffInput,
};

use super::read_input;

/// Arguments for payment allocation
#[derive(Args)]
pub struct NextPaymentArgs {
    /// Path to JSON/YAML file with the record, fees, amount and time
    #[arg(long)]
    pub input: Option<String>,

    /// Override the payment amount from the input
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Override the evaluation time (RFC 3339)
    #[arg(long)]
    pub at: Option<String>,
}

/// Arguments for a payoff quote
#[derive(Args)]
pub struct PayoffArgs {
    /// Path to JSON/YAML file with the record, fees and time
    #[arg(long)]
    pub input: Option<String>,

    /// Override the evaluation time (RFC 3339)
    #[arg(long)]
    pub at: Option<String>,
}

pub fn run_next_payment(args: NextPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut np_input: NextPaymentInput = read_input(args.input.as_deref(), "next-payment")?
        .ok_or("--input <file> or stdin required for payment allocation")?;
    if let Some(amount) = args.amount {
        np_input.payment_amount = amount;
    }
    if let Some(ref at) = args.at {
        np_input.now = parse_timestamp(at)?;
    }
    let result = preview_next_payment(&np_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_payoff(args: PayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut payoff_input: PayoffInput = read_input(args.input.as_deref(), "payoff")?
        .ok_or("--input <file> or stdin required for payoff quote")?;
    if let Some(ref at) = args.at {
        payoff_input.now = parse_timestamp(at)?;
    }
    let result = quote_payoff(&payoff_input)?;
    Ok(serde_json::to_value(result)?)
}
