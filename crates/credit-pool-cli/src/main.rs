mod commands;
mod input;
mod logger;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::fees::FeesArgs;
use commands::fixed_payment::{FixedPaymentArgs, FixedPaymentTableArgs};
use commands::payment::{NextPaymentArgs, PayoffArgs};
use commands::quote::QuoteArgs;
use commands::simulate::SimulateArgs;

/// Credit pool fee, payment allocation and lifecycle calculations
#[derive(Parser)]
#[command(
    name = "cpool",
    version,
    about = "Credit pool fee, payment allocation and lifecycle calculations",
    long_about = "A CLI for pooled-credit arithmetic with decimal precision. Computes \
                  fees, allocates payments against credit records, quotes payoffs and \
                  repayment schedules, looks up fixed-payment installments, and replays \
                  full credit lifecycles from scenario files."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log to stderr (-v lifecycle, -vv allocation detail)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Origination, late, early-payoff and minimum-principal fees
    Fees(FeesArgs),
    /// Allocate a payment against a credit record without applying it
    NextPayment(NextPaymentArgs),
    /// Amount due this period and full payoff amount of a credit record
    Payoff(PayoffArgs),
    /// Installment for a principal from a fixed-payment table
    FixedPayment(FixedPaymentArgs),
    /// Generate a fixed-payment table from the annuity formula
    FixedPaymentTable(FixedPaymentTableArgs),
    /// Quote origination cost, repayment schedule and effective APR
    Quote(QuoteArgs),
    /// Replay a credit lifecycle scenario against an in-memory pool
    Simulate(SimulateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Fees(args) => commands::fees::run_fees(args),
        Commands::NextPayment(args) => commands::payment::run_next_payment(args),
        Commands::Payoff(args) => commands::payment::run_payoff(args),
        Commands::FixedPayment(args) => commands::fixed_payment::run_fixed_payment(args),
        Commands::FixedPaymentTable(args) => commands::fixed_payment::run_fixed_payment_table(args),
        Commands::Quote(args) => commands::quote::run_quote(args),
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Version => {
            println!("cpool {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
