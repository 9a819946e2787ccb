use std::collections::BTreeMap;
use std::sync::Arc;

use clap::Args;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use credit_pool_core::clock::{format_timestamp, parse_timestamp, Clock, FixedClock, SystemClock};
use credit_pool_core::credit::{CreditRecord, CreditType};
use credit_pool_core::fees::{FeeSchedule, FixedPaymentTable};
use credit_pool_core::pool::{
    Account, AuthorizationPolicy, Collaborators, CreditEvent, CreditLifecycleController,
    CreditRequest, InMemoryCreditStore, InMemoryLedger, LiquidityPool, PoolConfig, PoolSetup,
    RecordingEventSink,
};
use credit_pool_core::{days_to_seconds, CreditPoolError, Money};

use super::read_input;

/// Arguments for scenario replay
#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario file (YAML or JSON)
    #[arg(long)]
    pub input: Option<String>,

    /// Record failing steps and keep going instead of stopping
    #[arg(long)]
    pub continue_on_error: bool,
}

/// A pool, its participants and a timed list of actions.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// RFC 3339 start time; defaults to the wall clock.
    #[serde(default)]
    pub start: Option<String>,
    pub owner: String,
    #[serde(default)]
    pub approvers: Vec<String>,
    pub pool: PoolConfig,
    #[serde(default)]
    pub fees: FeeSchedule,
    #[serde(default)]
    pub fixed_payments: FixedPaymentTable,
    /// Opening token balances of liquidity providers.
    #[serde(default)]
    pub lenders: BTreeMap<String, Money>,
    /// Opening token balances of borrowers, for interest and fees.
    #[serde(default)]
    pub borrowers: BTreeMap<String, Money>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Deposit {
        lender: String,
        amount: Money,
    },
    Withdraw {
        lender: String,
        amount: Money,
    },
    Request {
        borrower: String,
        amount: Money,
        num_periods: u32,
        #[serde(default)]
        payment_interval_days: Option<u32>,
        #[serde(default)]
        credit_type: CreditType,
    },
    Approve {
        approver: String,
        borrower: String,
    },
    Drawdown {
        borrower: String,
        amount: Money,
    },
    Pay {
        borrower: String,
        amount: Money,
    },
    Advance {
        days: u32,
    },
    Default {
        by: String,
        borrower: String,
    },
    Refresh {
        borrower: String,
    },
}

impl Step {
    fn action(&self) -> &'static str {
        match self {
            Step::Deposit { .. } => "deposit",
            Step::Withdraw { .. } => "withdraw",
            Step::Request { .. } => "request",
            Step::Approve { .. } => "approve",
            Step::Drawdown { .. } => "drawdown",
            Step::Pay { .. } => "pay",
            Step::Advance { .. } => "advance",
            Step::Default { .. } => "default",
            Step::Refresh { .. } => "refresh",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: usize,
    pub at: String,
    pub action: String,
    pub ok: bool,
    pub detail: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub final_time: String,
    pub steps: Vec<StepResult>,
    pub records: Vec<CreditRecord>,
    pub liquidity: LiquidityPool,
    pub events: Vec<CreditEvent>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario: Scenario = read_input(args.input.as_deref(), "scenario")?
        .ok_or("--input <scenario.yaml> or stdin required for simulate")?;
    let report = run_scenario(&scenario, args.continue_on_error)?;
    Ok(serde_json::json!({ "result": serde_json::to_value(report)? }))
}

pub fn run_scenario(
    scenario: &Scenario,
    continue_on_error: bool,
) -> Result<SimulationReport, Box<dyn std::error::Error>> {
    let start = match scenario.start {
        Some(ref s) => parse_timestamp(s)?,
        None => SystemClock.now(),
    };
    let clock = Arc::new(FixedClock::new(start));
    let ledger = Arc::new(InMemoryLedger::new());
    let events = Arc::new(RecordingEventSink::new());

    let policy = scenario
        .approvers
        .iter()
        .fold(AuthorizationPolicy::new(scenario.owner.clone()), |p, a| {
            p.with_approver(a.clone())
        });
    let controller = CreditLifecycleController::new(
        PoolSetup {
            policy,
            pool_config: scenario.pool.clone(),
            fees: scenario.fees.clone(),
            fixed_payments: scenario.fixed_payments.clone(),
        },
        Collaborators {
            store: Arc::new(InMemoryCreditStore::new()),
            ledger: ledger.clone(),
            events: events.clone(),
            clock: clock.clone(),
        },
    )?;

    for (lender, amount) in &scenario.lenders {
        ledger.mint(Account::Lender(lender.clone()), *amount)?;
    }
    for (borrower, amount) in &scenario.borrowers {
        ledger.mint(Account::Borrower(borrower.clone()), *amount)?;
    }

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (i, step) in scenario.steps.iter().enumerate() {
        let at = format_timestamp(clock.now());
        match run_step(&controller, &clock, step) {
            Ok(detail) => {
                info!("step {} {} ok", i + 1, step.action());
                steps.push(StepResult {
                    step: i + 1,
                    at,
                    action: step.action().to_string(),
                    ok: true,
                    detail,
                });
            }
            Err(e) if continue_on_error => {
                warn!("step {} {} failed: {}", i + 1, step.action(), e);
                steps.push(StepResult {
                    step: i + 1,
                    at,
                    action: step.action().to_string(),
                    ok: false,
                    detail: Value::String(e.to_string()),
                });
            }
            Err(e) => {
                return Err(format!("step {} ({}) failed: {}", i + 1, step.action(), e).into());
            }
        }
    }

    let mut records = Vec::new();
    for borrower in controller.borrowers()? {
        if let Some(record) = controller.credit_record(&borrower)? {
            records.push(record);
        }
    }

    Ok(SimulationReport {
        final_time: format_timestamp(clock.now()),
        steps,
        records,
        liquidity: controller.liquidity()?,
        events: events.events(),
    })
}

fn run_step(
    controller: &CreditLifecycleController,
    clock: &FixedClock,
    step: &Step,
) -> Result<Value, CreditPoolError> {
    let detail = match step {
        Step::Deposit { lender, amount } => {
            serde_json::to_value(controller.deposit(lender, *amount)?)?
        }
        Step::Withdraw { lender, amount } => {
            serde_json::to_value(controller.withdraw(lender, *amount)?)?
        }
        Step::Request {
            borrower,
            amount,
            num_periods,
            payment_interval_days,
            credit_type,
        } => {
            let request = CreditRequest {
                amount: *amount,
                payment_interval_days: *payment_interval_days,
                num_periods: *num_periods,
                credit_type: *credit_type,
            };
            serde_json::to_value(controller.request_credit(borrower, borrower, &request)?)?
        }
        Step::Approve { approver, borrower } => {
            serde_json::to_value(controller.approve_credit(approver, borrower)?)?
        }
        Step::Drawdown { borrower, amount } => {
            serde_json::to_value(controller.drawdown(borrower, borrower, *amount)?)?
        }
        Step::Pay { borrower, amount } => {
            serde_json::to_value(controller.make_payment(borrower, borrower, *amount)?)?
        }
        Step::Advance { days } => {
            clock.advance(days_to_seconds(*days));
            Value::String(format_timestamp(clock.now()))
        }
        Step::Default { by, borrower } => {
            serde_json::to_value(controller.trigger_default(by, borrower)?)?
        }
        Step::Refresh { borrower } => serde_json::to_value(controller.refresh_credit(borrower)?)?,
    };
    Ok(detail)
}
