//! Credit lifecycle controller.
//!
//! Drives a credit record through
//! `Requested -> Approved -> GoodStanding <-> Delayed -> Closed | Defaulted`
//! and keeps pool liquidity in step with it.
//!
//! Every mutating operation follows the same shape: authorize the caller,
//! take the borrower's lock, compute the next record and pool state on
//! copies, settle the token transfers as one batch, and only then commit.
//! A rejected operation leaves the store, the pool and the ledger untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::credit::billing::{bill_period, refresh_due_info};
use crate::credit::{
    due_breakdown, next_payment, CreditRecord, CreditState, CreditType, DueBreakdown,
    PaymentAllocation,
};
use crate::error::CreditPoolError;
use crate::fees::{FeeSchedule, FixedPaymentTable};
use crate::pool::auth::AuthorizationPolicy;
use crate::pool::config::{PoolConfig, ProtocolConfig};
use crate::pool::events::{CreditEvent, EventSink, LenderLoss};
use crate::pool::ledger::{Account, Ledger, Receipt, Transfer};
use crate::pool::liquidity::LiquidityPool;
use crate::pool::store::CreditRecordStore;
use crate::types::{Bps, BorrowerId, Money, PrincipalId, Timestamp};
use crate::CreditPoolResult;

/// Static pool setup: who administers it and on what terms it lends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSetup {
    pub policy: AuthorizationPolicy,
    pub pool_config: PoolConfig,
    #[serde(default)]
    pub fees: FeeSchedule,
    #[serde(default)]
    pub fixed_payments: FixedPaymentTable,
}

/// External collaborators the controller consumes.
pub struct Collaborators {
    pub store: Arc<dyn CreditRecordStore>,
    pub ledger: Arc<dyn Ledger>,
    pub events: Arc<dyn EventSink>,
    pub clock: Arc<dyn Clock>,
}

/// A borrower's request for credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRequest {
    pub amount: Money,
    /// Falls back to the pool's payment interval.
    #[serde(default)]
    pub payment_interval_days: Option<u32>,
    pub num_periods: u32,
    #[serde(default)]
    pub credit_type: CreditType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownOutcome {
    pub origination_fee: Money,
    pub net_amount: Money,
    pub record: CreditRecord,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub allocation: PaymentAllocation,
    /// Part of the offered amount that was not taken.
    pub unapplied: Money,
    pub record: CreditRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultOutcome {
    pub loss: Money,
    pub lender_losses: Vec<LenderLoss>,
    pub record: CreditRecord,
}

pub struct CreditLifecycleController {
    policy: RwLock<AuthorizationPolicy>,
    pool_config: RwLock<PoolConfig>,
    protocol: RwLock<ProtocolConfig>,
    fees: RwLock<FeeSchedule>,
    fixed_payments: RwLock<FixedPaymentTable>,
    liquidity: Mutex<LiquidityPool>,
    borrower_locks: Mutex<HashMap<BorrowerId, Arc<Mutex<()>>>>,
    store: Arc<dyn CreditRecordStore>,
    ledger: Arc<dyn Ledger>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

fn poisoned(what: &str) -> CreditPoolError {
    CreditPoolError::StorageError(format!("{what} lock poisoned"))
}

fn invalid_state(action: &str, state: CreditState) -> CreditPoolError {
    CreditPoolError::InvalidState {
        action: action.into(),
        state: state.to_string(),
    }
}

impl CreditLifecycleController {
    pub fn new(setup: PoolSetup, parts: Collaborators) -> CreditPoolResult<Self> {
        setup.pool_config.validate()?;
        setup.fees.validate()?;
        Ok(Self {
            policy: RwLock::new(setup.policy),
            pool_config: RwLock::new(setup.pool_config),
            protocol: RwLock::new(ProtocolConfig::default()),
            fees: RwLock::new(setup.fees),
            fixed_payments: RwLock::new(setup.fixed_payments),
            liquidity: Mutex::new(LiquidityPool::new()),
            borrower_locks: Mutex::new(HashMap::new()),
            store: parts.store,
            ledger: parts.ledger,
            events: parts.events,
            clock: parts.clock,
        })
    }

    // -----------------------------------------------------------------------
    // Borrower lifecycle
    // -----------------------------------------------------------------------

    pub fn request_credit(
        &self,
        caller: &str,
        borrower: &str,
        request: &CreditRequest,
    ) -> CreditPoolResult<CreditRecord> {
        self.policy()?.require_borrower(caller, borrower)?;
        let cfg = self.pool_config()?;
        self.check_open(&cfg)?;
        cfg.check_amount(request.amount)?;

        let interval = request
            .payment_interval_days
            .unwrap_or(cfg.payment_interval_days);
        if interval == 0 {
            return Err(CreditPoolError::InvalidInput {
                field: "payment_interval_days".into(),
                reason: "Payment interval must be at least 1 day".into(),
            });
        }
        if request.num_periods == 0 {
            return Err(CreditPoolError::InvalidInput {
                field: "num_periods".into(),
                reason: "At least one period is required".into(),
            });
        }

        let lock = self.borrower_lock(borrower)?;
        let _guard = lock.lock().map_err(|_| poisoned("borrower"))?;

        if let Some(existing) = self.store.get(borrower)? {
            if !existing.state.is_available_for_request() {
                return Err(invalid_state("request_credit", existing.state));
            }
        }

        let record = CreditRecord::requested(
            borrower,
            request.amount,
            cfg.apr_bps,
            interval,
            request.num_periods,
            request.credit_type,
        );
        self.store.put(record.clone())?;

        info!(
            "credit requested: borrower={} amount={} periods={} interval={}d",
            borrower, request.amount, request.num_periods, interval
        );
        self.events.emit(CreditEvent::CreditRequested {
            borrower: borrower.to_string(),
            credit_limit: request.amount,
            payment_interval_days: interval,
            num_periods: request.num_periods,
        });
        Ok(record)
    }

    pub fn approve_credit(&self, caller: &str, borrower: &str) -> CreditPoolResult<CreditRecord> {
        self.policy()?.require_approver(caller)?;
        let cfg = self.pool_config()?;
        self.check_open(&cfg)?;

        let lock = self.record_lock(borrower)?;
        let _guard = lock.lock().map_err(|_| poisoned("borrower"))?;

        let mut record = self.load(borrower)?;
        if record.state != CreditState::Requested {
            return Err(invalid_state("approve_credit", record.state));
        }

        if record.credit_type == CreditType::FixedPayment {
            // The installment itself is priced on the drawn amount.
            let _ = self.fixed_installment(&record, record.credit_limit)?;
        }
        record.state = CreditState::Approved;
        self.store.put(record.clone())?;

        info!("credit approved: borrower={} by={}", borrower, caller);
        self.events.emit(CreditEvent::CreditApproved {
            borrower: borrower.to_string(),
            approver: caller.to_string(),
            credit_limit: record.credit_limit,
            apr_bps: record.apr_bps,
        });
        Ok(record)
    }

    /// Withdraw a request or an approval that was never drawn.
    pub fn invalidate_credit(&self, caller: &str, borrower: &str) -> CreditPoolResult<CreditRecord> {
        self.policy()?.require_approver(caller)?;

        let lock = self.record_lock(borrower)?;
        let _guard = lock.lock().map_err(|_| poisoned("borrower"))?;

        let mut record = self.load(borrower)?;
        let old_state = record.state;
        if !matches!(old_state, CreditState::Requested | CreditState::Approved) {
            return Err(invalid_state("invalidate_credit", old_state));
        }
        record.state = CreditState::Deleted;
        self.store.put(record.clone())?;

        info!("credit invalidated: borrower={} by={}", borrower, caller);
        self.events.emit(CreditEvent::CreditInvalidated {
            borrower: borrower.to_string(),
            approver: caller.to_string(),
            old_state,
        });
        Ok(record)
    }

    pub fn change_credit_limit(
        &self,
        caller: &str,
        borrower: &str,
        new_limit: Money,
    ) -> CreditPoolResult<CreditRecord> {
        self.policy()?.require_approver(caller)?;
        let cfg = self.pool_config()?;

        let lock = self.record_lock(borrower)?;
        let _guard = lock.lock().map_err(|_| poisoned("borrower"))?;

        let mut record = self.load(borrower)?;
        if matches!(
            record.state,
            CreditState::Deleted | CreditState::Closed | CreditState::Defaulted
        ) {
            return Err(invalid_state("change_credit_limit", record.state));
        }
        if new_limit < record.remaining_principal || new_limit > cfg.max_credit_line {
            return Err(CreditPoolError::AmountOutOfRange {
                amount: new_limit,
                min: record.remaining_principal,
                max: cfg.max_credit_line,
            });
        }
        let old_limit = record.credit_limit;
        record.credit_limit = new_limit;
        self.store.put(record.clone())?;

        self.events.emit(CreditEvent::CreditLimitChanged {
            borrower: borrower.to_string(),
            old_limit,
            new_limit,
        });
        Ok(record)
    }

    pub fn drawdown(
        &self,
        caller: &str,
        borrower: &str,
        amount: Money,
    ) -> CreditPoolResult<DrawdownOutcome> {
        self.policy()?.require_borrower(caller, borrower)?;
        let cfg = self.pool_config()?;
        self.check_open(&cfg)?;
        let fees = self.fees()?;

        let lock = self.record_lock(borrower)?;
        let _guard = lock.lock().map_err(|_| poisoned("borrower"))?;

        let record = self.load(borrower)?;
        if record.state != CreditState::Approved {
            return Err(CreditPoolError::CreditNotApproved(borrower.to_string()));
        }
        if amount <= Decimal::ZERO || amount > record.credit_limit {
            return Err(CreditPoolError::AmountOutOfRange {
                amount,
                min: Decimal::ZERO,
                max: record.credit_limit,
            });
        }

        let origination_fee = fees.compute_origination_fee(amount);
        if origination_fee >= amount {
            return Err(CreditPoolError::InvalidInput {
                field: "amount".into(),
                reason: format!("Origination fee {origination_fee} consumes the drawdown"),
            });
        }
        let net_amount = amount - origination_fee;
        let now = self.clock.now();

        let mut updated = record.clone();
        if updated.credit_type == CreditType::FixedPayment {
            updated.fixed_installment = self.fixed_installment(&updated, amount)?;
        }
        updated.remaining_principal = amount;
        updated.due_date = now + updated.interval_seconds();
        updated.missed_periods = 0;
        updated.last_late_fee_date = 0;
        updated.state = CreditState::GoodStanding;
        bill_period(&mut updated, &fees);

        let mut pool = self.liquidity.lock().map_err(|_| poisoned("liquidity"))?;
        let mut staged = pool.clone();
        let split = staged.record_drawdown(amount, origination_fee, cfg.protocol_fee_bps)?;

        let receipt = self.settle(&[
            Transfer::new(Account::Pool, Account::Borrower(borrower.to_string()), net_amount),
            Transfer::new(Account::Pool, Account::Treasury, split.protocol),
        ])?;

        *pool = staged;
        drop(pool);
        self.store.put(updated.clone())?;

        info!(
            "drawdown: borrower={} amount={} fee={} due={}",
            borrower, amount, origination_fee, updated.due_date
        );
        self.events.emit(CreditEvent::DrawdownMade {
            borrower: borrower.to_string(),
            amount,
            origination_fee,
            net_amount,
            due_date: updated.due_date,
        });
        self.emit_state_change(borrower, record.state, updated.state);

        Ok(DrawdownOutcome {
            origination_fee,
            net_amount,
            record: updated,
            receipt,
        })
    }

    pub fn make_payment(
        &self,
        caller: &str,
        borrower: &str,
        amount: Money,
    ) -> CreditPoolResult<PaymentOutcome> {
        self.policy()?.require_borrower(caller, borrower)?;
        let cfg = self.pool_config()?;
        self.check_open(&cfg)?;
        let fees = self.fees()?;

        let lock = self.record_lock(borrower)?;
        let _guard = lock.lock().map_err(|_| poisoned("borrower"))?;

        let record = self.load(borrower)?;
        if !record.state.is_active() {
            return Err(invalid_state("make_payment", record.state));
        }

        let now = self.clock.now();
        let mut updated = record.clone();
        let delayed_from = refresh_due_info(&mut updated, now);

        let allocation = next_payment(&updated, updated.last_late_fee_date, amount, now, &fees)?;

        if allocation.is_noop() {
            return Ok(PaymentOutcome {
                allocation,
                unapplied: amount,
                record,
                receipt: None,
            });
        }

        let old_remaining = record.remaining_principal;
        let old_due_date = record.due_date;
        let state_before_payment = updated.state;

        updated.remaining_principal -= allocation.principal_paid;
        if allocation.paid_off || updated.remaining_principal <= Decimal::ZERO {
            updated.close();
        } else {
            if allocation.is_late {
                updated.last_late_fee_date = now;
            }
            updated.due_date += updated.interval_seconds();
            updated.remaining_periods = updated.remaining_periods.saturating_sub(1);
            updated.missed_periods = 0;
            updated.state = CreditState::GoodStanding;
            bill_period(&mut updated, &fees);
        }

        let mut pool = self.liquidity.lock().map_err(|_| poisoned("liquidity"))?;
        let mut staged = pool.clone();
        let split = staged.record_payment(
            allocation.principal_paid,
            allocation.income(),
            cfg.protocol_fee_bps,
        );

        let receipt = self.settle(&[
            Transfer::new(
                Account::Borrower(borrower.to_string()),
                Account::Pool,
                allocation.total_applied(),
            ),
            Transfer::new(Account::Pool, Account::Treasury, split.protocol),
        ])?;

        *pool = staged;
        drop(pool);
        self.store.put(updated.clone())?;

        info!(
            "payment: borrower={} amount={} principal={} interest={} fees={} paid_off={}",
            borrower,
            amount,
            allocation.principal_paid,
            allocation.interest_paid,
            allocation.fees_paid,
            allocation.paid_off
        );
        self.events.emit(CreditEvent::PaymentMade {
            borrower: borrower.to_string(),
            amount,
            allocation: allocation.clone(),
            old_remaining_principal: old_remaining,
            new_remaining_principal: updated.remaining_principal,
            old_due_date,
            new_due_date: updated.due_date,
        });
        if let Some(old_state) = delayed_from {
            self.emit_state_change(borrower, old_state, state_before_payment);
        }
        self.emit_state_change(borrower, state_before_payment, updated.state);

        Ok(PaymentOutcome {
            unapplied: amount - allocation.total_applied(),
            allocation,
            record: updated,
            receipt: Some(receipt),
        })
    }

    pub fn trigger_default(&self, caller: &str, borrower: &str) -> CreditPoolResult<DefaultOutcome> {
        self.policy()?.require_approver_or_owner(caller)?;
        let cfg = self.pool_config()?;
        self.check_open(&cfg)?;

        let lock = self.record_lock(borrower)?;
        let _guard = lock.lock().map_err(|_| poisoned("borrower"))?;

        let record = self.load(borrower)?;
        if !record.state.is_active() {
            return Err(invalid_state("trigger_default", record.state));
        }

        let now = self.clock.now();
        let allowed_after = record.due_date + cfg.grace_period_seconds();
        if now <= allowed_after {
            return Err(CreditPoolError::DefaultTooEarly { now, allowed_after });
        }

        let mut updated = record.clone();
        refresh_due_info(&mut updated, now);
        let loss = updated.remaining_principal;
        updated.state = CreditState::Defaulted;

        let mut pool = self.liquidity.lock().map_err(|_| poisoned("liquidity"))?;
        let mut staged = pool.clone();
        let lender_losses: Vec<LenderLoss> = staged
            .write_off(loss)
            .into_iter()
            .map(|(lender, loss)| LenderLoss { lender, loss })
            .collect();
        *pool = staged;
        drop(pool);
        self.store.put(updated.clone())?;

        warn!(
            "default triggered: borrower={} by={} loss={} missed_periods={}",
            borrower, caller, loss, updated.missed_periods
        );
        self.events.emit(CreditEvent::DefaultTriggered {
            borrower: borrower.to_string(),
            by: caller.to_string(),
            loss,
            lender_losses: lender_losses.clone(),
        });
        self.emit_state_change(borrower, record.state, updated.state);

        Ok(DefaultOutcome {
            loss,
            lender_losses,
            record: updated,
        })
    }

    /// Bring a record's lateness up to date. Anyone may call this.
    pub fn refresh_credit(&self, borrower: &str) -> CreditPoolResult<CreditRecord> {
        let lock = self.record_lock(borrower)?;
        let _guard = lock.lock().map_err(|_| poisoned("borrower"))?;

        let mut record = self.load(borrower)?;
        let before = record.clone();
        let changed = refresh_due_info(&mut record, self.clock.now());
        if record != before {
            self.store.put(record.clone())?;
        }
        if let Some(old_state) = changed {
            self.emit_state_change(borrower, old_state, record.state);
        }
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // Liquidity providers
    // -----------------------------------------------------------------------

    pub fn deposit(&self, caller: &str, amount: Money) -> CreditPoolResult<Money> {
        let cfg = self.pool_config()?;
        self.check_open(&cfg)?;

        let mut pool = self.liquidity.lock().map_err(|_| poisoned("liquidity"))?;
        let mut staged = pool.clone();
        let new_balance = staged.deposit(caller, amount)?;
        self.settle(&[Transfer::new(
            Account::Lender(caller.to_string()),
            Account::Pool,
            amount,
        )])?;
        *pool = staged;
        drop(pool);

        self.events.emit(CreditEvent::LiquidityDeposited {
            lender: caller.to_string(),
            amount,
            new_balance,
        });
        Ok(new_balance)
    }

    pub fn withdraw(&self, caller: &str, amount: Money) -> CreditPoolResult<Money> {
        let cfg = self.pool_config()?;
        self.check_open(&cfg)?;

        let mut pool = self.liquidity.lock().map_err(|_| poisoned("liquidity"))?;
        let mut staged = pool.clone();
        let new_balance = staged.withdraw(caller, amount)?;
        self.settle(&[Transfer::new(
            Account::Pool,
            Account::Lender(caller.to_string()),
            amount,
        )])?;
        *pool = staged;
        drop(pool);

        self.events.emit(CreditEvent::LiquidityWithdrawn {
            lender: caller.to_string(),
            amount,
            new_balance,
        });
        Ok(new_balance)
    }

    // -----------------------------------------------------------------------
    // Owner configuration
    // -----------------------------------------------------------------------

    pub fn set_fees(&self, caller: &str, new_fees: FeeSchedule) -> CreditPoolResult<()> {
        self.policy()?.require_owner(caller)?;
        new_fees.validate()?;
        let mut fees = self.fees.write().map_err(|_| poisoned("fees"))?;
        let old = std::mem::replace(&mut *fees, new_fees.clone());
        drop(fees);
        info!("fees updated by {}", caller);
        self.events.emit(CreditEvent::FeesUpdated { old, new: new_fees });
        Ok(())
    }

    pub fn add_fixed_payments(
        &self,
        caller: &str,
        terms: &[u32],
        aprs: &[Bps],
        payments: &[Money],
    ) -> CreditPoolResult<()> {
        self.policy()?.require_owner(caller)?;
        let mut table = self
            .fixed_payments
            .write()
            .map_err(|_| poisoned("fixed payments"))?;
        table.add_batch_of_fixed_payments(terms, aprs, payments)
    }

    pub fn set_pool_config(&self, caller: &str, config: PoolConfig) -> CreditPoolResult<()> {
        self.policy()?.require_owner(caller)?;
        config.validate()?;
        let mut current = self.pool_config.write().map_err(|_| poisoned("pool config"))?;
        *current = config;
        Ok(())
    }

    pub fn add_approver(&self, caller: &str, approver: &str) -> CreditPoolResult<()> {
        let mut policy = self.policy.write().map_err(|_| poisoned("policy"))?;
        policy.require_owner(caller)?;
        policy.approvers.insert(approver.to_string());
        Ok(())
    }

    pub fn set_paused(&self, caller: &str, paused: bool) -> CreditPoolResult<()> {
        self.policy()?.require_owner(caller)?;
        let mut protocol = self.protocol.write().map_err(|_| poisoned("protocol"))?;
        protocol.paused = paused;
        drop(protocol);
        info!("protocol paused={} by {}", paused, caller);
        self.events.emit(CreditEvent::ProtocolPauseChanged { paused });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    pub fn credit_record(&self, borrower: &str) -> CreditPoolResult<Option<CreditRecord>> {
        self.store.get(borrower)
    }

    /// How `amount` would be allocated if paid now.
    pub fn preview_payment(&self, borrower: &str, amount: Money) -> CreditPoolResult<PaymentAllocation> {
        let mut record = self.load(borrower)?;
        let now = self.clock.now();
        refresh_due_info(&mut record, now);
        next_payment(&record, record.last_late_fee_date, amount, now, &self.fees()?)
    }

    pub fn payoff_quote(&self, borrower: &str) -> CreditPoolResult<DueBreakdown> {
        let record = self.load(borrower)?;
        let now = self.clock.now();
        Ok(due_breakdown(&record, record.last_late_fee_date, now, &self.fees()?))
    }

    pub fn liquidity(&self) -> CreditPoolResult<LiquidityPool> {
        self.liquidity
            .lock()
            .map(|p| p.clone())
            .map_err(|_| poisoned("liquidity"))
    }

    pub fn fees(&self) -> CreditPoolResult<FeeSchedule> {
        self.fees
            .read()
            .map(|f| f.clone())
            .map_err(|_| poisoned("fees"))
    }

    pub fn pool_config(&self) -> CreditPoolResult<PoolConfig> {
        self.pool_config
            .read()
            .map(|c| c.clone())
            .map_err(|_| poisoned("pool config"))
    }

    pub fn borrowers(&self) -> CreditPoolResult<Vec<PrincipalId>> {
        self.store.borrowers()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn policy(&self) -> CreditPoolResult<AuthorizationPolicy> {
        self.policy
            .read()
            .map(|p| p.clone())
            .map_err(|_| poisoned("policy"))
    }

    fn check_open(&self, cfg: &PoolConfig) -> CreditPoolResult<()> {
        let protocol = self.protocol.read().map_err(|_| poisoned("protocol"))?;
        if protocol.paused {
            return Err(CreditPoolError::ProtocolPaused);
        }
        if !cfg.enabled {
            return Err(CreditPoolError::PoolNotActive);
        }
        Ok(())
    }

    fn borrower_lock(&self, borrower: &str) -> CreditPoolResult<Arc<Mutex<()>>> {
        let mut locks: MutexGuard<'_, HashMap<BorrowerId, Arc<Mutex<()>>>> =
            self.borrower_locks.lock().map_err(|_| poisoned("borrower map"))?;
        Ok(locks
            .entry(borrower.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Lock for a borrower that already has a record, so lookups of unknown
    /// ids do not grow the lock map.
    fn record_lock(&self, borrower: &str) -> CreditPoolResult<Arc<Mutex<()>>> {
        self.load(borrower)?;
        self.borrower_lock(borrower)
    }

    fn fixed_installment(&self, record: &CreditRecord, principal: Money) -> CreditPoolResult<Money> {
        let table = self
            .fixed_payments
            .read()
            .map_err(|_| poisoned("fixed payments"))?;
        table.get_fixed_payment_amount(principal, record.apr_bps, record.remaining_periods)
    }

    fn load(&self, borrower: &str) -> CreditPoolResult<CreditRecord> {
        self.store
            .get(borrower)?
            .ok_or_else(|| CreditPoolError::CreditNotFound(borrower.to_string()))
    }

    fn settle(&self, transfers: &[Transfer]) -> CreditPoolResult<Receipt> {
        self.ledger.settle(transfers).map_err(|e| {
            warn!("settlement failed, operation rolled back: {}", e);
            e
        })
    }

    fn emit_state_change(&self, borrower: &str, old_state: CreditState, new_state: CreditState) {
        if old_state == new_state {
            return;
        }
        info!(
            "credit state: borrower={} {} -> {}",
            borrower, old_state, new_state
        );
        self.events.emit(CreditEvent::CreditStateChanged {
            borrower: borrower.to_string(),
            old_state,
            new_state,
        });
    }
}
