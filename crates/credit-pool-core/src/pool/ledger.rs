//! Token settlement boundary. The controller describes the transfers an
//! operation needs and hands them to a [`Ledger`] as one batch; the batch
//! settles entirely or not at all.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CreditPoolError;
use crate::types::Money;
use crate::CreditPoolResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Account {
    Pool,
    Treasury,
    Borrower(String),
    Lender(String),
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Account::Pool => write!(f, "pool"),
            Account::Treasury => write!(f, "treasury"),
            Account::Borrower(id) => write!(f, "borrower:{id}"),
            Account::Lender(id) => write!(f, "lender:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Account,
    pub to: Account,
    pub amount: Money,
}

impl Transfer {
    pub fn new(from: Account, to: Account, amount: Money) -> Self {
        Self { from, to, amount }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: u64,
    pub transfers: Vec<Transfer>,
}

pub trait Ledger: Send + Sync {
    /// Apply every transfer or none of them.
    fn settle(&self, transfers: &[Transfer]) -> CreditPoolResult<Receipt>;
}

/// Balance-tracking ledger kept in memory. Zero-amount transfers are dropped
/// from the batch.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: Mutex<HashMap<Account, Money>>,
    next_receipt: AtomicU64,
    fail_next: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account from outside the system (funding a wallet).
    pub fn mint(&self, account: Account, amount: Money) -> CreditPoolResult<()> {
        let mut balances = self.lock()?;
        *balances.entry(account).or_insert(Decimal::ZERO) += amount;
        Ok(())
    }

    pub fn balance(&self, account: &Account) -> Money {
        self.balances
            .lock()
            .ok()
            .and_then(|b| b.get(account).copied())
            .unwrap_or(Decimal::ZERO)
    }

    /// Make the next settlement fail, as a transfer revert would.
    pub fn fail_next_settlement(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> CreditPoolResult<std::sync::MutexGuard<'_, HashMap<Account, Money>>> {
        self.balances
            .lock()
            .map_err(|_| CreditPoolError::StorageError("ledger lock poisoned".into()))
    }
}

impl Ledger for InMemoryLedger {
    fn settle(&self, transfers: &[Transfer]) -> CreditPoolResult<Receipt> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CreditPoolError::SettlementFailed(
                "transfer rejected by ledger".into(),
            ));
        }

        let mut balances = self.lock()?;
        let mut staged = balances.clone();
        let mut applied: Vec<Transfer> = Vec::with_capacity(transfers.len());

        for t in transfers {
            if t.amount < Decimal::ZERO {
                return Err(CreditPoolError::SettlementFailed(format!(
                    "negative transfer {} from {} to {}",
                    t.amount, t.from, t.to
                )));
            }
            if t.amount.is_zero() {
                continue;
            }
            let from_balance = staged.entry(t.from.clone()).or_insert(Decimal::ZERO);
            if *from_balance < t.amount {
                return Err(CreditPoolError::SettlementFailed(format!(
                    "{} holds {}, cannot send {}",
                    t.from, from_balance, t.amount
                )));
            }
            *from_balance -= t.amount;
            *staged.entry(t.to.clone()).or_insert(Decimal::ZERO) += t.amount;
            applied.push(t.clone());
        }

        *balances = staged;
        let id = self.next_receipt.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Receipt {
            id,
            transfers: applied,
        })
    }
}
