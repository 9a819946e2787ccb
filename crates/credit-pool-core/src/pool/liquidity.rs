//! Pool-level liquidity accounting shared by every borrower: cash on hand,
//! principal lent out, and each liquidity provider's claim on the pool.
//!
//! Income and losses are distributed to providers pro-rata to their claims.
//! Shares are truncated to whole units; the truncation remainder goes to the
//! largest provider so distributions always sum exactly.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CreditPoolError;
use crate::types::{apply_bps, Bps, Money, PrincipalId};
use crate::CreditPoolResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPool {
    /// Tokens held by the pool.
    pub cash: Money,
    /// Principal currently lent to borrowers.
    pub principal_outstanding: Money,
    /// Each provider's claim on `cash + principal_outstanding`.
    pub lender_balances: BTreeMap<PrincipalId, Money>,
    /// Cumulative income routed to the protocol treasury.
    pub protocol_income: Money,
    /// Cumulative income credited to providers.
    pub pool_income: Money,
    /// Cumulative principal written off.
    pub total_losses: Money,
}

/// Split of fee or interest income between treasury and providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeSplit {
    pub protocol: Money,
    pub pool: Money,
}

pub fn split_income(income: Money, protocol_fee_bps: Bps) -> IncomeSplit {
    let protocol = apply_bps(income, protocol_fee_bps);
    IncomeSplit {
        protocol,
        pool: income - protocol,
    }
}

/// Divide `amount` across `balances` pro-rata. Providers with a zero
/// balance receive nothing.
pub fn pro_rata(amount: Money, balances: &BTreeMap<PrincipalId, Money>) -> Vec<(PrincipalId, Money)> {
    let total: Money = balances.values().copied().sum();
    if total <= Decimal::ZERO || amount.is_zero() {
        return Vec::new();
    }

    let mut shares: Vec<(PrincipalId, Money)> = balances
        .iter()
        .filter(|(_, b)| **b > Decimal::ZERO)
        .map(|(id, b)| (id.clone(), (amount * *b / total).trunc()))
        .collect();

    let distributed: Money = shares.iter().map(|(_, s)| *s).sum();
    let remainder = amount - distributed;
    if !remainder.is_zero() {
        let largest = balances
            .iter()
            .filter(|(_, b)| **b > Decimal::ZERO)
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(id, _)| id.clone());
        if let Some(largest) = largest {
            if let Some(entry) = shares.iter_mut().find(|(id, _)| *id == largest) {
                entry.1 += remainder;
            }
        }
    }

    shares
}

impl LiquidityPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_claims(&self) -> Money {
        self.lender_balances.values().copied().sum()
    }

    pub fn balance_of(&self, lender: &str) -> Money {
        self.lender_balances
            .get(lender)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn deposit(&mut self, lender: &str, amount: Money) -> CreditPoolResult<Money> {
        require_positive("amount", amount)?;
        self.cash += amount;
        let balance = self
            .lender_balances
            .entry(lender.to_string())
            .or_insert(Decimal::ZERO);
        *balance += amount;
        Ok(*balance)
    }

    pub fn withdraw(&mut self, lender: &str, amount: Money) -> CreditPoolResult<Money> {
        require_positive("amount", amount)?;
        let balance = self.balance_of(lender);
        if amount > balance {
            return Err(CreditPoolError::AmountOutOfRange {
                amount,
                min: Decimal::ZERO,
                max: balance,
            });
        }
        if amount > self.cash {
            return Err(CreditPoolError::InsufficientLiquidity {
                requested: amount,
                available: self.cash,
            });
        }
        self.cash -= amount;
        let new_balance = balance - amount;
        self.lender_balances.insert(lender.to_string(), new_balance);
        Ok(new_balance)
    }

    pub fn ensure_available(&self, amount: Money) -> CreditPoolResult<()> {
        if amount > self.cash {
            return Err(CreditPoolError::InsufficientLiquidity {
                requested: amount,
                available: self.cash,
            });
        }
        Ok(())
    }

    /// Lend `amount` of principal, of which `fee` is retained as income.
    pub fn record_drawdown(
        &mut self,
        amount: Money,
        fee: Money,
        protocol_fee_bps: Bps,
    ) -> CreditPoolResult<IncomeSplit> {
        self.ensure_available(amount)?;
        let split = split_income(fee, protocol_fee_bps);
        self.cash = self.cash - (amount - fee) - split.protocol;
        self.principal_outstanding += amount;
        self.distribute_income(split);
        Ok(split)
    }

    /// Receive a repayment of `principal` plus `income` (interest and fees).
    pub fn record_payment(
        &mut self,
        principal: Money,
        income: Money,
        protocol_fee_bps: Bps,
    ) -> IncomeSplit {
        let split = split_income(income, protocol_fee_bps);
        self.cash += principal + split.pool;
        self.principal_outstanding -= principal;
        self.distribute_income(split);
        split
    }

    /// Write off `loss` of principal against provider claims.
    pub fn write_off(&mut self, loss: Money) -> Vec<(PrincipalId, Money)> {
        let shares = pro_rata(loss, &self.lender_balances);
        for (lender, share) in &shares {
            if let Some(balance) = self.lender_balances.get_mut(lender) {
                *balance = (*balance - *share).max(Decimal::ZERO);
            }
        }
        self.principal_outstanding -= loss;
        self.total_losses += loss;
        shares
    }

    fn distribute_income(&mut self, split: IncomeSplit) {
        self.protocol_income += split.protocol;
        self.pool_income += split.pool;
        for (lender, share) in pro_rata(split.pool, &self.lender_balances) {
            if let Some(balance) = self.lender_balances.get_mut(&lender) {
                *balance += share;
            }
        }
    }
}

fn require_positive(field: &str, amount: Money) -> CreditPoolResult<()> {
    if amount <= Decimal::ZERO {
        return Err(CreditPoolError::InvalidInput {
            field: field.into(),
            reason: "Amount must be positive".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn two_lenders() -> LiquidityPool {
        let mut pool = LiquidityPool::new();
        pool.deposit("lp1", dec!(3000)).unwrap();
        pool.deposit("lp2", dec!(1000)).unwrap();
        pool
    }

    #[test]
    fn test_pro_rata_sums_exactly() {
        let mut balances = BTreeMap::new();
        balances.insert("a".to_string(), dec!(1));
        balances.insert("b".to_string(), dec!(1));
        balances.insert("c".to_string(), dec!(1));
        let shares = pro_rata(dec!(100), &balances);
        let total: Money = shares.iter().map(|(_, s)| *s).sum();
        assert_eq!(total, dec!(100));
        // remainder goes to the first of the tied largest holders
        assert_eq!(shares[0], ("a".to_string(), dec!(34)));
    }

    #[test]
    fn test_drawdown_and_payment_keep_claims_balanced() {
        let mut pool = two_lenders();
        let split = pool.record_drawdown(dec!(1000), dec!(20), 1000).unwrap();
        assert_eq!(split.protocol, dec!(2));
        assert_eq!(split.pool, dec!(18));
        assert_eq!(pool.cash, dec!(3018));
        assert_eq!(pool.principal_outstanding, dec!(1000));
        assert_eq!(pool.total_claims(), pool.cash + pool.principal_outstanding);

        pool.record_payment(dec!(100), dec!(40), 1000);
        assert_eq!(pool.principal_outstanding, dec!(900));
        assert_eq!(pool.total_claims(), pool.cash + pool.principal_outstanding);
        assert_eq!(pool.protocol_income, dec!(6));
    }

    #[test]
    fn test_write_off_is_pro_rata() {
        let mut pool = two_lenders();
        pool.record_drawdown(dec!(2000), dec!(0), 0).unwrap();
        let shares = pool.write_off(dec!(2000));
        assert_eq!(
            shares,
            vec![("lp1".to_string(), dec!(1500)), ("lp2".to_string(), dec!(500))]
        );
        assert_eq!(pool.balance_of("lp1"), dec!(1500));
        assert_eq!(pool.balance_of("lp2"), dec!(500));
        assert_eq!(pool.total_claims(), pool.cash + pool.principal_outstanding);
    }

    #[test]
    fn test_withdraw_limits() {
        let mut pool = two_lenders();
        assert!(matches!(
            pool.withdraw("lp2", dec!(1001)),
            Err(CreditPoolError::AmountOutOfRange { .. })
        ));
        pool.record_drawdown(dec!(3500), dec!(0), 0).unwrap();
        assert!(matches!(
            pool.withdraw("lp2", dec!(1000)),
            Err(CreditPoolError::InsufficientLiquidity { .. })
        ));
        assert_eq!(pool.withdraw("lp2", dec!(500)).unwrap(), dec!(500));
    }

    #[test]
    fn test_drawdown_needs_cash() {
        let mut pool = two_lenders();
        assert!(matches!(
            pool.record_drawdown(dec!(5000), dec!(0), 0),
            Err(CreditPoolError::InsufficientLiquidity { .. })
        ));
    }
}
