use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Money, Timestamp};

#[derive(Debug, Error)]
pub enum CreditPoolError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid fee config: {field} is {value} bps, must not exceed 10000")]
    InvalidFeeConfig { field: String, value: u64 },

    #[error("Array size mismatch: terms={terms}, aprs={aprs}, payments={payments}")]
    ArraySizeMismatch {
        terms: usize,
        aprs: usize,
        payments: usize,
    },

    #[error("Fixed payment not found for {term_months} months at {apr_bps} bps")]
    PriceNotFound { term_months: u32, apr_bps: u32 },

    #[error("Caller {caller} is not the pool owner")]
    OwnerRequired { caller: String },

    #[error("Caller {caller} is not an approver")]
    ApproverRequired { caller: String },

    #[error("Caller {caller} cannot act for borrower {borrower}")]
    BorrowerMismatch { caller: String, borrower: String },

    #[error("No credit record for borrower {0}")]
    CreditNotFound(String),

    #[error("Credit for borrower {0} is not approved")]
    CreditNotApproved(String),

    #[error("Invalid state for {action}: credit is {state}")]
    InvalidState { action: String, state: String },

    #[error("Amount {amount} out of range [{min}, {max}]")]
    AmountOutOfRange { amount: Money, min: Money, max: Money },

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: Money, available: Money },

    #[error("Default too early: now {now}, allowed after {allowed_after}")]
    DefaultTooEarly {
        now: Timestamp,
        allowed_after: Timestamp,
    },

    #[error("Protocol is paused")]
    ProtocolPaused,

    #[error("Pool is not active")]
    PoolNotActive,

    #[error("Settlement failed: {0}")]
    SettlementFailed(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse error taxonomy used by callers that only care about the kind of
/// rejection, not its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    Configuration,
    Authorization,
    State,
    Range,
    NotFound,
    Timing,
    Paused,
    Settlement,
    Computation,
}

impl CreditPoolError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CreditPoolError::InvalidInput { .. }
            | CreditPoolError::InvalidFeeConfig { .. }
            | CreditPoolError::ArraySizeMismatch { .. } => ErrorCategory::Configuration,
            CreditPoolError::OwnerRequired { .. }
            | CreditPoolError::ApproverRequired { .. }
            | CreditPoolError::BorrowerMismatch { .. } => ErrorCategory::Authorization,
            CreditPoolError::CreditNotApproved(_) | CreditPoolError::InvalidState { .. } => {
                ErrorCategory::State
            }
            CreditPoolError::AmountOutOfRange { .. }
            | CreditPoolError::InsufficientLiquidity { .. } => ErrorCategory::Range,
            CreditPoolError::PriceNotFound { .. } | CreditPoolError::CreditNotFound(_) => {
                ErrorCategory::NotFound
            }
            CreditPoolError::DefaultTooEarly { .. } => ErrorCategory::Timing,
            CreditPoolError::ProtocolPaused | CreditPoolError::PoolNotActive => {
                ErrorCategory::Paused
            }
            CreditPoolError::SettlementFailed(_) | CreditPoolError::StorageError(_) => {
                ErrorCategory::Settlement
            }
            CreditPoolError::ConvergenceFailure { .. }
            | CreditPoolError::DivisionByZero { .. }
            | CreditPoolError::SerializationError(_) => ErrorCategory::Computation,
        }
    }
}

impl From<serde_json::Error> for CreditPoolError {
    fn from(e: serde_json::Error) -> Self {
        CreditPoolError::SerializationError(e.to_string())
    }
}
