pub mod clock;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "fees")]
pub mod fees;

#[cfg(feature = "credit")]
pub mod credit;

#[cfg(feature = "pool")]
pub mod pool;

pub use error::{CreditPoolError, ErrorCategory};
pub use types::*;

/// Standard result type for all credit-pool operations
pub type CreditPoolResult<T> = Result<T, CreditPoolError>;
