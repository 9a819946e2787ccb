pub mod allocation;
pub mod billing;
pub mod quote;
pub mod record;

pub use allocation::{due_breakdown, next_payment, DueBreakdown, PaymentAllocation};
pub use record::{CreditRecord, CreditState, CreditType};
