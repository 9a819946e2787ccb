pub mod fixed_payments;
pub mod schedule;

pub use fixed_payments::FixedPaymentTable;
pub use schedule::{quote_fees, FeeQuote, FeeQuoteInput, FeeSchedule};
