pub mod auth;
pub mod config;
pub mod controller;
pub mod events;
pub mod ledger;
pub mod liquidity;
pub mod store;

pub use auth::AuthorizationPolicy;
pub use config::{PoolConfig, ProtocolConfig};
pub use controller::{
    Collaborators, CreditLifecycleController, CreditRequest, DefaultOutcome, DrawdownOutcome,
    PaymentOutcome, PoolSetup,
};
pub use events::{CreditEvent, EventSink, LenderLoss, RecordingEventSink};
pub use ledger::{Account, InMemoryLedger, Ledger, Receipt, Transfer};
pub use liquidity::LiquidityPool;
pub use store::{CreditRecordStore, InMemoryCreditStore};
