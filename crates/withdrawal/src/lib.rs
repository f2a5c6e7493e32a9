//! Outbound (L2→L1) withdrawal tracking.
//!
//! Withdrawals are discovered by the [`collector::EventCollector`], given a
//! current [`client::types::OutgoingMessageState`] by the
//! [`state::MessageStateResolver`] and kept in the
//! [`ledger::PendingWithdrawalLedger`] until they are redeemed on L1. Redeemed
//! messages are remembered in the durable [`cache::ExecutionCache`].

pub mod cache;
pub mod collector;
pub mod error;
pub mod ledger;
pub mod scheduler;
pub mod state;
pub mod types;

pub use cache::ExecutionCache;
pub use collector::{Collection, EventCollector};
pub use error::{Error, Result};
pub use ledger::{LedgerEvent, PendingWithdrawalLedger, RebuildSummary};
pub use scheduler::RequestScheduler;
pub use state::MessageStateResolver;
pub use types::{AssetKind, ObservedWithdrawal, WithdrawalRecord};
