//! Chat ledger: append-only message log keyed by (user, chat session).

pub mod ledger;
pub mod service;

pub use ledger::ChatLedger;
pub use service::ChatLedgerService;
