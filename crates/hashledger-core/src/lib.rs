//! Hash-chained, proof-of-work ledger held in memory.

pub mod block;
pub mod config;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod mine;
pub mod pow;
pub mod transaction;
pub mod validation;

pub use block::Block;
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::{Balance, Ledger};
pub use pow::MiningLimits;
pub use transaction::{parse_transactions, Transaction};
pub use validation::ChainViolation;
