use thiserror::Error;

/// Failures surfaced by ledger operations. None of them leave the ledger partially updated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid transaction: amount {amount} is negative")]
    InvalidTransaction { amount: i64 },

    #[error("insufficient funds: {address} holds {balance}, needs {requested}")]
    InsufficientFunds {
        address: String,
        balance: i128,
        requested: i64,
    },

    #[error("index {index} out of bounds for chain of length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("mining gave up after {attempts} attempts")]
    MiningExhausted { attempts: u64 },

    #[error("mining cancelled")]
    MiningCancelled,

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
