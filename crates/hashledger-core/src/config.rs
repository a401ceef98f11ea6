//! Ledger parameters, loadable from TOML.

use crate::constants::{
    BANK_ADDRESS, DEFAULT_CURRENCY_SYMBOL, DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD,
    HASH_HEX_SIZE,
};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading zero hex characters every block hash must carry.
    pub difficulty: u32,
    pub mining_reward: i64,
    /// Display only.
    pub currency_symbol: String,
    pub bank_address: String,
    /// Upper bound on nonces tried per block. `None` searches until a hash is found.
    pub max_mining_attempts: Option<u64>,
    /// Spread the nonce search over the rayon pool.
    pub parallel_mining: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            bank_address: BANK_ADDRESS.to_string(),
            max_mining_attempts: None,
            parallel_mining: false,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| LedgerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file. Missing keys fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| LedgerError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty as usize > HASH_HEX_SIZE {
            return Err(LedgerError::InvalidConfig(format!(
                "difficulty {} exceeds hash length {HASH_HEX_SIZE}",
                self.difficulty
            )));
        }
        if self.bank_address.is_empty() {
            return Err(LedgerError::InvalidConfig(
                "bank_address must not be empty".to_string(),
            ));
        }
        if self.max_mining_attempts == Some(0) {
            return Err(LedgerError::InvalidConfig(
                "max_mining_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
