use crate::error::Result;
use crate::pow::{self, MiningLimits};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// A batch of transactions chained to its predecessor by hash.
///
/// The stored `hash` always equals [`Block::calculate_hash`] unless one of the
/// `overwrite_*` methods has been used. Serializes as
/// `{transactions, timestamp, prevHash, hash, nonce}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    transactions: Vec<Transaction>,
    timestamp: u64,
    prev_hash: String,
    hash: String,
    nonce: u64,
}

impl Block {
    /// Builds an unmined block (nonce 0) and computes its hash.
    /// `timestamp` defaults to now, `prev_hash` to the empty string.
    pub fn new(
        transactions: Vec<Transaction>,
        timestamp: Option<u64>,
        prev_hash: Option<String>,
    ) -> Self {
        let mut block = Self {
            transactions,
            timestamp: timestamp.unwrap_or_else(now_millis),
            prev_hash: prev_hash.unwrap_or_default(),
            hash: String::new(),
            nonce: 0,
        };
        block.update_hash();
        block
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn prev_hash(&self) -> &str {
        &self.prev_hash
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// SHA-256 over `timestamp ‖ json(transactions) ‖ prev_hash ‖ nonce`, hex encoded.
    pub fn calculate_hash(&self) -> String {
        digest_hex(&self.preimage_prefix(), self.nonce)
    }

    pub fn update_hash(&mut self) {
        self.hash = self.calculate_hash();
    }

    /// Searches nonces one by one until the hash has `difficulty` leading zeros.
    /// Never returns if `difficulty` exceeds the hash length; use [`Block::mine_with`]
    /// when the search has to be bounded.
    pub fn mine_block(&mut self, difficulty: u32) {
        while !pow::meets_difficulty(&self.hash, difficulty) {
            self.nonce += 1;
            self.update_hash();
        }
    }

    /// Bounded, cancellable mining. Returns the number of hashes examined.
    pub fn mine_with(&mut self, difficulty: u32, limits: &MiningLimits) -> Result<u64> {
        pow::mine(self, difficulty, limits)
    }

    pub fn is_mined(&self, difficulty: u32) -> bool {
        pow::meets_difficulty(&self.hash, difficulty)
    }

    /// Replaces the batch without touching the stored hash.
    pub fn overwrite_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }

    /// Replaces the timestamp without touching the stored hash.
    pub fn overwrite_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Replaces the predecessor link without touching the stored hash.
    pub fn overwrite_prev_hash(&mut self, prev_hash: impl Into<String>) {
        self.prev_hash = prev_hash.into();
    }

    pub(crate) fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.update_hash();
    }

    /// Every hashed field except the nonce, in hashing order.
    pub(crate) fn preimage_prefix(&self) -> Vec<u8> {
        // Vec<Transaction> only holds strings and integers, so encoding cannot fail.
        let txs = serde_json::to_vec(&self.transactions).unwrap_or_default();
        let timestamp = self.timestamp.to_string();
        let mut bytes = Vec::with_capacity(timestamp.len() + txs.len() + self.prev_hash.len() + 20);
        bytes.extend_from_slice(timestamp.as_bytes());
        bytes.extend_from_slice(&txs);
        bytes.extend_from_slice(self.prev_hash.as_bytes());
        bytes
    }
}

pub(crate) fn digest_hex(prefix: &[u8], nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prefix);
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Blocks compare by hash alone; the hash already commits to every other field.
impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Block {}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txs = serde_json::to_string(&self.transactions).map_err(|_| fmt::Error)?;
        write!(
            f,
            "Block(timestamp={}, transactions={}, prevHash={}, hash={}, nonce={})",
            self.timestamp, txs, self.prev_hash, self.hash, self.nonce
        )
    }
}
