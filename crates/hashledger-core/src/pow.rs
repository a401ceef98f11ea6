use crate::block::Block;
use crate::constants::HASH_HEX_SIZE;
use crate::error::{LedgerError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// True when the first `difficulty` characters of `hash` are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let d = difficulty as usize;
    hash.len() >= d && hash.bytes().take(d).all(|b| b == b'0')
}

/// Bounds on a nonce search.
#[derive(Clone, Debug, Default)]
pub struct MiningLimits {
    pub max_attempts: Option<u64>,
    pub cancel: Option<Arc<AtomicBool>>,
    pub parallel: bool,
}

impl MiningLimits {
    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Mine `block` in place. Counts the starting hash as the first attempt.
pub fn mine(block: &mut Block, difficulty: u32, limits: &MiningLimits) -> Result<u64> {
    if difficulty as usize > HASH_HEX_SIZE {
        return Err(LedgerError::InvalidConfig(format!(
            "difficulty {difficulty} exceeds hash length {HASH_HEX_SIZE}"
        )));
    }
    if limits.parallel {
        return crate::mine::mine_parallel(block, difficulty, limits);
    }

    let mut attempts: u64 = 1;
    while !meets_difficulty(block.hash(), difficulty) {
        if limits.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(LedgerError::MiningExhausted { attempts });
        }
        if limits.is_cancelled() {
            return Err(LedgerError::MiningCancelled);
        }
        let next = block
            .nonce()
            .checked_add(1)
            .ok_or(LedgerError::MiningExhausted { attempts })?;
        block.set_nonce(next);
        attempts += 1;
    }
    Ok(attempts)
}
