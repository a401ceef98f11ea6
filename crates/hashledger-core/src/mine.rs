use crate::block::{digest_hex, Block};
use crate::constants::NONCES_PER_CHUNK;
use crate::error::{LedgerError, Result};
use crate::pow::{meets_difficulty, MiningLimits};
use rayon::prelude::*;
use tracing::info;

/// Mines a block by searching nonces in parallel until its hash has `difficulty` leading zeros.
///
/// The search runs in rounds of `NONCES_PER_CHUNK` per rayon thread, starting at the block's
/// current nonce; limits and cancellation are checked between rounds, so the reported attempt
/// count is rounded up to whole rounds. The winning nonce is not necessarily the smallest one.
pub fn mine_parallel(block: &mut Block, difficulty: u32, limits: &MiningLimits) -> Result<u64> {
    // Only the nonce varies between attempts.
    let prefix = block.preimage_prefix();
    let round = NONCES_PER_CHUNK.saturating_mul(rayon::current_num_threads().max(1) as u64);
    let mut next = block.nonce();
    let mut attempts: u64 = 0;

    loop {
        if limits.is_cancelled() {
            return Err(LedgerError::MiningCancelled);
        }
        let mut span = round;
        if let Some(max) = limits.max_attempts {
            span = span.min(max.saturating_sub(attempts));
        }
        let end = next.saturating_add(span);

        let found = (next..end)
            .into_par_iter()
            .find_any(|nonce| meets_difficulty(&digest_hex(&prefix, *nonce), difficulty));
        attempts += end - next;

        if let Some(nonce) = found {
            block.set_nonce(nonce);
            info!(
                "Mined block with nonce {} and hash {} after ~{} attempts",
                nonce,
                block.hash(),
                attempts
            );
            return Ok(attempts);
        }
        if limits.max_attempts.is_some_and(|max| attempts >= max) || end == u64::MAX {
            return Err(LedgerError::MiningExhausted { attempts });
        }
        next = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn block() -> Block {
        Block::new(
            vec![Transaction::new("alice", "bob", 3)],
            Some(1_600_000_000_000),
            Some("00ff".into()),
        )
    }

    #[test]
    fn parallel_result_satisfies_invariants() {
        let mut b = block();
        let attempts = mine_parallel(&mut b, 3, &MiningLimits::default()).unwrap();
        assert!(attempts > 0);
        assert!(b.hash().starts_with("000"));
        assert_eq!(b.hash(), b.calculate_hash());
    }

    #[test]
    fn parallel_respects_attempt_cap() {
        let mut b = block();
        let err = mine_parallel(&mut b, 64, &MiningLimits::default().with_max_attempts(10_000))
            .unwrap_err();
        assert_eq!(err, LedgerError::MiningExhausted { attempts: 10_000 });
    }

    #[test]
    fn parallel_respects_cancel() {
        let mut b = block();
        let limits = MiningLimits::default().with_cancel(Arc::new(AtomicBool::new(true)));
        assert_eq!(
            mine_parallel(&mut b, 64, &limits),
            Err(LedgerError::MiningCancelled)
        );
    }

    #[test]
    fn pow_dispatches_to_parallel() {
        let mut b = block();
        crate::pow::mine(&mut b, 2, &MiningLimits::default().parallel(true)).unwrap();
        assert!(b.is_mined(2));
    }
}
