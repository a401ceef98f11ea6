use crate::block::Block;
use crate::pow::meets_difficulty;
use std::fmt;

/// First integrity problem found while scanning a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainViolation {
    /// Stored hash differs from the hash recomputed from the block's fields.
    HashMismatch { index: usize },
    /// `prev_hash` does not point at the preceding block.
    BrokenLink { index: usize },
    /// Hash lacks the required leading zeros.
    InsufficientWork { index: usize },
}

impl ChainViolation {
    pub fn index(&self) -> usize {
        match self {
            Self::HashMismatch { index }
            | Self::BrokenLink { index }
            | Self::InsufficientWork { index } => *index,
        }
    }
}

impl fmt::Display for ChainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashMismatch { index } => write!(f, "block {index}: stored hash is stale"),
            Self::BrokenLink { index } => {
                write!(f, "block {index}: prevHash does not match block {}", index - 1)
            }
            Self::InsufficientWork { index } => {
                write!(f, "block {index}: hash misses the difficulty prefix")
            }
        }
    }
}

pub fn check_block(block: &Block, index: usize, difficulty: u32) -> Result<(), ChainViolation> {
    if !meets_difficulty(block.hash(), difficulty) {
        return Err(ChainViolation::InsufficientWork { index });
    }
    if block.hash() != block.calculate_hash() {
        return Err(ChainViolation::HashMismatch { index });
    }
    Ok(())
}

/// Scan `chain` front to back and stop at the first violation.
pub fn validate_chain(chain: &[Block], difficulty: u32) -> Result<(), ChainViolation> {
    if let Some(genesis) = chain.first() {
        check_block(genesis, 0, difficulty)?;
    }
    for (i, pair) in chain.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        let index = i + 1;
        if !meets_difficulty(prev.hash(), difficulty) {
            return Err(ChainViolation::InsufficientWork { index: i });
        }
        check_block(cur, index, difficulty)?;
        if cur.prev_hash() != prev.hash() {
            return Err(ChainViolation::BrokenLink { index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;

    fn mined_chain(len: usize, difficulty: u32) -> Vec<Block> {
        let mut chain: Vec<Block> = Vec::with_capacity(len);
        for i in 0..len {
            let prev = chain.last().map(|b| b.hash().to_string());
            let mut block = Block::new(
                vec![Transaction::new("bank", format!("user{i}"), i as i64)],
                Some(1_000 + i as u64),
                prev,
            );
            block.mine_block(difficulty);
            chain.push(block);
        }
        chain
    }

    #[test]
    fn empty_and_intact_chains_pass() {
        assert_eq!(validate_chain(&[], 2), Ok(()));
        assert_eq!(validate_chain(&mined_chain(4, 2), 2), Ok(()));
    }

    #[test]
    fn stale_hash_is_reported() {
        let mut chain = mined_chain(3, 1);
        chain[2].overwrite_timestamp(42);
        assert_eq!(
            validate_chain(&chain, 1),
            Err(ChainViolation::HashMismatch { index: 2 })
        );
    }

    #[test]
    fn broken_link_is_reported() {
        let mut chain = mined_chain(3, 1);
        let mut forged = Block::new(vec![], Some(5), Some("0000".into()));
        forged.mine_block(1);
        chain[1] = forged;
        assert_eq!(
            validate_chain(&chain, 1),
            Err(ChainViolation::BrokenLink { index: 1 })
        );
    }

    #[test]
    fn unmined_block_is_reported() {
        // Difficulty 0 leaves nonce 0; genesis hash here starts with "2f7f".
        let mut chain = mined_chain(2, 0);
        assert_eq!(
            validate_chain(&chain, 2),
            Err(ChainViolation::InsufficientWork { index: 0 })
        );
        chain.truncate(1);
        assert!(validate_chain(&chain, 0).is_ok());
    }

    #[test]
    fn tampered_genesis_is_reported() {
        let mut chain = mined_chain(1, 1);
        chain[0].overwrite_transactions(vec![]);
        assert_eq!(
            validate_chain(&chain, 1),
            Err(ChainViolation::HashMismatch { index: 0 })
        );
    }

    #[test]
    fn display_names_the_block() {
        let text = ChainViolation::BrokenLink { index: 3 }.to_string();
        assert_eq!(text, "block 3: prevHash does not match block 2");
    }
}
