//! The chain of mined blocks together with its pending-transaction pool.

use crate::block::Block;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::pow::MiningLimits;
use crate::transaction::Transaction;
use crate::validation::{validate_chain, ChainViolation};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Account balance. Wider than an amount so replaying any number of `i64`
/// transfers cannot overflow.
pub type Balance = i128;

/// Append-only ledger. Balances are never cached: every query replays the chain.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    difficulty: u32,
    pending_transactions: Vec<Transaction>,
    mining_reward: i64,
    currency_symbol: String,
    bank_address: String,
    limits: MiningLimits,
}

impl Ledger {
    /// Validates `config` and mines the genesis block.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        Self::build(config, None)
    }

    pub fn with_difficulty(difficulty: u32) -> Result<Self> {
        Self::new(LedgerConfig::with_difficulty(difficulty))
    }

    /// Like [`Ledger::new`], but every search (genesis included) stops once `cancel` is raised.
    pub fn new_cancellable(config: LedgerConfig, cancel: Arc<AtomicBool>) -> Result<Self> {
        Self::build(config, Some(cancel))
    }

    fn build(config: LedgerConfig, cancel: Option<Arc<AtomicBool>>) -> Result<Self> {
        config.validate()?;
        let limits = MiningLimits {
            max_attempts: config.max_mining_attempts,
            cancel,
            parallel: config.parallel_mining,
        };
        let mut genesis = Self::create_genesis_block(config.difficulty);
        genesis.mine_with(config.difficulty, &limits)?;
        info!(
            "Genesis block mined at difficulty {} with hash {}",
            config.difficulty,
            genesis.hash()
        );
        Ok(Self {
            chain: vec![genesis],
            difficulty: config.difficulty,
            pending_transactions: Vec::new(),
            mining_reward: config.mining_reward,
            currency_symbol: config.currency_symbol,
            bank_address: config.bank_address,
            limits,
        })
    }

    /// Empty, unmined first block whose `prev_hash` is the SHA-256 of the difficulty.
    pub fn create_genesis_block(difficulty: u32) -> Block {
        let seed = hex::encode(Sha256::digest(difficulty.to_string().as_bytes()));
        Block::new(Vec::new(), None, Some(seed))
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn size(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn mining_reward(&self) -> i64 {
        self.mining_reward
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    pub fn bank_address(&self) -> &str {
        &self.bank_address
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn last_block(&self) -> &Block {
        // genesis is always present
        &self.chain[self.chain.len() - 1]
    }

    /// Negative indices count back from the tip (`-1` is the last block).
    pub fn get_block(&self, index: i64) -> Result<&Block> {
        let i = self.resolve_index(index)?;
        Ok(&self.chain[i])
    }

    /// Raw access to a stored block. Edits made through it are not re-mined, so
    /// [`Ledger::is_valid`] reports them.
    pub fn block_mut(&mut self, index: i64) -> Result<&mut Block> {
        let i = self.resolve_index(index)?;
        Ok(&mut self.chain[i])
    }

    fn resolve_index(&self, index: i64) -> Result<usize> {
        let len = self.chain.len();
        let resolved = if index < 0 { len as i64 + index } else { index };
        if resolved < 0 || resolved >= len as i64 {
            return Err(LedgerError::IndexOutOfBounds { index, len });
        }
        Ok(resolved as usize)
    }

    /// Queue a transfer for the next block.
    ///
    /// Rejects negative amounts and, except for the bank, senders whose mined
    /// balance is below `amount`. Pending debits are not taken into account.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<()> {
        if transaction.amount() < 0 {
            warn!(
                "Rejected transaction {} -> {}: negative amount {}",
                transaction.from(),
                transaction.to(),
                transaction.amount()
            );
            return Err(LedgerError::InvalidTransaction {
                amount: transaction.amount(),
            });
        }
        if transaction.from() != self.bank_address {
            let balance = self.get_balance_of_address(transaction.from());
            if balance < Balance::from(transaction.amount()) {
                warn!(
                    "Rejected transaction {} -> {}: balance {} below {}",
                    transaction.from(),
                    transaction.to(),
                    balance,
                    transaction.amount()
                );
                return Err(LedgerError::InsufficientFunds {
                    address: transaction.from().to_string(),
                    balance,
                    requested: transaction.amount(),
                });
            }
        }
        debug!(
            "Queued transaction {} -> {} ({})",
            transaction.from(),
            transaction.to(),
            self.format_amount(transaction.amount().into())
        );
        self.pending_transactions.push(transaction);
        Ok(())
    }

    /// Mine the whole pending pool into one block, then leave a single reward
    /// transaction for `reward_address` in the pool. The reward lands in the
    /// next mined block, not this one.
    pub fn mine_pending_transactions(&mut self, reward_address: &str) -> Result<&Block> {
        let block = Block::new(
            self.pending_transactions.clone(),
            None,
            Some(self.last_block().hash().to_string()),
        );
        self.mine_and_append(block)?;
        self.pending_transactions = vec![Transaction::new(
            self.bank_address.clone(),
            reward_address,
            self.mining_reward,
        )];
        Ok(self.last_block())
    }

    /// Airdrop `amount` from the bank to each address and mine it straight away.
    /// The reward for that block goes to the bank and waits in the pool.
    pub fn welcome<S: AsRef<str>>(&mut self, addresses: &[S], amount: i64) -> Result<()> {
        let queued = self.pending_transactions.len();
        let result = self.airdrop(addresses, amount);
        if result.is_err() {
            self.pending_transactions.truncate(queued);
        }
        result
    }

    fn airdrop<S: AsRef<str>>(&mut self, addresses: &[S], amount: i64) -> Result<()> {
        let bank = self.bank_address.clone();
        for address in addresses {
            self.add_transaction(Transaction::new(bank.clone(), address.as_ref(), amount))?;
        }
        self.mine_pending_transactions(&bank)?;
        Ok(())
    }

    /// Append a mined block holding `transactions` directly, bypassing the pool
    /// and the balance check. No reward is issued.
    pub fn add(
        &mut self,
        transactions: Vec<Transaction>,
        timestamp: Option<u64>,
    ) -> Result<&Block> {
        if let Some(tx) = transactions.iter().find(|tx| tx.amount() < 0) {
            return Err(LedgerError::InvalidTransaction {
                amount: tx.amount(),
            });
        }
        let block = Block::new(
            transactions,
            timestamp,
            Some(self.last_block().hash().to_string()),
        );
        self.mine_and_append(block)?;
        Ok(self.last_block())
    }

    /// Re-mine `block`'s batch and timestamp on top of the current tip.
    pub fn add_block(&mut self, block: &Block) -> Result<&Block> {
        self.add(block.transactions().to_vec(), Some(block.timestamp()))
    }

    /// One block per batch, in order. Amounts are checked up front; blocks mined
    /// before a mining failure stay appended.
    pub fn add_multiple<I>(&mut self, batches: I) -> Result<()>
    where
        I: IntoIterator<Item = Vec<Transaction>>,
    {
        let batches: Vec<Vec<Transaction>> = batches.into_iter().collect();
        if let Some(tx) = batches.iter().flatten().find(|tx| tx.amount() < 0) {
            return Err(LedgerError::InvalidTransaction {
                amount: tx.amount(),
            });
        }
        for batch in batches {
            self.add(batch, None)?;
        }
        Ok(())
    }

    fn mine_and_append(&mut self, mut block: Block) -> Result<()> {
        let attempts = block.mine_with(self.difficulty, &self.limits)?;
        info!(
            "Mined block {} with {} transactions, nonce {} and hash {} ({} attempts)",
            self.chain.len(),
            block.transactions().len(),
            block.nonce(),
            block.hash(),
            attempts
        );
        self.chain.push(block);
        Ok(())
    }

    /// Replays every mined transaction. The pending pool is ignored.
    pub fn get_balance_of_address(&self, address: &str) -> Balance {
        self.chain
            .iter()
            .flat_map(|block| block.transactions())
            .fold(0, |mut balance, tx| {
                if tx.from() == address {
                    balance -= Balance::from(tx.amount());
                }
                if tx.to() == address {
                    balance += Balance::from(tx.amount());
                }
                balance
            })
    }

    /// Balance of every address that appears on chain.
    pub fn balances(&self) -> BTreeMap<String, Balance> {
        let mut balances = BTreeMap::new();
        for tx in self.chain.iter().flat_map(|block| block.transactions()) {
            let amount = Balance::from(tx.amount());
            *balances.entry(tx.from().to_string()).or_insert(0) -= amount;
            *balances.entry(tx.to().to_string()).or_insert(0) += amount;
        }
        balances
    }

    /// First integrity violation, if any.
    pub fn validate(&self) -> std::result::Result<(), ChainViolation> {
        validate_chain(&self.chain, self.difficulty)
    }

    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(violation) => {
                warn!("Chain failed validation: {violation}");
                false
            }
        }
    }

    pub fn format_amount(&self, amount: Balance) -> String {
        format!("{amount} {}", self.currency_symbol)
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockchain(chain=[")?;
        for (i, block) in self.chain.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{block}")?;
        }
        write!(f, "], difficulty={})", self.difficulty)
    }
}
