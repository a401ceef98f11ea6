use crate::constants::{CHAIN_ID_BYTES, DEFAULT_MAX_DIFFICULTY, DEFAULT_MAX_MINING_ATTEMPTS};
use crate::error::ApiError;
use hashledger_core::{Ledger, LedgerConfig};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::info;

pub type SharedLedger = Arc<Mutex<Ledger>>;

/// Independent ledgers keyed by a random hex id. Each ledger has its own lock;
/// the map lock is only held for lookups and inserts.
pub struct ChainRegistry {
    chains: RwLock<HashMap<String, SharedLedger>>,
    defaults: LedgerConfig,
    max_difficulty: u32,
    cancel: Arc<AtomicBool>,
}

impl ChainRegistry {
    pub fn new(defaults: LedgerConfig) -> Self {
        Self::with_max_difficulty(defaults, DEFAULT_MAX_DIFFICULTY)
    }

    /// Mining on the node is always bounded: a config without an attempt cap gets
    /// `DEFAULT_MAX_MINING_ATTEMPTS`.
    pub fn with_max_difficulty(mut defaults: LedgerConfig, max_difficulty: u32) -> Self {
        if defaults.max_mining_attempts.is_none() {
            defaults.max_mining_attempts = Some(DEFAULT_MAX_MINING_ATTEMPTS);
        }
        Self {
            chains: RwLock::new(HashMap::new()),
            defaults,
            max_difficulty,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn defaults(&self) -> &LedgerConfig {
        &self.defaults
    }

    pub fn max_difficulty(&self) -> u32 {
        self.max_difficulty
    }

    /// Mines a genesis block on the calling thread; call from a blocking context.
    /// A requested difficulty is capped at `max_difficulty`; the configured default is not.
    pub fn create(&self, difficulty: Option<u32>) -> Result<String, ApiError> {
        let mut config = self.defaults.clone();
        if let Some(difficulty) = difficulty {
            if difficulty > self.max_difficulty {
                return Err(ApiError::BadRequest(format!(
                    "difficulty {difficulty} exceeds the node maximum of {}",
                    self.max_difficulty
                )));
            }
            config.difficulty = difficulty;
        }
        let ledger = Ledger::new_cancellable(config, self.cancel.clone())?;
        let id = new_chain_id();
        self.chains
            .write()
            .map_err(|_| ApiError::Internal("chain registry lock poisoned".into()))?
            .insert(id.clone(), Arc::new(Mutex::new(ledger)));
        info!("Created chain {id}");
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<SharedLedger, ApiError> {
        self.chains
            .read()
            .map_err(|_| ApiError::Internal("chain registry lock poisoned".into()))?
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::UnknownChain(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.chains.read().map(|chains| chains.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop every running and future nonce search.
    pub fn cancel_mining(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

pub fn lock(ledger: &SharedLedger) -> Result<MutexGuard<'_, Ledger>, ApiError> {
    ledger
        .lock()
        .map_err(|_| ApiError::Internal("ledger lock poisoned".into()))
}

fn new_chain_id() -> String {
    let mut bytes = [0u8; CHAIN_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ChainRegistry>,
}

impl AppState {
    pub fn new(defaults: LedgerConfig) -> Self {
        Self::with_max_difficulty(defaults, DEFAULT_MAX_DIFFICULTY)
    }

    pub fn with_max_difficulty(defaults: LedgerConfig, max_difficulty: u32) -> Self {
        Self {
            registry: Arc::new(ChainRegistry::with_max_difficulty(defaults, max_difficulty)),
        }
    }
}
