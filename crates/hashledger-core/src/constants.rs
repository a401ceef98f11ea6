pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const DEFAULT_MINING_REWARD: i64 = 100;
pub const DEFAULT_CURRENCY_SYMBOL: &str = "LGR";
/// System account that funds rewards and airdrops. Exempt from the balance check.
pub const BANK_ADDRESS: &str = "bank";
/// Nonces handed to each rayon task per round of the parallel search.
pub const NONCES_PER_CHUNK: u64 = 4096;
