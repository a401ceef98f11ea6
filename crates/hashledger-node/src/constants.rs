pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
/// Random bytes behind each hex chain id.
pub const CHAIN_ID_BYTES: usize = 16;
/// Highest difficulty a client may ask for when creating a chain.
pub const DEFAULT_MAX_DIFFICULTY: u32 = 6;
/// Nonce budget per block when the ledger config sets none. About four times the
/// expected work at `DEFAULT_MAX_DIFFICULTY`.
pub const DEFAULT_MAX_MINING_ATTEMPTS: u64 = 1 << 26;
