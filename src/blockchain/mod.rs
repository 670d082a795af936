pub mod block;
pub mod model;
pub mod pow;
pub mod transaction;
pub mod validator;

pub use block::Block;
pub use model::Blockchain;
pub use transaction::{Transaction, TransactionError};
pub use validator::{BlockRejection, ChainRejection};

/// Default Proof-of-Work difficulty (number of leading zero hex chars).
pub const DEFAULT_DIFFICULTY: u32 = 2;

/// Difficulty bounds (keep low in dev to avoid long waits)
pub const DIFF_MIN: u32 = 1;
pub const DIFF_MAX: u32 = 6;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
