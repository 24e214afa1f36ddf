// Chain-wide error type.
//
// Five kinds, matching spec §7 exactly: NotFound and Invalid are routinely
// recovered by callers (a miss during iteration, a rejected block); ChainIntegrity,
// Storage, and ExhaustedNonce are fatal and propagate.

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("invalid: {0}")]
    Invalid(&'static str),

    #[error("chain integrity error: {0}")]
    ChainIntegrity(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),

    #[error("nonce range exhausted without finding a valid hash")]
    ExhaustedNonce,
}

pub type Result<T> = std::result::Result<T, ChainError>;
