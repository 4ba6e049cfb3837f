use async_trait::async_trait;
use tonfeed_format::Address;
use tonfeed_node_types::{BlockId, TransactionCursor, TransactionPage, TransactionRecord};

/// Errors surfaced by node gateway operations.
///
/// `NotFound` is part of normal control flow: the requested master block may
/// simply not be produced yet, and old transactions get pruned from under
/// the scanner. Everything else is a real fault.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The node does not have the requested entity.
    #[error("not found")]
    NotFound,
    /// The node could not be reached at all.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    /// The node answered with a non-success status.
    #[error("node returned status {status}: {message}")]
    Rpc {
        /// HTTP status code of the response.
        status: u16,
        /// Error message carried in the response body.
        message: String,
    },
    /// The node answered with something that does not parse.
    #[error("malformed node response: {0}")]
    Malformed(String),
    /// A payload cell inside a response failed to decode.
    #[error("bad cell payload: {0}")]
    Format(#[from] tonfeed_format::Error),
}

impl NodeError {
    /// True for the absence of an entity, as opposed to a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NodeError::NotFound)
    }
}

/// Read interface of a block gateway.
///
/// Implementations are plain transports: one request per call, no retries
/// and no caching. The scanner owns the retry policy.
#[async_trait]
pub trait NodeClient: Send + Sync + 'static {
    /// Latest master block known to the node.
    async fn get_chain_head(&self) -> Result<BlockId, NodeError>;

    /// Resolves a position to the canonical block at that position.
    /// `NotFound` when the block has not been produced yet.
    async fn lookup_block(&self, id: BlockId) -> Result<BlockId, NodeError>;

    /// Most recent shard block of every lineage as registered by the given
    /// master block.
    async fn get_shard_set(&self, id: BlockId) -> Result<Vec<BlockId>, NodeError>;

    /// Immediate predecessors of a shard block: one for an ordinary or
    /// post-split block, two for a post-merge block.
    async fn get_block_parents(&self, id: BlockId) -> Result<Vec<BlockId>, NodeError>;

    /// One page of the transaction list of a block, starting right after the
    /// cursor.
    async fn list_transactions(
        &self,
        block: BlockId,
        page_size: u32,
        after: Option<TransactionCursor>,
    ) -> Result<TransactionPage, NodeError>;

    /// Loads a single transaction of `block` by account and logical time.
    async fn get_transaction(
        &self,
        block: BlockId,
        account: &Address,
        lt: u64,
    ) -> Result<TransactionRecord, NodeError>;
}
