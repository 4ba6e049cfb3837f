#![deny(missing_docs)]
//! Scanner library for following jetton transfer notifications on chain.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tonfeed_node_types::BlockId;

mod backoff;
mod config;
mod decode;
mod fetch;
mod http;
mod node;
mod process;
mod store;
mod tracker;
mod types;

pub use tonfeed_format as format;
pub use tonfeed_node_types as node_types;

pub use config::{NodeConfig, ScannerConfig};
pub use decode::decode_payment_notification;
pub use http::HttpNode;
pub use node::{NodeClient, NodeError};
pub use store::{CheckpointStore, MemoryStore};
pub use tracker::ShardTracker;
pub use types::{BlockCheckpoint, PaymentNotification};

use crate::backoff::Backoff;
use crate::process::BlockProcessor;

/// Follows the master chain and runs every finalized block through the
/// payment notification pipeline.
///
/// The scanner resumes from the last committed checkpoint, or from the
/// current chain head on a first run. Master blocks are handled strictly in
/// seqno order, one at a time, and each is committed atomically together
/// with the notifications decoded out of it.
pub struct Scanner {
    /// Gateway the chain is read through.
    node: Arc<dyn NodeClient>,
    /// Sink for checkpoints and decoded notifications.
    store: Arc<dyn CheckpointStore>,
    /// Watermarks of the shard lineages seen so far.
    tracker: Arc<ShardTracker>,
    /// Per-block pipeline.
    processor: BlockProcessor,
    /// First poll delay when the next master block is not ready.
    poll_base_delay: Duration,
    /// Cap the poll delay doubles up to.
    poll_max_delay: Duration,
    /// Fixed pause between retries while resolving the starting position.
    startup_retry_delay: Duration,
}

impl Scanner {
    /// Creates a scanner over the given node and store.
    pub fn new(
        node: Arc<dyn NodeClient>,
        store: Arc<dyn CheckpointStore>,
        config: ScannerConfig,
    ) -> Self {
        let tracker = Arc::new(ShardTracker::new());
        let processor = BlockProcessor::new(
            node.clone(),
            store.clone(),
            tracker.clone(),
            config.transaction_page_size.unwrap_or(100),
        );
        Self {
            node,
            store,
            tracker,
            processor,
            poll_base_delay: Duration::from_millis(config.poll_base_delay_millis.unwrap_or(2_000)),
            poll_max_delay: Duration::from_millis(config.poll_max_delay_millis.unwrap_or(8_000)),
            startup_retry_delay: Duration::from_millis(
                config.startup_retry_delay_millis.unwrap_or(1_000),
            ),
        }
    }

    /// Scans master blocks until `cancel` fires.
    ///
    /// A block that fails to process is logged and skipped, the loop never
    /// stops on per-block errors. The only hard failure is being unable to
    /// read the stored checkpoint at startup.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        log::info!("start scanning blocks");

        let Some(start) = self.resolve_start_position(&cancel).await? else {
            return Ok(());
        };

        let mut position = start;
        let mut backoff = Backoff::new(self.poll_base_delay, self.poll_max_delay);
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }
            match self.node.lookup_block(position).await {
                Ok(master) => {
                    backoff.reset();
                    if let Err(e) = self.processor.process(master).await {
                        log::error!("failed to process master block {}, skipping: {:?}", master, e);
                    }
                    position.seqno = master.seqno + 1;
                }
                Err(e) => {
                    if e.is_not_found() {
                        log::trace!("master block {} is not produced yet", position.seqno);
                    } else {
                        log::error!("failed to lookup master block {}: {}", position.seqno, e);
                    }
                    if !self.sleep(backoff.next_delay(), &cancel).await {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Picks the master block to scan from and seeds the shard watermarks
    /// with its shard set.
    ///
    /// Every node call in here is retried at a fixed pace until it succeeds,
    /// the scanner cannot do anything useful before this completes. Returns
    /// `None` when cancelled mid-resolution.
    async fn resolve_start_position(&self, cancel: &CancellationToken) -> Result<Option<BlockId>> {
        let position = match self
            .store
            .last_checkpoint()
            .await
            .context("read last checkpoint")?
        {
            Some(checkpoint) => checkpoint.next_position(),
            None => loop {
                match self.node.get_chain_head().await {
                    Ok(head) => break head,
                    Err(e) => {
                        log::error!("failed to get chain head: {}", e);
                        if !self.sleep(self.startup_retry_delay, cancel).await {
                            return Ok(None);
                        }
                    }
                }
            },
        };

        let master = loop {
            match self.node.lookup_block(position).await {
                Ok(master) => break master,
                Err(e) => {
                    if e.is_not_found() {
                        log::debug!("master block {} is not produced yet", position.seqno);
                    } else {
                        log::error!("failed to lookup master block {}: {}", position.seqno, e);
                    }
                    if !self.sleep(self.startup_retry_delay, cancel).await {
                        return Ok(None);
                    }
                }
            }
        };

        let shards = loop {
            match self.node.get_shard_set(master).await {
                Ok(shards) => break shards,
                Err(e) => {
                    log::error!("failed to get first shards: {}", e);
                    if !self.sleep(self.startup_retry_delay, cancel).await {
                        return Ok(None);
                    }
                }
            }
        };
        for tip in &shards {
            self.tracker.seed(tip);
        }

        log::info!(
            "scanning from master block {} with {} tracked shard chains",
            master.seqno,
            shards.len()
        );
        Ok(Some(master))
    }

    /// Sleeps for `delay` unless cancelled first. Returns false on
    /// cancellation.
    async fn sleep(&self, delay: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancel.cancelled() => false,
        }
    }
}
