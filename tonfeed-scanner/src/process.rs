use crate::decode::decode_payment_notification;
use crate::fetch::fetch_block_transactions;
use crate::node::NodeClient;
use crate::store::CheckpointStore;
use crate::tracker::ShardTracker;
use crate::types::{BlockCheckpoint, PaymentNotification};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tonfeed_node_types::{BlockId, TransactionRecord};

/// Per-master-block pipeline: discover the shard blocks the master made
/// visible, pull their transactions, decode and commit.
pub(crate) struct BlockProcessor {
    node: Arc<dyn NodeClient>,
    store: Arc<dyn CheckpointStore>,
    tracker: Arc<ShardTracker>,
    page_size: u32,
}

impl BlockProcessor {
    pub(crate) fn new(
        node: Arc<dyn NodeClient>,
        store: Arc<dyn CheckpointStore>,
        tracker: Arc<ShardTracker>,
        page_size: u32,
    ) -> Self {
        Self {
            node,
            store,
            tracker,
            page_size,
        }
    }

    /// Processes one master block end to end.
    ///
    /// Nothing is written unless every transaction of the block decoded
    /// cleanly, so a failure here leaves the store as if the block was never
    /// seen.
    pub(crate) async fn process(&self, master: BlockId) -> Result<()> {
        let started = Instant::now();

        let shard_blocks = self.discover_new_shard_blocks(master).await?;
        let transactions = self.fetch_all(shard_blocks).await?;
        let transaction_count = transactions.len();
        let notifications = decode_transactions(transactions).await?;

        self.store
            .commit_block(BlockCheckpoint::from(master), notifications)
            .await
            .context("commit block")?;

        // head seqno is decoration for lag visibility, losing it never
        // fails the block
        match self.node.get_chain_head().await {
            Ok(head) => log::info!(
                "master block {}/{} processed in {:.2}s with {} transactions",
                master.seqno,
                head.seqno,
                started.elapsed().as_secs_f64(),
                transaction_count
            ),
            Err(_) => log::info!(
                "master block {} processed in {:.2}s with {} transactions",
                master.seqno,
                started.elapsed().as_secs_f64(),
                transaction_count
            ),
        }
        Ok(())
    }

    /// Collects every shard block that became visible with `master`.
    ///
    /// The master only reports the newest block per lineage, so each
    /// reported tip is walked back through its parents until a block the
    /// tracker has already handled. Split and merge boundaries are just
    /// parent edges into other lineages here.
    async fn discover_new_shard_blocks(&self, master: BlockId) -> Result<Vec<BlockId>> {
        let reported = self
            .node
            .get_shard_set(master)
            .await
            .with_context(|| format!("get shard set of {master}"))?;

        let mut seen = HashSet::new();
        let mut queued = Vec::new();
        for tip in reported {
            let mut stack = vec![tip];
            while let Some(block) = stack.pop() {
                if !self.tracker.observe(&block) || !seen.insert(block) {
                    continue;
                }
                let parents = self
                    .node
                    .get_block_parents(block)
                    .await
                    .with_context(|| format!("get parents of {block}"))?;
                stack.extend(parents);
                queued.push(block);
            }
            self.tracker.commit(tip.lineage(), tip.seqno);
        }
        Ok(queued)
    }

    async fn fetch_all(&self, blocks: Vec<BlockId>) -> Result<Vec<TransactionRecord>> {
        let mut tasks: JoinSet<Result<Vec<TransactionRecord>>> = JoinSet::new();
        for block in blocks {
            let node = self.node.clone();
            let page_size = self.page_size;
            tasks.spawn(async move { fetch_block_transactions(node, block, page_size).await });
        }

        let mut transactions = Vec::new();
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(mut block_transactions)) => transactions.append(&mut block_transactions),
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(anyhow::Error::new(e));
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(transactions),
        }
    }
}

/// Decodes a batch of transactions concurrently.
///
/// The first hard decode failure cancels the remaining work and poisons the
/// whole batch. Staged notifications are dropped with it, the caller commits
/// nothing.
async fn decode_transactions(
    transactions: Vec<TransactionRecord>,
) -> Result<Vec<PaymentNotification>> {
    let staged = Arc::new(Mutex::new(Vec::new()));
    let cancel = CancellationToken::new();
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    for tx in transactions {
        if cancel.is_cancelled() {
            break;
        }
        let staged = staged.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            if cancel.is_cancelled() {
                return Ok(());
            }
            match decode_payment_notification(&tx) {
                Ok(Some(notification)) => {
                    staged.lock().unwrap().push(notification);
                    Ok(())
                }
                Ok(None) => Ok(()),
                Err(e) => {
                    cancel.cancel();
                    Err(e).with_context(|| format!("decode transaction {}:{}", tx.account, tx.lt))
                }
            }
        });
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(anyhow::Error::new(e));
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(std::mem::take(&mut *staged.lock().unwrap())),
    }
}
