#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Instant;
use tonfeed_format::{Address, CellBuilder, Coins, HashBytes, IntMsgInfo, Message, MsgInfo};
use tonfeed_node_types::{
    BlockId, ShortTxInfo, TransactionCursor, TransactionPage, TransactionRecord, BASECHAIN,
    MASTERCHAIN, SHARD_FULL,
};
use tonfeed_scanner::{
    BlockCheckpoint, CheckpointStore, MemoryStore, NodeClient, NodeError, PaymentNotification,
};

pub fn master(seqno: u32) -> BlockId {
    BlockId::new(MASTERCHAIN, SHARD_FULL, seqno)
}

pub fn shard(prefix: u64, seqno: u32) -> BlockId {
    BlockId::new(BASECHAIN, prefix, seqno)
}

pub fn sender() -> Address {
    Address::new(0, [0xab; 32])
}

/// Transaction on `owner` carrying a well formed transfer notification.
pub fn transfer_tx(owner: Address, lt: u64, amount: u128, comment: &str) -> TransactionRecord {
    notification_tx(owner, lt, amount, comment.as_bytes())
}

/// Transaction whose notification comment is not valid UTF-8, poisoning the
/// block it lands in.
pub fn poison_tx(owner: Address, lt: u64) -> TransactionRecord {
    notification_tx(owner, lt, 1, &[0xff, 0xfe])
}

/// Transaction with no inbound message at all.
pub fn plain_tx(owner: Address, lt: u64) -> TransactionRecord {
    TransactionRecord {
        account: owner,
        lt,
        hash: HashBytes::ZERO,
        in_msg: None,
    }
}

fn notification_tx(owner: Address, lt: u64, amount: u128, comment: &[u8]) -> TransactionRecord {
    let mut body = CellBuilder::new();
    body.store_u32(0x7362_d09c).unwrap();
    body.store_u64(lt).unwrap();
    body.store_coins(Coins::new(amount)).unwrap();
    body.store_address(&sender()).unwrap();
    body.store_bit(false).unwrap();
    body.store_u32(0).unwrap();
    body.store_bytes(comment).unwrap();

    TransactionRecord {
        account: owner,
        lt,
        hash: HashBytes::ZERO,
        in_msg: Some(Message {
            info: MsgInfo::Internal(IntMsgInfo {
                bounce: false,
                bounced: false,
                src: sender(),
                dest: owner,
                value: Coins::new(30_000_000),
                created_lt: lt.saturating_sub(1),
                created_at: 1_700_000_000,
            }),
            body: Some(body.build()),
        }),
    }
}

#[derive(Default)]
struct FakeState {
    masters: BTreeMap<u32, Vec<BlockId>>,
    parents: HashMap<BlockId, Vec<BlockId>>,
    transactions: HashMap<BlockId, Vec<TransactionRecord>>,
    pruned: HashSet<u64>,
    lookup_failures: HashMap<u32, u32>,
    lookups: Vec<(u32, Instant)>,
    list_calls: Vec<(BlockId, Option<u64>)>,
}

/// Scriptable in-process gateway.
///
/// Masters, shard blocks and transactions are registered up front (or while
/// a scanner is running, the state sits behind a mutex) and every lookup and
/// listing is recorded for assertions.
#[derive(Default)]
pub struct FakeNode {
    state: Mutex<FakeState>,
}

impl FakeNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a master block with the shard tips it reports.
    pub fn add_master(&self, seqno: u32, tips: Vec<BlockId>) {
        self.state.lock().unwrap().masters.insert(seqno, tips);
    }

    /// Registers a shard block with its parents and transactions.
    pub fn add_shard_block(
        &self,
        block: BlockId,
        parents: Vec<BlockId>,
        transactions: Vec<TransactionRecord>,
    ) {
        let mut state = self.state.lock().unwrap();
        state.parents.insert(block, parents);
        state.transactions.insert(block, transactions);
    }

    /// Marks a logical time as pruned: listed, but gone on full load.
    pub fn prune(&self, lt: u64) {
        self.state.lock().unwrap().pruned.insert(lt);
    }

    /// Makes the next `count` lookups of `seqno` fail with a server error.
    pub fn fail_lookups(&self, seqno: u32, count: u32) {
        self.state.lock().unwrap().lookup_failures.insert(seqno, count);
    }

    /// Every recorded lookup of `seqno`, in call order.
    pub fn lookup_times(&self, seqno: u32) -> Vec<Instant> {
        self.state
            .lock()
            .unwrap()
            .lookups
            .iter()
            .filter(|(s, _)| *s == seqno)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn lookup_count(&self, seqno: u32) -> usize {
        self.lookup_times(seqno).len()
    }

    /// Blocks whose transaction list was requested from the first page, in
    /// call order.
    pub fn listed_blocks(&self) -> Vec<BlockId> {
        self.state
            .lock()
            .unwrap()
            .list_calls
            .iter()
            .filter(|(_, cursor)| cursor.is_none())
            .map(|(block, _)| *block)
            .collect()
    }

    /// Cursors of every list call against `block`, in call order.
    pub fn list_cursors(&self, block: BlockId) -> Vec<Option<u64>> {
        self.state
            .lock()
            .unwrap()
            .list_calls
            .iter()
            .filter(|(b, _)| *b == block)
            .map(|(_, cursor)| *cursor)
            .collect()
    }
}

#[async_trait]
impl NodeClient for FakeNode {
    async fn get_chain_head(&self) -> Result<BlockId, NodeError> {
        let state = self.state.lock().unwrap();
        match state.masters.keys().next_back() {
            Some(seqno) => Ok(master(*seqno)),
            None => Err(NodeError::NotFound),
        }
    }

    async fn lookup_block(&self, id: BlockId) -> Result<BlockId, NodeError> {
        let mut state = self.state.lock().unwrap();
        state.lookups.push((id.seqno, Instant::now()));
        if let Some(left) = state.lookup_failures.get_mut(&id.seqno) {
            if *left > 0 {
                *left -= 1;
                return Err(NodeError::Rpc {
                    status: 503,
                    message: "overloaded".to_owned(),
                });
            }
        }
        if state.masters.contains_key(&id.seqno) {
            Ok(master(id.seqno))
        } else {
            Err(NodeError::NotFound)
        }
    }

    async fn get_shard_set(&self, id: BlockId) -> Result<Vec<BlockId>, NodeError> {
        let state = self.state.lock().unwrap();
        state
            .masters
            .get(&id.seqno)
            .cloned()
            .ok_or(NodeError::NotFound)
    }

    async fn get_block_parents(&self, id: BlockId) -> Result<Vec<BlockId>, NodeError> {
        let state = self.state.lock().unwrap();
        Ok(state.parents.get(&id).cloned().unwrap_or_default())
    }

    async fn list_transactions(
        &self,
        block: BlockId,
        page_size: u32,
        after: Option<TransactionCursor>,
    ) -> Result<TransactionPage, NodeError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push((block, after.map(|c| c.lt)));

        let records = state.transactions.get(&block).cloned().unwrap_or_default();
        let start = match after {
            Some(cursor) => records
                .iter()
                .position(|tx| tx.account.account == cursor.account && tx.lt == cursor.lt)
                .map(|i| i + 1)
                .unwrap_or(records.len()),
            None => 0,
        };
        let end = (start + page_size as usize).min(records.len());
        let transactions: Vec<ShortTxInfo> = records[start..end]
            .iter()
            .map(|tx| ShortTxInfo {
                account: tx.account.account,
                lt: tx.lt,
                hash: tx.hash,
            })
            .collect();
        let next = if end < records.len() {
            transactions.last().map(|tx| tx.cursor())
        } else {
            None
        };
        Ok(TransactionPage { transactions, next })
    }

    async fn get_transaction(
        &self,
        block: BlockId,
        account: &Address,
        lt: u64,
    ) -> Result<TransactionRecord, NodeError> {
        let state = self.state.lock().unwrap();
        if state.pruned.contains(&lt) {
            return Err(NodeError::NotFound);
        }
        state
            .transactions
            .get(&block)
            .and_then(|txs| {
                txs.iter()
                    .find(|tx| tx.account == *account && tx.lt == lt)
                    .cloned()
            })
            .ok_or(NodeError::NotFound)
    }
}

/// [`CheckpointStore`] wrapper recording every commit for assertions.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    commits: Mutex<Vec<(u32, usize)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seqno and notification count of every commit, in commit order.
    pub fn commits(&self) -> Vec<(u32, usize)> {
        self.commits.lock().unwrap().clone()
    }

    pub fn checkpoint_seqno(&self) -> Option<u32> {
        self.inner.checkpoint().map(|c| c.block.seqno)
    }

    pub fn comments(&self) -> Vec<String> {
        self.inner
            .notifications()
            .iter()
            .map(|n| n.comment.clone())
            .collect()
    }

    pub fn notifications(&self) -> Vec<PaymentNotification> {
        self.inner.notifications()
    }
}

#[async_trait]
impl CheckpointStore for RecordingStore {
    async fn last_checkpoint(&self) -> Result<Option<BlockCheckpoint>> {
        self.inner.last_checkpoint().await
    }

    async fn commit_block(
        &self,
        checkpoint: BlockCheckpoint,
        notifications: Vec<PaymentNotification>,
    ) -> Result<()> {
        self.commits
            .lock()
            .unwrap()
            .push((checkpoint.block.seqno, notifications.len()));
        self.inner.commit_block(checkpoint, notifications).await
    }
}

/// Seeds a store with an already committed checkpoint at `seqno`.
pub async fn seed_checkpoint(store: &dyn CheckpointStore, seqno: u32) {
    store
        .commit_block(BlockCheckpoint::from(master(seqno)), Vec::new())
        .await
        .unwrap();
}

/// Polls `check` under the paused clock until it holds.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition not reached in time");
}
