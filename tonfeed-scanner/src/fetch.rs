use crate::node::NodeClient;
use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tonfeed_format::Address;
use tonfeed_node_types::{BlockId, TransactionRecord};

/// Loads every transaction of one shard block.
///
/// The transaction list is paged through sequentially while the full
/// transaction loads fan out as tasks. Transactions that disappear between
/// listing and loading were pruned by the node and are skipped.
pub(crate) async fn fetch_block_transactions(
    node: Arc<dyn NodeClient>,
    block: BlockId,
    page_size: u32,
) -> Result<Vec<TransactionRecord>> {
    let results = Arc::new(Mutex::new(Vec::new()));
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    let mut cursor = None;
    loop {
        let page = node
            .list_transactions(block, page_size, cursor)
            .await
            .with_context(|| format!("list transactions of block {block}"))?;

        for short in page.transactions {
            let node = node.clone();
            let results = results.clone();
            let account = Address::new(block.shard.workchain as i8, short.account);
            tasks.spawn(async move {
                match node.get_transaction(block, &account, short.lt).await {
                    Ok(tx) => {
                        results.lock().unwrap().push(tx);
                        Ok(())
                    }
                    // listed but already pruned, nothing left to decode
                    Err(e) if e.is_not_found() => Ok(()),
                    Err(e) => Err(e).with_context(|| {
                        format!("load transaction {}:{} of block {block}", account, short.lt)
                    }),
                }
            });
        }

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
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
        None => {
            let transactions = std::mem::take(&mut *results.lock().unwrap());
            Ok(transactions)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use tonfeed_format::HashBytes;
    use tonfeed_node_types::{
        ShortTxInfo, TransactionCursor, TransactionPage, BASECHAIN, SHARD_FULL,
    };

    struct PagingNode {
        lts: Vec<u64>,
        pruned: HashSet<u64>,
        fail_lt: Option<u64>,
        page_requests: Mutex<Vec<Option<u64>>>,
    }

    impl PagingNode {
        fn new(lts: Vec<u64>) -> Self {
            Self {
                lts,
                pruned: HashSet::new(),
                fail_lt: None,
                page_requests: Mutex::new(Vec::new()),
            }
        }
    }

    fn list_account() -> HashBytes {
        HashBytes::from([0x11; 32])
    }

    #[async_trait]
    impl NodeClient for PagingNode {
        async fn get_chain_head(&self) -> Result<BlockId, NodeError> {
            unimplemented!()
        }

        async fn lookup_block(&self, _id: BlockId) -> Result<BlockId, NodeError> {
            unimplemented!()
        }

        async fn get_shard_set(&self, _id: BlockId) -> Result<Vec<BlockId>, NodeError> {
            unimplemented!()
        }

        async fn get_block_parents(&self, _id: BlockId) -> Result<Vec<BlockId>, NodeError> {
            unimplemented!()
        }

        async fn list_transactions(
            &self,
            _block: BlockId,
            page_size: u32,
            after: Option<TransactionCursor>,
        ) -> Result<TransactionPage, NodeError> {
            self.page_requests
                .lock()
                .unwrap()
                .push(after.map(|cursor| cursor.lt));

            let start = match after {
                Some(cursor) => self
                    .lts
                    .iter()
                    .position(|lt| *lt == cursor.lt)
                    .map(|i| i + 1)
                    .unwrap_or(self.lts.len()),
                None => 0,
            };
            let end = (start + page_size as usize).min(self.lts.len());
            let transactions: Vec<ShortTxInfo> = self.lts[start..end]
                .iter()
                .map(|lt| ShortTxInfo {
                    account: list_account(),
                    lt: *lt,
                    hash: HashBytes::ZERO,
                })
                .collect();
            let next = if end < self.lts.len() {
                transactions.last().map(|tx| tx.cursor())
            } else {
                None
            };
            Ok(TransactionPage { transactions, next })
        }

        async fn get_transaction(
            &self,
            _block: BlockId,
            account: &Address,
            lt: u64,
        ) -> Result<TransactionRecord, NodeError> {
            if self.pruned.contains(&lt) {
                return Err(NodeError::NotFound);
            }
            if self.fail_lt == Some(lt) {
                return Err(NodeError::Rpc {
                    status: 500,
                    message: "backend hiccup".to_owned(),
                });
            }
            Ok(TransactionRecord {
                account: *account,
                lt,
                hash: HashBytes::ZERO,
                in_msg: None,
            })
        }
    }

    fn block() -> BlockId {
        BlockId::new(BASECHAIN, SHARD_FULL, 5)
    }

    #[tokio::test]
    async fn test_pages_until_exhausted() {
        let node = Arc::new(PagingNode::new((1..=250).collect()));
        let txs = fetch_block_transactions(node.clone(), block(), 100)
            .await
            .unwrap();

        assert_eq!(txs.len(), 250);
        assert_eq!(
            *node.page_requests.lock().unwrap(),
            vec![None, Some(100), Some(200)]
        );
    }

    #[tokio::test]
    async fn test_skips_pruned_transactions() {
        let mut node = PagingNode::new(vec![1, 2, 3, 4, 5]);
        node.pruned.insert(3);

        let txs = fetch_block_transactions(Arc::new(node), block(), 100)
            .await
            .unwrap();
        let mut lts: Vec<u64> = txs.iter().map(|tx| tx.lt).collect();
        lts.sort_unstable();
        assert_eq!(lts, vec![1, 2, 4, 5]);
    }

    #[tokio::test]
    async fn test_propagates_load_failure() {
        let mut node = PagingNode::new(vec![1, 2, 3]);
        node.fail_lt = Some(2);

        let err = fetch_block_transactions(Arc::new(node), block(), 100)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("load transaction"));
    }
}
