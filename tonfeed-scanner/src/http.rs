use crate::config::NodeConfig;
use crate::node::{NodeClient, NodeError};
use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tonfeed_format::Address;
use tonfeed_node_types::{BlockId, TransactionCursor, TransactionPage, TransactionRecord};
use url::Url;

/// Json transport over a block gateway http api.
///
/// Deliberately thin: one request per call and no retries, the scanner
/// drives the retry policy around it.
pub struct HttpNode {
    http_client: reqwest::Client,
    url: Url,
    bearer_token: Option<String>,
}

impl HttpNode {
    /// Creates a new gateway client from config.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let timeout = config
            .http_req_timeout_millis
            .map(|t| t.get())
            .unwrap_or(30_000);

        let user_agent = format!("tonfeed/{}", env!("CARGO_PKG_VERSION"));

        let http_client = reqwest::Client::builder()
            .no_gzip()
            .timeout(Duration::from_millis(timeout))
            .user_agent(user_agent)
            .build()
            .unwrap();

        let url = config.url.context("gateway url is required")?;
        ensure!(!url.cannot_be_a_base(), "gateway url cannot be a base");

        Ok(Self {
            http_client,
            url,
            bearer_token: config.bearer_token,
        })
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, NodeError> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| NodeError::Malformed("gateway url cannot be a base".to_owned()))?
            .extend(segments);
        Ok(url)
    }

    /// Url of a block scoped endpoint:
    /// `/block/{workchain}/{shard}/{seqno}/{tail...}`.
    fn block_url(&self, id: BlockId, tail: &[&str]) -> Result<Url, NodeError> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| NodeError::Malformed("gateway url cannot be a base".to_owned()))?
            .push("block")
            .push(&id.shard.workchain.to_string())
            .push(&format!("{:016x}", id.shard.prefix))
            .push(&id.seqno.to_string())
            .extend(tail);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, NodeError> {
        let mut req = self.http_client.get(url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(bearer_token) = &self.bearer_token {
            req = req.bearer_auth(bearer_token);
        }

        let res = req.send().await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(NodeError::NotFound);
        }
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(NodeError::Rpc {
                status: status.as_u16(),
                message,
            });
        }

        res.json()
            .await
            .map_err(|e| NodeError::Malformed(e.to_string()))
    }
}

#[derive(Deserialize)]
struct ShardSet {
    shards: Vec<BlockId>,
}

#[derive(Deserialize)]
struct ParentSet {
    parents: Vec<BlockId>,
}

#[async_trait]
impl NodeClient for HttpNode {
    async fn get_chain_head(&self) -> Result<BlockId, NodeError> {
        self.get_json(self.api_url(&["head"])?, &[]).await
    }

    async fn lookup_block(&self, id: BlockId) -> Result<BlockId, NodeError> {
        self.get_json(self.block_url(id, &[])?, &[]).await
    }

    async fn get_shard_set(&self, id: BlockId) -> Result<Vec<BlockId>, NodeError> {
        let set: ShardSet = self
            .get_json(self.block_url(id, &["shards"])?, &[])
            .await?;
        Ok(set.shards)
    }

    async fn get_block_parents(&self, id: BlockId) -> Result<Vec<BlockId>, NodeError> {
        let set: ParentSet = self
            .get_json(self.block_url(id, &["parents"])?, &[])
            .await?;
        Ok(set.parents)
    }

    async fn list_transactions(
        &self,
        block: BlockId,
        page_size: u32,
        after: Option<TransactionCursor>,
    ) -> Result<TransactionPage, NodeError> {
        let mut query = vec![("count", page_size.to_string())];
        if let Some(after) = after {
            query.push(("after_account", after.account.encode_hex()));
            query.push(("after_lt", after.lt.to_string()));
        }

        self.get_json(self.block_url(block, &["transactions"])?, &query)
            .await
    }

    async fn get_transaction(
        &self,
        block: BlockId,
        account: &Address,
        lt: u64,
    ) -> Result<TransactionRecord, NodeError> {
        let account = account.to_string();
        let lt = lt.to_string();
        self.get_json(
            self.block_url(block, &["transaction", &account, &lt])?,
            &[],
        )
        .await
    }
}
