use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use url::Url;

/// Configuration for [`HttpNode`](crate::HttpNode).
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Gateway server URL.
    pub url: Option<Url>,
    /// Gateway server bearer token.
    pub bearer_token: Option<String>,
    /// Timeout treshold for a single http request in milliseconds, default is 30 seconds (30_000ms).
    pub http_req_timeout_millis: Option<NonZeroU64>,
}

/// Configuration for [`Scanner`](crate::Scanner).
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// First delay before re-polling when the next master block is not ready
    /// yet, in milliseconds. Default is 2 seconds (2_000ms).
    pub poll_base_delay_millis: Option<u64>,
    /// Upper bound the poll delay doubles up to, in milliseconds. Default is
    /// 8 seconds (8_000ms).
    pub poll_max_delay_millis: Option<u64>,
    /// Fixed delay between retries while resolving the starting position, in
    /// milliseconds. Default is 1 second (1_000ms).
    pub startup_retry_delay_millis: Option<u64>,
    /// Number of transactions requested per block transaction list page.
    /// Default is 100.
    pub transaction_page_size: Option<u32>,
}
