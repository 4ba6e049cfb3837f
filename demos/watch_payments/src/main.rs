// Example of watching live jetton transfer notifications through a gateway.
// Decoded payments are logged as they arrive and dumped once on exit.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tonfeed_scanner::{HttpNode, MemoryStore, NodeConfig, Scanner, ScannerConfig};
use url::Url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let url: Url = std::env::var("TONFEED_GATEWAY_URL")?.parse()?;
    let bearer_token = std::env::var("TONFEED_GATEWAY_TOKEN").ok();

    let node = HttpNode::new(NodeConfig {
        url: Some(url),
        bearer_token,
        http_req_timeout_millis: None,
    })?;

    let store = Arc::new(MemoryStore::new());
    let scanner = Scanner::new(Arc::new(node), store.clone(), ScannerConfig::default());

    let cancel = CancellationToken::new();
    let scan = tokio::spawn(scanner.run(cancel.clone()));

    tokio::signal::ctrl_c().await?;
    cancel.cancel();
    scan.await??;

    for payment in store.notifications() {
        println!(
            "{} from {} to {}, comment: {}",
            payment.amount, payment.sender, payment.destination, payment.comment
        );
    }

    Ok(())
}
