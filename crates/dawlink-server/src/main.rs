//! Standalone call server. Serves an in-memory host graph so clients can
//! be developed without a DAW.

use dawlink::{shared, BridgeConfig, MemoryHost, Result};
use dawlink_server::CallServer;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut config = BridgeConfig::default();
    if let Some(path) = env::args().nth(1) {
        config.socket_path = path.into();
    }

    let server = CallServer::new(config, shared(MemoryHost::new()));
    server.run().await
}
