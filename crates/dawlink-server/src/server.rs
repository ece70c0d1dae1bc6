//! Connection loop.

use dawlink::dispatch;
use dawlink::transport::{MessageTransport, TransportListener};
use dawlink::{BridgeConfig, Result, SharedHost};
use std::sync::Arc;

/// Accepts client connections and executes their requests against the
/// host graph.
pub struct CallServer {
    config: BridgeConfig,
    host: SharedHost,
}

impl CallServer {
    pub fn new(config: BridgeConfig, host: SharedHost) -> Self {
        Self { config, host }
    }

    /// Bind and serve until the task is dropped. Every client connection
    /// runs in its own task; the host mutex serializes request execution
    /// across all of them, so concurrent requests queue rather than race.
    pub async fn run(&self) -> Result<()> {
        let listener = TransportListener::bind(&self.config.socket_path).await?;
        tracing::info!(
            socket = %self.config.socket_path.display(),
            "call server listening"
        );
        loop {
            let transport = listener.accept().await?;
            let host = Arc::clone(&self.host);
            tokio::spawn(async move {
                if let Err(err) = serve_connection(transport, host).await {
                    tracing::debug!(error = %err, "client connection closed");
                }
            });
        }
    }
}

async fn serve_connection(mut transport: MessageTransport, host: SharedHost) -> Result<()> {
    loop {
        let request = transport.recv_request().await?;
        // Lock per request. A batch holds the lock for its whole run, so
        // its calls observe no interleaving from other clients.
        let response = {
            let mut guard = host.lock();
            dispatch::execute_request(&mut *guard, &request)
        };
        transport.send_response(&response).await?;
    }
}
