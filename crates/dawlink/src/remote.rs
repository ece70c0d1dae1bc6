//! Client side of the distant call path.
//!
//! A dedicated I/O thread owns the transport inside a current-thread tokio
//! runtime; callers block on a reply channel, so calls are synchronous at
//! the call site even though the transport is asynchronous internally.
//! Transient transport failures are retried a bounded number of times with
//! backoff before surfacing a connection error. Host-reported failures are
//! never retried.

use crate::error::{BridgeError, Result};
use crate::protocol::{BridgeConfig, HostRequest, HostResponse};
use crate::transport::MessageTransport;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread;
use std::time::Duration;

enum Command {
    Call {
        request: HostRequest,
        reply: Sender<Result<HostResponse>>,
    },
    Shutdown,
}

/// Handle to the bridge I/O thread. Shuts the thread down on drop.
pub(crate) struct RemoteBridge {
    commands: Sender<Command>,
    io_thread: Option<thread::JoinHandle<()>>,
}

impl RemoteBridge {
    /// Connect to the in-host call server. Fails eagerly when the host is
    /// unreachable after the configured retry budget.
    pub fn connect(config: BridgeConfig) -> Result<Self> {
        let (commands, command_rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = bounded(1);

        let io_thread = thread::Builder::new()
            .name("dawlink-bridge".to_string())
            .spawn(move || io_thread_main(config, command_rx, ready_tx))
            .map_err(BridgeError::Io)?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                commands,
                io_thread: Some(io_thread),
            }),
            Ok(Err(err)) => {
                let _ = io_thread.join();
                Err(err)
            }
            Err(_) => {
                let _ = io_thread.join();
                Err(BridgeError::Connection(
                    "bridge thread exited before connecting".to_string(),
                ))
            }
        }
    }

    /// Ship a request and block until its response or failure arrives.
    pub fn call(&self, request: HostRequest) -> Result<HostResponse> {
        let (reply_tx, reply_rx) = bounded(1);
        self.commands
            .send(Command::Call {
                request,
                reply: reply_tx,
            })
            .map_err(|_| BridgeError::Connection("bridge thread is gone".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| BridgeError::Connection("bridge thread dropped the call".to_string()))?
    }
}

impl Drop for RemoteBridge {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.io_thread.take() {
            let _ = handle.join();
        }
    }
}

fn io_thread_main(config: BridgeConfig, commands: Receiver<Command>, ready: Sender<Result<()>>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            let _ = ready.send(Err(BridgeError::Io(err)));
            return;
        }
    };

    let mut transport = match runtime.block_on(connect_with_retry(&config)) {
        Ok(transport) => Some(transport),
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    while let Ok(command) = commands.recv() {
        match command {
            Command::Call { request, reply } => {
                let result = runtime.block_on(perform(&mut transport, &config, &request));
                let _ = reply.send(result);
            }
            Command::Shutdown => break,
        }
    }
}

async fn connect_once(config: &BridgeConfig) -> Result<MessageTransport> {
    let deadline = Duration::from_millis(config.connect_timeout_ms);
    match tokio::time::timeout(deadline, MessageTransport::connect(&config.socket_path)).await {
        Ok(result) => result,
        Err(_) => Err(BridgeError::Connection(format!(
            "connect timed out after {}ms",
            config.connect_timeout_ms
        ))),
    }
}

async fn connect_with_retry(config: &BridgeConfig) -> Result<MessageTransport> {
    let mut attempt: u32 = 0;
    loop {
        match connect_once(config).await {
            Ok(transport) => return Ok(transport),
            Err(err) if attempt < config.max_retries => {
                attempt += 1;
                tracing::debug!(attempt, error = %err, "connect failed, retrying");
                backoff(config, attempt).await;
            }
            Err(err) => {
                return Err(BridgeError::Connection(format!(
                    "could not reach host at {}: {err}",
                    config.socket_path.display()
                )))
            }
        }
    }
}

async fn backoff(config: &BridgeConfig, attempt: u32) {
    tokio::time::sleep(Duration::from_millis(
        config.retry_backoff_ms.saturating_mul(u64::from(attempt)),
    ))
    .await;
}

/// One call with bounded retry. Any transient failure drops the transport
/// so the next attempt reconnects.
async fn perform(
    slot: &mut Option<MessageTransport>,
    config: &BridgeConfig,
    request: &HostRequest,
) -> Result<HostResponse> {
    let mut attempt: u32 = 0;
    loop {
        match round_trip(slot, config, request).await {
            Ok(response) => return Ok(response),
            Err(err) if err.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                *slot = None;
                tracing::warn!(attempt, error = %err, "transport failure, retrying");
                backoff(config, attempt).await;
            }
            Err(err) => {
                if err.is_transient() {
                    *slot = None;
                    return Err(BridgeError::Connection(format!(
                        "retry budget exhausted: {err}"
                    )));
                }
                return Err(err);
            }
        }
    }
}

async fn round_trip(
    slot: &mut Option<MessageTransport>,
    config: &BridgeConfig,
    request: &HostRequest,
) -> Result<HostResponse> {
    if slot.is_none() {
        *slot = Some(connect_once(config).await?);
    }
    let transport = match slot.as_mut() {
        Some(transport) => transport,
        None => return Err(BridgeError::Connection("no transport".to_string())),
    };

    let deadline = Duration::from_millis(config.call_timeout_ms);
    match tokio::time::timeout(deadline, async {
        transport.send_request(request).await?;
        transport.recv_response().await
    })
    .await
    {
        Ok(result) => result,
        Err(_) => Err(BridgeError::Connection(format!(
            "call timed out after {}ms",
            config.call_timeout_ms
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_to_unreachable_host_fails_with_connection_error() {
        let config = BridgeConfig {
            socket_path: std::env::temp_dir().join("dawlink-no-such-server.sock"),
            connect_timeout_ms: 100,
            call_timeout_ms: 100,
            max_retries: 1,
            retry_backoff_ms: 1,
        };
        let err = match RemoteBridge::connect(config) {
            Err(err) => err,
            Ok(_) => panic!("connect should fail without a server"),
        };
        assert!(matches!(err, BridgeError::Connection(_)));
    }
}
