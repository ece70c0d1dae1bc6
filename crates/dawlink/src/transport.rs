//! IPC transport layer.
//!
//! Length-prefixed bincode frames over Unix domain sockets or Windows named
//! pipes, carrying `HostRequest` / `HostResponse` messages between client
//! and in-host call server.

use crate::error::Result;
use crate::protocol::{HostRequest, HostResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};

#[cfg(windows)]
use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeServer, ServerOptions};

/// Message transport for one client connection.
pub enum MessageTransport {
    #[cfg(unix)]
    Unix(UnixStream),
    #[cfg(windows)]
    WindowsClient(tokio::net::windows::named_pipe::NamedPipeClient),
    #[cfg(windows)]
    WindowsServer(NamedPipeServer),
}

async fn write_frame<S, M>(stream: &mut S, msg: &M) -> Result<()>
where
    S: AsyncWrite + Unpin,
    M: Serialize,
{
    let data = bincode::serialize(msg)?;
    stream.write_u32(data.len() as u32).await?;
    stream.write_all(&data).await?;
    stream.flush().await?;
    Ok(())
}

async fn read_frame<S, M>(stream: &mut S) -> Result<M>
where
    S: AsyncRead + Unpin,
    M: DeserializeOwned,
{
    let len = stream.read_u32().await? as usize;
    let mut data = vec![0u8; len];
    stream.read_exact(&mut data).await?;
    Ok(bincode::deserialize(&data)?)
}

impl MessageTransport {
    /// Connect to socket path (Unix) or named pipe (Windows).
    #[cfg(unix)]
    pub async fn connect(socket_path: &std::path::Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        Ok(Self::Unix(stream))
    }

    #[cfg(windows)]
    pub async fn connect(pipe_name: &std::path::Path) -> Result<Self> {
        let client = ClientOptions::new().open(pipe_name)?;
        Ok(Self::WindowsClient(client))
    }

    pub async fn send_request(&mut self, msg: &HostRequest) -> Result<()> {
        match self {
            #[cfg(unix)]
            Self::Unix(s) => write_frame(s, msg).await,
            #[cfg(windows)]
            Self::WindowsClient(c) => write_frame(c, msg).await,
            #[cfg(windows)]
            Self::WindowsServer(s) => write_frame(s, msg).await,
        }
    }

    pub async fn recv_request(&mut self) -> Result<HostRequest> {
        match self {
            #[cfg(unix)]
            Self::Unix(s) => read_frame(s).await,
            #[cfg(windows)]
            Self::WindowsClient(c) => read_frame(c).await,
            #[cfg(windows)]
            Self::WindowsServer(s) => read_frame(s).await,
        }
    }

    pub async fn send_response(&mut self, msg: &HostResponse) -> Result<()> {
        match self {
            #[cfg(unix)]
            Self::Unix(s) => write_frame(s, msg).await,
            #[cfg(windows)]
            Self::WindowsClient(c) => write_frame(c, msg).await,
            #[cfg(windows)]
            Self::WindowsServer(s) => write_frame(s, msg).await,
        }
    }

    pub async fn recv_response(&mut self) -> Result<HostResponse> {
        match self {
            #[cfg(unix)]
            Self::Unix(s) => read_frame(s).await,
            #[cfg(windows)]
            Self::WindowsClient(c) => read_frame(c).await,
            #[cfg(windows)]
            Self::WindowsServer(s) => read_frame(s).await,
        }
    }
}

/// Server-side transport listener.
pub struct TransportListener {
    #[cfg(unix)]
    listener: UnixListener,
    #[cfg(windows)]
    pipe_name: std::path::PathBuf,
}

impl TransportListener {
    /// Bind to socket path (Unix) or prepare named pipe (Windows).
    #[cfg(unix)]
    pub async fn bind(socket_path: &std::path::Path) -> Result<Self> {
        // Remove a stale socket left by a previous server
        let _ = std::fs::remove_file(socket_path);
        let listener = UnixListener::bind(socket_path)?;
        Ok(Self { listener })
    }

    #[cfg(windows)]
    pub async fn bind(pipe_name: &std::path::Path) -> Result<Self> {
        Ok(Self {
            pipe_name: pipe_name.to_path_buf(),
        })
    }

    /// Accept a connection.
    #[cfg(unix)]
    pub async fn accept(&self) -> Result<MessageTransport> {
        let (stream, _) = self.listener.accept().await?;
        Ok(MessageTransport::Unix(stream))
    }

    #[cfg(windows)]
    pub async fn accept(&self) -> Result<MessageTransport> {
        let server = ServerOptions::new().create(&self.pipe_name)?;
        server.connect().await?;
        Ok(MessageTransport::WindowsServer(server))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::locator::Locator;
    use crate::protocol::{ops, CallRequest, FailureKind, Value};

    #[tokio::test]
    async fn test_request_roundtrip_over_socket_pair() {
        let (client, server) = UnixStream::pair().unwrap();
        let mut client = MessageTransport::Unix(client);
        let mut server = MessageTransport::Unix(server);

        let request = HostRequest::Call(CallRequest::new(
            Locator::Track {
                id: "track-9".into(),
            },
            ops::TRACK_GET_VOLUME,
            [],
        ));
        client.send_request(&request).await.unwrap();

        match server.recv_request().await.unwrap() {
            HostRequest::Call(call) => {
                assert_eq!(call.method, ops::TRACK_GET_VOLUME);
            }
            _ => panic!("Wrong request variant"),
        }

        server
            .send_response(&HostResponse::Success(Value::Float(1.0)))
            .await
            .unwrap();
        match client.recv_response().await.unwrap() {
            HostResponse::Success(Value::Float(v)) => assert_eq!(v, 1.0),
            _ => panic!("Wrong response variant"),
        }
    }

    #[tokio::test]
    async fn test_failure_roundtrip_over_socket_pair() {
        let (client, server) = UnixStream::pair().unwrap();
        let mut client = MessageTransport::Unix(client);
        let mut server = MessageTransport::Unix(server);

        server
            .send_response(&HostResponse::Failure {
                kind: FailureKind::LocatorResolution,
                message: "track:gone".into(),
            })
            .await
            .unwrap();

        match client.recv_response().await.unwrap() {
            HostResponse::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::LocatorResolution);
                assert_eq!(message, "track:gone");
            }
            _ => panic!("Wrong response variant"),
        }
    }

    #[tokio::test]
    async fn test_recv_fails_on_closed_peer() {
        let (client, server) = UnixStream::pair().unwrap();
        let mut client = MessageTransport::Unix(client);
        drop(server);

        assert!(client.recv_response().await.is_err());
    }

    #[tokio::test]
    async fn test_listener_accepts_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.sock");
        let listener = TransportListener::bind(&path).await.unwrap();

        let connect = tokio::spawn({
            let path = path.clone();
            async move { MessageTransport::connect(&path).await }
        });

        let mut server_side = listener.accept().await.unwrap();
        let mut client_side = connect.await.unwrap().unwrap();

        client_side
            .send_request(&HostRequest::Batch(Vec::new()))
            .await
            .unwrap();
        match server_side.recv_request().await.unwrap() {
            HostRequest::Batch(calls) => assert!(calls.is_empty()),
            _ => panic!("Wrong request variant"),
        }
    }
}
