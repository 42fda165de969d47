//! Byte-stream transport used by the fetch client.
//!
//! A transport is connected at the start of a fetch and closed before the fetch
//! returns; it never carries a connection across calls.

use std::{fmt::Debug, io, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::debug;

#[async_trait]
pub trait Transport: Send + Debug {
    async fn connect(&mut self, host: &str, port: u16) -> io::Result<()>;

    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads whatever is available into `buf`; `Ok(0)` means the peer closed.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Releases the connection. Safe to call when not connected.
    async fn close(&mut self);
}

/// Plain TCP transport.
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    connect_timeout: Duration,
}

impl TcpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { stream: None, connect_timeout }
    }

    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        self.stream.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "transport is not connected")
        })
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        let stream = timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??;

        debug!(host, port, "connected");
        self.stream = Some(stream);
        Ok(())
    }

    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream()?.write_all(bytes).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream()?.read(buf).await
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            // The peer may already have gone away; nothing to report.
            let _ = stream.shutdown().await;
            debug!("connection closed");
        }
    }
}
