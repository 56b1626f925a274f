//! # Client
//! Runs one test against a PROXY-protocol-aware server: connect,
//! send the encoded header, send the optional payload, read one
//! response.

use crate::{Error, TestConfig};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::info;

/// The test client, a thin wrapper around a [`TestConfig`]
#[derive(Debug, Clone)]
pub struct Client {
    config: TestConfig,
}

impl Client {
    /// Constructs a new client for one test run
    pub fn new(config: TestConfig) -> Self {
        Self { config }
    }

    /// Runs the test, returning whatever the server answered.
    ///
    /// The header is encoded before anything touches the network, so
    /// a bad descriptor never leaves a half-open connection behind.
    pub async fn run(&self) -> Result<Vec<u8>, Error> {
        let descriptor = self.config.descriptor()?;
        let header = descriptor.encode()?;

        let addr = self.config.server();
        let mut stream = timeout(self.config.timeout(), TcpStream::connect(addr))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??;
        info!(%addr, "connected");

        info!(%descriptor, bytes = header.len(), "sending header");
        stream.write_all(&header).await?;

        if let Some(message) = &self.config.message {
            info!(bytes = message.len(), "sending payload");
            stream.write_all(message.as_bytes()).await?;
        }

        let mut response = Vec::with_capacity(4096);
        timeout(self.config.timeout(), stream.read_buf(&mut response))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read timed out"))??;
        info!(
            bytes = response.len(),
            response = %String::from_utf8_lossy(&response),
            "response received"
        );

        Ok(response)
    }
}
