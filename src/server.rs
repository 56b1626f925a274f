//! # Server
//! The test server: accepts connections, decodes the PROXY header,
//! logs the decoded descriptor and answers with a fixed HTTP response.
//! One connection per task, no shared state.

use crate::Error;
use proxyproto_rs::decode;
use std::net::{SocketAddr, ToSocketAddrs};
use tokio::{
    io::{self, AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tracing::{debug, info, warn};

const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\n\r\nHello, World!";

/// The `Server` struct that holds the listen address
#[derive(Debug, Clone, Copy)]
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Constructs a new Server
    pub fn new<S>(addr: S) -> io::Result<Self>
    where
        S: ToSocketAddrs,
    {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no listen address"))?;
        Ok(Self { addr })
    }

    /// The address the server listens on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the server and listen for new connections.
    ///
    /// A connection that fails (bad header included) is logged and
    /// closed; the listener itself keeps running.
    pub async fn start(self) -> io::Result<()> {
        let listener = TcpListener::bind(&self.addr).await?;
        info!(addr = %self.addr, "test server listening");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, peer).await {
                            warn!(%peer, error = %e, "connection failed");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "accept failed"),
            }
        }
    }

    async fn handle_connection(mut stream: TcpStream, peer: SocketAddr) -> Result<(), Error> {
        info!(%peer, "new connection");

        let descriptor = decode(&mut stream).await?;
        info!(%peer, %descriptor, "decoded header");

        // whatever follows the header is ordinary payload
        let mut payload = Vec::with_capacity(4096);
        stream.read_buf(&mut payload).await?;
        if !payload.is_empty() {
            debug!(%peer, bytes = payload.len(), payload = %String::from_utf8_lossy(&payload), "payload");
        }

        stream.write_all(RESPONSE).await?;
        info!(%peer, "connection handled");

        Ok(())
    }
}
