//! # Descriptor
//! Contains the [`ConnectionDescriptor`], the single value flowing
//! through encoder and decoder: which protocol version, which
//! transport, and the two endpoint addresses the header talks about.

use crate::error::EncodeError;
use crate::transport;
use std::fmt;
use std::net::SocketAddr;

/// The two incompatible wire formats of the PROXY protocol
#[allow(missing_docs)]
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    V1,
    V2,
}

/// The transport the proxied connection used.
///
/// `Unknown` only ever comes out of the decoder, for a v2 transport
/// nibble outside STREAM/DGRAM. It cannot be encoded.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transport {
    /// STREAM on the wire
    Tcp,
    /// DGRAM on the wire
    Udp,
    /// Any other transport nibble
    Unknown,
}

impl Transport {
    pub(crate) fn from_nibble(nibble: u8) -> Self {
        match nibble {
            transport::STREAM => Transport::Tcp,
            transport::DGRAM => Transport::Udp,
            _ => Transport::Unknown,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Tcp => write!(f, "TCP"),
            Transport::Udp => write!(f, "UDP"),
            Transport::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// One proxied connection as described by a header.
///
/// Immutable once constructed; [`ConnectionDescriptor::new`] enforces
/// that both addresses share a family, so an existing descriptor is
/// always encodable as far as addresses are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    version: ProtocolVersion,
    transport: Transport,
    source: SocketAddr,
    dest: SocketAddr,
}

impl ConnectionDescriptor {
    /// Constructs a new descriptor, rejecting mixed address families
    pub fn new(
        version: ProtocolVersion,
        transport: Transport,
        source: SocketAddr,
        dest: SocketAddr,
    ) -> Result<Self, EncodeError> {
        if source.is_ipv4() != dest.is_ipv4() {
            return Err(EncodeError::AddressFamilyMismatch);
        }

        Ok(Self {
            version,
            transport,
            source,
            dest,
        })
    }

    /// Which signature this descriptor encodes to (or was decoded from)
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// `transport` field getter
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// The original client address
    pub fn source(&self) -> SocketAddr {
        self.source
    }

    /// The original destination address
    pub fn dest(&self) -> SocketAddr {
        self.dest
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = match self.version {
            ProtocolVersion::V1 => "v1",
            ProtocolVersion::V2 => "v2",
        };
        write!(
            f,
            "{version} {transport} {src} -> {dst}",
            transport = self.transport,
            src = self.source,
            dst = self.dest
        )
    }
}
