#![warn(missing_docs)]

//! # A pure Rust implementation of the PROXY protocol (v1 and v2)
//! according to the [`haproxy spec`](https://www.haproxy.org/download/1.8/doc/proxy-protocol.txt)
//!
//! The v1 header is a single human-readable ASCII line, the v2 header
//! is a binary record. Both carry the original client and destination
//! addresses across an intermediary.

/// The v1 signature, the first bytes of the text header
pub const V1_SIGNATURE: &[u8] = b"PROXY";

/// The v2 signature, the first 12 bytes of the binary header
pub const V2_SIGNATURE: [u8; 12] = [
    0x0d, 0x0a, 0x0d, 0x0a, 0x00, 0x0d, 0x0a, 0x51, 0x55, 0x49, 0x54, 0x0a,
];

/// Size of the fixed part of a v2 header (signature + 4 bytes)
pub const V2_FIXED_LEN: usize = 16;

/// A v1 line may not exceed 107 bytes, terminator included
pub const V1_MAX_LINE: usize = 107;

pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod error;

pub use decode::decode;
pub use descriptor::{ConnectionDescriptor, ProtocolVersion, Transport};
pub use error::{DecodeError, EncodeError};

/// Values of the v2 version/command byte (byte 12)
#[allow(missing_docs)]
pub mod command {
    pub const LOCAL: u8 = 0x20;
    pub const PROXY: u8 = 0x21;
}

/// Values of the v2 address-family nibble (top half of byte 13)
#[allow(missing_docs)]
pub mod family {
    pub const UNSPEC: u8 = 0x00;
    pub const INET: u8 = 0x10;
    pub const INET6: u8 = 0x20;
    pub const UNIX: u8 = 0x30;
}

/// Values of the v2 transport nibble (bottom half of byte 13)
#[allow(missing_docs)]
pub mod transport {
    pub const UNSPEC: u8 = 0x00;
    pub const STREAM: u8 = 0x01;
    pub const DGRAM: u8 = 0x02;
}
