//! # Error
//! Everything that can go wrong while encoding or decoding a header.
//!
//! Transport failures are carried through [`DecodeError::Io`] verbatim
//! and are never folded into the protocol error kinds.

/// Encode-time failures, all of them descriptor invariant violations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodeError {
    /// Source and destination addresses belong to different families
    #[error("invalid descriptor: source and destination address families differ")]
    AddressFamilyMismatch,

    /// The descriptor's transport cannot be put on the wire
    #[error("invalid descriptor: transport must be TCP or UDP")]
    UnknownTransport,
}

/// Decode-time failures
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The stream prefix matches neither the v1 nor the v2 signature
    #[error("stream does not start with a PROXY protocol header")]
    NoProxyHeader,

    /// A v1 line that violates the text format
    #[error("malformed v1 header: {0}")]
    MalformedV1Header(&'static str),

    /// A v2 header that violates the binary format
    #[error("malformed v2 header: {0}")]
    MalformedV2Header(&'static str),

    /// The stream ended before the announced header bytes arrived
    #[error("stream truncated before the full header was read")]
    TruncatedStream,

    /// A well-formed v2 header with an address family we do not speak.
    /// The address block has been consumed by the time this is returned,
    /// the stream is positioned right after the header.
    #[error("unsupported v2 address family 0x{0:02x}")]
    UnsupportedFamily(u8),

    /// An I/O failure on the underlying stream, surfaced as-is
    #[error("io error while reading header: {0}")]
    Io(#[from] std::io::Error),
}
