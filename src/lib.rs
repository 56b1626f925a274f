#![warn(missing_docs)]

//! # proxyprobe
//! A small tool for exercising servers that speak the PROXY protocol:
//! a [`Client`] that prepends a v1 or v2 header to a test payload and
//! a [`Server`] that accepts connections, decodes the header and logs
//! what it found. The codec itself lives in the `proxyproto-rs` crate.

pub mod client;
pub mod config;
pub mod server;

pub use client::Client;
pub use config::TestConfig;
pub use server::Server;

use proxyproto_rs::{DecodeError, EncodeError};

/// Everything a test run can fail with.
///
/// Codec errors keep their own kinds; transport failures stay `Io`
/// and are never reinterpreted as protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value that cannot be turned into a descriptor
    #[error("invalid config: {0}")]
    Config(String),

    /// The config file did not parse
    #[error("config file error: {0}")]
    Json(#[from] serde_json::Error),

    /// Header construction failed
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Header parsing failed
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A transport-level failure (connect, timeout, read, write)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
