//! # Config
//! The configuration record a test run is built from. Deserialized
//! from a JSON file, amended by `key=value` command line overrides,
//! and turned into a validated [`ConnectionDescriptor`] right before
//! the header is encoded.

use crate::Error;
use proxyproto_rs::{ConnectionDescriptor, ProtocolVersion, Transport};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Default test payload, a minimal HTTP request
pub const DEFAULT_MESSAGE: &str = "GET / HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n";

/// One test run: where to connect, what the header should claim,
/// what to send afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestConfig {
    /// PROXY protocol version to send, 1 or 2
    pub version: u8,
    /// Target server address
    pub server_addr: IpAddr,
    /// Target server port
    pub server_port: u16,
    /// Source address the header claims
    pub src_ip: IpAddr,
    /// Source port the header claims
    pub src_port: u16,
    /// Destination address the header claims
    pub dst_ip: IpAddr,
    /// Destination port the header claims
    pub dst_port: u16,
    /// Claimed transport, TCP or UDP
    pub protocol: Transport,
    /// Payload sent after the header, `None` sends nothing
    pub message: Option<String>,
    /// Connect and read timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server_addr: "127.0.0.1".parse().unwrap(),
            server_port: 8080,
            src_ip: "192.168.1.100".parse().unwrap(),
            src_port: 12345,
            dst_ip: "192.168.1.200".parse().unwrap(),
            dst_port: 80,
            protocol: Transport::Tcp,
            message: Some(DEFAULT_MESSAGE.to_string()),
            timeout_secs: 10,
        }
    }
}

impl TestConfig {
    /// Loads a config from a JSON file, missing fields take defaults
    pub fn from_file(path: &str) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Applies one `key=value` override, mirroring the flag set of
    /// the command line
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let invalid = |what: &str| Error::Config(format!("{what}: {value:?}"));

        match key {
            "version" => self.version = value.parse().map_err(|_| invalid("bad version"))?,
            "server" => self.server_addr = value.parse().map_err(|_| invalid("bad server address"))?,
            "port" => self.server_port = value.parse().map_err(|_| invalid("bad server port"))?,
            "src-ip" => self.src_ip = value.parse().map_err(|_| invalid("bad source ip"))?,
            "src-port" => self.src_port = value.parse().map_err(|_| invalid("bad source port"))?,
            "dst-ip" => self.dst_ip = value.parse().map_err(|_| invalid("bad destination ip"))?,
            "dst-port" => self.dst_port = value.parse().map_err(|_| invalid("bad destination port"))?,
            "protocol" => {
                self.protocol = match value.to_ascii_uppercase().as_str() {
                    "TCP" => Transport::Tcp,
                    "UDP" => Transport::Udp,
                    _ => return Err(invalid("protocol must be TCP or UDP")),
                }
            }
            "message" => {
                self.message = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "timeout" => self.timeout_secs = value.parse().map_err(|_| invalid("bad timeout"))?,
            _ => return Err(Error::Config(format!("unknown option {key:?}"))),
        }

        Ok(())
    }

    /// Builds the validated descriptor this config describes
    pub fn descriptor(&self) -> Result<ConnectionDescriptor, Error> {
        let version = match self.version {
            1 => ProtocolVersion::V1,
            2 => ProtocolVersion::V2,
            v => return Err(Error::Config(format!("version must be 1 or 2, got {v}"))),
        };

        Ok(ConnectionDescriptor::new(
            version,
            self.protocol,
            SocketAddr::new(self.src_ip, self.src_port),
            SocketAddr::new(self.dst_ip, self.dst_port),
        )?)
    }

    /// The address the client dials
    pub fn server(&self) -> SocketAddr {
        SocketAddr::new(self.server_addr, self.server_port)
    }

    /// Connect/read timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_the_tool_defaults() {
        let config = TestConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.server(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.message.is_some());
    }

    #[test]
    fn overrides_are_applied() {
        let mut config = TestConfig::default();
        config.apply("version", "2").unwrap();
        config.apply("src-ip", "2001:db8::1").unwrap();
        config.apply("dst-ip", "2001:db8::2").unwrap();
        config.apply("protocol", "udp").unwrap();
        config.apply("message", "").unwrap();

        assert_eq!(config.version, 2);
        assert_eq!(config.protocol, Transport::Udp);
        assert!(config.message.is_none());

        let descriptor = config.descriptor().unwrap();
        assert_eq!(descriptor.version(), ProtocolVersion::V2);
    }

    #[test]
    fn unknown_override_is_rejected() {
        let mut config = TestConfig::default();
        assert!(config.apply("no-such-key", "1").is_err());
        assert!(config.apply("src-port", "70000").is_err());
    }

    #[test]
    fn bad_version_fails_descriptor() {
        let config = TestConfig {
            version: 3,
            ..Default::default()
        };
        assert!(matches!(config.descriptor(), Err(Error::Config(_))));
    }

    #[test]
    fn mixed_families_fail_descriptor() {
        let config = TestConfig {
            src_ip: "2001:db8::1".parse().unwrap(),
            ..Default::default()
        };
        assert!(matches!(config.descriptor(), Err(Error::Encode(_))));
    }
}
