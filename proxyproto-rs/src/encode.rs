//! # Encode
//! Turns a [`ConnectionDescriptor`] into the exact bytes a proxy would
//! prepend to the stream. Pure functions, no I/O.

use crate::descriptor::{ConnectionDescriptor, ProtocolVersion, Transport};
use crate::error::EncodeError;
use crate::{command, family, transport, V2_SIGNATURE};
use std::io::Write;
use std::net::IpAddr;

/// Room for the largest header we ever build (v2 INET6, 52 bytes)
/// or any sane v1 line.
const BUF_CAP: usize = 108;

impl ConnectionDescriptor {
    /// Encodes the header for this descriptor's version
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        match self.version() {
            ProtocolVersion::V1 => self.encode_v1(),
            ProtocolVersion::V2 => self.encode_v2(),
        }
    }

    /// `PROXY <TCP4|TCP6|UDP4|UDP6> <src> <dst> <sport> <dport>\r\n`
    ///
    /// The 4/6 digit comes from the source address family carried on
    /// the descriptor. No length cap is enforced on the produced line.
    fn encode_v1(&self) -> Result<Vec<u8>, EncodeError> {
        let token = match (self.transport(), self.source().is_ipv4()) {
            (Transport::Tcp, true) => "TCP4",
            (Transport::Tcp, false) => "TCP6",
            (Transport::Udp, true) => "UDP4",
            (Transport::Udp, false) => "UDP6",
            (Transport::Unknown, _) => return Err(EncodeError::UnknownTransport),
        };

        let mut buf = Vec::with_capacity(BUF_CAP);
        // write! on a Vec cannot fail
        let _ = write!(
            buf,
            "PROXY {token} {src} {dst} {sport} {dport}\r\n",
            src = self.source().ip(),
            dst = self.dest().ip(),
            sport = self.source().port(),
            dport = self.dest().port()
        );

        Ok(buf)
    }

    /// 12-byte signature, version/command `0x21`, family|transport
    /// byte, big-endian length, then the address block.
    ///
    /// The length field always equals the actual block size (12 for
    /// INET, 36 for INET6) so that family-agnostic decoders can skip
    /// the block.
    fn encode_v2(&self) -> Result<Vec<u8>, EncodeError> {
        let trans = match self.transport() {
            Transport::Tcp => transport::STREAM,
            Transport::Udp => transport::DGRAM,
            Transport::Unknown => return Err(EncodeError::UnknownTransport),
        };

        let mut buf = Vec::with_capacity(BUF_CAP);
        buf.extend_from_slice(&V2_SIGNATURE);
        buf.push(command::PROXY);

        match (self.source().ip(), self.dest().ip()) {
            (IpAddr::V4(src), IpAddr::V4(dst)) => {
                buf.push(family::INET | trans);
                buf.extend_from_slice(&12u16.to_be_bytes());
                buf.extend_from_slice(&src.octets());
                buf.extend_from_slice(&dst.octets());
            }
            (IpAddr::V6(src), IpAddr::V6(dst)) => {
                buf.push(family::INET6 | trans);
                buf.extend_from_slice(&36u16.to_be_bytes());
                buf.extend_from_slice(&src.octets());
                buf.extend_from_slice(&dst.octets());
            }
            // unreachable past ConnectionDescriptor::new, kept as a hard check
            _ => return Err(EncodeError::AddressFamilyMismatch),
        }

        buf.extend_from_slice(&self.source().port().to_be_bytes());
        buf.extend_from_slice(&self.dest().port().to_be_bytes());

        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn descriptor(version: ProtocolVersion, transport: Transport) -> ConnectionDescriptor {
        ConnectionDescriptor::new(
            version,
            transport,
            "192.168.1.100:12345".parse().unwrap(),
            "192.168.1.200:80".parse().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn v1_tcp4_exact_line() {
        let encoded = descriptor(ProtocolVersion::V1, Transport::Tcp)
            .encode()
            .unwrap();
        assert_eq!(
            encoded,
            b"PROXY TCP4 192.168.1.100 192.168.1.200 12345 80\r\n"
        );
    }

    #[test]
    fn v1_udp6_exact_line() {
        let descriptor = ConnectionDescriptor::new(
            ProtocolVersion::V1,
            Transport::Udp,
            "[2001:db8::1]:56324".parse().unwrap(),
            "[2001:db8::11]:443".parse().unwrap(),
        )
        .unwrap();

        assert_eq!(
            descriptor.encode().unwrap(),
            b"PROXY UDP6 2001:db8::1 2001:db8::11 56324 443\r\n"
        );
    }

    #[test]
    fn v2_inet_exact_bytes() {
        let encoded = descriptor(ProtocolVersion::V2, Transport::Tcp)
            .encode()
            .unwrap();

        assert_eq!(encoded.len(), 28);
        assert_eq!(encoded[..12], V2_SIGNATURE);
        assert_eq!(encoded[12], 0x21);
        assert_eq!(encoded[13], 0x11); // INET | STREAM
        assert_eq!(encoded[14..16], [0x00, 0x0c]);
        assert_eq!(encoded[16..20], [192, 168, 1, 100]);
        assert_eq!(encoded[20..24], [192, 168, 1, 200]);
        assert_eq!(encoded[24..26], 12345u16.to_be_bytes());
        assert_eq!(encoded[26..28], 80u16.to_be_bytes());
    }

    #[test]
    fn v2_inet6_length_field() {
        let descriptor = ConnectionDescriptor::new(
            ProtocolVersion::V2,
            Transport::Udp,
            "[2001:db8::1]:56324".parse().unwrap(),
            "[2001:db8::11]:443".parse().unwrap(),
        )
        .unwrap();
        let encoded = descriptor.encode().unwrap();

        assert_eq!(encoded.len(), 52);
        assert_eq!(encoded[13], 0x22); // INET6 | DGRAM
        assert_eq!(encoded[14..16], [0x00, 0x24]);
    }

    #[test]
    fn unknown_transport_is_rejected() {
        let err = descriptor(ProtocolVersion::V2, Transport::Unknown)
            .encode()
            .unwrap_err();
        assert_eq!(err, EncodeError::UnknownTransport);
    }
}
