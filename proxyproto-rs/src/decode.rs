//! # Decode
//! Reads a PROXY protocol header off the front of a byte stream.
//!
//! The decoder is a single straight-line pass: probe the stream,
//! dispatch on the matched signature, parse, done. A failure is
//! terminal for that stream, there is no retry state.

use crate::descriptor::{ConnectionDescriptor, ProtocolVersion, Transport};
use crate::error::DecodeError;
use crate::{family, V1_MAX_LINE, V1_SIGNATURE, V2_FIXED_LEN, V2_SIGNATURE};
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Detects and consumes a v1 or v2 header from `stream`.
///
/// On success exactly the header's bytes have been consumed and the
/// stream is positioned at the first payload byte. The same holds for
/// [`DecodeError::UnsupportedFamily`]: the announced address block is
/// fully consumed before the error is returned, so a caller that wants
/// to keep using the stream still can.
///
/// A stream that starts with neither signature fails with
/// [`DecodeError::NoProxyHeader`] after consuming at most the 16
/// probed bytes.
pub async fn decode<R>(stream: &mut R) -> Result<ConnectionDescriptor, DecodeError>
where
    R: AsyncRead + Unpin,
{
    let mut probe = [0u8; V2_FIXED_LEN];
    let filled = fill_probe(stream, &mut probe).await?;

    if probe[..filled].starts_with(V1_SIGNATURE) {
        decode_v1(stream, &probe[..filled]).await
    } else if filled >= V2_SIGNATURE.len() && probe[..V2_SIGNATURE.len()] == V2_SIGNATURE {
        decode_v2(stream, &probe, filled).await
    } else {
        Err(DecodeError::NoProxyHeader)
    }
}

/// Reads until `probe` is full or the stream ends, returning how many
/// bytes were actually read.
async fn fill_probe<R>(stream: &mut R, probe: &mut [u8]) -> Result<usize, DecodeError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < probe.len() {
        let n = stream.read(&mut probe[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Consumes the v1 line through its `\n` and parses it.
///
/// `prefix` holds the already-consumed probe bytes, which are the
/// start of the line.
async fn decode_v1<R>(stream: &mut R, prefix: &[u8]) -> Result<ConnectionDescriptor, DecodeError>
where
    R: AsyncRead + Unpin,
{
    let mut line = prefix.to_vec();

    if !line.contains(&b'\n') {
        if prefix.len() < V2_FIXED_LEN {
            // stream ended inside the probe, no terminator is coming
            return Err(DecodeError::MalformedV1Header("unterminated line"));
        }

        loop {
            if line.len() >= V1_MAX_LINE {
                return Err(DecodeError::MalformedV1Header("line too long"));
            }

            match stream.read_u8().await {
                Ok(byte) => {
                    line.push(byte);
                    if byte == b'\n' {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    return Err(DecodeError::MalformedV1Header("unterminated line"));
                }
                Err(e) => return Err(DecodeError::Io(e)),
            }
        }
    }

    parse_v1_line(&line)
}

fn parse_v1_line(line: &[u8]) -> Result<ConnectionDescriptor, DecodeError> {
    let newline = line
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(DecodeError::MalformedV1Header("unterminated line"))?;

    let text = std::str::from_utf8(&line[..newline])
        .map_err(|_| DecodeError::MalformedV1Header("not valid ascii"))?;
    let text = text.strip_suffix('\r').unwrap_or(text);

    let tokens = text.split(' ').collect::<Vec<_>>();
    if tokens.len() != 6 {
        return Err(DecodeError::MalformedV1Header(
            "expected 6 space-separated tokens",
        ));
    }

    // detection already matched the prefix, but the token must be exact
    if tokens[0] != "PROXY" {
        return Err(DecodeError::MalformedV1Header("missing PROXY token"));
    }

    // The declared 4/6 digit is deliberately NOT cross-checked against
    // the address syntax that follows, matching the lenient wire
    // behavior of existing senders.
    let transport = match tokens[1] {
        "TCP4" | "TCP6" => Transport::Tcp,
        "UDP4" | "UDP6" => Transport::Udp,
        _ => return Err(DecodeError::MalformedV1Header("unknown transport token")),
    };

    let src_ip = tokens[2]
        .parse::<IpAddr>()
        .map_err(|_| DecodeError::MalformedV1Header("invalid source address"))?;
    let dst_ip = tokens[3]
        .parse::<IpAddr>()
        .map_err(|_| DecodeError::MalformedV1Header("invalid destination address"))?;
    let src_port = tokens[4]
        .parse::<u16>()
        .map_err(|_| DecodeError::MalformedV1Header("invalid source port"))?;
    let dst_port = tokens[5]
        .parse::<u16>()
        .map_err(|_| DecodeError::MalformedV1Header("invalid destination port"))?;

    ConnectionDescriptor::new(
        ProtocolVersion::V1,
        transport,
        SocketAddr::new(src_ip, src_port),
        SocketAddr::new(dst_ip, dst_port),
    )
    .map_err(|_| DecodeError::MalformedV1Header("mixed address families"))
}

/// Parses the 16-byte fixed header already sitting in `probe`, then
/// consumes exactly the announced address block.
async fn decode_v2<R>(
    stream: &mut R,
    probe: &[u8; V2_FIXED_LEN],
    filled: usize,
) -> Result<ConnectionDescriptor, DecodeError>
where
    R: AsyncRead + Unpin,
{
    if filled < V2_FIXED_LEN {
        return Err(DecodeError::TruncatedStream);
    }

    // detection matched already; a mismatch here is an internal bug
    if probe[..V2_SIGNATURE.len()] != V2_SIGNATURE {
        return Err(DecodeError::MalformedV2Header("signature mismatch"));
    }

    if probe[12] >> 4 != 0x2 {
        return Err(DecodeError::MalformedV2Header("version nibble is not 2"));
    }

    let fam = probe[13] & 0xf0;
    let transport = Transport::from_nibble(probe[13] & 0x0f);
    let length = u16::from_be_bytes([probe[14], probe[15]]) as usize;

    // The whole block is consumed before the family is interpreted so
    // that an UnsupportedFamily error leaves the stream positioned at
    // the first byte after the header.
    let mut block = vec![0u8; length];
    stream.read_exact(&mut block).await.map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            DecodeError::TruncatedStream
        } else {
            DecodeError::Io(e)
        }
    })?;

    let (source, dest) = match fam {
        family::INET => {
            if block.len() < 12 {
                return Err(DecodeError::MalformedV2Header(
                    "address block too short for INET",
                ));
            }
            let src: [u8; 4] = block[0..4].try_into().unwrap();
            let dst: [u8; 4] = block[4..8].try_into().unwrap();
            let src_port = u16::from_be_bytes([block[8], block[9]]);
            let dst_port = u16::from_be_bytes([block[10], block[11]]);
            (
                SocketAddr::new(IpAddr::V4(Ipv4Addr::from(src)), src_port),
                SocketAddr::new(IpAddr::V4(Ipv4Addr::from(dst)), dst_port),
            )
        }
        family::INET6 => {
            if block.len() < 36 {
                return Err(DecodeError::MalformedV2Header(
                    "address block too short for INET6",
                ));
            }
            let src: [u8; 16] = block[0..16].try_into().unwrap();
            let dst: [u8; 16] = block[16..32].try_into().unwrap();
            let src_port = u16::from_be_bytes([block[32], block[33]]);
            let dst_port = u16::from_be_bytes([block[34], block[35]]);
            (
                SocketAddr::new(IpAddr::V6(Ipv6Addr::from(src)), src_port),
                SocketAddr::new(IpAddr::V6(Ipv6Addr::from(dst)), dst_port),
            )
        }
        _ => return Err(DecodeError::UnsupportedFamily(fam)),
    };

    ConnectionDescriptor::new(ProtocolVersion::V2, transport, source, dest)
        .map_err(|_| DecodeError::MalformedV2Header("mixed address families"))
}
