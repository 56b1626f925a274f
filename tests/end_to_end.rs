use proxyprobe::{Client, Server, TestConfig};
use proxyproto_rs::{ConnectionDescriptor, ProtocolVersion, Transport};
use tokio::time::{self, Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

#[macro_use]
pub(crate) mod macros {
    macro_rules! start {
        ($addr:expr) => {{
            let server = Server::new($addr).unwrap();
            let handler = tokio::spawn(async move { server.start().await.unwrap() });
            time::sleep(Duration::from_secs(1)).await;
            handler
        }};
    }
}

fn descriptor(version: ProtocolVersion) -> ConnectionDescriptor {
    ConnectionDescriptor::new(
        version,
        Transport::Tcp,
        "192.168.1.100:12345".parse().unwrap(),
        "192.168.1.200:80".parse().unwrap(),
    )
    .unwrap()
}

async fn send_and_read(addr: &str, bytes: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(bytes).await.unwrap();

    let mut response = Vec::with_capacity(4096);
    stream.read_buf(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn v1_header_end_to_end() {
    let server_addr = "127.0.0.1:17081";
    let handler = start!(server_addr);

    let mut bytes = descriptor(ProtocolVersion::V1).encode().unwrap();
    bytes.extend_from_slice(b"ping\r\n\r\n");
    let response = send_and_read(server_addr, &bytes).await;

    assert!(response.starts_with(b"HTTP/1.1 200 OK"));

    handler.abort();
    time::sleep(Duration::from_secs(1)).await;
    assert!(handler.is_finished());
}

#[tokio::test]
async fn v2_header_end_to_end() {
    let server_addr = "127.0.0.1:17082";
    let handler = start!(server_addr);

    let mut bytes = descriptor(ProtocolVersion::V2).encode().unwrap();
    bytes.extend_from_slice(b"ping\r\n\r\n");
    let response = send_and_read(server_addr, &bytes).await;

    assert!(response.starts_with(b"HTTP/1.1 200 OK"));

    handler.abort();
    time::sleep(Duration::from_secs(1)).await;
    assert!(handler.is_finished());
}

#[tokio::test]
async fn client_against_server() {
    let handler = start!("127.0.0.1:17083");

    let mut config = TestConfig::default();
    config.apply("version", "2").unwrap();
    config.apply("port", "17083").unwrap();
    config.apply("timeout", "5").unwrap();

    let response = Client::new(config).run().await.unwrap();
    assert!(response.ends_with(b"Hello, World!"));

    handler.abort();
    time::sleep(Duration::from_secs(1)).await;
    assert!(handler.is_finished());
}

// one bad connection must not take the listener down
#[tokio::test]
async fn bad_header_closes_only_that_connection() {
    let server_addr = "127.0.0.1:17084";
    let handler = start!(server_addr);

    let mut stream = TcpStream::connect(server_addr).await.unwrap();
    stream.write_all(b"definitely not a proxy header").await.unwrap();
    let mut buf = Vec::with_capacity(64);
    // server drops the connection without answering; depending on
    // timing that shows up as EOF or as a reset
    assert!(matches!(stream.read_buf(&mut buf).await, Ok(0) | Err(_)));
    drop(stream);

    let mut bytes = descriptor(ProtocolVersion::V1).encode().unwrap();
    bytes.extend_from_slice(b"still alive?\r\n\r\n");
    let response = send_and_read(server_addr, &bytes).await;
    assert!(response.starts_with(b"HTTP/1.1 200 OK"));

    handler.abort();
    time::sleep(Duration::from_secs(1)).await;
    assert!(handler.is_finished());
}
