use proxyprobe::{Client, Server, TestConfig};
use std::env;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn help() -> ! {
    println!("proxyprobe 0.1.0 - A PROXY protocol v1/v2 test tool");
    println!("Usage: ./proxyprobe <command> [args]\n");
    println!("Commands:");
    println!("server <addr>:<port>                 Run the echo test server");
    println!("client [config.json] [key=value ..]  Send one header and read the response\n");
    println!("Client overrides:");
    println!("version=<1|2> server=<ip> port=<n> src-ip=<ip> src-port=<n>");
    println!("dst-ip=<ip> dst-port=<n> protocol=<TCP|UDP> message=<text> timeout=<secs>");
    std::process::exit(0);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = env::args().skip(1);

    match args.next().as_deref() {
        Some("server") => {
            let addr = args.next().unwrap_or_else(|| "0.0.0.0:8080".to_string());
            Server::new(addr.as_str())?.start().await?;
        }
        Some("client") => {
            let mut config = TestConfig::default();

            for arg in args {
                match arg.split_once('=') {
                    Some((key, value)) => config.apply(key, value)?,
                    None => config = TestConfig::from_file(&arg)?,
                }
            }

            if let Err(e) = Client::new(config).run().await {
                error!(error = %e, "test failed");
                std::process::exit(1);
            }
        }
        _ => help(),
    }

    Ok(())
}
