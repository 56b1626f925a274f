use proxyprobe::{Client, TestConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let config = TestConfig::from_file("./demos/test_config.json")?;

    println!("Testing against {}", config.server());
    let response = Client::new(config).run().await?;
    println!("{}", String::from_utf8_lossy(&response));

    Ok(())
}
