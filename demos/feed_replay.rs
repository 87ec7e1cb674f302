//! Publishes a synthetic reading on a timer and prints it back from a subscriber
//!
//! Run with: cargo run --example feed_replay [SERVER_ADDR] [SENSOR] [RATE_HZ]
//!
//! Start `sensor_server` first, then:
//!   cargo run --example feed_replay 127.0.0.1:8080 demo 5

use std::time::Duration;

use sensorcast::client::{FeedPublisher, FeedSubscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let addr = args.get(1).cloned().unwrap_or_else(|| "127.0.0.1:8080".to_string());
    let sensor = args.get(2).cloned().unwrap_or_else(|| "demo".to_string());
    let rate: u32 = match args.get(3) {
        Some(r) => r.parse()?,
        None => 5,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sensorcast=info".parse()?),
        )
        .init();

    let mut subscriber = FeedSubscriber::connect(addr.as_str(), &sensor, None).await?;
    println!("Subscribed to '{}' as {}", sensor, subscriber.client_id());

    let mut publisher = FeedPublisher::connect(addr.as_str(), &sensor).await?;

    let publish = async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1) / rate.max(1));
        let mut i: u64 = 0;
        loop {
            ticker.tick().await;
            let value = 20.0 + (i as f64 / 10.0).sin();
            let reading = format!(r#"{{"value":{:.3}}}"#, value);
            if let Err(e) = publisher.send(reading).await {
                eprintln!("Publish failed: {}", e);
                break;
            }
            i += 1;
        }
    };

    let receive = async move {
        loop {
            match subscriber.recv().await {
                Ok(Some(payload)) => println!("{}", String::from_utf8_lossy(&payload)),
                Ok(None) => {
                    println!("Feed ended");
                    break;
                }
                Err(e) => {
                    eprintln!("Receive failed: {}", e);
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = publish => {}
        _ = receive => {}
        _ = tokio::signal::ctrl_c() => println!("\nStopping..."),
    }

    Ok(())
}
