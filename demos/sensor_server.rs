//! Sensor stream server example
//!
//! Run with: cargo run --example sensor_server [BIND_ADDR] [SENSOR...]
//!
//! Examples:
//!   cargo run --example sensor_server                          # 0.0.0.0:8080, sensor "demo"
//!   cargo run --example sensor_server localhost thermo camera  # 127.0.0.1:8080
//!   cargo run --example sensor_server 127.0.0.1:9000 thermo
//!
//! ## Publishing
//!
//!   cargo run --example feed_replay 127.0.0.1:8080 thermo
//!
//! ## Features
//!
//! - Every sensor gets a reading monitor that logs the latest reading every 10s
//! - Subscribers receive a keepalive ping every 2s while idle
//! - Slow subscribers drop their own oldest readings instead of slowing others

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use sensorcast::monitor::{LatestReadingSink, ReadingMonitor};
use sensorcast::{SensorServer, ServerConfig};

/// Stand-in for a persistence layer: logs each sampled reading
struct LogSink;

impl LatestReadingSink for LogSink {
    async fn store_latest(&self, sensor_id: &str, payload: Bytes) {
        tracing::info!(
            sensor = %sensor_id,
            size = payload.len(),
            reading = %String::from_utf8_lossy(&payload),
            "Latest reading"
        );
    }
}

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "localhost:9000" -> 127.0.0.1:9000
/// - "127.0.0.1" -> 127.0.0.1:8080
/// - "0.0.0.0:9000" -> 0.0.0.0:9000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 8080;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: sensor_server [BIND_ADDR] [SENSOR...]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8080)");
    eprintln!("  SENSOR       Sensor ids to register (default: demo)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let mut config = ServerConfig::default();
    if let Some(addr_str) = args.get(1) {
        match parse_bind_addr(addr_str) {
            Ok(addr) => config = config.bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    let sensors: Vec<String> = if args.len() > 2 {
        args[2..].to_vec()
    } else {
        vec!["demo".to_string()]
    };
    for sensor in &sensors {
        config = config.sensor(sensor.clone());
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sensorcast=debug".parse()?)
                .add_directive("sensor_server=info".parse()?),
        )
        .init();

    println!("Starting sensor server on {}", config.bind_addr);
    println!("Sensors: {}", sensors.join(", "));
    println!();

    let server = SensorServer::new(config);

    let monitor = ReadingMonitor::new(
        Arc::clone(server.registry()),
        Arc::new(LogSink),
        Duration::from_secs(10),
    );
    for sensor in &sensors {
        let _ = monitor.spawn(sensor)?;
    }

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
