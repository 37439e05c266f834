//! Example: Scanning for MLX90632 sensors
//!
//! Lists every peripheral advertising the sensor name `MLX R`.
//!
//! Run with: `cargo run --example scan_devices`

use mlx_core::scan::{self, ScanOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("Scanning for MLX R sensors...");
    println!();

    let devices = scan::scan_with_options(ScanOptions::default().duration_secs(10)).await?;

    if devices.is_empty() {
        println!("No sensors found.");
        println!();
        println!("Make sure:");
        println!("  - The sensor board is powered on");
        println!("  - Bluetooth is enabled on this computer");
        println!("  - The board is within range");
    } else {
        println!("Found {} sensor(s):", devices.len());
        println!();

        for device in &devices {
            let name = device.name.as_deref().unwrap_or("Unknown");
            let rssi = device
                .rssi
                .map(|r| format!("{} dBm", r))
                .unwrap_or_else(|| "N/A".to_string());

            println!("  {}", name);
            println!("    Identifier: {}", device.identifier);
            println!("    RSSI: {}", rssi);
            println!(
                "    Service advertised: {}",
                if device.advertises_service { "yes" } else { "no" }
            );
        }
    }

    Ok(())
}
