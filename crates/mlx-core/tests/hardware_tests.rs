//! Hardware integration tests for mlx-core
//!
//! These tests require a powered sensor board in range and should be run with:
//! ```
//! cargo test --package mlx-core --test hardware_tests -- --ignored --nocapture
//! ```
//!
//! Set `MLX_DEVICE` to match a board advertising a different name:
//! ```
//! MLX_DEVICE="MLX R" cargo test --package mlx-core --test hardware_tests -- --ignored --nocapture
//! ```

use std::env;
use std::sync::Arc;
use std::time::Duration;

use mlx_core::scan::{ScanOptions, scan_with_options};
use mlx_core::{ConnectOptions, Device, SampleSlot};
use mlx_types::epoch_millis_now;
use mlx_types::uuids::DEVICE_NAME_FILTER;
use tokio::time::{sleep, timeout};

/// Default timeout for BLE operations
const BLE_TIMEOUT: Duration = Duration::from_secs(30);

fn device_name() -> String {
    env::var("MLX_DEVICE")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEVICE_NAME_FILTER.to_string())
}

// =============================================================================
// Scan Tests
// =============================================================================

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_scan_discovers_sensor() {
    let options = ScanOptions::default()
        .duration_secs(10)
        .name_filter(device_name());

    let result = timeout(BLE_TIMEOUT, scan_with_options(options)).await;

    match result {
        Ok(Ok(devices)) => {
            println!("Scan discovered {} sensor(s):", devices.len());
            for device in &devices {
                println!(
                    "  - {} ({})",
                    device.name.as_deref().unwrap_or("Unknown"),
                    device.identifier
                );
            }
        }
        Ok(Err(e)) => panic!("Scan failed: {}", e),
        Err(_) => panic!("Scan timed out"),
    }
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_scan_unfiltered() {
    let options = ScanOptions::default().duration_secs(5).all_devices();

    let result = timeout(Duration::from_secs(15), scan_with_options(options)).await;

    match result {
        Ok(Ok(devices)) => println!("Unfiltered scan found {} devices", devices.len()),
        Ok(Err(e)) => panic!("Unfiltered scan failed: {}", e),
        Err(_) => panic!("Unfiltered scan timed out"),
    }
}

// =============================================================================
// Connection Tests
// =============================================================================

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_connect_disconnect_cycle() {
    let options = ConnectOptions::new().name(device_name());

    let device = match timeout(BLE_TIMEOUT, Device::connect(&options)).await {
        Ok(Ok(d)) => d,
        Ok(Err(e)) => panic!("Failed to connect: {}", e),
        Err(_) => panic!("Connection timed out"),
    };
    println!("Connected to {}", device.address());
    assert!(device.is_connected().await);

    let result = timeout(Duration::from_secs(5), device.disconnect()).await;
    assert!(result.is_ok(), "Disconnect should complete without timeout");
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_notifications_deliver_frames() {
    let options = ConnectOptions::new().name(device_name());
    let device = timeout(BLE_TIMEOUT, Device::connect(&options))
        .await
        .expect("Connect timeout")
        .expect("Connect failed");

    let slot = SampleSlot::new();
    let sink = slot.clone();
    device
        .subscribe_to_notifications(Arc::new(move |payload| {
            sink.offer(payload, epoch_millis_now());
        }))
        .await
        .expect("Subscribe failed");

    sleep(Duration::from_secs(3)).await;

    let sample = slot.take().expect("No frame within 3 seconds");
    println!(
        "ambient {} °C, object {} °C, uptime {} ms",
        sample.ambient_c, sample.object_c, sample.sensor_elapsed_ms
    );
    assert!(sample.ambient_c.is_finite());
    assert!(sample.object_c.is_finite());

    let _ = device.unsubscribe_from_notifications().await;
    let _ = device.disconnect().await;
}
