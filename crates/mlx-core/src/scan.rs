//! Device discovery and scanning.
//!
//! Sensors are selected by exact advertised name; the service UUID is only
//! reported, since not every stack includes it in scan results.

use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use serde::Serialize;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::error::{DeviceNotFoundReason, Error, Result};
use crate::util::{create_identifier, name_matches};
use mlx_types::uuids::{DEVICE_NAME_FILTER, MLX_SERVICE};

/// How often known peripherals are checked while waiting for a sensor.
const FIND_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Information about a discovered device.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDevice {
    /// Advertised local name.
    pub name: Option<String>,
    /// The peripheral ID for connecting.
    #[serde(skip)]
    pub id: PeripheralId,
    /// A connection identifier (peripheral ID on macOS, address on other platforms).
    pub identifier: String,
    /// RSSI signal strength.
    pub rssi: Option<i16>,
    /// Whether the sensor service UUID was advertised.
    pub advertises_service: bool,
}

/// Options for scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How long to scan for devices.
    pub duration: Duration,
    /// Exact name to match; `None` lists every device.
    pub name_filter: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
            name_filter: Some(DEVICE_NAME_FILTER.to_string()),
        }
    }
}

impl ScanOptions {
    /// Create new scan options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set scan duration in seconds.
    #[must_use]
    pub fn duration_secs(mut self, secs: u64) -> Self {
        self.duration = Duration::from_secs(secs);
        self
    }

    /// Match this exact advertised name.
    #[must_use]
    pub fn name_filter(mut self, name: impl Into<String>) -> Self {
        self.name_filter = Some(name.into());
        self
    }

    /// List every BLE device, not just sensors.
    #[must_use]
    pub fn all_devices(mut self) -> Self {
        self.name_filter = None;
        self
    }
}

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters
        .into_iter()
        .next()
        .ok_or(Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter))
}

/// Scan for devices with custom options.
///
/// An empty list indicates no devices were found (not an error).
pub async fn scan_with_options(options: ScanOptions) -> Result<Vec<DiscoveredDevice>> {
    let adapter = get_adapter().await?;
    scan_with_adapter(&adapter, &options).await
}

/// Scan for devices using a specific adapter.
pub async fn scan_with_adapter(
    adapter: &Adapter,
    options: &ScanOptions,
) -> Result<Vec<DiscoveredDevice>> {
    info!(
        "Starting BLE scan for {} seconds...",
        options.duration.as_secs()
    );

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    let peripherals = adapter.peripherals().await?;
    let mut discovered = Vec::new();

    for peripheral in peripherals {
        match process_peripheral(&peripheral, options.name_filter.as_deref()).await {
            Ok(Some(device)) => {
                debug!("Found device: {:?}", device.name);
                discovered.push(device);
            }
            Ok(None) => {}
            Err(e) => {
                debug!("Error processing peripheral: {}", e);
            }
        }
    }

    info!("Scan complete. Found {} device(s)", discovered.len());
    Ok(discovered)
}

async fn process_peripheral(
    peripheral: &Peripheral,
    name_filter: Option<&str>,
) -> Result<Option<DiscoveredDevice>> {
    let Some(properties) = peripheral.properties().await? else {
        return Ok(None);
    };

    let name = properties.local_name.clone();
    if let Some(filter) = name_filter
        && !name_matches(name.as_deref(), filter)
    {
        return Ok(None);
    }

    let id = peripheral.id();
    let identifier = create_identifier(&properties.address.to_string(), &id);

    Ok(Some(DiscoveredDevice {
        name,
        id,
        identifier,
        rssi: properties.rssi,
        advertises_service: properties.services.contains(&MLX_SERVICE),
    }))
}

/// Find the first sensor advertising exactly `name`.
///
/// Checks peripherals the adapter already knows about, then scans for up to
/// `scan_timeout`, returning as soon as a match shows up.
#[tracing::instrument(level = "info", skip_all, fields(name = %name))]
pub async fn find_sensor(name: &str, scan_timeout: Duration) -> Result<(Adapter, Peripheral)> {
    let adapter = get_adapter().await?;

    if let Some(peripheral) = find_peripheral_by_name(&adapter, name).await? {
        info!("Found device in cache (no scan needed)");
        return Ok((adapter, peripheral));
    }

    adapter.start_scan(ScanFilter::default()).await?;
    let deadline = Instant::now() + scan_timeout;
    let found = loop {
        if let Some(peripheral) = find_peripheral_by_name(&adapter, name).await? {
            break Some(peripheral);
        }
        if Instant::now() >= deadline {
            break None;
        }
        sleep(FIND_POLL_INTERVAL).await;
    };

    if let Err(e) = adapter.stop_scan().await {
        debug!("Failed to stop scan: {}", e);
    }

    match found {
        Some(peripheral) => {
            info!("Found device");
            Ok((adapter, peripheral))
        }
        None => {
            warn!("No device named '{}' after {:?}", name, scan_timeout);
            Err(Error::device_not_found(name))
        }
    }
}

async fn find_peripheral_by_name(adapter: &Adapter, name: &str) -> Result<Option<Peripheral>> {
    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        if let Ok(Some(props)) = peripheral.properties().await
            && name_matches(props.local_name.as_deref(), name)
        {
            debug!("Matched by name: {}", name);
            return Ok(Some(peripheral));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_options_default() {
        let options = ScanOptions::default();
        assert_eq!(options.duration, Duration::from_secs(10));
        assert_eq!(options.name_filter.as_deref(), Some("MLX R"));
    }

    #[test]
    fn test_scan_options_builder() {
        let options = ScanOptions::new().duration_secs(3).name_filter("Bench R");
        assert_eq!(options.duration, Duration::from_secs(3));
        assert_eq!(options.name_filter.as_deref(), Some("Bench R"));

        let options = options.all_devices();
        assert!(options.name_filter.is_none());
    }
}
