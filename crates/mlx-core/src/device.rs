//! Sensor connection and notification plumbing.
//!
//! A [`Device`] is a live GATT link to one sensor board with the sample
//! characteristic already resolved. [`BleConnector`] wraps discovery and
//! connection for the session worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Characteristic, Peripheral as _, PeripheralProperties};
use btleplug::platform::{Adapter, Peripheral};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{DeviceEvent, DeviceId, DisconnectReason, EventDispatcher, EventReceiver};
use crate::scan::find_sensor;
use crate::traits::{Connector, NotificationHandler, SensorDevice};
use crate::util::{create_identifier, format_peripheral_id};
use mlx_types::uuids::{DEVICE_NAME_FILTER, MLX_SERVICE, SAMPLE_CHARACTERISTIC};

/// Default timeout for BLE connection operations.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for service discovery.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for subscribe/unsubscribe.
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time to look for the sensor before giving up.
const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for BLE connection timeouts.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use mlx_core::device::ConnectionConfig;
///
/// let config = ConnectionConfig::default()
///     .connection_timeout(Duration::from_secs(20))
///     .operation_timeout(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing a BLE connection.
    pub connection_timeout: Duration,
    /// Timeout for service discovery after connection.
    pub discovery_timeout: Duration,
    /// Timeout for enabling or disabling notifications.
    pub operation_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    /// Create a new connection config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the service discovery timeout.
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the subscribe/unsubscribe timeout.
    #[must_use]
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Reject zero timeouts.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("connection_timeout", self.connection_timeout),
            ("discovery_timeout", self.discovery_timeout),
            ("operation_timeout", self.operation_timeout),
        ] {
            if value.is_zero() {
                return Err(Error::invalid_config(format!("{label} must be non-zero")));
            }
        }
        Ok(())
    }
}

/// What to connect to and how long to wait.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Exact advertised name of the sensor.
    pub name: String,
    /// How long to look for the sensor.
    pub scan_timeout: Duration,
    /// Link timeouts.
    pub connection: ConnectionConfig,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            name: DEVICE_NAME_FILTER.to_string(),
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            connection: ConnectionConfig::default(),
        }
    }
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a different advertised name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set how long to look for the sensor.
    #[must_use]
    pub fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set link timeouts.
    #[must_use]
    pub fn connection(mut self, config: ConnectionConfig) -> Self {
        self.connection = config;
        self
    }

    /// Check that the options are usable.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_config("device name must not be empty"));
        }
        if self.scan_timeout.is_zero() {
            return Err(Error::invalid_config("scan_timeout must be non-zero"));
        }
        self.connection.validate()
    }
}

/// A connected sensor board.
///
/// This struct intentionally does not implement `Clone`; share it through
/// `Arc<Device>`. Call [`Device::disconnect`] before dropping it.
pub struct Device {
    /// Kept alive for the lifetime of the peripheral connection.
    #[allow(dead_code)]
    adapter: Adapter,
    peripheral: Peripheral,
    name: Option<String>,
    /// MAC address on Linux/Windows, peripheral UUID on macOS.
    address: String,
    /// The resolved sample characteristic.
    characteristic: Characteristic,
    /// Task forwarding notifications to the active handler.
    notification_task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    /// Task watching adapter events for a dropped link.
    link_watcher: std::sync::Mutex<Option<JoinHandle<()>>>,
    events: EventDispatcher,
    /// Set once the link is gone, by either side.
    disconnected: Arc<AtomicBool>,
    config: ConnectionConfig,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("characteristic", &self.characteristic.uuid)
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Find the sensor by name and connect to it.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mlx_core::device::{ConnectOptions, Device};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let device = Device::connect(&ConnectOptions::default()).await?;
    ///     println!("Connected to {:?}", device);
    ///     device.disconnect().await?;
    ///     Ok(())
    /// }
    /// ```
    #[tracing::instrument(level = "info", skip_all, fields(name = %options.name))]
    pub async fn connect(options: &ConnectOptions) -> Result<Self> {
        options.validate()?;
        let (adapter, peripheral) = find_sensor(&options.name, options.scan_timeout).await?;
        Self::from_peripheral_with_config(adapter, peripheral, options.connection.clone()).await
    }

    /// Connect to an already-discovered peripheral and resolve the sample
    /// characteristic.
    ///
    /// If the connect itself or anything after it fails, the peripheral is
    /// disconnected before the error is returned.
    #[tracing::instrument(level = "info", skip_all, fields(connect_timeout = ?config.connection_timeout))]
    pub async fn from_peripheral_with_config(
        adapter: Adapter,
        peripheral: Peripheral,
        config: ConnectionConfig,
    ) -> Result<Self> {
        info!("Connecting to device...");
        let connected = match timeout(config.connection_timeout, peripheral.connect()).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::timeout("connect to device", config.connection_timeout)),
        };
        // A timed-out or failed attempt may still have a half-open link.
        disconnect_on_error(connected, peripheral.disconnect(), "connect").await?;
        info!("Connected!");

        let (characteristic, properties) = disconnect_on_error(
            resolve_link(&peripheral, &config).await,
            peripheral.disconnect(),
            "setup",
        )
        .await?;
        let name = properties.as_ref().and_then(|p| p.local_name.clone());

        // On macOS the address is 00:00:00:00:00:00, so fall back to the peripheral ID
        let address = properties
            .as_ref()
            .map(|p| create_identifier(&p.address.to_string(), &peripheral.id()))
            .unwrap_or_else(|| format_peripheral_id(&peripheral.id()));

        let events = EventDispatcher::default();
        let disconnected = Arc::new(AtomicBool::new(false));
        let device_id = match &name {
            Some(n) => DeviceId::with_name(address.clone(), n.clone()),
            None => DeviceId::new(address.clone()),
        };
        let link_watcher = spawn_link_watcher(
            &adapter,
            &peripheral,
            device_id,
            events.clone(),
            disconnected.clone(),
        )
        .await;

        Ok(Self {
            adapter,
            peripheral,
            name,
            address,
            characteristic,
            notification_task: tokio::sync::Mutex::new(None),
            link_watcher: std::sync::Mutex::new(link_watcher),
            events,
            disconnected,
            config,
        })
    }

    /// Check if the device is connected (queries BLE stack state).
    pub async fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::SeqCst)
            && self.peripheral.is_connected().await.unwrap_or(false)
    }

    /// Get the device name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the device address or identifier.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the current connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Enable notifications and forward each payload to `handler`.
    ///
    /// A previously registered handler is dropped first.
    pub async fn subscribe_to_notifications(&self, handler: NotificationHandler) -> Result<()> {
        self.stop_notification_task().await;

        let op_timeout = self.config.operation_timeout;
        timeout(op_timeout, self.peripheral.subscribe(&self.characteristic))
            .await
            .map_err(|_| Error::timeout("enable notifications", op_timeout))??;

        let mut stream = disconnect_on_error(
            self.peripheral.notifications().await.map_err(Error::from),
            self.peripheral.unsubscribe(&self.characteristic),
            "notification stream",
        )
        .await?;
        let char_uuid = self.characteristic.uuid;
        let handle = tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                if notification.uuid == char_uuid {
                    handler(&notification.value);
                }
            }
        });

        *self.notification_task.lock().await = Some(handle);
        debug!("Notifications enabled on {}", char_uuid);
        Ok(())
    }

    /// Drop the handler and disable notifications.
    pub async fn unsubscribe_from_notifications(&self) -> Result<()> {
        self.stop_notification_task().await;

        let op_timeout = self.config.operation_timeout;
        timeout(op_timeout, self.peripheral.unsubscribe(&self.characteristic))
            .await
            .map_err(|_| Error::timeout("disable notifications", op_timeout))??;
        debug!("Notifications disabled");
        Ok(())
    }

    /// Disconnect from the device.
    ///
    /// Aborts the notification and link-watch tasks, then drops the BLE link.
    #[tracing::instrument(level = "info", skip(self), fields(device_name = ?self.name))]
    pub async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from device...");
        self.disconnected.store(true, Ordering::SeqCst);

        self.stop_notification_task().await;
        self.stop_link_watcher();

        self.peripheral.disconnect().await?;
        Ok(())
    }

    async fn stop_notification_task(&self) {
        if let Some(handle) = self.notification_task.lock().await.take() {
            handle.abort();
        }
    }

    fn stop_link_watcher(&self) {
        if let Ok(mut watcher) = self.link_watcher.lock()
            && let Some(handle) = watcher.take()
        {
            handle.abort();
        }
    }
}

/// Hand `result` back, running `cleanup` first when it is an error.
///
/// Cleanup failures are logged and otherwise ignored; the original error wins.
async fn disconnect_on_error<T, E>(
    result: Result<T>,
    cleanup: impl Future<Output = std::result::Result<(), E>>,
    step: &str,
) -> Result<T>
where
    E: std::fmt::Display,
{
    if let Err(e) = &result {
        debug!(step, error = %e, "Releasing partial link");
        if let Err(cleanup_err) = cleanup.await {
            debug!(step, error = %cleanup_err, "Cleanup after failure failed");
        }
    }
    result
}

/// Resolve everything a [`Device`] needs from a freshly connected peripheral.
async fn resolve_link(
    peripheral: &Peripheral,
    config: &ConnectionConfig,
) -> Result<(Characteristic, Option<PeripheralProperties>)> {
    let characteristic = resolve_characteristic(peripheral, config).await?;
    let properties = peripheral.properties().await?;
    Ok((characteristic, properties))
}

/// Discover services and locate the sample characteristic.
async fn resolve_characteristic(
    peripheral: &Peripheral,
    config: &ConnectionConfig,
) -> Result<Characteristic> {
    info!("Discovering services...");
    timeout(config.discovery_timeout, peripheral.discover_services())
        .await
        .map_err(|_| Error::timeout("discover services", config.discovery_timeout))??;

    let services = peripheral.services();
    debug!("Found {} services", services.len());

    let service = services
        .iter()
        .find(|s| s.uuid == MLX_SERVICE)
        .ok_or_else(|| Error::service_not_found(MLX_SERVICE.to_string()))?;

    service
        .characteristics
        .iter()
        .find(|c| c.uuid == SAMPLE_CHARACTERISTIC)
        .cloned()
        .ok_or_else(|| {
            Error::characteristic_not_found(SAMPLE_CHARACTERISTIC.to_string(), services.len())
        })
}

/// Watch adapter events and publish a disconnect when this peripheral drops.
///
/// Returns `None` if the adapter event stream is unavailable; the link then
/// only ends through an explicit disconnect.
async fn spawn_link_watcher(
    adapter: &Adapter,
    peripheral: &Peripheral,
    device: DeviceId,
    events: EventDispatcher,
    disconnected: Arc<AtomicBool>,
) -> Option<JoinHandle<()>> {
    let mut stream = match adapter.events().await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Adapter events unavailable, link loss will go unnoticed: {}", e);
            return None;
        }
    };
    let peripheral_id = peripheral.id();

    Some(tokio::spawn(async move {
        while let Some(event) = stream.next().await {
            if let CentralEvent::DeviceDisconnected(id) = event
                && id == peripheral_id
            {
                if !disconnected.swap(true, Ordering::SeqCst) {
                    info!(device = %device.id, "Link lost");
                    events.send(DeviceEvent::Disconnected {
                        device,
                        reason: DisconnectReason::LinkLost,
                    });
                }
                break;
            }
        }
    }))
}

#[async_trait]
impl SensorDevice for Device {
    async fn is_connected(&self) -> bool {
        Device::is_connected(self).await
    }

    async fn disconnect(&self) -> Result<()> {
        Device::disconnect(self).await
    }

    fn name(&self) -> Option<&str> {
        Device::name(self)
    }

    fn address(&self) -> &str {
        Device::address(self)
    }

    async fn subscribe(&self, handler: NotificationHandler) -> Result<()> {
        self.subscribe_to_notifications(handler).await
    }

    async fn unsubscribe(&self) -> Result<()> {
        self.unsubscribe_from_notifications().await
    }

    fn events(&self) -> EventReceiver {
        self.events.subscribe()
    }
}

// Best-effort cleanup if disconnect() was never called. The BLE disconnect
// is spawned and may not complete during shutdown.
impl Drop for Device {
    fn drop(&mut self) {
        if self.disconnected.swap(true, Ordering::SeqCst) {
            return;
        }

        warn!(
            device_name = ?self.name,
            device_address = %self.address,
            "Device dropped without calling disconnect() - performing best-effort cleanup"
        );

        if let Ok(mut task) = self.notification_task.try_lock()
            && let Some(handle) = task.take()
        {
            handle.abort();
        }
        self.stop_link_watcher();

        let peripheral = self.peripheral.clone();
        let address = self.address.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = peripheral.disconnect().await {
                    debug!(device_address = %address, error = %e, "Best-effort disconnect failed");
                } else {
                    debug!(device_address = %address, "Best-effort disconnect completed");
                }
            });
        }
    }
}

/// [`Connector`] backed by a real Bluetooth adapter.
#[derive(Debug, Clone, Default)]
pub struct BleConnector {
    options: ConnectOptions,
}

impl BleConnector {
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }
}

#[async_trait]
impl Connector for BleConnector {
    async fn connect(&self) -> Result<Arc<dyn SensorDevice>> {
        let device: Arc<dyn SensorDevice> = Arc::new(Device::connect(&self.options).await?);
        Ok(device)
    }
}
