//! Trait abstractions for sensor links.
//!
//! [`SensorDevice`] abstracts over the real Bluetooth device and the mock
//! used in tests and simulation. [`Connector`] abstracts over how a link is
//! obtained, so the session worker never talks to btleplug directly.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::events::EventReceiver;

/// Callback invoked with each raw notification payload.
///
/// Called from the transport's notification task; it must not block.
pub type NotificationHandler = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Operations on a connected sensor.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use mlx_core::{SensorDevice, SampleSlot, Result};
///
/// async fn watch(device: &dyn SensorDevice, slot: SampleSlot) -> Result<()> {
///     device
///         .subscribe(Arc::new(move |payload| {
///             slot.offer(payload, mlx_types::epoch_millis_now());
///         }))
///         .await
/// }
/// ```
#[async_trait]
pub trait SensorDevice: Send + Sync {
    /// Check if the device is connected.
    async fn is_connected(&self) -> bool;

    /// Disconnect from the device.
    async fn disconnect(&self) -> Result<()>;

    /// Get the device name, if available.
    fn name(&self) -> Option<&str>;

    /// Get the device address or identifier.
    ///
    /// On Linux/Windows this is typically the MAC address.
    /// On macOS this is a UUID since MAC addresses are not exposed.
    fn address(&self) -> &str;

    /// Enable notifications on the sample characteristic and route each
    /// payload to `handler`. Replaces any previous handler.
    async fn subscribe(&self, handler: NotificationHandler) -> Result<()>;

    /// Disable notifications and drop the handler.
    async fn unsubscribe(&self) -> Result<()>;

    /// Subscribe to link events (disconnects initiated by the device side).
    fn events(&self) -> EventReceiver;
}

/// Produces connected sensor links.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Discover, connect and resolve the sample characteristic.
    ///
    /// On failure nothing stays connected.
    async fn connect(&self) -> Result<Arc<dyn SensorDevice>>;
}
