//! Collaborators the gesture pipeline depends on but does not implement.
//!
//! - [`ActionSink`] turns gestures into host side effects.
//! - [`Transport`] finds the device, delivers notifications and reports
//!   link loss.

use crate::domain::dispatch::DispatchHandle;
use crate::domain::models::{DeviceTarget, Gesture, SignalSource};
use async_trait::async_trait;

/// Consumer of decoded gestures.
///
/// Host-side failures are the sink's own concern: they are logged and
/// swallowed, never returned to the dispatch path. Implementations that
/// are not reentrant must serialize effects internally.
#[async_trait]
pub trait ActionSink: Send + Sync + 'static {
    async fn consume(&self, gesture: Gesture);
}

/// Link-layer access to a single controller
#[async_trait]
pub trait Transport: Send {
    type Device: Send;

    /// Resolve the target to a device handle, or `None` when nothing matched
    async fn discover(&mut self, target: &DeviceTarget) -> anyhow::Result<Option<Self::Device>>;

    /// Connect to the device and enumerate its services
    async fn connect(&mut self, device: Self::Device) -> anyhow::Result<()>;

    /// Start delivering notifications for `source` into `handle`.
    ///
    /// Returns `false` when the device does not expose the source.
    async fn subscribe(
        &mut self,
        source: SignalSource,
        handle: DispatchHandle,
    ) -> anyhow::Result<bool>;

    /// Resolves once the link to the device is lost
    async fn disconnected(&mut self);

    /// Tear the connection down
    async fn close(&mut self);
}
