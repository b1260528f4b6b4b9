//! BLE Scanner Module
//!
//! Resolves a device name or address from advertisements.

use crate::domain::models::{format_address, DeviceTarget};
use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisementReceivedEventArgs, BluetoothLEAdvertisementWatcher,
    BluetoothLEScanningMode,
};
use windows::Foundation::TypedEventHandler;

/// A device seen while scanning
#[derive(Debug, Clone)]
pub struct ScannedDevice {
    pub name: String,
    pub address: u64,
    pub signal_strength: i16,
}

/// BLE Scanner backed by an advertisement watcher
pub struct BleScanner {
    watcher: Option<BluetoothLEAdvertisementWatcher>,
}

impl BleScanner {
    pub fn new() -> Self {
        Self { watcher: None }
    }

    /// Scan until a device matching `target` advertises, or `timeout` elapses
    pub async fn find(
        &mut self,
        target: &DeviceTarget,
        timeout: Duration,
    ) -> Result<Option<ScannedDevice>> {
        let mut found = self.start()?;
        let deadline = tokio::time::Instant::now() + timeout;

        let result = loop {
            match tokio::time::timeout_at(deadline, found.recv()).await {
                Ok(Some(device)) => {
                    debug!(
                        "Advertisement from '{}' ({}), RSSI {}",
                        device.name,
                        format_address(device.address),
                        device.signal_strength
                    );
                    if target.matches(&device.name, device.address) {
                        info!(
                            "Found '{}' at {}",
                            device.name,
                            format_address(device.address)
                        );
                        break Some(device);
                    }
                }
                Ok(None) | Err(_) => break None,
            }
        };

        self.stop()?;
        Ok(result)
    }

    fn start(&mut self) -> Result<mpsc::UnboundedReceiver<ScannedDevice>> {
        // Stop any existing scan
        self.stop()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let watcher = BluetoothLEAdvertisementWatcher::new()?;
        watcher.SetScanningMode(BluetoothLEScanningMode::Active)?;

        let handler = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let name = args.Advertisement()?.LocalName()?.to_string();
                    let _ = sender.send(ScannedDevice {
                        name,
                        address: args.BluetoothAddress()?,
                        signal_strength: args.RawSignalStrengthInDBm()?,
                    });
                }
                Ok(())
            },
        );

        watcher.Received(&handler)?;
        watcher.Start()?;
        self.watcher = Some(watcher);

        Ok(receiver)
    }

    /// Stop scanning
    pub fn stop(&mut self) -> Result<()> {
        if let Some(watcher) = self.watcher.take() {
            debug!("Stopping BLE scan...");
            watcher.Stop()?;
        }
        Ok(())
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
