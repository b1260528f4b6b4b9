//! Bluetooth Service Module
//!
//! WinRT implementation of the session transport: scanning, connection
//! and notification delivery for the Nuimo controller.

use crate::domain::dispatch::DispatchHandle;
use crate::domain::models::{DeviceTarget, SignalSource};
use crate::domain::ports::Transport;
use crate::infrastructure::bluetooth::{
    connection::{BleConnection, ConnectionConfig},
    scanner::{BleScanner, ScannedDevice},
};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Main Bluetooth service coordinating all BLE operations
pub struct BluetoothService {
    scanner: BleScanner,
    scan_timeout: Duration,
    config: ConnectionConfig,
    connection: Option<BleConnection>,
    link_lost: Option<mpsc::UnboundedReceiver<()>>,
}

impl BluetoothService {
    pub fn new(scan_timeout: Duration, config: ConnectionConfig) -> Self {
        Self {
            scanner: BleScanner::new(),
            scan_timeout,
            config,
            connection: None,
            link_lost: None,
        }
    }
}

#[async_trait]
impl Transport for BluetoothService {
    type Device = ScannedDevice;

    async fn discover(&mut self, target: &DeviceTarget) -> Result<Option<ScannedDevice>> {
        self.scanner.find(target, self.scan_timeout).await
    }

    async fn connect(&mut self, device: ScannedDevice) -> Result<()> {
        let mut connection = BleConnection::open(device.address, &self.config).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        connection.watch_status(tx)?;

        self.connection = Some(connection);
        self.link_lost = Some(rx);
        Ok(())
    }

    async fn subscribe(&mut self, source: SignalSource, handle: DispatchHandle) -> Result<bool> {
        match self.connection.as_mut() {
            Some(connection) => connection.subscribe(source, handle).await,
            None => anyhow::bail!("Not connected"),
        }
    }

    async fn disconnected(&mut self) {
        if let Some(connection) = &self.connection {
            if !connection.is_connected() {
                warn!("Device is no longer connected");
                return;
            }
        }
        match self.link_lost.as_mut() {
            Some(link_lost) => {
                link_lost.recv().await;
                info!("Device disconnected");
            }
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        let _ = self.scanner.stop();
        self.link_lost = None;
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}
