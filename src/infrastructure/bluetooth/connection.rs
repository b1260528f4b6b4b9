//! BLE Connection Module
//!
//! Opens the device, walks its GATT services and wires notify
//! characteristics into the dispatch engine.

use crate::domain::dispatch::DispatchHandle;
use crate::domain::models::{format_address, SignalSource};
use crate::infrastructure::bluetooth::protocol;
use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattCharacteristicProperties,
    GattClientCharacteristicConfigurationDescriptorValue, GattCommunicationStatus,
    GattValueChangedEventArgs,
};
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Foundation::TypedEventHandler;
use windows::Storage::Streams::{DataReader, IBuffer};

/// Configuration for connection behavior
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Only enumerate these services; empty means all
    pub services: Vec<u128>,
}

/// Open link to one controller
pub struct BleConnection {
    device: BluetoothLEDevice,
    characteristics: HashMap<SignalSource, GattCharacteristic>,
    value_tokens: Vec<(GattCharacteristic, i64)>,
    status_token: Option<i64>,
}

impl BleConnection {
    /// Connect to a device by Bluetooth address and enumerate its services
    pub async fn open(address: u64, config: &ConnectionConfig) -> Result<Self> {
        info!("Connecting to Bluetooth device: {}", format_address(address));

        let device = BluetoothLEDevice::FromBluetoothAddressAsync(address)?.await?;
        info!("Device connected: {}", device.Name()?);

        let characteristics = Self::enumerate(&device, config).await?;

        Ok(Self {
            device,
            characteristics,
            value_tokens: Vec::new(),
            status_token: None,
        })
    }

    /// Log the service tree and collect notify characteristics by source
    async fn enumerate(
        device: &BluetoothLEDevice,
        config: &ConnectionConfig,
    ) -> Result<HashMap<SignalSource, GattCharacteristic>> {
        let services_result = device.GetGattServicesAsync()?.await?;
        if services_result.Status()? != GattCommunicationStatus::Success {
            error!(
                "Failed to get GATT services: {:?}",
                services_result.Status()?
            );
            anyhow::bail!("Failed to get GATT services");
        }

        let mut found = HashMap::new();
        let services = services_result.Services()?;

        for i in 0..services.Size()? {
            let service = services.GetAt(i)?;
            let service_uuid = service.Uuid()?.to_u128();

            if !config.services.is_empty() && !config.services.contains(&service_uuid) {
                debug!("[Service] {} skipped", protocol::format_uuid(service_uuid));
                continue;
            }
            info!(
                "[Service] {} ({})",
                protocol::format_uuid(service_uuid),
                protocol::service_name(service_uuid).unwrap_or("Unknown")
            );

            let chars_result = service.GetCharacteristicsAsync()?.await?;
            if chars_result.Status()? != GattCommunicationStatus::Success {
                error!("  Failed to get characteristics: {:?}", chars_result.Status()?);
                continue;
            }

            let characteristics = chars_result.Characteristics()?;
            for j in 0..characteristics.Size()? {
                let c = characteristics.GetAt(j)?;
                let uuid = c.Uuid()?.to_u128();
                let properties = c.CharacteristicProperties()?;

                if has_property(properties, GattCharacteristicProperties::Notify) {
                    match protocol::source_for_uuid(uuid) {
                        Some(source) => {
                            info!(
                                "  [Characteristic] {} ({}), Notify",
                                protocol::format_uuid(uuid),
                                source
                            );
                            found.insert(source, c);
                        }
                        None => info!(
                            "  [Characteristic] {}, Notify (no decoder)",
                            protocol::format_uuid(uuid)
                        ),
                    }
                } else if has_property(properties, GattCharacteristicProperties::Read) {
                    log_read_value(&c, uuid).await;
                } else {
                    info!("  [Characteristic] {}", protocol::format_uuid(uuid));
                }
            }
        }

        Ok(found)
    }

    /// Enable notifications for `source` and forward them to `handle`
    pub async fn subscribe(&mut self, source: SignalSource, handle: DispatchHandle) -> Result<bool> {
        let Some(characteristic) = self.characteristics.get(&source).cloned() else {
            return Ok(false);
        };

        let data_handler = TypedEventHandler::new(
            move |_: windows::core::Ref<GattCharacteristic>,
                  args: windows::core::Ref<GattValueChangedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    match buffer_bytes(&args.CharacteristicValue()?) {
                        Ok(data) => {
                            let _ = handle.submit(source, data);
                        }
                        Err(e) => warn!("Could not read {} notification: {}", source, e),
                    }
                }
                Ok(())
            },
        );
        let token = characteristic.ValueChanged(&data_handler)?;
        self.value_tokens.push((characteristic.clone(), token));

        let status = characteristic
            .WriteClientCharacteristicConfigurationDescriptorAsync(
                GattClientCharacteristicConfigurationDescriptorValue::Notify,
            )?
            .await?;
        if status != GattCommunicationStatus::Success {
            anyhow::bail!("Notification subscription returned status: {:?}", status);
        }

        Ok(true)
    }

    /// Send `()` on `link_lost` when the device drops the connection
    pub fn watch_status(&mut self, link_lost: mpsc::UnboundedSender<()>) -> Result<()> {
        let status_handler =
            TypedEventHandler::new(move |dev: windows::core::Ref<BluetoothLEDevice>, _| {
                if let Some(dev) = dev.as_ref() {
                    if dev.ConnectionStatus()? == BluetoothConnectionStatus::Disconnected {
                        let _ = link_lost.send(());
                    }
                }
                Ok(())
            });
        self.status_token = Some(self.device.ConnectionStatusChanged(&status_handler)?);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.device
            .ConnectionStatus()
            .map(|s| s == BluetoothConnectionStatus::Connected)
            .unwrap_or(false)
    }

    /// Detach handlers and release the device
    pub fn close(self) {
        for (characteristic, token) in &self.value_tokens {
            let _ = characteristic.RemoveValueChanged(*token);
        }
        if let Some(token) = self.status_token {
            let _ = self.device.RemoveConnectionStatusChanged(token);
        }
        let _ = self.device.Close();
        info!("Disconnected from device");
    }
}

fn has_property(properties: GattCharacteristicProperties, wanted: GattCharacteristicProperties) -> bool {
    properties.0 & wanted.0 != 0
}

async fn log_read_value(characteristic: &GattCharacteristic, uuid: u128) {
    let read = async {
        let result = characteristic.ReadValueAsync()?.await?;
        if result.Status()? != GattCommunicationStatus::Success {
            anyhow::bail!("read returned status {:?}", result.Status()?);
        }
        buffer_bytes(&result.Value()?)
    };

    match read.await {
        Ok(value) => debug!(
            "  [Characteristic] {}, Value: {:02X?}",
            protocol::format_uuid(uuid),
            value
        ),
        Err(e) => error!(
            "  [Characteristic] {}, Error: {}",
            protocol::format_uuid(uuid),
            e
        ),
    }
}

fn buffer_bytes(buffer: &IBuffer) -> Result<Vec<u8>> {
    let reader = DataReader::FromBuffer(buffer)?;
    let length = reader.UnconsumedBufferLength()? as usize;
    let mut bytes = vec![0u8; length];
    reader.ReadBytes(&mut bytes)?;
    Ok(bytes)
}
