//! Nuimo Controller Protocol
//!
//! GATT identifiers of the controller and their mapping onto signal sources.

use crate::domain::models::SignalSource;
use anyhow::Result;

/// Nuimo primary service
pub const NUIMO_SERVICE_UUID: &str = "f29b1525-cb19-40f3-be5c-7241ecb82fd2";

pub const BUTTON_CHAR_UUID: &str = "f29b1529-cb19-40f3-be5c-7241ecb82fd2";
pub const TOUCH_CHAR_UUID: &str = "f29b1527-cb19-40f3-be5c-7241ecb82fd2";
pub const ROTATION_CHAR_UUID: &str = "f29b1528-cb19-40f3-be5c-7241ecb82fd2";
pub const FLY_CHAR_UUID: &str = "f29b1526-cb19-40f3-be5c-7241ecb82fd2";

/// Standard Battery Level characteristic
pub const BATTERY_CHAR_UUID: &str = "00002a19-0000-1000-8000-00805f9b34fb";

/// Services the controller exposes, with display names
pub const KNOWN_SERVICES: &[(&str, &str)] = &[
    (NUIMO_SERVICE_UUID, "Nuimo"),
    ("f29b1523-cb19-40f3-be5c-7241ecb82fd1", "Legacy LED Matrix"),
    ("00001801-0000-1000-8000-00805f9b34fb", "Generic Attribute"),
    ("0000180a-0000-1000-8000-00805f9b34fb", "Device Information"),
    ("0000180f-0000-1000-8000-00805f9b34fb", "Battery"),
];

pub fn service_name(uuid: u128) -> Option<&'static str> {
    KNOWN_SERVICES
        .iter()
        .find(|(known, _)| parse_uuid(known).ok() == Some(uuid))
        .map(|(_, name)| *name)
}

/// Notify characteristic carrying a source
pub fn characteristic_uuid(source: SignalSource) -> &'static str {
    match source {
        SignalSource::Button => BUTTON_CHAR_UUID,
        SignalSource::Touch => TOUCH_CHAR_UUID,
        SignalSource::Rotation => ROTATION_CHAR_UUID,
        SignalSource::Fly => FLY_CHAR_UUID,
        SignalSource::Battery => BATTERY_CHAR_UUID,
    }
}

/// Source carried by a characteristic, if any
pub fn source_for_uuid(uuid: u128) -> Option<SignalSource> {
    SignalSource::ALL
        .into_iter()
        .find(|source| parse_uuid(characteristic_uuid(*source)).ok() == Some(uuid))
}

/// Parse a textual UUID into its 128-bit value
pub fn parse_uuid(uuid_str: &str) -> Result<u128> {
    let hex = uuid_str.trim().replace('-', "");

    if hex.len() != 32 {
        return Err(anyhow::anyhow!("Invalid UUID format: {}", uuid_str));
    }

    Ok(u128::from_str_radix(&hex, 16)?)
}

pub fn format_uuid(uuid: u128) -> String {
    let hex = format!("{:032x}", uuid);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
