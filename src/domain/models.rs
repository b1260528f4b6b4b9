use crate::domain::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user action recognized on the controller.
///
/// Gestures own all of their data, so they can be handed to any consumer
/// (including other tasks) once produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    // Button
    ButtonPress,
    ButtonRelease,

    // Touch surface
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    TouchLeft,
    TouchRight,
    TouchTop,
    TouchBottom,
    LongTouchLeft,
    LongTouchRight,
    LongTouchTop,
    LongTouchBottom,

    /// Signed ring rotation since the previous notification
    Rotation(i16),

    /// Battery charge in percent
    BatteryLevel(u32),
}

/// Physical channel a notification arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Button,
    Touch,
    Rotation,
    Fly,
    Battery,
}

impl SignalSource {
    pub const ALL: [SignalSource; 5] = [
        SignalSource::Button,
        SignalSource::Touch,
        SignalSource::Rotation,
        SignalSource::Fly,
        SignalSource::Battery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Touch => "touch",
            Self::Rotation => "rotation",
            Self::Fly => "fly",
            Self::Battery => "battery",
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownSourceName(s.to_string()))
    }
}

/// Which device the session should connect to.
///
/// Name and address are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceTarget {
    Name(String),
    Address(u64),
}

impl DeviceTarget {
    /// Build a target from the two optional selectors, requiring exactly one
    pub fn from_parts(name: Option<&str>, address: Option<&str>) -> Result<Self, ConfigError> {
        match (name, address) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingDevice),
            (None, None) => Err(ConfigError::NoDevice),
            (Some(name), None) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ConfigError::NoDevice);
                }
                Ok(Self::Name(name.to_string()))
            }
            (None, Some(address)) => parse_address(address).map(Self::Address),
        }
    }

    pub fn matches(&self, name: &str, address: u64) -> bool {
        match self {
            Self::Name(wanted) => wanted == name,
            Self::Address(wanted) => *wanted == address,
        }
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name '{}'", name),
            Self::Address(address) => write!(f, "address '{}'", format_address(*address)),
        }
    }
}

/// Parse a MAC address such as `AA:BB:CC:DD:EE:FF` into its 48-bit value
pub fn parse_address(text: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidAddress(text.to_string());

    let parts: Vec<&str> = text.trim().split([':', '-']).collect();
    if parts.len() != 6 {
        return Err(invalid());
    }

    let mut address = 0u64;
    for part in parts {
        if part.len() != 2 {
            return Err(invalid());
        }
        let octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        address = (address << 8) | octet as u64;
    }
    Ok(address)
}

pub fn format_address(address: u64) -> String {
    let bytes = address.to_be_bytes();
    bytes[2..]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Lifecycle of a device session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Discovering,
    ConnectedSubscribing,
    Active,
    Terminated,
}

/// Why an active session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    StopRequested,
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("AA:BB:CC:DD:EE:FF").unwrap(), 0xAABB_CCDD_EEFF);
        assert_eq!(parse_address("01-02-03-04-05-06").unwrap(), 0x0102_0304_0506);
        assert!(parse_address("AA:BB:CC:DD:EE").is_err());
        assert!(parse_address("AA:BB:CC:DD:EE:GG").is_err());
        assert!(parse_address("AAA:BB:CC:DD:EE:F").is_err());
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(0xAABB_CCDD_EEFF), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_device_target_exclusive() {
        assert!(matches!(
            DeviceTarget::from_parts(Some("Nuimo"), Some("AA:BB:CC:DD:EE:FF")),
            Err(ConfigError::ConflictingDevice)
        ));
        assert!(matches!(
            DeviceTarget::from_parts(None, None),
            Err(ConfigError::NoDevice)
        ));
        assert_eq!(
            DeviceTarget::from_parts(Some("Nuimo"), None).unwrap(),
            DeviceTarget::Name("Nuimo".to_string())
        );
        assert_eq!(
            DeviceTarget::from_parts(None, Some("AA:BB:CC:DD:EE:FF")).unwrap(),
            DeviceTarget::Address(0xAABB_CCDD_EEFF)
        );
    }

    #[test]
    fn test_signal_source_from_str() {
        assert_eq!("Rotation".parse::<SignalSource>().unwrap(), SignalSource::Rotation);
        assert!("led".parse::<SignalSource>().is_err());
    }
}
