//! Gesture Decoders
//!
//! One pure decoder per signal source. Each takes the raw notification
//! payload and yields at most one gesture.
//!
//! # Payload layouts
//!
//! ```text
//! button   : [state]            0 = released, anything else = pressed
//! touch    : [code, ..]         index into TOUCH_GESTURES, unknown codes ignored
//! rotation : [lo, hi, ..]       i16 little-endian, two's complement
//! fly      : [..]               not decoded
//! battery  : [b0, b1, ..]       unsigned big-endian percentage
//! ```

use crate::domain::error::DecodeError;
use crate::domain::models::{Gesture, SignalSource};
use tracing::debug;

/// Signature shared by every decoder
pub type Decoder = fn(&[u8]) -> Result<Option<Gesture>, DecodeError>;

/// Touch codes in firmware order
pub const TOUCH_GESTURES: [Gesture; 12] = [
    Gesture::SwipeLeft,
    Gesture::SwipeRight,
    Gesture::SwipeUp,
    Gesture::SwipeDown,
    Gesture::TouchLeft,
    Gesture::TouchRight,
    Gesture::TouchTop,
    Gesture::TouchBottom,
    Gesture::LongTouchLeft,
    Gesture::LongTouchRight,
    Gesture::LongTouchTop,
    Gesture::LongTouchBottom,
];

/// Minimum payload length each source requires
pub fn min_payload_len(source: SignalSource) -> usize {
    match source {
        SignalSource::Button => 1,
        SignalSource::Touch => 1,
        SignalSource::Rotation => 2,
        SignalSource::Fly => 0,
        SignalSource::Battery => 1,
    }
}

/// The decoder responsible for a source.
///
/// Exhaustive over [`SignalSource`], so a new source fails to build until
/// it has a decoder.
pub fn decoder_for(source: SignalSource) -> Decoder {
    match source {
        SignalSource::Button => decode_button,
        SignalSource::Touch => decode_touch,
        SignalSource::Rotation => decode_rotation,
        SignalSource::Fly => decode_fly,
        SignalSource::Battery => decode_battery,
    }
}

fn require(source: SignalSource, data: &[u8]) -> Result<(), DecodeError> {
    let expected = min_payload_len(source);
    if data.len() < expected {
        return Err(DecodeError::MalformedPayload {
            signal: source,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

pub fn decode_button(data: &[u8]) -> Result<Option<Gesture>, DecodeError> {
    require(SignalSource::Button, data)?;
    let gesture = if data[0] == 0 {
        Gesture::ButtonRelease
    } else {
        Gesture::ButtonPress
    };
    Ok(Some(gesture))
}

pub fn decode_touch(data: &[u8]) -> Result<Option<Gesture>, DecodeError> {
    require(SignalSource::Touch, data)?;
    let gesture = TOUCH_GESTURES.get(data[0] as usize).copied();
    if gesture.is_none() {
        debug!("Ignoring unknown touch code {}", data[0]);
    }
    Ok(gesture)
}

pub fn decode_rotation(data: &[u8]) -> Result<Option<Gesture>, DecodeError> {
    require(SignalSource::Rotation, data)?;
    // High bit of the second byte marks a negative delta
    let delta = i16::from_le_bytes([data[0], data[1]]);
    Ok(Some(Gesture::Rotation(delta)))
}

/// Fly gestures are registered but not decoded yet; every payload is
/// accepted and yields nothing.
pub fn decode_fly(data: &[u8]) -> Result<Option<Gesture>, DecodeError> {
    require(SignalSource::Fly, data)?;
    debug!("Fly gesture not decoded ({} bytes)", data.len());
    Ok(None)
}

pub fn decode_battery(data: &[u8]) -> Result<Option<Gesture>, DecodeError> {
    require(SignalSource::Battery, data)?;
    // Saturates rather than wraps on payloads wider than 32 bits
    let level = data.iter().fold(0u32, |acc, &b| {
        acc.saturating_mul(256).saturating_add(b as u32)
    });
    Ok(Some(Gesture::BatteryLevel(level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button() {
        for b in 0..=u8::MAX {
            let expected = if b == 0 {
                Gesture::ButtonRelease
            } else {
                Gesture::ButtonPress
            };
            assert_eq!(decode_button(&[b]).unwrap(), Some(expected));
            assert_eq!(decode_button(&[b, 0xFF, 0x00]).unwrap(), Some(expected));
        }
    }

    #[test]
    fn test_touch_table() {
        for (i, gesture) in TOUCH_GESTURES.iter().enumerate() {
            assert_eq!(decode_touch(&[i as u8]).unwrap(), Some(*gesture));
            assert_eq!(decode_touch(&[i as u8, 0x42, 0x13]).unwrap(), Some(*gesture));
        }
        assert_eq!(decode_touch(&[0]).unwrap(), Some(Gesture::SwipeLeft));
        assert_eq!(decode_touch(&[11]).unwrap(), Some(Gesture::LongTouchBottom));
    }

    #[test]
    fn test_touch_unknown_code() {
        for code in 12..=u8::MAX {
            assert_eq!(decode_touch(&[code]).unwrap(), None);
        }
    }

    #[test]
    fn test_rotation_known_values() {
        assert_eq!(decode_rotation(&[0xFF, 0xFF]).unwrap(), Some(Gesture::Rotation(-1)));
        assert_eq!(decode_rotation(&[0x01, 0x00]).unwrap(), Some(Gesture::Rotation(1)));
        assert_eq!(
            decode_rotation(&[0x00, 0x80]).unwrap(),
            Some(Gesture::Rotation(-32768))
        );
        assert_eq!(
            decode_rotation(&[0xFF, 0x7F]).unwrap(),
            Some(Gesture::Rotation(32767))
        );
    }

    #[test]
    fn test_rotation_every_i16() {
        for v in i16::MIN..=i16::MAX {
            let bytes = v.to_le_bytes();
            assert_eq!(decode_rotation(&bytes).unwrap(), Some(Gesture::Rotation(v)));
        }
    }

    #[test]
    fn test_battery() {
        assert_eq!(decode_battery(&[0x64]).unwrap(), Some(Gesture::BatteryLevel(100)));
        assert_eq!(decode_battery(&[0x00]).unwrap(), Some(Gesture::BatteryLevel(0)));
        assert_eq!(
            decode_battery(&[0x01, 0x00]).unwrap(),
            Some(Gesture::BatteryLevel(256))
        );
        assert_eq!(
            decode_battery(&[0x01, 0, 0, 0, 0]).unwrap(),
            Some(Gesture::BatteryLevel(u32::MAX))
        );
    }

    #[test]
    fn test_fly_yields_nothing() {
        assert_eq!(decode_fly(&[]).unwrap(), None);
        assert_eq!(decode_fly(&[0x01, 0x02]).unwrap(), None);
    }

    #[test]
    fn test_short_payloads() {
        for source in SignalSource::ALL {
            let decode = decoder_for(source);
            let min = min_payload_len(source);
            for len in 0..min {
                let data = vec![0u8; len];
                assert_eq!(
                    decode(&data),
                    Err(DecodeError::MalformedPayload {
                        signal: source,
                        expected: min,
                        actual: len,
                    })
                );
            }
        }
        assert!(decode_rotation(&[0x01]).is_err());
        assert!(decode_button(&[]).is_err());
    }
}
