//! Error definitions for the gesture pipeline

use crate::domain::models::{DeviceTarget, SignalSource};
use thiserror::Error;

/// Failure to turn a notification into a gesture. Never fatal for a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// No decoder is registered for the source
    #[error("no decoder registered for source '{0}'")]
    UnknownSource(SignalSource),

    /// Payload is shorter than the source requires
    #[error("malformed {signal} payload: expected at least {expected} byte(s), got {actual}")]
    MalformedPayload {
        signal: SignalSource,
        expected: usize,
        actual: usize,
    },
}

/// Notification refused at the dispatch entry point
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("dispatch engine is stopped")]
    Stopped,

    /// Notification dropped because the arrival queue is full
    #[error("dispatch queue is full, {0} notification dropped")]
    QueueFull(SignalSource),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("source '{0}' registered more than once")]
    Duplicate(SignalSource),
}

/// Invalid run configuration, reported before any connection attempt
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("either a device name or a device address must be given")]
    NoDevice,

    #[error("device name and device address are mutually exclusive")]
    ConflictingDevice,

    #[error("invalid device address '{0}', expected AA:BB:CC:DD:EE:FF")]
    InvalidAddress(String),

    #[error("unknown signal source '{0}'")]
    UnknownSourceName(String),

    #[error("the signal source allow-list is empty")]
    EmptySourceList,

    #[error("failed to load settings from {path}: {reason}")]
    Load { path: String, reason: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Fatal outcome of a session run
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("could not find device with {0}")]
    DeviceNotFound(DeviceTarget),

    /// The device exposed none of the requested sources
    #[error("none of the requested signal sources could be subscribed")]
    NothingSubscribed,

    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),
}
