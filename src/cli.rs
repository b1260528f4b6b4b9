//! Command line interface.
//!
//! Flags override values from the settings file.

use crate::domain::error::ConfigError;
use crate::domain::models::{DeviceTarget, SignalSource};
use crate::domain::session::SessionConfig;
use crate::domain::settings::Settings;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Use a Nuimo controller as a mouse.
#[derive(Debug, Parser)]
#[command(name = "nuimo_mouse", version)]
#[command(group(ArgGroup::new("device").args(["name", "address"])))]
pub struct Cli {
    /// The name of the bluetooth device to connect to
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// The address of the bluetooth device to connect to
    #[arg(long, value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Signal source to subscribe to (repeatable); defaults to all
    #[arg(long = "source", value_name = "SOURCE")]
    pub sources: Vec<SignalSource>,

    /// If provided, only enumerate matching service(s)
    #[arg(long, num_args = 1.., value_name = "UUID")]
    pub services: Vec<String>,

    /// Pointer travel of a swipe, in pixels
    #[arg(short = 's', long, value_name = "PIXELS")]
    pub swipe_distance: Option<i32>,

    /// Scroll notches per unit of rotation
    #[arg(short = 'r', long, value_name = "FACTOR")]
    pub scroll_multiplier: Option<f64>,

    /// Seconds to scan for the device before giving up
    #[arg(long, value_name = "SECONDS")]
    pub scan_timeout: Option<u64>,

    /// Settings file (JSON)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Sets the log level to debug
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// Fold the command line into the loaded settings.
    ///
    /// A device selector given on the command line replaces both selectors
    /// from the file.
    pub fn apply(&self, settings: &mut Settings) {
        if self.name.is_some() || self.address.is_some() {
            settings.device_name = self.name.clone();
            settings.device_address = self.address.clone();
        }
        if !self.sources.is_empty() {
            settings.sources = self.sources.clone();
        }
        if !self.services.is_empty() {
            settings.services = self.services.clone();
        }
        if let Some(distance) = self.swipe_distance {
            settings.swipe_distance = distance;
        }
        if let Some(multiplier) = self.scroll_multiplier {
            settings.scroll_multiplier = multiplier;
        }
        if let Some(timeout) = self.scan_timeout {
            settings.scan_timeout_secs = timeout;
        }
        if self.debug {
            settings.log_settings.level = "debug".to_string();
        }
    }
}

/// Validate the device selector and source list
pub fn session_config(settings: &Settings) -> Result<SessionConfig, ConfigError> {
    let target = DeviceTarget::from_parts(
        settings.device_name.as_deref(),
        settings.device_address.as_deref(),
    )?;
    SessionConfig::new(target, &settings.sources)
}
