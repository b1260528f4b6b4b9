//! Bluetooth Module
//!
//! BLE access to the Nuimo controller.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    BluetoothService                     │
//! │         (implements the session's Transport)            │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌─────────────┐  ┌───────────┐
//! │  Scanner  │  │ Connection  │  │ Protocol  │
//! │           │  │             │  │           │
//! │ - name /  │  │ - GATT walk │  │ - UUIDs   │
//! │   address │  │ - notify    │  │ - source  │
//! │   lookup  │  │ - link loss │  │   mapping │
//! └───────────┘  └─────────────┘  └───────────┘
//! ```
//!
//! Only [`protocol`] is platform independent; the rest needs WinRT.

#[cfg(windows)]
pub mod connection;
pub mod protocol;
#[cfg(windows)]
pub mod scanner;
#[cfg(windows)]
pub mod service;

#[cfg(windows)]
pub use service::BluetoothService;
