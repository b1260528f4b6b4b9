//! Protocol decoding and session logic, independent of any platform API.

pub mod dispatch;
pub mod error;
pub mod gestures;
pub mod models;
pub mod ports;
pub mod registry;
pub mod session;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;
