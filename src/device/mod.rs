//! Authenticated access to the inverter web API.
//!
//! [`DeviceClient`] holds the session produced by the handshake and attaches
//! `Authorization: Session <id>` to every call. When the device answers 401
//! the session is considered expired: one new handshake, one retry.

pub mod client;
pub mod error;
pub mod processdata;

pub use client::{DeviceClient, PROCESSDATA_PATH};
pub use error::DeviceError;
pub use processdata::{ModuleQuery, ModuleValues, ProcessValue};
