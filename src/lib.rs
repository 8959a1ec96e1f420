//! Local-network client for KOSTAL PLENTICORE inverters.
//!
//! The inverter's web API only answers authenticated calls. Authentication is
//! a SCRAM-like handshake (PBKDF2, HMAC-SHA256 proofs, mutual signature
//! check) that ends by sending the device its own token sealed with
//! AES-256-GCM, in exchange for a session id.
//!
//! - [`security`]: crypto primitives of the handshake
//! - [`auth`]: the handshake state machine and its error taxonomy
//! - [`device`]: session ownership and authenticated API calls
//! - [`config`]: TOML configuration

pub mod auth;
pub mod config;
pub mod device;
pub mod security;

pub use auth::{AuthError, AuthErrorKind, AuthenticatedSession, Handshake, HandshakeState};
pub use config::{Config, DeviceConfig};
pub use device::{DeviceClient, DeviceError, ModuleQuery};
