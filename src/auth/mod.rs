//! Device authentication: a SCRAM-like handshake that ends in a session id.
//!
//! Provides:
//! - [`Handshake`]: the three-step state machine (`start`, `finish`, `create_session`)
//! - [`AuthSession`]: keys and proof for one attempt, never published
//! - [`AuthenticatedSession`]: the only value that outlives a handshake
//! - [`AuthError`] / [`AuthErrorKind`]: failure taxonomy
//!
//! ## Design Decisions
//! - The session id is returned as a value and held by the device owner,
//!   so "not yet authenticated" is `None` rather than a stale field.
//! - The username is fixed to `user`; only the password is configurable.
//! - No retries inside the handshake. Callers use [`AuthErrorKind::is_transient`]
//!   to choose between backoff and reporting a configuration problem.

pub mod error;
pub mod handshake;
pub mod messages;
pub mod session;

pub use error::{AuthError, AuthErrorKind};
pub use handshake::{Handshake, USERNAME};
pub use session::{AuthSession, AuthenticatedSession, Challenge, HandshakeState, Step};
