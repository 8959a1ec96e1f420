//! Cryptographic building blocks of the device handshake.
//!
//! - [`nonce`]: client nonce and IV generation
//! - [`kdf`]: PBKDF2 salted password and the SCRAM key schedule
//! - [`mac`]: HMAC-SHA256 / SHA-256 helpers
//! - [`proof`]: auth message, client proof and server signature check
//! - [`encryption`]: AES-256-GCM sealing of the session token

pub mod encryption;
pub mod kdf;
pub mod mac;
pub mod nonce;
pub mod proof;

pub use encryption::{SealedToken, SessionCipher, IV_LEN, TAG_LEN};
pub use kdf::{SaltedPassword, ScramKeys};
pub use mac::{hmac_sha256, sha256, ScramKey, KEY_LEN};
pub use nonce::{NonceSource, OsNonceSource, CLIENT_NONCE_LEN};
pub use proof::{constant_time_eq, xor, AuthMessage, Proof};

/// Failure inside a crypto primitive.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The primitive could not be constructed or run on this host.
    #[error("crypto primitive unavailable: {0}")]
    Unavailable(String),
    /// AEAD tag verification failed.
    #[error("authenticated decryption failed")]
    Integrity,
}
