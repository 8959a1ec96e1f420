//! Random client nonces and cipher IVs.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;

use super::encryption::IV_LEN;

/// Raw client nonce length: three 32-bit words.
pub const CLIENT_NONCE_LEN: usize = 12;

/// Source of per-attempt randomness for the handshake.
///
/// Every call must return fresh bytes; an IV in particular must never repeat
/// for one session key.
pub trait NonceSource: Send + Sync {
    fn client_nonce(&self) -> [u8; CLIENT_NONCE_LEN];

    fn iv(&self) -> [u8; IV_LEN];
}

/// Operating-system backed randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn client_nonce(&self) -> [u8; CLIENT_NONCE_LEN] {
        rand::random()
    }

    fn iv(&self) -> [u8; IV_LEN] {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        iv
    }
}
