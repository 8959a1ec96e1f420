//! AES-256-GCM transport of the session token.
//!
//! The device expects a 16-byte IV and a 128-bit tag, with no associated
//! data. The key is the raw session-key HMAC output.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use base64::Engine;

use super::mac::KEY_LEN;
use super::CryptoError;

/// IV size expected by the device (16 bytes / 128 bits).
pub const IV_LEN: usize = 16;

/// GCM authentication tag size (16 bytes / 128 bits).
pub const TAG_LEN: usize = 16;

/// AES-256 in GCM mode with a 16-byte nonce; the tag size defaults to 16.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// A token encrypted for the `create_session` call.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedToken {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

impl SealedToken {
    pub fn iv_b64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.iv)
    }

    pub fn tag_b64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.tag)
    }

    pub fn payload_b64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.ciphertext)
    }
}

impl std::fmt::Debug for SealedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedToken")
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

/// AES-256-GCM engine keyed with the session key.
pub struct SessionCipher {
    key: [u8; KEY_LEN],
}

impl SessionCipher {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    fn cipher(&self) -> Result<Aes256Gcm16, CryptoError> {
        Aes256Gcm16::new_from_slice(&self.key)
            .map_err(|e| CryptoError::Unavailable(format!("AES-256-GCM init failed: {e}")))
    }

    /// Encrypt `token` under `iv`. The caller must never reuse an IV with
    /// the same key.
    pub fn seal(&self, iv: [u8; IV_LEN], token: &str) -> Result<SealedToken, CryptoError> {
        let cipher = self.cipher()?;
        let nonce = Nonce::<U16>::from_slice(&iv);

        // Output is ciphertext || tag.
        let mut ciphertext = cipher
            .encrypt(nonce, token.as_bytes())
            .map_err(|e| CryptoError::Unavailable(format!("AES-256-GCM encryption failed: {e}")))?;

        let tag_start = ciphertext
            .len()
            .checked_sub(TAG_LEN)
            .ok_or_else(|| CryptoError::Unavailable("GCM output shorter than tag".into()))?;
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&ciphertext[tag_start..]);
        ciphertext.truncate(tag_start);

        Ok(SealedToken {
            iv,
            ciphertext,
            tag,
        })
    }

    /// Decrypt and authenticate a sealed token.
    pub fn open(&self, sealed: &SealedToken) -> Result<Vec<u8>, CryptoError> {
        let cipher = self.cipher()?;
        let nonce = Nonce::<U16>::from_slice(&sealed.iv);

        let mut combined = Vec::with_capacity(sealed.ciphertext.len() + TAG_LEN);
        combined.extend_from_slice(&sealed.ciphertext);
        combined.extend_from_slice(&sealed.tag);

        cipher
            .decrypt(nonce, combined.as_slice())
            .map_err(|_| CryptoError::Integrity)
    }
}
