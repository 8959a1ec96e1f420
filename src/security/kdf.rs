//! Password stretching and the SCRAM key schedule.
//!
//! The device salts the password with PBKDF2-HMAC-SHA256 and derives
//! everything else from the 32-byte result:
//!
//! ```text
//! SaltedPassword = PBKDF2(password, salt, rounds)
//! ClientKey      = HMAC(SaltedPassword, "Client Key")
//! ServerKey      = HMAC(SaltedPassword, "Server Key")
//! StoredKey      = SHA256(ClientKey)
//! SessionKey     = HMAC(StoredKey, "Session Key" || AuthMessage || ClientKey)
//! ```

use sha2::Sha256;

use super::mac::{hmac_sha256, ScramKey, KEY_LEN};
use super::proof::AuthMessage;
use super::CryptoError;

const CLIENT_KEY_LABEL: &[u8] = b"Client Key";
const SERVER_KEY_LABEL: &[u8] = b"Server Key";
const SESSION_KEY_LABEL: &[u8] = b"Session Key";

/// PBKDF2 output, the root of the key schedule. Never leaves the host.
#[repr(transparent)]
pub struct SaltedPassword {
    bytes: [u8; KEY_LEN],
}

impl SaltedPassword {
    /// Stretch `password` with the device-supplied salt and iteration count.
    pub fn derive(password: &str, salt: &[u8], rounds: u32) -> Self {
        pbkdf2::pbkdf2_hmac_array::<Sha256, KEY_LEN>(password.as_bytes(), salt, rounds).into()
    }

    pub fn client_key(&self) -> Result<ScramKey, CryptoError> {
        hmac_sha256(&self.bytes, [CLIENT_KEY_LABEL]).map(Into::into)
    }

    pub fn server_key(&self) -> Result<ScramKey, CryptoError> {
        hmac_sha256(&self.bytes, [SERVER_KEY_LABEL]).map(Into::into)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl From<[u8; KEY_LEN]> for SaltedPassword {
    #[inline(always)]
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }
}

/// Client, server and stored keys for one authentication attempt.
#[derive(Debug, Clone)]
pub struct ScramKeys {
    pub client_key: ScramKey,
    pub server_key: ScramKey,
    pub stored_key: ScramKey,
}

impl ScramKeys {
    pub fn derive(salted: &SaltedPassword) -> Result<Self, CryptoError> {
        let client_key = salted.client_key()?;
        let server_key = salted.server_key()?;
        let stored_key = client_key.sha256();

        Ok(Self {
            client_key,
            server_key,
            stored_key,
        })
    }

    /// Key material for the session-token cipher.
    ///
    /// One HMAC over three segments in this exact order; it is used
    /// directly as the AES-256 key.
    pub fn session_key(&self, auth_message: &AuthMessage) -> Result<[u8; KEY_LEN], CryptoError> {
        hmac_sha256(
            self.stored_key.as_ref(),
            [
                SESSION_KEY_LABEL,
                auth_message.as_bytes(),
                self.client_key.as_ref(),
            ],
        )
    }
}
