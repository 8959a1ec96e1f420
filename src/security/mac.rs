//! HMAC-SHA256 and SHA-256 helpers shared by the key schedule and proofs.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::CryptoError;

/// Length of every SCRAM key, signature and derived session key.
pub const KEY_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// `HMAC-SHA256(key, part_0 || part_1 || ...)`.
///
/// The parts are fed into a single MAC instance in order, so
/// `[a, b]` yields the same output as `[a ++ b]` and never a nested MAC.
pub fn hmac_sha256<'a>(
    key: &[u8],
    parts: impl IntoIterator<Item = &'a [u8]>,
) -> Result<[u8; KEY_LEN], CryptoError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CryptoError::Unavailable(format!("HMAC-SHA256 init failed: {e}")))?;
    parts.into_iter().for_each(|part| mac.update(part));

    Ok(mac.finalize().into_bytes().into())
}

/// Plain SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; KEY_LEN] {
    Sha256::digest(data).into()
}

/// One of the keys derived from the salted password.
/// The same shape is used for `ClientKey`, `ServerKey` and `StoredKey`.
#[derive(Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct ScramKey {
    bytes: [u8; KEY_LEN],
}

impl ScramKey {
    /// `StoredKey = SHA256(ClientKey)`.
    pub fn sha256(&self) -> Self {
        sha256(&self.bytes).into()
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl From<[u8; KEY_LEN]> for ScramKey {
    #[inline(always)]
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }
}

impl AsRef<[u8]> for ScramKey {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for ScramKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ScramKey(<redacted>)")
    }
}
