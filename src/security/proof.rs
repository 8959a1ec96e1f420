//! Auth message construction, client proof and server signature checks.

use base64::Engine;

use super::kdf::ScramKeys;
use super::mac::{hmac_sha256, KEY_LEN};
use super::CryptoError;

/// Base64 of the GS2 header `n,,`. Fixed; the device never negotiates
/// channel binding.
pub const CHANNEL_BINDING: &str = "biws";

/// The string both sides MAC to prove knowledge of the password.
///
/// `n=<user>,r=<clientNonce>,r=<serverNonce>,s=<salt>,i=<rounds>,c=biws,r=<serverNonce>`
///
/// Nonces and salt are the exact base64 strings exchanged on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthMessage(String);

impl AuthMessage {
    pub fn new(
        username: &str,
        client_nonce: &str,
        server_nonce: &str,
        salt_b64: &str,
        rounds: u32,
    ) -> Self {
        Self(format!(
            "n={username},r={client_nonce},r={server_nonce},s={salt_b64},i={rounds},c={CHANNEL_BINDING},r={server_nonce}"
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for AuthMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client proof and the server signature we expect back, computed together
/// from one auth message.
#[derive(Clone)]
pub struct Proof {
    client_proof: [u8; KEY_LEN],
    server_signature: [u8; KEY_LEN],
}

impl Proof {
    /// `ClientSignature = HMAC(StoredKey, AuthMessage)`,
    /// `ClientProof = ClientSignature ^ ClientKey`,
    /// `ServerSignature = HMAC(ServerKey, AuthMessage)`.
    pub fn compute(keys: &ScramKeys, auth_message: &AuthMessage) -> Result<Self, CryptoError> {
        let client_signature = hmac_sha256(keys.stored_key.as_ref(), [auth_message.as_bytes()])?;
        let server_signature = hmac_sha256(keys.server_key.as_ref(), [auth_message.as_bytes()])?;

        Ok(Self {
            client_proof: xor(&client_signature, keys.client_key.as_bytes()),
            server_signature,
        })
    }

    pub fn client_proof(&self) -> &[u8; KEY_LEN] {
        &self.client_proof
    }

    /// Base64 form sent in the `proof` field.
    pub fn client_proof_b64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.client_proof)
    }

    pub fn expected_server_signature(&self) -> &[u8; KEY_LEN] {
        &self.server_signature
    }

    /// Compare the device's decoded `signature` with the expected one.
    pub fn verify_server_signature(&self, received: &[u8]) -> bool {
        constant_time_eq(received, &self.server_signature)
    }
}

impl std::fmt::Debug for Proof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proof").finish_non_exhaustive()
    }
}

/// Element-wise XOR of two equally sized keys.
pub fn xor(a: &[u8; KEY_LEN], b: &[u8; KEY_LEN]) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
        *o = x ^ y;
    }
    out
}

/// Constant-time byte comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
