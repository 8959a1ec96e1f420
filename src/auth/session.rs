//! Per-attempt handshake state and the session it produces.

use base64::Engine;

use super::error::AuthError;
use super::messages::StartResponse;
use crate::security::{
    AuthMessage, CryptoError, Proof, SaltedPassword, ScramKeys, SealedToken, SessionCipher, IV_LEN,
};

/// One HTTP round trip of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Start,
    Finish,
    CreateSession,
}

impl Step {
    /// Endpoint path relative to the device base URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::Start => "/api/v1/auth/start",
            Self::Finish => "/api/v1/auth/finish",
            Self::CreateSession => "/api/v1/auth/create_session",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Finish => "finish",
            Self::CreateSession => "create_session",
        })
    }
}

/// Observable position of a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    Started,
    Challenged,
    ProofSent,
    SessionRequested,
    Authenticated,
    Failed(super::AuthErrorKind),
}

impl HandshakeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Authenticated | Self::Failed(_))
    }
}

/// Parameters the device returned from `auth/start`.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub server_nonce: String,
    /// Salt exactly as received; it is part of the auth message.
    pub salt_b64: String,
    pub salt: Vec<u8>,
    pub rounds: u32,
    pub transaction_id: String,
}

impl TryFrom<StartResponse> for Challenge {
    type Error = AuthError;

    fn try_from(resp: StartResponse) -> Result<Self, Self::Error> {
        let protocol = |detail: &str| AuthError::Protocol {
            step: Step::Start,
            detail: detail.to_string(),
        };

        if resp.nonce.is_empty() {
            return Err(protocol("empty server nonce"));
        }
        if resp.transaction_id.is_empty() {
            return Err(protocol("empty transactionId"));
        }
        if resp.rounds == 0 {
            return Err(protocol("rounds must be positive"));
        }
        let salt = base64::engine::general_purpose::STANDARD
            .decode(&resp.salt)
            .map_err(|e| AuthError::Protocol {
                step: Step::Start,
                detail: format!("salt is not valid base64: {e}"),
            })?;

        Ok(Self {
            server_nonce: resp.nonce,
            salt_b64: resp.salt,
            salt,
            rounds: resp.rounds,
            transaction_id: resp.transaction_id,
        })
    }
}

/// Everything derived for one attempt once the challenge is known.
///
/// Built only from a complete [`Challenge`], so no later step can run
/// without salt, server nonce, rounds and transaction id. Dropped when the
/// attempt ends; nothing here is ever sent except the proof and sealed token.
pub struct AuthSession {
    client_nonce: String,
    challenge: Challenge,
    keys: ScramKeys,
    auth_message: AuthMessage,
    proof: Proof,
}

impl AuthSession {
    /// Run the key schedule. PBKDF2 dominates the cost.
    pub fn derive(
        username: &str,
        password: &str,
        client_nonce: String,
        challenge: Challenge,
    ) -> Result<Self, CryptoError> {
        let salted = SaltedPassword::derive(password, &challenge.salt, challenge.rounds);
        let keys = ScramKeys::derive(&salted)?;
        let auth_message = AuthMessage::new(
            username,
            &client_nonce,
            &challenge.server_nonce,
            &challenge.salt_b64,
            challenge.rounds,
        );
        let proof = Proof::compute(&keys, &auth_message)?;

        Ok(Self {
            client_nonce,
            challenge,
            keys,
            auth_message,
            proof,
        })
    }

    pub fn client_nonce(&self) -> &str {
        &self.client_nonce
    }

    pub fn transaction_id(&self) -> &str {
        &self.challenge.transaction_id
    }

    pub fn auth_message(&self) -> &AuthMessage {
        &self.auth_message
    }

    pub fn client_proof_b64(&self) -> String {
        self.proof.client_proof_b64()
    }

    pub fn verify_server_signature(&self, received: &[u8]) -> bool {
        self.proof.verify_server_signature(received)
    }

    /// Encrypt the device token with the session key for `create_session`.
    pub fn seal_token(&self, token: &str, iv: [u8; IV_LEN]) -> Result<SealedToken, CryptoError> {
        let key = self.keys.session_key(&self.auth_message)?;
        SessionCipher::new(key).seal(iv, token)
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("client_nonce", &self.client_nonce)
            .field("transaction_id", &self.challenge.transaction_id)
            .field("rounds", &self.challenge.rounds)
            .finish_non_exhaustive()
    }
}

/// Result of a successful handshake: the bearer credential for later calls.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    session_id: String,
    transaction_id: String,
}

impl AuthenticatedSession {
    pub(crate) fn new(session_id: String, transaction_id: String) -> Self {
        Self {
            session_id,
            transaction_id,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Session {}", self.session_id)
    }
}

impl std::fmt::Debug for AuthenticatedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedSession")
            .field("session_id", &"<redacted>")
            .field("transaction_id", &self.transaction_id)
            .finish()
    }
}
