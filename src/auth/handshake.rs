//! Three-round-trip session handshake against the device web API.
//!
//! ```text
//! Idle ─start─▶ Started ─200─▶ Challenged ─finish─▶ ProofSent
//!      ─signature ok─▶ SessionRequested ─create_session─▶ Authenticated
//! ```
//!
//! Any step may end in `Failed(kind)`. Nothing is retried here; the caller
//! decides whether to run a new handshake.

use std::sync::Arc;

use base64::Engine;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::AuthError;
use super::messages::{
    CreateSessionRequest, CreateSessionResponse, FinishRequest, FinishResponse, StartRequest,
    StartResponse,
};
use super::session::{AuthSession, AuthenticatedSession, Challenge, HandshakeState, Step};
use crate::security::NonceSource;

/// The device only knows this account name for the installer-less login.
pub const USERNAME: &str = "user";

/// Drives one device authentication.
pub struct Handshake {
    http: reqwest::Client,
    base_url: String,
    password: String,
    nonces: Arc<dyn NonceSource>,
    state: HandshakeState,
}

impl Handshake {
    /// `base_url` is the device root, e.g. `http://192.168.1.50`.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        password: impl Into<String>,
        nonces: Arc<dyn NonceSource>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            password: password.into(),
            nonces,
            state: HandshakeState::Idle,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Run all three round trips. Each call starts over from `Idle` with
    /// fresh nonces.
    pub async fn run(&mut self) -> Result<AuthenticatedSession, AuthError> {
        self.state = HandshakeState::Idle;

        match self.drive().await {
            Ok(session) => {
                self.state = HandshakeState::Authenticated;
                tracing::info!(
                    transaction_id = session.transaction_id(),
                    "Device session established"
                );
                Ok(session)
            }
            Err(e) => {
                let kind = e.kind();
                self.state = HandshakeState::Failed(kind);
                tracing::warn!(%kind, step = ?e.step(), "Device authentication failed: {e}");
                Err(e)
            }
        }
    }

    async fn drive(&mut self) -> Result<AuthenticatedSession, AuthError> {
        let b64 = base64::engine::general_purpose::STANDARD;

        // Step 1: nonce exchange
        let client_nonce = b64.encode(self.nonces.client_nonce());
        self.state = HandshakeState::Started;
        let start: StartResponse = self
            .exchange(
                Step::Start,
                &StartRequest {
                    username: USERNAME.to_string(),
                    nonce: client_nonce.clone(),
                },
            )
            .await?;
        let challenge = Challenge::try_from(start)?;
        self.state = HandshakeState::Challenged;

        let session = self.derive_session(client_nonce, challenge).await?;
        let transaction_id = session.transaction_id().to_string();

        // Step 2: proof exchange
        self.state = HandshakeState::ProofSent;
        let finish: FinishResponse = self
            .exchange(
                Step::Finish,
                &FinishRequest {
                    transaction_id: transaction_id.clone(),
                    proof: session.client_proof_b64(),
                },
            )
            .await?;

        let signature = b64
            .decode(&finish.signature)
            .map_err(|e| AuthError::Protocol {
                step: Step::Finish,
                detail: format!("signature is not valid base64: {e}"),
            })?;
        if !session.verify_server_signature(&signature) {
            return Err(AuthError::AuthenticationIntegrity);
        }

        // Step 3: hand the sealed token back to open a session
        self.state = HandshakeState::SessionRequested;
        let sealed = session.seal_token(&finish.token, self.nonces.iv())?;
        let created: CreateSessionResponse = self
            .exchange(
                Step::CreateSession,
                &CreateSessionRequest {
                    transaction_id: transaction_id.clone(),
                    iv: sealed.iv_b64(),
                    tag: sealed.tag_b64(),
                    payload: sealed.payload_b64(),
                },
            )
            .await?;

        if created.session_id.is_empty() {
            return Err(AuthError::Protocol {
                step: Step::CreateSession,
                detail: "empty sessionId".into(),
            });
        }

        Ok(AuthenticatedSession::new(created.session_id, transaction_id))
    }

    /// PBKDF2 with device-chosen rounds is CPU bound; keep it off the
    /// async worker.
    async fn derive_session(
        &self,
        client_nonce: String,
        challenge: Challenge,
    ) -> Result<AuthSession, AuthError> {
        let password = self.password.clone();
        let session = tokio::task::spawn_blocking(move || {
            AuthSession::derive(USERNAME, &password, client_nonce, challenge)
        })
        .await
        .map_err(|e| {
            crate::security::CryptoError::Unavailable(format!("key derivation task failed: {e}"))
        })??;

        Ok(session)
    }

    /// POST one step and decode its 200 body, mapping documented status
    /// codes to their failure kinds.
    async fn exchange<Req, Resp>(&self, step: Step, body: &Req) -> Result<Resp, AuthError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, step.path());
        let resp = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|source| AuthError::Communication { step, source })?;

        let status = resp.status();
        tracing::debug!(%step, status = status.as_u16(), "Auth round trip completed");

        if let Some(err) = rejection(step, status) {
            return Err(err);
        }

        let text = resp
            .text()
            .await
            .map_err(|source| AuthError::Communication { step, source })?;

        serde_json::from_str(&text).map_err(|e| AuthError::Protocol {
            step,
            detail: format!("malformed JSON body: {e}"),
        })
    }
}

impl std::fmt::Debug for Handshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handshake")
            .field("base_url", &self.base_url)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Failure for a non-200 status at `step`, or `None` to continue.
fn rejection(step: Step, status: StatusCode) -> Option<AuthError> {
    match (step, status) {
        (_, StatusCode::OK) => None,
        (Step::Start, StatusCode::BAD_REQUEST) => Some(AuthError::ApiIncompatible),
        (Step::Start, StatusCode::FORBIDDEN) => Some(AuthError::AccountLocked),
        (Step::Start, StatusCode::SERVICE_UNAVAILABLE) => Some(AuthError::DeviceNotReady),
        (Step::Finish | Step::CreateSession, StatusCode::BAD_REQUEST) => {
            Some(AuthError::BadPassword { step })
        }
        (_, other) => Some(AuthError::Protocol {
            step,
            detail: format!("unexpected HTTP status {other}"),
        }),
    }
}
