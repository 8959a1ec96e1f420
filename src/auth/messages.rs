//! JSON bodies of the three authentication endpoints.

use serde::{Deserialize, Serialize};

/// `POST /api/v1/auth/start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub username: String,
    /// Base64 client nonce.
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    /// Base64 salt.
    pub salt: String,
    /// Server nonce, used verbatim in the auth message.
    pub nonce: String,
    pub rounds: u32,
    pub transaction_id: String,
}

/// `POST /api/v1/auth/finish`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRequest {
    pub transaction_id: String,
    /// Base64 client proof.
    pub proof: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishResponse {
    /// Base64 of the 32-byte server signature.
    pub signature: String,
    /// Opaque token to seal for `create_session`.
    pub token: String,
}

/// `POST /api/v1/auth/create_session`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub transaction_id: String,
    pub iv: String,
    pub tag: String,
    pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
}
