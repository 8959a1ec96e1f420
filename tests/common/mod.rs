//! Scripted inverter for integration tests.
//!
//! Implements the device side of the handshake with the crate's own
//! primitives: it checks the client proof, signs the auth message and opens
//! the sealed token before handing out a session id.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use plenticore_link::security::{
    hmac_sha256, xor, AuthMessage, NonceSource, SaltedPassword, ScramKeys, SealedToken,
    SessionCipher, CLIENT_NONCE_LEN, IV_LEN, KEY_LEN, TAG_LEN,
};

pub const B64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

pub const START: &str = "/api/v1/auth/start";
pub const FINISH: &str = "/api/v1/auth/finish";
pub const CREATE_SESSION: &str = "/api/v1/auth/create_session";

/// Device-side secrets and behavior switches.
pub struct DeviceModel {
    pub password: String,
    pub salt: Vec<u8>,
    pub rounds: u32,
    pub server_nonce: String,
    pub transaction_id: String,
    pub token: String,
    /// Handed out in order; the last one repeats.
    pub session_ids: Vec<String>,
    /// Return a signature that does not match the auth message.
    pub tamper_signature: bool,
    /// Answer `start` with 403 once this many handshakes have started.
    pub lock_after: Option<usize>,
    starts: AtomicUsize,
    sessions_issued: AtomicUsize,
    client_nonces: Mutex<Vec<String>>,
    opened_tokens: Mutex<Vec<String>>,
}

impl DeviceModel {
    /// The reference scenario: `salt12`, 4096 rounds, `serverN`, `tx1`, `abc123`.
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            salt: b"salt12".to_vec(),
            rounds: 4096,
            server_nonce: "serverN".into(),
            transaction_id: "tx1".into(),
            token: "device-token-0815".into(),
            session_ids: vec!["abc123".into()],
            tamper_signature: false,
            lock_after: None,
            starts: AtomicUsize::new(0),
            sessions_issued: AtomicUsize::new(0),
            client_nonces: Mutex::new(Vec::new()),
            opened_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn client_nonces(&self) -> Vec<String> {
        self.client_nonces.lock().unwrap().clone()
    }

    pub fn opened_tokens(&self) -> Vec<String> {
        self.opened_tokens.lock().unwrap().clone()
    }

    fn salt_b64(&self) -> String {
        B64.encode(&self.salt)
    }

    fn keys(&self) -> ScramKeys {
        ScramKeys::derive(&SaltedPassword::derive(&self.password, &self.salt, self.rounds)).unwrap()
    }

    fn auth_message(&self) -> AuthMessage {
        let nonces = self.client_nonces.lock().unwrap();
        let client_nonce = nonces.last().expect("start must precede finish");
        AuthMessage::new(
            "user",
            client_nonce,
            &self.server_nonce,
            &self.salt_b64(),
            self.rounds,
        )
    }

    /// Mount start, finish and create_session on `server`.
    pub async fn mount(self: &Arc<Self>, server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(START))
            .and(header("content-type", "application/json"))
            .and(header("accept", "application/json"))
            .respond_with(StartResponder(Arc::clone(self)))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(FINISH))
            .respond_with(FinishResponder(Arc::clone(self)))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(CREATE_SESSION))
            .respond_with(CreateSessionResponder(Arc::clone(self)))
            .mount(server)
            .await;
    }
}

fn body(req: &Request) -> Value {
    serde_json::from_slice(&req.body).unwrap_or(Value::Null)
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value.get(name).and_then(Value::as_str)
}

pub struct StartResponder(pub Arc<DeviceModel>);

impl Respond for StartResponder {
    fn respond(&self, req: &Request) -> ResponseTemplate {
        let device = &self.0;
        let started = device.starts.fetch_add(1, Ordering::SeqCst);
        if device.lock_after.is_some_and(|limit| started >= limit) {
            return ResponseTemplate::new(403);
        }

        let body = body(req);
        let (Some("user"), Some(nonce)) = (field(&body, "username"), field(&body, "nonce")) else {
            return ResponseTemplate::new(400);
        };
        device.client_nonces.lock().unwrap().push(nonce.to_string());

        ResponseTemplate::new(200).set_body_json(json!({
            "nonce": device.server_nonce,
            "transactionId": device.transaction_id,
            "salt": device.salt_b64(),
            "rounds": device.rounds,
        }))
    }
}

pub struct FinishResponder(pub Arc<DeviceModel>);

impl Respond for FinishResponder {
    fn respond(&self, req: &Request) -> ResponseTemplate {
        let device = &self.0;
        let body = body(req);
        if field(&body, "transactionId") != Some(device.transaction_id.as_str()) {
            return ResponseTemplate::new(400);
        }
        let Some(proof) = field(&body, "proof").and_then(|p| B64.decode(p).ok()) else {
            return ResponseTemplate::new(400);
        };
        let Ok(proof) = <[u8; KEY_LEN]>::try_from(proof.as_slice()) else {
            return ResponseTemplate::new(400);
        };

        let keys = device.keys();
        let msg = device.auth_message();
        let client_signature = hmac_sha256(keys.stored_key.as_ref(), [msg.as_bytes()]).unwrap();
        let client_key = xor(&proof, &client_signature);
        if keys.stored_key.as_bytes() != &plenticore_link::security::sha256(&client_key) {
            return ResponseTemplate::new(400);
        }

        let mut signature = hmac_sha256(keys.server_key.as_ref(), [msg.as_bytes()]).unwrap();
        if device.tamper_signature {
            signature[0] ^= 0x80;
        }

        ResponseTemplate::new(200).set_body_json(json!({
            "signature": B64.encode(signature),
            "token": device.token,
        }))
    }
}

pub struct CreateSessionResponder(pub Arc<DeviceModel>);

impl Respond for CreateSessionResponder {
    fn respond(&self, req: &Request) -> ResponseTemplate {
        let device = &self.0;
        let body = body(req);
        if field(&body, "transactionId") != Some(device.transaction_id.as_str()) {
            return ResponseTemplate::new(400);
        }
        let decode = |name: &str| field(&body, name).and_then(|v| B64.decode(v).ok());
        let (Some(iv), Some(tag), Some(payload)) = (decode("iv"), decode("tag"), decode("payload"))
        else {
            return ResponseTemplate::new(400);
        };
        let (Ok(iv), Ok(tag)) = (
            <[u8; IV_LEN]>::try_from(iv.as_slice()),
            <[u8; TAG_LEN]>::try_from(tag.as_slice()),
        ) else {
            return ResponseTemplate::new(400);
        };

        let key = device.keys().session_key(&device.auth_message()).unwrap();
        let sealed = SealedToken {
            iv,
            ciphertext: payload,
            tag,
        };
        let Ok(plain) = SessionCipher::new(key).open(&sealed) else {
            return ResponseTemplate::new(400);
        };
        let plain = String::from_utf8_lossy(&plain).into_owned();
        let accepted = plain == device.token;
        device.opened_tokens.lock().unwrap().push(plain);
        if !accepted {
            return ResponseTemplate::new(400);
        }

        let issued = device.sessions_issued.fetch_add(1, Ordering::SeqCst);
        let index = issued.min(device.session_ids.len() - 1);
        ResponseTemplate::new(200).set_body_json(json!({ "sessionId": device.session_ids[index] }))
    }
}

/// Nonce source returning fixed bytes, for reproducible requests.
pub struct FixedNonces {
    pub client_nonce: [u8; CLIENT_NONCE_LEN],
    pub iv: [u8; IV_LEN],
}

impl NonceSource for FixedNonces {
    fn client_nonce(&self) -> [u8; CLIENT_NONCE_LEN] {
        self.client_nonce
    }

    fn iv(&self) -> [u8; IV_LEN] {
        self.iv
    }
}
