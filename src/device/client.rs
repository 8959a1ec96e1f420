//! Connection to one inverter: owns the session and signs API calls.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::Mutex;

use super::error::DeviceError;
use super::processdata::{ModuleQuery, ModuleValues};
use crate::auth::{AuthenticatedSession, Handshake};
use crate::config::DeviceConfig;
use crate::security::{NonceSource, OsNonceSource};

/// Process-data endpoint, relative to the device root.
pub const PROCESSDATA_PATH: &str = "/api/v1/processdata";

/// HTTP client for one device.
///
/// The session slot's lock also serializes handshakes, so at most one
/// authentication runs per device at a time.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: String,
    password: String,
    nonces: Arc<dyn NonceSource>,
    session: Mutex<Option<AuthenticatedSession>>,
}

impl DeviceClient {
    pub fn new(config: &DeviceConfig) -> Result<Self, DeviceError> {
        Self::with_nonce_source(config, Arc::new(OsNonceSource))
    }

    pub fn with_nonce_source(
        config: &DeviceConfig,
        nonces: Arc<dyn NonceSource>,
    ) -> Result<Self, DeviceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(DeviceError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            password: config.password.clone(),
            nonces,
            session: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a fresh handshake and replace the current session with its result.
    pub async fn authenticate(&self) -> Result<AuthenticatedSession, DeviceError> {
        let mut slot = self.session.lock().await;
        self.establish(&mut slot).await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Forget the current session; the next call re-authenticates.
    pub async fn clear_session(&self) {
        self.session.lock().await.take();
    }

    /// POST `body` to `path` with the session header, authenticating first if
    /// needed. A 401 triggers one re-authentication and one retry.
    ///
    /// Returns the status and body of the final response.
    pub async fn post_authenticated<B>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, String), DeviceError>
    where
        B: Serialize + ?Sized,
    {
        let mut slot = self.session.lock().await;

        let session = match (*slot).clone() {
            Some(session) => session,
            None => self.establish(&mut slot).await?,
        };

        let (status, text) = self.send(path, body, &session).await?;
        if status != StatusCode::UNAUTHORIZED {
            return Ok((status, text));
        }

        tracing::info!(path, "Session expired, re-authenticating");
        let session = self.establish(&mut slot).await?;
        let (status, text) = self.send(path, body, &session).await?;
        if status == StatusCode::UNAUTHORIZED {
            slot.take();
            return Err(DeviceError::Unauthorized);
        }
        Ok((status, text))
    }

    /// Read process data for the given modules in one request.
    ///
    /// If any requested id does not exist the device rejects the whole
    /// request with 404.
    pub async fn process_data(
        &self,
        modules: &[ModuleQuery],
    ) -> Result<Vec<ModuleValues>, DeviceError> {
        let (status, text) = self.post_authenticated(PROCESSDATA_PATH, modules).await?;

        match status {
            StatusCode::OK => serde_json::from_str(&text).map_err(|source| DeviceError::Decode {
                path: PROCESSDATA_PATH,
                source,
            }),
            StatusCode::NOT_FOUND => Err(DeviceError::ModuleNotFound),
            StatusCode::SERVICE_UNAVAILABLE => Err(DeviceError::NotReady),
            other => Err(DeviceError::Status {
                path: PROCESSDATA_PATH,
                status: other.as_u16(),
            }),
        }
    }

    /// The previous session is dropped before the handshake starts, so a
    /// failed attempt never leaves a stale id behind.
    async fn establish(
        &self,
        slot: &mut Option<AuthenticatedSession>,
    ) -> Result<AuthenticatedSession, DeviceError> {
        slot.take();

        let mut handshake = Handshake::new(
            self.http.clone(),
            self.base_url.clone(),
            self.password.clone(),
            Arc::clone(&self.nonces),
        );
        let session = handshake.run().await?;
        *slot = Some(session.clone());
        Ok(session)
    }

    async fn send<B>(
        &self,
        path: &str,
        body: &B,
        session: &AuthenticatedSession,
    ) -> Result<(StatusCode, String), DeviceError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, session.authorization())
            .json(body)
            .send()
            .await
            .map_err(|source| DeviceError::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = resp.status();
        tracing::debug!(path, status = status.as_u16(), "Device call completed");

        let text = resp.text().await.map_err(|source| DeviceError::Transport {
            path: path.to_string(),
            source,
        })?;
        Ok((status, text))
    }
}

impl std::fmt::Debug for DeviceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
