use crate::auth::{AuthError, AuthErrorKind};

/// Failure of an authenticated device call.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("device rejected the session again after re-authentication (HTTP 401)")]
    Unauthorized,

    #[error("device does not provide a requested module or process-data id (HTTP 404)")]
    ModuleNotFound,

    #[error("device is not ready for communication yet (HTTP 503)")]
    NotReady,

    #[error("unexpected HTTP status {status} from {path}")]
    Status { path: &'static str, status: u16 },

    #[error("malformed response from {path}: {source}")]
    Decode {
        path: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl DeviceError {
    /// Handshake failure kind, if authentication is what failed.
    pub fn auth_kind(&self) -> Option<AuthErrorKind> {
        match self {
            Self::Auth(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Worth retrying on the next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Auth(e) => e.kind().is_transient(),
            Self::Transport { .. } | Self::NotReady | Self::Unauthorized => true,
            Self::Client(_) | Self::ModuleNotFound | Self::Status { .. } | Self::Decode { .. } => {
                false
            }
        }
    }
}
