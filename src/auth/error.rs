//! Handshake failure taxonomy.

use super::session::Step;
use crate::security::CryptoError;

/// Coarse failure category a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// Device still booting; retry the whole handshake later.
    DeviceNotReady,
    /// The device rejected the fixed username: its API contract changed.
    ApiIncompatible,
    /// Device-side lockout after repeated bad attempts.
    AccountLocked,
    /// Password rejected at `finish` or `create_session`.
    BadPassword,
    /// Server signature mismatch. Never downgrade this to a retry.
    AuthenticationIntegrityError,
    /// A required crypto primitive is not usable on this host.
    CryptoUnavailable,
    /// Network failure or timeout.
    CommunicationError,
    /// Malformed or unexpected response.
    ProtocolError,
}

impl AuthErrorKind {
    /// Worth retrying after a backoff.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::DeviceNotReady | Self::CommunicationError)
    }

    /// Needs user action (credentials, account, firmware) before retrying.
    pub fn is_configuration(self) -> bool {
        matches!(
            self,
            Self::BadPassword | Self::AccountLocked | Self::ApiIncompatible
        )
    }
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Why a handshake attempt failed. Every variant is terminal for the attempt.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("device is not ready for communication yet (HTTP 503)")]
    DeviceNotReady,

    #[error("device rejected the username; its web API has changed (HTTP 400 at start)")]
    ApiIncompatible,

    #[error("device account is locked after too many failed logins (HTTP 403)")]
    AccountLocked,

    #[error("password rejected by device at {step} (HTTP 400)")]
    BadPassword { step: Step },

    #[error("server signature mismatch; device identity could not be verified")]
    AuthenticationIntegrity,

    #[error(transparent)]
    CryptoUnavailable(#[from] CryptoError),

    #[error("communication with device failed at {step}: {source}")]
    Communication {
        step: Step,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response at {step}: {detail}")]
    Protocol { step: Step, detail: String },
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::DeviceNotReady => AuthErrorKind::DeviceNotReady,
            Self::ApiIncompatible => AuthErrorKind::ApiIncompatible,
            Self::AccountLocked => AuthErrorKind::AccountLocked,
            Self::BadPassword { .. } => AuthErrorKind::BadPassword,
            Self::AuthenticationIntegrity => AuthErrorKind::AuthenticationIntegrityError,
            Self::CryptoUnavailable(_) => AuthErrorKind::CryptoUnavailable,
            Self::Communication { .. } => AuthErrorKind::CommunicationError,
            Self::Protocol { .. } => AuthErrorKind::ProtocolError,
        }
    }

    /// Round trip the failure happened in, when it is tied to one.
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::DeviceNotReady | Self::ApiIncompatible | Self::AccountLocked => Some(Step::Start),
            Self::BadPassword { step }
            | Self::Communication { step, .. }
            | Self::Protocol { step, .. } => Some(*step),
            Self::AuthenticationIntegrity => Some(Step::Finish),
            Self::CryptoUnavailable(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_classify_backoff_vs_configuration() {
        assert!(AuthErrorKind::DeviceNotReady.is_transient());
        assert!(AuthErrorKind::CommunicationError.is_transient());
        assert!(!AuthErrorKind::BadPassword.is_transient());
        assert!(!AuthErrorKind::AuthenticationIntegrityError.is_transient());

        assert!(AuthErrorKind::BadPassword.is_configuration());
        assert!(AuthErrorKind::AccountLocked.is_configuration());
        assert!(AuthErrorKind::ApiIncompatible.is_configuration());
        assert!(!AuthErrorKind::DeviceNotReady.is_configuration());
    }

    #[test]
    fn integrity_error_is_neither_transient_nor_configuration() {
        let kind = AuthError::AuthenticationIntegrity.kind();
        assert!(!kind.is_transient());
        assert!(!kind.is_configuration());
    }

    #[test]
    fn bad_password_reports_step() {
        let err = AuthError::BadPassword {
            step: Step::CreateSession,
        };
        assert_eq!(err.kind(), AuthErrorKind::BadPassword);
        assert_eq!(err.step(), Some(Step::CreateSession));
        assert!(err.to_string().contains("create_session"));
    }

    #[test]
    fn crypto_error_converts() {
        let err: AuthError = CryptoError::Unavailable("AES-256-GCM".into()).into();
        assert_eq!(err.kind(), AuthErrorKind::CryptoUnavailable);
        assert_eq!(err.step(), None);
    }
}
