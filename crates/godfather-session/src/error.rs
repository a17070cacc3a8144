//! Error types for the session layer.

use std::path::PathBuf;

use godfather_api::ApiError;
use godfather_protocol::{ProtocolError, Role};

/// Shown when a login fails and the backend gave no reason.
pub const LOGIN_FAILED_FALLBACK: &str =
    "Login failed. Please check your credentials and role selection.";

/// Errors from the durable key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory map could not be serialized.
    #[error("could not encode storage: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors that can occur during the session lifecycle.
///
/// The `Display` text of `Validation`, `RoleMismatch` and `AuthFailed` is
/// meant for the user and is shown as-is.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The login form was rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// First login with a role other than the one the game master assigned.
    #[error("You are assigned the role: {assigned}. Please select the correct role.")]
    RoleMismatch { assigned: Role },

    /// The backend refused the login or could not be reached.
    ///
    /// `message` is the backend's `detail` when it sent one, otherwise
    /// [`LOGIN_FAILED_FALLBACK`].
    #[error("{message}")]
    AuthFailed {
        message: String,
        #[source]
        source: ApiError,
    },

    /// Another login is still waiting for the backend.
    #[error("a login is already in progress")]
    LoginInProgress,

    /// The session hasn't been restored yet.
    #[error("session is still loading")]
    NotReady,

    /// Bootstrap runs once per process.
    #[error("session was already bootstrapped")]
    AlreadyBootstrapped,

    /// The player signed out while this login was waiting for the
    /// backend. Nothing was stored.
    #[error("login cancelled by a sign-out")]
    LoginCancelled,

    /// The operation needs a signed-in player.
    #[error("not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl SessionError {
    /// Wraps a failed login call, keeping the backend's own message.
    pub(crate) fn auth_failed(source: ApiError) -> Self {
        let message = source
            .detail()
            .map(str::to_owned)
            .unwrap_or_else(|| LOGIN_FAILED_FALLBACK.to_owned());
        Self::AuthFailed { message, source }
    }
}
