//! Unified error type for the Godfather client.

use godfather_api::ApiError;
use godfather_protocol::ProtocolError;
use godfather_session::{SessionError, StorageError};

/// Top-level error that wraps every crate-specific error.
///
/// `?` converts sub-crate errors automatically. The one special case is
/// [`ApiError::Unauthorized`]: by the time it reaches this type the session
/// has already been invalidated, so it becomes
/// [`GodfatherError::SessionInvalidated`].
#[derive(Debug, thiserror::Error)]
pub enum GodfatherError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Any backend failure other than `401`.
    #[error(transparent)]
    Api(ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The backend rejected the token; the player must log in again.
    #[error("session rejected by the backend")]
    SessionInvalidated {
        #[source]
        source: ApiError,
    },
}

impl From<ApiError> for GodfatherError {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() {
            Self::SessionInvalidated { source: err }
        } else {
            Self::Api(err)
        }
    }
}

impl GodfatherError {
    /// The text to show the user.
    ///
    /// Login problems and backend `detail` messages are shown verbatim.
    /// Transport and server failures get a generic sentence; the full
    /// error is in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Session(err) => session_message(err),
            Self::SessionInvalidated { .. } => {
                "Your session has expired. Please log in again.".to_owned()
            }
            Self::Api(err) => api_message(err),
            Self::Storage(_) => "Could not save session data on this device.".to_owned(),
            Self::Protocol(_) => "Could not read session data on this device.".to_owned(),
        }
    }

    /// Returns `true` if the user has to log in (again) to continue.
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            Self::SessionInvalidated { .. } | Self::Session(SessionError::NotAuthenticated)
        )
    }
}

fn session_message(err: &SessionError) -> String {
    match err {
        SessionError::Validation(_)
        | SessionError::RoleMismatch { .. }
        | SessionError::AuthFailed { .. } => err.to_string(),
        SessionError::LoginInProgress => "Logging in, please wait.".to_owned(),
        SessionError::NotReady => "Still loading, please try again.".to_owned(),
        SessionError::NotAuthenticated => "Please log in to continue.".to_owned(),
        SessionError::LoginCancelled => "Login cancelled.".to_owned(),
        SessionError::AlreadyBootstrapped => "The session is already loaded.".to_owned(),
        SessionError::Storage(_) => "Could not save session data on this device.".to_owned(),
        SessionError::Protocol(_) => "Could not read session data on this device.".to_owned(),
    }
}

fn api_message(err: &ApiError) -> String {
    if let Some(detail) = err.detail() {
        return detail.to_owned();
    }
    match err {
        ApiError::Status { status, .. } => format!("The game server returned an error ({status})."),
        ApiError::Transport(_) => "Could not reach the game server.".to_owned(),
        ApiError::Decode(_) => "The game server sent an unexpected response.".to_owned(),
        ApiError::InvalidUrl(url) => format!("Invalid game server address: {url}"),
        ApiError::Encode(_) | ApiError::Unauthorized { .. } => {
            "Something went wrong, please try again.".to_owned()
        }
    }
}
