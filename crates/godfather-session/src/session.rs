//! Session types: the signed-in player, the three-state auth machine and
//! the login form.

use std::fmt;

use godfather_protocol::{LoginRequest, Player, Role};

use crate::{SessionError, is_admin};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A signed-in player: the bearer token plus the cached player record.
///
/// The two always travel together. Storage never holds one without the
/// other after a bootstrap.
#[derive(Clone, PartialEq)]
pub struct Session {
    token: String,
    player: Player,
}

impl Session {
    pub fn new(token: impl Into<String>, player: Player) -> Self {
        Self {
            token: token.into(),
            player,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Derived from the player record; see [`is_admin`].
    pub fn is_admin(&self) -> bool {
        is_admin(&self.player)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("player", &self.player)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// The client's authentication state.
///
/// ```text
///   Loading ──(bootstrap)──→ Authenticated ⇄ Unauthenticated
///      └──────(bootstrap)──→ Unauthenticated
/// ```
///
/// `Loading` is left exactly once, by bootstrap, and never re-entered.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Stored credentials haven't been checked yet.
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// `false` unless authenticated as an admin.
    pub fn is_admin(&self) -> bool {
        self.session().is_some_and(Session::is_admin)
    }
}

// ---------------------------------------------------------------------------
// Credentials & LoginForm
// ---------------------------------------------------------------------------

/// A validated email/password/role triple.
///
/// Saved after every successful manual login so the next start can sign
/// in automatically.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl Credentials {
    pub(crate) fn to_request(&self) -> LoginRequest {
        LoginRequest {
            email: self.email.clone(),
            password: self.password.clone(),
            role: self.role.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// What the user typed into the login screen.
#[derive(Clone, Default, PartialEq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// `None` until the user picks one of the game roles.
    pub role: Option<Role>,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role,
        }
    }

    /// A form filled in from the saved login.
    pub fn prefilled(saved: &Credentials) -> Self {
        Self::new(
            saved.email.clone(),
            saved.password.clone(),
            Some(saved.role.clone()),
        )
    }

    /// Checks the form locally.
    ///
    /// # Errors
    /// [`SessionError::Validation`] with the message to show when the email
    /// or password is blank, no role is picked, or the role isn't one of
    /// [`Role::SELECTABLE`].
    pub fn validate(&self) -> Result<Credentials, SessionError> {
        if self.email.trim().is_empty() {
            return Err(SessionError::Validation("Please enter your email".into()));
        }
        if self.password.trim().is_empty() {
            return Err(SessionError::Validation("Please enter your password".into()));
        }
        let role = match &self.role {
            None => {
                return Err(SessionError::Validation(
                    "Please select your role to continue".into(),
                ));
            }
            Some(role) if !role.is_selectable() => {
                return Err(SessionError::Validation(format!(
                    "{role} is not a role you can select"
                )));
            }
            Some(role) => role.clone(),
        };

        Ok(Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
            role,
        })
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}
