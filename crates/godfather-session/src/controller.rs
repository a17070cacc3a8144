//! The session controller: the single owner of the client's auth state.
//!
//! Everything that reads or writes the token, the cached player record or
//! the saved login goes through [`SessionController`]. Screens observe the
//! state through a `watch` channel; the API layer reads the token and
//! reports `401`s through [`SessionHooks`].
//!
//! # Concurrency note
//!
//! The controller is shared behind an `Arc`. State changes go through the
//! `watch::Sender`, which is internally locked, and storage calls are
//! atomic per call. Two latches guard the async operations: bootstrap runs
//! once, and only one manual login may wait on the backend at a time.
//!
//! Every commit (storage write plus state change) happens under the epoch
//! lock. `logout` bumps the epoch, so a login or automatic login that was
//! waiting on the backend when the player signed out sees a new epoch and
//! drops its result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use godfather_api::{AuthBackend, SessionHooks};
use godfather_protocol::{Codec, JsonCodec, Player, Role};
use tokio::sync::watch;

use crate::{
    AuthState, Credentials, LoginForm, Session, SessionError, Storage, StorageError, keys,
};

/// Owns the session state machine.
///
/// ```text
/// new() ──→ [Loading] ──bootstrap()──→ [Authenticated] ⇄ [Unauthenticated]
///                                          │  login()  ↑        ↑
///                                          └─logout()──┘        │
///                                          └─invalidate() (401)─┘
/// ```
pub struct SessionController<B: AuthBackend, S: Storage> {
    backend: B,
    storage: S,
    codec: JsonCodec,
    state: watch::Sender<AuthState>,
    bootstrap_started: AtomicBool,
    login_in_flight: AtomicBool,
    epoch: Mutex<u64>,
}

/// Releases the login latch when the login future completes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<B: AuthBackend, S: Storage> SessionController<B, S> {
    /// Creates a controller in the `Loading` state. Call
    /// [`bootstrap`](Self::bootstrap) next.
    pub fn new(backend: B, storage: S) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self {
            backend,
            storage,
            codec: JsonCodec,
            state,
            bootstrap_started: AtomicBool::new(false),
            login_in_flight: AtomicBool::new(false),
            epoch: Mutex::new(0),
        }
    }

    /// Held while committing a transition. Never held across an `.await`.
    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_epoch(&self) -> u64 {
        *self.lock_epoch()
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // -- bootstrap ------------------------------------------------------------

    /// Restores the session from storage. Runs once per controller.
    ///
    /// 1. Token and player record both present → `Authenticated`, without
    ///    asking the backend.
    /// 2. Otherwise, a complete saved login → one automatic login. If it
    ///    fails the saved login is deleted.
    /// 3. Otherwise → `Unauthenticated`.
    ///
    /// Storage or backend failures are logged, never returned: bootstrap
    /// always leaves `Loading`.
    ///
    /// # Errors
    /// [`SessionError::AlreadyBootstrapped`] on the second call.
    pub async fn bootstrap(&self) -> Result<AuthState, SessionError> {
        if self.bootstrap_started.swap(true, Ordering::AcqRel) {
            return Err(SessionError::AlreadyBootstrapped);
        }

        let started = self.current_epoch();
        let restored = self.restore(started).await;

        let restored = {
            let epoch = self.lock_epoch();
            let restored = if *epoch == started {
                restored
            } else {
                AuthState::Unauthenticated
            };
            self.state.send_replace(restored.clone());
            restored
        };

        tracing::info!(
            authenticated = restored.is_authenticated(),
            admin = restored.is_admin(),
            "session bootstrapped"
        );
        Ok(restored)
    }

    async fn restore(&self, started: u64) -> AuthState {
        match self.cached_session() {
            Ok(Some(session)) => {
                tracing::debug!(player_id = %session.player().player_id, "using cached session");
                return AuthState::Authenticated(session);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not read cached session"),
        }

        let saved = match self.read_saved_login() {
            Ok(Some(saved)) => saved,
            Ok(None) => return AuthState::Unauthenticated,
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved login");
                return AuthState::Unauthenticated;
            }
        };

        tracing::info!(email = %saved.email, role = %saved.role, "attempting automatic login");

        match self.backend.login(&saved.to_request()).await {
            Ok(response) => {
                let session = Session::new(response.access_token, response.player);
                let epoch = self.lock_epoch();
                if *epoch != started {
                    tracing::info!("signed out during automatic login, discarding the result");
                    return AuthState::Unauthenticated;
                }
                if let Err(e) = self.write_session(&session) {
                    tracing::warn!(error = %e, "automatic login succeeded but could not be cached");
                }
                AuthState::Authenticated(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "automatic login failed, forgetting saved login");
                if let Err(e) = self.storage.remove_many(&keys::SAVED_LOGIN) {
                    tracing::warn!(error = %e, "could not clear saved login");
                }
                AuthState::Unauthenticated
            }
        }
    }

    /// Reads the token and player record. A half-written pair or an
    /// unreadable record is removed.
    fn cached_session(&self) -> Result<Option<Session>, StorageError> {
        let token = self.read(keys::TOKEN)?;
        let player = self.read(keys::PLAYER)?;

        match (token, player) {
            (None, None) => Ok(None),
            (Some(token), Some(raw)) => match self.codec.decode_text::<Player>(&raw) {
                Ok(player) => Ok(Some(Session::new(token, player))),
                Err(e) => {
                    tracing::warn!(error = %e, "cached player record is unreadable, discarding");
                    self.storage.remove_many(&keys::SESSION)?;
                    Ok(None)
                }
            },
            (token, _) => {
                tracing::warn!(
                    has_token = token.is_some(),
                    "discarding half of a cached session"
                );
                self.storage.remove_many(&keys::SESSION)?;
                Ok(None)
            }
        }
    }

    /// Empty strings count as absent.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.storage.get(key)?.filter(|v| !v.is_empty()))
    }

    fn read_saved_login(&self) -> Result<Option<Credentials>, StorageError> {
        let email = self.read(keys::SAVED_EMAIL)?;
        let password = self.read(keys::SAVED_PASSWORD)?;
        let role = self.read(keys::SAVED_ROLE)?;

        Ok(match (email, password, role) {
            (Some(email), Some(password), Some(role)) => Some(Credentials {
                email,
                password,
                role: Role::from(role),
            }),
            _ => None,
        })
    }

    fn write_session(&self, session: &Session) -> Result<(), SessionError> {
        let player = self.codec.encode_text(session.player())?;
        self.storage
            .set_many(&[(keys::TOKEN, session.token()), (keys::PLAYER, player.as_str())])?;
        Ok(())
    }

    // -- login / logout -------------------------------------------------------

    /// The saved login, for pre-filling the login form.
    pub fn saved_credentials(&self) -> Result<Option<Credentials>, SessionError> {
        Ok(self.read_saved_login()?)
    }

    /// Signs in with the form's credentials.
    ///
    /// On success the token, the player record and the saved login are all
    /// written, and the state becomes `Authenticated`. On any failure
    /// nothing is written and the state is unchanged.
    ///
    /// # Errors
    /// - [`SessionError::Validation`]: the form is incomplete (no request sent)
    /// - [`SessionError::NotReady`]: bootstrap hasn't finished
    /// - [`SessionError::LoginInProgress`]: another login is pending
    /// - [`SessionError::AuthFailed`]: the backend refused, with its message
    /// - [`SessionError::RoleMismatch`]: first login with the wrong role
    /// - [`SessionError::LoginCancelled`]: [`logout`](Self::logout) ran
    ///   while the backend was answering
    pub async fn login(&self, form: &LoginForm) -> Result<Session, SessionError> {
        let credentials = form.validate()?;

        if self.is_loading() {
            return Err(SessionError::NotReady);
        }

        let _latch =
            InFlight::acquire(&self.login_in_flight).ok_or(SessionError::LoginInProgress)?;
        let started = self.current_epoch();

        tracing::info!(email = %credentials.email, role = %credentials.role, "logging in");

        let response = self
            .backend
            .login(&credentials.to_request())
            .await
            .map_err(|e| {
                tracing::warn!(email = %credentials.email, error = %e, "login rejected");
                SessionError::auth_failed(e)
            })?;

        if response.is_first_login {
            if let Some(assigned) = &response.assigned_role {
                if *assigned != credentials.role {
                    tracing::warn!(
                        selected = %credentials.role,
                        assigned = %assigned,
                        "first login with the wrong role"
                    );
                    return Err(SessionError::RoleMismatch {
                        assigned: assigned.clone(),
                    });
                }
            }
        }

        let session = Session::new(response.access_token, response.player);
        let player = self.codec.encode_text(session.player())?;

        let epoch = self.lock_epoch();
        if *epoch != started {
            tracing::info!(email = %credentials.email, "signed out during login, discarding the result");
            return Err(SessionError::LoginCancelled);
        }
        self.storage.set_many(&[
            (keys::TOKEN, session.token()),
            (keys::PLAYER, player.as_str()),
            (keys::SAVED_EMAIL, credentials.email.as_str()),
            (keys::SAVED_PASSWORD, credentials.password.as_str()),
            (keys::SAVED_ROLE, credentials.role.as_str()),
        ])?;

        self.state
            .send_replace(AuthState::Authenticated(session.clone()));
        drop(epoch);

        tracing::info!(
            player_id = %session.player().player_id,
            admin = session.is_admin(),
            "logged in"
        );
        Ok(session)
    }

    /// Signs out and forgets the saved login. Safe to call repeatedly.
    ///
    /// While still loading only storage is cleared; bootstrap then finds
    /// nothing and ends `Unauthenticated`.
    pub fn logout(&self) -> Result<(), SessionError> {
        let mut epoch = self.lock_epoch();
        *epoch = epoch.wrapping_add(1);
        let cleared = self.storage.remove_many(&keys::ALL);
        let changed = self.end_session();
        drop(epoch);
        tracing::info!(was_signed_in = changed, "logged out");
        cleared.map_err(SessionError::from)
    }

    /// Ends the session after the backend rejected the token.
    ///
    /// Deletes the token and player record but keeps the saved login. A
    /// login already in flight is not cancelled: its new token is still
    /// good.
    pub fn invalidate(&self) {
        let _epoch = self.lock_epoch();
        if let Err(e) = self.storage.remove_many(&keys::SESSION) {
            tracing::warn!(error = %e, "could not clear cached session");
        }
        if self.end_session() {
            tracing::warn!("session invalidated by the backend");
        }
    }

    /// `Authenticated` → `Unauthenticated`. Returns whether it changed.
    fn end_session(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_authenticated() {
                *state = AuthState::Unauthenticated;
                true
            } else {
                false
            }
        })
    }

    /// Replaces the cached player record after a profile fetch.
    ///
    /// The token is unchanged; the admin flag follows the new record.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] unless signed in.
    pub fn update_player(&self, player: Player) -> Result<Session, SessionError> {
        let encoded = self.codec.encode_text(&player)?;

        let _epoch = self.lock_epoch();
        let current = self.current_session().ok_or(SessionError::NotAuthenticated)?;
        let session = Session::new(current.token(), player);

        self.storage.set(keys::PLAYER, &encoded)?;
        self.state.send_if_modified(|state| match state {
            AuthState::Authenticated(current) if *current != session => {
                *current = session.clone();
                true
            }
            _ => false,
        });

        tracing::debug!(player_id = %session.player().player_id, "player record refreshed");
        Ok(session)
    }

    /// The token to send with the next request.
    pub fn bearer_token(&self) -> Option<String> {
        self.state
            .borrow()
            .session()
            .map(|s| s.token().to_owned())
    }
}

impl<B: AuthBackend, S: Storage> SessionHooks for SessionController<B, S> {
    fn bearer_token(&self) -> Option<String> {
        SessionController::bearer_token(self)
    }

    fn invalidate(&self) {
        SessionController::invalidate(self);
    }
}
