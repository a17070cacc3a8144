//! `GameClient` builder and the signed-in client.
//!
//! This is the entry point for using the game from Rust. It ties the
//! layers together: HTTP client → session controller → route guard.

use std::path::PathBuf;
use std::sync::Arc;

use godfather_api::{ApiConfig, GameApi, HttpClient};
use godfather_protocol::Player;
use godfather_route::{Access, NavLink, Screen, nav_links, resolve};
use godfather_session::{
    AuthState, Credentials, FileStorage, LoginForm, Session, SessionController, Storage,
};
use tokio::sync::watch;

use crate::GodfatherError;

/// Where the session is kept when nothing else is configured.
pub const DEFAULT_STATE_FILE: &str = ".godfather/session.json";

/// The session controller as wired by [`GameClient`].
pub type Controller<S> = SessionController<HttpClient, S>;

/// Builder for a [`GameClient`].
///
/// ```rust,no_run
/// # async fn run() -> Result<(), godfather::GodfatherError> {
/// use godfather::prelude::*;
///
/// let client = GameClient::<FileStorage>::builder()
///     .api_url("https://mafia.example")
///     .state_file("/tmp/godfather.json")
///     .build()?;
/// client.bootstrap().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GameClientBuilder {
    api: ApiConfig,
    state_file: PathBuf,
}

impl GameClientBuilder {
    /// Starts from [`ApiConfig::from_env`] and [`DEFAULT_STATE_FILE`].
    pub fn new() -> Self {
        Self {
            api: ApiConfig::from_env(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api = ApiConfig::new(url);
        self
    }

    pub fn api_config(mut self, config: ApiConfig) -> Self {
        self.api = config;
        self
    }

    pub fn state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = path.into();
        self
    }

    /// Builds a client whose session lives in the state file.
    pub fn build(self) -> Result<GameClient<FileStorage>, GodfatherError> {
        let storage = FileStorage::open(&self.state_file)?;
        self.build_with_storage(storage)
    }

    /// Builds a client on any storage.
    pub fn build_with_storage<S: Storage>(self, storage: S) -> Result<GameClient<S>, GodfatherError> {
        let http = HttpClient::new(&self.api)?;
        let session = Arc::new(SessionController::new(http.clone(), storage));
        let api = GameApi::new(http, Arc::clone(&session));
        tracing::debug!(base_url = %self.api.base_url, "game client ready");
        Ok(GameClient { session, api })
    }
}

impl Default for GameClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A client of the game backend with its session.
///
/// Every backend call goes through [`api`](Self::api), which attaches the
/// session token. A `401` on any of them signs the player out; the next
/// [`navigate`](Self::navigate) then lands on the login screen.
pub struct GameClient<S: Storage> {
    session: Arc<Controller<S>>,
    api: GameApi<Controller<S>>,
}

impl<S: Storage> GameClient<S> {
    pub fn builder() -> GameClientBuilder {
        GameClientBuilder::new()
    }

    /// Restores the session. Call once, before anything else.
    pub async fn bootstrap(&self) -> Result<AuthState, GodfatherError> {
        Ok(self.session.bootstrap().await?)
    }

    pub async fn login(&self, form: &LoginForm) -> Result<Session, GodfatherError> {
        Ok(self.session.login(form).await?)
    }

    pub fn logout(&self) -> Result<(), GodfatherError> {
        Ok(self.session.logout()?)
    }

    pub fn saved_credentials(&self) -> Result<Option<Credentials>, GodfatherError> {
        Ok(self.session.saved_credentials()?)
    }

    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.session.subscribe()
    }

    pub fn access(&self) -> Access {
        Access::from(&self.session.state())
    }

    /// The screen a navigation to `path` ends up on.
    pub fn navigate(&self, path: &str) -> Screen {
        resolve(path, self.access())
    }

    pub fn nav_links(&self) -> Vec<NavLink> {
        nav_links(self.access())
    }

    /// The authenticated backend endpoints.
    pub fn api(&self) -> &GameApi<Controller<S>> {
        &self.api
    }

    /// The backend endpoints, but only when the guard would show the
    /// admin screen. Non-admins get `None`, mirroring the silent redirect.
    pub fn admin_api(&self) -> Option<&GameApi<Controller<S>>> {
        (self.navigate("/admin") == Screen::Admin).then_some(&self.api)
    }

    pub fn session(&self) -> &Controller<S> {
        &self.session
    }

    /// Fetches the player's profile and refreshes the cached record.
    pub async fn refresh_profile(&self) -> Result<Player, GodfatherError> {
        let player = self.api.my_profile().await?;
        self.session.update_player(player.clone())?;
        Ok(player)
    }
}
