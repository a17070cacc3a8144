//! # Godfather
//!
//! Client for *The Godfather*, an office mafia game.
//!
//! The crate wires three layers into one [`GameClient`]:
//!
//! - the backend REST client (`godfather-api`)
//! - the session lifecycle: bootstrap, login, logout and the `401` reset
//!   (`godfather-session`)
//! - the route guard that picks the screen for a path (`godfather-route`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use godfather::prelude::*;
//!
//! # async fn run() -> Result<(), GodfatherError> {
//! let client = GameClient::<FileStorage>::builder().build()?;
//! client.bootstrap().await?;
//!
//! if client.navigate("/missions") == Screen::Login {
//!     let form = LoginForm::new("me@office.example", "secret", Some(Role::Detective));
//!     client.login(&form).await?;
//! }
//! let today = client.api().today_missions().await?;
//! # let _ = today;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod logging;

pub use client::{Controller, DEFAULT_STATE_FILE, GameClient, GameClientBuilder};
pub use error::GodfatherError;

pub use godfather_api as api;
pub use godfather_protocol as protocol;
pub use godfather_route as route;
pub use godfather_session as session;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use godfather::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{GameClient, GameClientBuilder, GodfatherError};

    pub use godfather_api::{ApiConfig, ApiError, GameApi};
    pub use godfather_protocol::{EntityId, MarketStatus, Player, PlayerId, Role};
    pub use godfather_route::{Access, NavLink, Route, Screen};
    pub use godfather_session::{
        AuthState, Credentials, FileStorage, LoginForm, MemoryStorage, Session, Storage,
    };
}
