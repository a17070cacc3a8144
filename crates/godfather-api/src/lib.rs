//! REST client for the Godfather game backend.
//!
//! Two seams connect this crate to the session layer above it:
//!
//! - [`AuthBackend`]: "turn credentials into a token". Implemented by
//!   [`HttpClient`] against `POST /auth/login`, and by mocks in tests.
//! - [`SessionHooks`]: "who am I, and what to do when the backend says I'm
//!   not". Implemented by the session controller; [`GameApi`] reads the
//!   bearer token through it before every request and calls
//!   [`SessionHooks::invalidate`] on any `401`.
//!
//! ```text
//! Session (controller) ──implements──→ SessionHooks ←──reads── GameApi
//!        │                                                       │
//!        └──────────uses──→ AuthBackend (HttpClient) ←──wraps────┘
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod endpoints;
mod error;
mod http;

pub use config::{API_URL_ENV, ApiConfig, DEFAULT_API_URL};
pub use endpoints::GameApi;
pub use error::ApiError;
pub use http::HttpClient;

use godfather_protocol::{LoginRequest, LoginResponse};

/// Exchanges login credentials for a bearer token and player record.
///
/// # Trait bounds
///
/// - `Send + Sync` → the backend is shared with the session controller,
///   which itself sits behind an `Arc`.
/// - `'static` → it owns its HTTP client; nothing borrowed.
pub trait AuthBackend: Send + Sync + 'static {
    /// Calls the login endpoint.
    ///
    /// # Returns
    /// - `Ok(LoginResponse)`: the backend accepted the credentials.
    /// - `Err(ApiError)`: rejected credentials (`Unauthorized`/`Status`
    ///   with the backend's `detail`) or a transport failure.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl std::future::Future<Output = Result<LoginResponse, ApiError>> + Send;
}

/// Session callbacks used by [`GameApi`] around every authenticated request.
pub trait SessionHooks: Send + Sync + 'static {
    /// The bearer token to send, read fresh for every request.
    fn bearer_token(&self) -> Option<String>;

    /// Called when the backend answers `401`: the session is over.
    fn invalidate(&self);
}
