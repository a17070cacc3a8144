//! Session lifecycle for the Godfather client.
//!
//! This crate owns everything about "who is signed in":
//!
//! 1. **Storage**: durable key-value storage for the token, the cached
//!    player record and the saved login ([`Storage`], [`MemoryStorage`],
//!    [`FileStorage`])
//! 2. **Lifecycle**: bootstrap, login, logout and the `401` reset
//!    ([`SessionController`])
//! 3. **Authorization**: the admin rule ([`is_admin`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Route layer (above)   ← reads AuthState to pick a screen
//!     ↕
//! Session layer (this crate)  ← owns the token and the player record
//!     ↕
//! API layer (below)     ← AuthBackend for login, SessionHooks for 401s
//! ```

mod controller;
mod error;
mod privilege;
mod session;
mod storage;

pub use controller::SessionController;
pub use error::{LOGIN_FAILED_FALLBACK, SessionError, StorageError};
pub use privilege::is_admin;
pub use session::{AuthState, Credentials, LoginForm, Session};
pub use storage::{FileStorage, MemoryStorage, Storage, keys};
