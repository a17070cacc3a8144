//! Screen routing for the Godfather client.
//!
//! The route guard decides, for every navigation, which screen is actually
//! shown. It is a pure function of the requested [`Route`] and the
//! caller's [`Access`], which is derived from the session's
//! [`AuthState`](godfather_session::AuthState).
//!
//! ```text
//! "/missions?x=1" ──parse──→ Route::Missions ──guard(access)──→ Render / Redirect
//!                                                   ↻ resolve() follows redirects
//! ```

mod guard;
mod nav;
mod route;

pub use guard::{Access, Navigation, guard, resolve, resolve_route};
pub use nav::{NavLink, nav_links};
pub use route::{Route, Screen};
