//! The route guard.

use godfather_session::AuthState;

use crate::{Route, Screen};

/// What the guard needs to know about the caller.
///
/// Derived from [`AuthState`]. There is no "admin but signed out" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// The session is still being restored.
    Loading,
    Anonymous,
    Player,
    Admin,
}

impl Access {
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Player | Self::Admin)
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl From<&AuthState> for Access {
    fn from(state: &AuthState) -> Self {
        match state {
            AuthState::Loading => Self::Loading,
            AuthState::Unauthenticated => Self::Anonymous,
            AuthState::Authenticated(session) if session.is_admin() => Self::Admin,
            AuthState::Authenticated(_) => Self::Player,
        }
    }
}

/// The guard's decision for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Screen),
    /// Go here instead, replacing the requested location.
    Redirect(Route),
}

/// Decides what a navigation to `route` shows.
///
/// | route       | loading | anonymous           | player              | admin     |
/// |-------------|---------|---------------------|---------------------|-----------|
/// | login       | Loading | render              | → dashboard         | → dashboard |
/// | admin       | Loading | → dashboard         | → dashboard         | render    |
/// | unknown     | Loading | → dashboard         | → dashboard         | → dashboard |
/// | other       | Loading | → login             | render              | render    |
///
/// The admin redirect is silent: no error screen, just the landing page.
pub fn guard(route: Route, access: Access) -> Navigation {
    if access == Access::Loading {
        return Navigation::Render(Screen::Loading);
    }

    match route {
        Route::Unknown => Navigation::Redirect(Route::Dashboard),
        Route::Login if access.is_authenticated() => Navigation::Redirect(Route::Dashboard),
        Route::Login => Navigation::Render(Screen::Login),
        r if r.requires_admin() && !access.is_admin() => Navigation::Redirect(Route::Dashboard),
        r if r.is_protected() && !access.is_authenticated() => Navigation::Redirect(Route::Login),
        other => match other.screen() {
            Some(screen) => Navigation::Render(screen),
            None => Navigation::Redirect(Route::Dashboard),
        },
    }
}

/// Longest redirect chain the guard produces (`/admin` → `/` → `/login`).
const MAX_HOPS: usize = 2;

/// Follows redirects from `route` to the screen that ends up shown.
pub fn resolve_route(route: Route, access: Access) -> Screen {
    let mut current = route;
    for _ in 0..=MAX_HOPS {
        match guard(current, access) {
            Navigation::Render(screen) => return screen,
            Navigation::Redirect(next) => {
                tracing::debug!(from = %current, to = %next, ?access, "route redirected");
                current = next;
            }
        }
    }
    // Unreachable with the table above; fall back to the safest screen.
    tracing::warn!(requested = %route, ?access, "redirect chain did not settle");
    if access.is_authenticated() {
        Screen::Dashboard
    } else {
        Screen::Login
    }
}

/// Parses `path` and follows redirects to the screen that ends up shown.
pub fn resolve(path: &str, access: Access) -> Screen {
    resolve_route(Route::parse(path), access)
}
