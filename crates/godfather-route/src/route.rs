//! Routes (what was asked for) and screens (what gets shown).

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A navigable location in the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    /// The landing screen, `/`.
    Dashboard,
    Missions,
    /// The black market.
    Trade,
    Leaderboard,
    Family,
    Admin,
    /// Any path the client doesn't know.
    Unknown,
}

impl Route {
    /// Every known route, in navigation order.
    pub const KNOWN: [Route; 7] = [
        Route::Dashboard,
        Route::Missions,
        Route::Trade,
        Route::Leaderboard,
        Route::Family,
        Route::Admin,
        Route::Login,
    ];

    /// Parses a path. Query strings, fragments and surrounding slashes are
    /// ignored; matching is exact and case-sensitive otherwise.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();

        match path.trim().trim_matches('/') {
            "" => Self::Dashboard,
            "login" => Self::Login,
            "missions" => Self::Missions,
            "trade" => Self::Trade,
            "leaderboard" => Self::Leaderboard,
            "family" => Self::Family,
            "admin" => Self::Admin,
            _ => Self::Unknown,
        }
    }

    /// The canonical path. `Unknown` has none and reports the catch-all `*`.
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/",
            Self::Missions => "/missions",
            Self::Trade => "/trade",
            Self::Leaderboard => "/leaderboard",
            Self::Family => "/family",
            Self::Admin => "/admin",
            Self::Unknown => "*",
        }
    }

    /// Routes that need a signed-in player. Only the login screen doesn't.
    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Login)
    }

    pub fn requires_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// The screen this route shows once the guard lets it through.
    /// `None` for `Unknown`, which is never rendered.
    pub fn screen(self) -> Option<Screen> {
        Some(match self {
            Self::Login => Screen::Login,
            Self::Dashboard => Screen::Dashboard,
            Self::Missions => Screen::Missions,
            Self::Trade => Screen::Trade,
            Self::Leaderboard => Screen::Leaderboard,
            Self::Family => Screen::Family,
            Self::Admin => Screen::Admin,
            Self::Unknown => return None,
        })
    }
}

impl FromStr for Route {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// What the user actually sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Shown while the session is being restored.
    Loading,
    Login,
    Dashboard,
    Missions,
    Trade,
    Leaderboard,
    Family,
    Admin,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Login => "Login",
            Self::Dashboard => "Dashboard",
            Self::Missions => "Missions",
            Self::Trade => "Black Market",
            Self::Leaderboard => "Leaderboard",
            Self::Family => "Family",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
