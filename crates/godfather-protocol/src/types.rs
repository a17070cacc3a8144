//! Identity and authentication types.
//!
//! These are the structures the login endpoint accepts and returns, plus
//! the player record the client caches between runs. The backend is loose
//! about types (player ids arrive as numbers or strings, spreadsheet-backed
//! fields arrive as `"TRUE"` or `null`), so the deserializers here are
//! deliberately lenient while the Rust side stays strongly typed.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// An identifier as the backend sends it: either a number or a string.
///
/// `#[serde(untagged)]` means there is no wrapper in JSON: `42` becomes
/// `EntityId::Number(42)` and `"m-7"` becomes `EntityId::Text("m-7")`.
/// Serde tries the variants in order, so numbers win when both would fit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Parses typed-in ids: digits become a number, anything else stays text.
impl FromStr for EntityId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(s.to_string()),
        })
    }
}

/// A unique identifier for a player.
///
/// Newtype over [`EntityId`] so a player id can't be passed where a mission
/// or offer id is expected. `#[serde(transparent)]` keeps the JSON shape of
/// the inner id (`0`, `"u1"`), not `{ "0": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub EntityId);

impl PlayerId {
    /// Numeric id of the super-admin account.
    pub const ADMIN_SENTINEL_NUMBER: i64 = 0;

    /// Text id of the super-admin account.
    pub const ADMIN_SENTINEL_TEXT: &'static str = "admin-uuid";

    /// Returns `true` if this is the reserved id of the single super-admin
    /// account.
    ///
    /// The backend has used both a numeric and a text form for that
    /// account, so both are recognised here and nowhere else. The account
    /// is an administrator whatever its role field says.
    pub fn is_admin_sentinel(&self) -> bool {
        match &self.0 {
            EntityId::Number(n) => *n == Self::ADMIN_SENTINEL_NUMBER,
            EntityId::Text(s) => s == Self::ADMIN_SENTINEL_TEXT,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for PlayerId {
    fn from(n: i64) -> Self {
        Self(EntityId::Number(n))
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(EntityId::from(s))
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self(EntityId::Text(s))
    }
}

impl FromStr for PlayerId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A player's role in the game.
///
/// The seven game roles are the ones a player can pick on the login
/// screen. `Admin` is the backend's staff role. Anything else the backend
/// sends is kept verbatim in `Other` so a cached record never loses data.
///
/// `#[serde(from = "String", into = "String")]` makes the JSON form the
/// plain backend string (`"Godfather"`, `"admin"`), via the `From` impls
/// below.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Godfather,
    Don,
    Caporegime,
    Detective,
    Merchant,
    Doctor,
    Citizen,
    Admin,
    Other(String),
}

impl Role {
    /// The roles a player may select when logging in, in menu order.
    pub const SELECTABLE: [Role; 7] = [
        Role::Godfather,
        Role::Don,
        Role::Caporegime,
        Role::Detective,
        Role::Merchant,
        Role::Doctor,
        Role::Citizen,
    ];

    /// The exact string the backend uses for this role.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Godfather => "Godfather",
            Self::Don => "Don",
            Self::Caporegime => "Caporegime",
            Self::Detective => "Detective",
            Self::Merchant => "Merchant",
            Self::Doctor => "Doctor",
            Self::Citizen => "Citizen",
            Self::Admin => "admin",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` for roles that grant access to admin screens.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::Godfather)
    }

    /// Returns `true` if a player can pick this role on the login form.
    pub fn is_selectable(&self) -> bool {
        Self::SELECTABLE.contains(self)
    }

    /// Returns `true` when the backend has no real role for the player.
    ///
    /// Spreadsheet-backed records use an empty cell or `#N/A`.
    pub fn is_unassigned(&self) -> bool {
        match self {
            Self::Other(s) => s.trim().is_empty() || s == "#N/A",
            _ => false,
        }
    }
}

impl Default for Role {
    /// An unassigned role (empty string), used when the field is missing.
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "Godfather" => Self::Godfather,
            "Don" => Self::Don,
            "Caporegime" => Self::Caporegime,
            "Detective" => Self::Detective,
            "Merchant" => Self::Merchant,
            "Doctor" => Self::Doctor,
            "Citizen" => Self::Citizen,
            "admin" => Self::Admin,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::from(s.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A snapshot of a player's profile.
///
/// The client caches this after login and after each profile fetch. It is
/// a cache, not the source of truth: the backend owns the data. Fields the
/// client doesn't model (scores, items, counters) land in `extra` and are
/// written back unchanged, so nothing is lost when the record is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: PlayerId,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// The role the player is currently playing. `null` or missing
    /// becomes an unassigned role.
    #[serde(default, deserialize_with = "role_or_unassigned")]
    pub role: Role,

    /// The role the game master assigned to this account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_role: Option<Role>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    /// Mafia dollars. Missing, `null` or unparsable values read as zero.
    #[serde(default, deserialize_with = "lenient_number")]
    pub balance: f64,

    /// Accepts JSON booleans and the spreadsheet strings `"TRUE"`/`"FALSE"`.
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub alive: Option<bool>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Player {
    /// The role to show for this player.
    ///
    /// Falls back to `assigned_role` when `role` is unassigned. This is for
    /// display only; authorization always looks at `role`.
    pub fn effective_role(&self) -> &Role {
        match &self.assigned_role {
            Some(assigned) if self.role.is_unassigned() => assigned,
            _ => &self.role,
        }
    }
}

fn role_or_unassigned<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(Role::from).unwrap_or_default())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => Some(s.trim().eq_ignore_ascii_case("true")),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

// Hand-written so the password never ends up in a log line.
impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Successful response of `POST /auth/login`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Opaque bearer token for every later request.
    pub access_token: String,

    pub player: Player,

    /// `true` the first time this account logs in.
    #[serde(default)]
    pub is_first_login: bool,

    /// The role the game master assigned. The client compares it with the
    /// selected role on a first login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_role: Option<Role>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"<redacted>")
            .field("player", &self.player)
            .field("is_first_login", &self.is_first_login)
            .field("assigned_role", &self.assigned_role)
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
