//! Game payloads: missions, news, families, the black market and admin
//! request bodies.
//!
//! The backend owns the rules behind every one of these. The client only
//! reads them for display and sends the request bodies below, so the
//! response types keep the fields the screens use and carry the rest in
//! `extra`.

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EntityId, Player, PlayerId, Role};

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

/// One entry of the news feed shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `GET /player/news/all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsFeed {
    #[serde(default)]
    pub news: Vec<NewsItem>,
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// A mission as listed on the missions screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub mission_id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Reward in mafia dollars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_md: Option<f64>,
    /// `puzzle`, `task`, ... as the backend names it.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    /// `active` or `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Mission {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }
}

/// Response of the mission listing endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionList {
    #[serde(default)]
    pub missions: Vec<Mission>,
}

/// Body of `POST /missions/complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteMission {
    pub mission_id: EntityId,
    /// Admins may complete a mission on behalf of another player.
    pub player_id: Option<PlayerId>,
}

/// Body of `POST /missions/puzzle-solved`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleSolved {
    pub player_id: Option<PlayerId>,
    pub puzzle_id: Option<EntityId>,
}

/// Body of `POST /admin/add-mission`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMission {
    pub title: String,
    pub description: String,
    pub reward_md: f64,
    #[serde(rename = "type")]
    pub kind: String,
    /// `public` or a restricted visibility.
    pub visibility: String,
    /// A family name, or `all`.
    pub assigned_family: String,
    /// A role name, or `all`.
    pub assigned_role: String,
    pub day: u32,
    pub status: String,
    pub completed: bool,
}

impl NewMission {
    /// A public, active mission open to every family and role.
    pub fn public(title: impl Into<String>, description: impl Into<String>, reward_md: f64, day: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            reward_md,
            kind: "puzzle".into(),
            visibility: "public".into(),
            assigned_family: "all".into(),
            assigned_role: "all".into(),
            day,
            status: "active".into(),
            completed: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

/// A family summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub don: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_money: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `GET /families/my/family`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MyFamily {
    #[serde(default)]
    pub family: Option<Family>,
    #[serde(default)]
    pub members: Vec<Player>,
}

/// Response of `GET /families/`.
///
/// Some backend versions wrap the list in `{ "families": [...] }`, others
/// return the bare array. `#[serde(untagged)]` accepts both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FamilyList {
    Wrapped { families: Vec<Family> },
    Bare(Vec<Family>),
}

impl FamilyList {
    pub fn into_vec(self) -> Vec<Family> {
        match self {
            Self::Wrapped { families } => families,
            Self::Bare(families) => families,
        }
    }
}

// ---------------------------------------------------------------------------
// Black market
// ---------------------------------------------------------------------------

/// An item for sale on the black market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOffer {
    pub offer_id: EntityId,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_available: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the offer listing endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferList {
    #[serde(default)]
    pub offers: Vec<MarketOffer>,
}

/// IST is UTC+5:30; the market runs on Indian wall-clock time.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// 23:11 IST, in minutes after midnight.
const MARKET_OPENS_AT: i64 = 23 * 60 + 11;

/// The market stays open for one hour.
const MARKET_OPEN_MINUTES: u32 = 60;

const MINUTES_PER_DAY: u32 = 24 * 60;

fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Whether the black market is trading.
///
/// The backend has no status endpoint: the window (every night from
/// 23:11 to 00:11 IST) is fixed, and the client works it out from the
/// clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketStatus {
    pub is_open: bool,
    /// Minutes until the next opening; `None` while open.
    pub opens_in_minutes: Option<u32>,
}

impl MarketStatus {
    /// Status at the given instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        let wall: NaiveTime = instant.with_timezone(&ist()).time();
        // NaiveTime arithmetic wraps at midnight.
        let since_open = wall - TimeDelta::minutes(MARKET_OPENS_AT);
        let minutes = since_open.num_seconds_from_midnight() / 60;

        if minutes < MARKET_OPEN_MINUTES {
            Self {
                is_open: true,
                opens_in_minutes: None,
            }
        } else {
            Self {
                is_open: false,
                opens_in_minutes: Some(MINUTES_PER_DAY - minutes),
            }
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }
}

/// Body of `POST /blackmarket/admin/create-offer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOffer {
    pub item_name: String,
    pub description: String,
    pub price: f64,
    pub quantity_available: i64,
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Body of `POST /trades/transfer-money`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferMoney {
    pub to_player_id: PlayerId,
    pub amount: f64,
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// Response of `GET /admin/game-state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission_unlock_hour: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /admin/update-money`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateMoney {
    pub player_id: PlayerId,
    /// Signed change to apply to the balance.
    pub amount: f64,
    pub reason: Option<String>,
}

/// Response of `POST /admin/update-money`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyUpdate {
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub old_balance: f64,
    #[serde(default)]
    pub new_balance: f64,
    #[serde(default)]
    pub change: f64,
}

/// Body of `POST /admin/update-items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateItems {
    pub player_id: PlayerId,
    pub items: Vec<String>,
}

impl UpdateItems {
    /// Builds the body from comma-separated input, dropping blank entries.
    pub fn from_csv(player_id: PlayerId, input: &str) -> Self {
        let items = input
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect();
        Self { player_id, items }
    }
}

/// Body of `POST /admin/update-stats`: the player id plus any stat fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStats {
    pub player_id: PlayerId,
    #[serde(flatten)]
    pub stats: Map<String, Value>,
}

/// Body of `POST /admin/assign-role`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignRole {
    pub player_id: PlayerId,
    pub role: Role,
    pub family: Option<String>,
    #[serde(default)]
    pub balance: f64,
}

/// Body of `POST /admin/eliminate-player` and `POST /admin/revive-player`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAction {
    pub player_id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body of `POST /admin/publish-news`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishNews {
    pub title: String,
    pub message: String,
}

/// Who an admin email blast goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecipientType {
    /// Only the game master's test inbox.
    #[default]
    Test,
    All,
}

/// Body of the `POST /admin/send-*-email` endpoints. The backend sends
/// the emails; the client only triggers them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailBlast {
    pub recipient_type: RecipientType,
}

/// Generic acknowledgement returned by action endpoints (purchase,
/// mark-dead, email triggers, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
