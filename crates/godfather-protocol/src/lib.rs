//! Wire types for the Godfather game client.
//!
//! This crate defines the "language" the client and the game backend speak:
//!
//! - **Identity and auth** ([`PlayerId`], [`Role`], [`Player`],
//!   [`LoginRequest`], [`LoginResponse`]): what the login endpoint
//!   accepts and returns, and the player record the client caches.
//! - **Game payloads** ([`Mission`], [`NewsItem`], [`Family`],
//!   [`MarketOffer`], request bodies for admin actions): the shapes the
//!   dashboard, market and admin screens read and write.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how cached records are
//!   turned into bytes for client-side storage.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about HTTP or storage. It only knows
//! how the data looks.
//!
//! ```text
//! Protocol (types) → Api (HTTP) → Session (auth lifecycle) → Route (screens)
//! ```

mod codec;
mod error;
mod game;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use game::{
    ActionReceipt, AssignRole, CompleteMission, EmailBlast, Family,
    FamilyList, GameState, MarketOffer, MarketStatus, Mission, MissionList,
    MoneyUpdate, MyFamily, NewMission, NewOffer, NewsFeed, NewsItem,
    OfferList, PlayerAction, PublishNews, PuzzleSolved, RecipientType,
    TransferMoney, UpdateItems, UpdateMoney, UpdateStats,
};
pub use types::{
    EntityId, LoginRequest, LoginResponse, Player, PlayerId, Role,
};
