//! Authenticated endpoints of the game backend.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use godfather_protocol::{
    ActionReceipt, AssignRole, CompleteMission, EmailBlast, EntityId, Family, FamilyList, GameState,
    Mission, MissionList, MoneyUpdate, MyFamily, NewMission, NewOffer, NewsFeed,
    OfferList, Player, PlayerAction, PlayerId, PublishNews, PuzzleSolved, RecipientType,
    TransferMoney, UpdateItems, UpdateMoney, UpdateStats,
};

use crate::http::ApiRequest;
use crate::{ApiError, HttpClient, SessionHooks};

/// The game backend as seen by a signed-in player.
///
/// Every call reads the current bearer token from the session through
/// [`SessionHooks::bearer_token`]. A `401` answer ends the session through
/// [`SessionHooks::invalidate`] before the error is returned, so the caller
/// only has to route to the login screen.
pub struct GameApi<H: SessionHooks> {
    http: HttpClient,
    hooks: Arc<H>,
}

impl<H: SessionHooks> Clone for GameApi<H> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<H: SessionHooks> std::fmt::Debug for GameApi<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameApi")
            .field("base_url", &self.http.base_url())
            .finish_non_exhaustive()
    }
}

impl<H: SessionHooks> GameApi<H> {
    pub fn new(http: HttpClient, hooks: Arc<H>) -> Self {
        Self { http, hooks }
    }

    /// The unauthenticated client underneath.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let token = self.hooks.bearer_token();
        let result = self.http.send(request, token.as_deref()).await;
        if let Err(ApiError::Unauthorized { detail }) = &result {
            tracing::warn!(detail = ?detail, "backend rejected the session token, signing out");
            self.hooks.invalidate();
        }
        result
    }

    // -- player ---------------------------------------------------------------

    /// `GET /player/me/profile`
    pub async fn my_profile(&self) -> Result<Player, ApiError> {
        self.call(ApiRequest::get("/player/me/profile")).await
    }

    /// `GET /player/{id}`
    pub async fn player(&self, id: &PlayerId) -> Result<Player, ApiError> {
        let path = format!("/player/{}", urlencoding::encode(&id.to_string()));
        self.call(ApiRequest::get(path)).await
    }

    /// `GET /player/`
    pub async fn all_players(&self) -> Result<Vec<Player>, ApiError> {
        self.call(ApiRequest::get("/player/")).await
    }

    /// `GET /player/leaderboard/top?limit=N`
    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<Player>, ApiError> {
        self.call(ApiRequest::get("/player/leaderboard/top").query("limit", limit))
            .await
    }

    /// `GET /player/news/all`
    pub async fn news(&self) -> Result<NewsFeed, ApiError> {
        self.call(ApiRequest::get("/player/news/all")).await
    }

    /// `POST /player/me/mark-dead`: the player reports their own elimination.
    pub async fn mark_dead(&self) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/player/me/mark-dead")).await
    }

    // -- missions -------------------------------------------------------------

    /// `GET /missions/today`
    pub async fn today_missions(&self) -> Result<MissionList, ApiError> {
        self.call(ApiRequest::get("/missions/today")).await
    }

    /// `GET /missions/all`, optionally for one day or across all days.
    pub async fn all_missions(
        &self,
        day: Option<u32>,
        all_days: bool,
    ) -> Result<MissionList, ApiError> {
        let request = ApiRequest::get("/missions/all")
            .query_opt("day", day)
            .query_opt("all_days", all_days.then_some(true));
        self.call(request).await
    }

    /// `GET /missions/{id}`
    pub async fn mission(&self, id: &EntityId) -> Result<Mission, ApiError> {
        let path = format!("/missions/{}", urlencoding::encode(&id.to_string()));
        self.call(ApiRequest::get(path)).await
    }

    /// `POST /missions/complete`
    pub async fn complete_mission(&self, body: &CompleteMission) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/missions/complete").json(body)?)
            .await
    }

    /// `POST /missions/puzzle-solved`
    pub async fn puzzle_solved(&self, body: &PuzzleSolved) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/missions/puzzle-solved").json(body)?)
            .await
    }

    // -- trades ---------------------------------------------------------------

    /// `POST /trades/transfer-money`
    pub async fn transfer_money(&self, body: &TransferMoney) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/trades/transfer-money").json(body)?)
            .await
    }

    /// `GET /trades/history`
    pub async fn trade_history(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/trades/history")).await
    }

    /// `GET /trades/all`
    pub async fn all_trades(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/trades/all")).await
    }

    // -- families -------------------------------------------------------------

    /// `GET /families/`, accepting both the wrapped and the bare list.
    pub async fn families(&self) -> Result<Vec<Family>, ApiError> {
        let list: FamilyList = self.call(ApiRequest::get("/families/")).await?;
        Ok(list.into_vec())
    }

    /// `GET /families/{name}`
    pub async fn family(&self, name: &str) -> Result<Family, ApiError> {
        let path = format!("/families/{}", urlencoding::encode(name));
        self.call(ApiRequest::get(path)).await
    }

    /// `GET /families/{name}/members`
    pub async fn family_members(&self, name: &str) -> Result<Vec<Player>, ApiError> {
        let path = format!("/families/{}/members", urlencoding::encode(name));
        self.call(ApiRequest::get(path)).await
    }

    /// `GET /families/leaderboard/top?limit=N`
    pub async fn family_leaderboard(&self, limit: u32) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/families/leaderboard/top").query("limit", limit))
            .await
    }

    /// `GET /families/my/family`
    pub async fn my_family(&self) -> Result<MyFamily, ApiError> {
        self.call(ApiRequest::get("/families/my/family")).await
    }

    // -- black market ---------------------------------------------------------

    /// `GET /blackmarket/offers`
    pub async fn market_offers(&self) -> Result<OfferList, ApiError> {
        self.call(ApiRequest::get("/blackmarket/offers")).await
    }

    /// `POST /blackmarket/purchase/{id}`
    pub async fn purchase_offer(&self, offer_id: &EntityId) -> Result<ActionReceipt, ApiError> {
        let path = format!("/blackmarket/purchase/{}", urlencoding::encode(&offer_id.to_string()));
        self.call(ApiRequest::post(path)).await
    }

    // -- admin ----------------------------------------------------------------

    /// `GET /blackmarket/admin/all-offers`
    pub async fn admin_all_offers(&self) -> Result<OfferList, ApiError> {
        self.call(ApiRequest::get("/blackmarket/admin/all-offers"))
            .await
    }

    /// `POST /blackmarket/admin/create-offer`
    pub async fn admin_create_offer(&self, body: &NewOffer) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/blackmarket/admin/create-offer").json(body)?)
            .await
    }

    /// `DELETE /blackmarket/admin/delete-offer/{id}`
    pub async fn admin_delete_offer(&self, offer_id: &EntityId) -> Result<ActionReceipt, ApiError> {
        let path = format!(
            "/blackmarket/admin/delete-offer/{}",
            urlencoding::encode(&offer_id.to_string())
        );
        self.call(ApiRequest::delete(path)).await
    }

    /// `GET /admin/players`
    pub async fn admin_players(&self) -> Result<Vec<Player>, ApiError> {
        self.call(ApiRequest::get("/admin/players")).await
    }

    /// `GET /admin/game-state`
    pub async fn game_state(&self) -> Result<GameState, ApiError> {
        self.call(ApiRequest::get("/admin/game-state")).await
    }

    /// `GET /admin/dashboard`
    pub async fn admin_dashboard(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/admin/dashboard")).await
    }

    /// `GET /admin/news`
    pub async fn admin_news(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/admin/news")).await
    }

    /// `POST /admin/update-money`
    pub async fn update_money(&self, body: &UpdateMoney) -> Result<MoneyUpdate, ApiError> {
        self.call(ApiRequest::post("/admin/update-money").json(body)?)
            .await
    }

    /// `POST /admin/update-items`
    pub async fn update_items(&self, body: &UpdateItems) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/admin/update-items").json(body)?)
            .await
    }

    /// `POST /admin/update-stats`
    pub async fn update_stats(&self, body: &UpdateStats) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/admin/update-stats").json(body)?)
            .await
    }

    /// `POST /admin/assign-role`
    pub async fn assign_role(&self, body: &AssignRole) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/admin/assign-role").json(body)?)
            .await
    }

    /// `POST /admin/add-mission`
    pub async fn add_mission(&self, body: &NewMission) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/admin/add-mission").json(body)?)
            .await
    }

    /// `DELETE /admin/clear-missions`
    pub async fn clear_missions(&self) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::delete("/admin/clear-missions")).await
    }

    /// `POST /admin/publish-news`
    pub async fn publish_news(&self, body: &PublishNews) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/admin/publish-news").json(body)?)
            .await
    }

    /// `POST /admin/eliminate-player`
    pub async fn eliminate_player(&self, body: &PlayerAction) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/admin/eliminate-player").json(body)?)
            .await
    }

    /// `POST /admin/revive-player`
    pub async fn revive_player(&self, body: &PlayerAction) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/admin/revive-player").json(body)?)
            .await
    }

    /// `POST /admin/set-game-day?day=N`
    pub async fn set_game_day(&self, day: u32) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/admin/set-game-day").query("day", day))
            .await
    }

    /// `POST /admin/set-unlock-hour?hour=H`: when the day's missions unlock.
    pub async fn set_unlock_hour(&self, hour: u32) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/admin/set-unlock-hour").query("hour", hour))
            .await
    }

    /// `POST /admin/set-blackmarket-hour?hour=H`
    pub async fn set_blackmarket_hour(&self, hour: u32) -> Result<ActionReceipt, ApiError> {
        self.call(ApiRequest::post("/admin/set-blackmarket-hour").query("hour", hour))
            .await
    }

    /// `POST /admin/send-day-start-email`
    pub async fn send_day_start_email(
        &self,
        recipients: RecipientType,
    ) -> Result<ActionReceipt, ApiError> {
        self.email_blast("/admin/send-day-start-email", recipients)
            .await
    }

    /// `POST /admin/send-mission-unlock-email`
    pub async fn send_mission_unlock_email(
        &self,
        recipients: RecipientType,
    ) -> Result<ActionReceipt, ApiError> {
        self.email_blast("/admin/send-mission-unlock-email", recipients)
            .await
    }

    /// `POST /admin/send-blackmarket-email`
    pub async fn send_blackmarket_email(
        &self,
        recipients: RecipientType,
    ) -> Result<ActionReceipt, ApiError> {
        self.email_blast("/admin/send-blackmarket-email", recipients)
            .await
    }

    async fn email_blast(
        &self,
        path: &'static str,
        recipient_type: RecipientType,
    ) -> Result<ActionReceipt, ApiError> {
        let body = EmailBlast { recipient_type };
        self.call(ApiRequest::post(path).json(&body)?).await
    }
}
