//! Integration tests for the session lifecycle: bootstrap, login, logout
//! and the `401` reset, against a scripted auth backend.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use godfather_api::{ApiError, AuthBackend, SessionHooks};
use godfather_protocol::{LoginRequest, LoginResponse, Role};
use godfather_session::{
    AuthState, FileStorage, LOGIN_FAILED_FALLBACK, LoginForm, MemoryStorage, SessionController,
    SessionError, Storage, keys,
};
use serde_json::{Value, json};

// =========================================================================
// Scripted backend
// =========================================================================

type Script = Box<dyn Fn(&LoginRequest) -> Result<Value, ApiError> + Send + Sync>;

/// Answers every login with the script and records what was sent.
struct ScriptedBackend {
    script: Script,
    calls: AtomicUsize,
    last_request: Mutex<Option<(String, String, Role)>>,
}

impl ScriptedBackend {
    fn new(script: impl Fn(&LoginRequest) -> Result<Value, ApiError> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A backend that must never be called.
    fn unreachable() -> Self {
        Self::new(|_| panic!("unexpected login call"))
    }

    fn rejecting(detail: &'static str) -> Self {
        Self::new(move |_| {
            Err(ApiError::Unauthorized {
                detail: Some(detail.into()),
            })
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AuthBackend for ScriptedBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((
            request.email.clone(),
            request.password.clone(),
            request.role.clone(),
        ));
        let body = (self.script)(request)?;
        Ok(serde_json::from_value(body).unwrap())
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn detective_login() -> Value {
    json!({
        "access_token": "t1",
        "player": { "player_id": "u1", "name": "Ana", "role": "Detective", "balance": 500 },
        "is_first_login": false,
    })
}

fn cached_player(id: Value, role: &str) -> String {
    json!({ "player_id": id, "name": "Luca", "role": role }).to_string()
}

fn saved_login() -> [(&'static str, &'static str); 3] {
    [
        (keys::SAVED_EMAIL, "a@x.com"),
        (keys::SAVED_PASSWORD, "p"),
        (keys::SAVED_ROLE, "Detective"),
    ]
}

fn get(storage: &impl Storage, key: &str) -> Option<String> {
    storage.get(key).unwrap()
}

fn all_keys_absent(storage: &impl Storage) -> bool {
    keys::ALL.iter().all(|k| get(storage, k).is_none())
}

async fn ready(
    backend: ScriptedBackend,
    storage: MemoryStorage,
) -> SessionController<ScriptedBackend, MemoryStorage> {
    let controller = SessionController::new(backend, storage);
    controller.bootstrap().await.unwrap();
    controller
}

// =========================================================================
// Bootstrap
// =========================================================================

#[tokio::test]
async fn test_bootstrap_cached_session_makes_no_network_call() {
    for (id, role, admin) in [
        (json!(7), "Don", false),
        (json!("u-9"), "Godfather", true),
        (json!(0), "Citizen", true),
        (json!("admin-uuid"), "Merchant", true),
    ] {
        let storage = MemoryStorage::with_entries([
            (keys::TOKEN, "cached-token".to_string()),
            (keys::PLAYER, cached_player(id, role)),
        ]);
        let controller = SessionController::new(ScriptedBackend::unreachable(), storage);

        let state = controller.bootstrap().await.unwrap();

        assert!(state.is_authenticated());
        assert_eq!(state.is_admin(), admin);
        assert_eq!(controller.backend().calls(), 0);
        assert_eq!(controller.bearer_token().as_deref(), Some("cached-token"));
    }
}

#[tokio::test]
async fn test_bootstrap_cached_session_wins_over_saved_login() {
    let storage = MemoryStorage::with_entries(
        [
            (keys::TOKEN, "cached-token".to_string()),
            (keys::PLAYER, cached_player(json!(7), "Don")),
        ]
        .into_iter()
        .chain(saved_login().map(|(k, v)| (k, v.to_string()))),
    );
    let controller = SessionController::new(ScriptedBackend::unreachable(), storage);

    assert!(controller.bootstrap().await.unwrap().is_authenticated());
    assert_eq!(controller.backend().calls(), 0);
}

#[tokio::test]
async fn test_bootstrap_saved_login_signs_in_once() {
    let controller = SessionController::new(
        ScriptedBackend::new(|_| Ok(detective_login())),
        MemoryStorage::with_entries(saved_login()),
    );

    let state = controller.bootstrap().await.unwrap();

    assert!(state.is_authenticated());
    assert_eq!(controller.backend().calls(), 1);
    assert_eq!(
        *controller.backend().last_request.lock().unwrap(),
        Some(("a@x.com".into(), "p".into(), Role::Detective))
    );
    assert_eq!(get(controller.storage(), keys::TOKEN).as_deref(), Some("t1"));
    assert!(get(controller.storage(), keys::PLAYER).is_some());
    assert_eq!(get(controller.storage(), keys::SAVED_EMAIL).as_deref(), Some("a@x.com"));
}

#[tokio::test]
async fn test_bootstrap_failed_auto_login_forgets_saved_login() {
    let controller = SessionController::new(
        ScriptedBackend::rejecting("Invalid email or password"),
        MemoryStorage::with_entries(saved_login()),
    );

    let state = controller.bootstrap().await.unwrap();

    assert_eq!(state, AuthState::Unauthenticated);
    assert_eq!(controller.backend().calls(), 1);
    assert!(all_keys_absent(controller.storage()));
}

#[tokio::test]
async fn test_bootstrap_transport_failure_also_forgets_saved_login() {
    let controller = SessionController::new(
        ScriptedBackend::new(|_| {
            Err(ApiError::Status {
                status: 503,
                detail: None,
            })
        }),
        MemoryStorage::with_entries(saved_login()),
    );

    assert_eq!(controller.bootstrap().await.unwrap(), AuthState::Unauthenticated);
    assert!(controller.saved_credentials().unwrap().is_none());
}

#[tokio::test]
async fn test_bootstrap_incomplete_saved_login_is_ignored() {
    let controller = SessionController::new(
        ScriptedBackend::unreachable(),
        MemoryStorage::with_entries([(keys::SAVED_EMAIL, "a@x.com"), (keys::SAVED_ROLE, "Don")]),
    );

    assert_eq!(controller.bootstrap().await.unwrap(), AuthState::Unauthenticated);
    assert_eq!(get(controller.storage(), keys::SAVED_EMAIL).as_deref(), Some("a@x.com"));
}

#[tokio::test]
async fn test_bootstrap_discards_orphan_token() {
    let storage = MemoryStorage::with_entries([(keys::TOKEN, "lonely")]);
    let controller = SessionController::new(ScriptedBackend::unreachable(), storage);

    assert_eq!(controller.bootstrap().await.unwrap(), AuthState::Unauthenticated);
    assert!(get(controller.storage(), keys::TOKEN).is_none());
}

#[tokio::test]
async fn test_bootstrap_discards_unreadable_player_then_tries_saved_login() {
    let storage = MemoryStorage::with_entries(
        [(keys::TOKEN, "t0"), (keys::PLAYER, "{not json")]
            .into_iter()
            .chain(saved_login()),
    );
    let controller = SessionController::new(ScriptedBackend::new(|_| Ok(detective_login())), storage);

    let state = controller.bootstrap().await.unwrap();

    assert!(state.is_authenticated());
    assert_eq!(controller.backend().calls(), 1);
    assert_eq!(controller.bearer_token().as_deref(), Some("t1"));
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn test_login_scenario_detective() {
    let controller = ready(ScriptedBackend::new(|_| Ok(detective_login())), MemoryStorage::new()).await;

    let session = controller
        .login(&LoginForm::new("a@x.com", "p", Some(Role::Detective)))
        .await
        .unwrap();

    assert!(!session.is_admin());
    assert_eq!(session.player().role, Role::Detective);

    let storage = controller.storage();
    assert_eq!(get(storage, keys::TOKEN).as_deref(), Some("t1"));
    let cached: Value = serde_json::from_str(&get(storage, keys::PLAYER).unwrap()).unwrap();
    assert_eq!(cached["player_id"], "u1");
    assert_eq!(cached["balance"], 500.0);
    assert_eq!(get(storage, keys::SAVED_EMAIL).as_deref(), Some("a@x.com"));
    assert_eq!(get(storage, keys::SAVED_PASSWORD).as_deref(), Some("p"));
    assert_eq!(get(storage, keys::SAVED_ROLE).as_deref(), Some("Detective"));
    assert!(controller.state().is_authenticated());
}

#[tokio::test]
async fn test_login_scenario_sentinel_id_is_admin_regardless_of_role() {
    let backend = ScriptedBackend::new(|_| {
        let mut body = detective_login();
        body["player"]["player_id"] = json!(0);
        Ok(body)
    });
    let controller = ready(backend, MemoryStorage::new()).await;

    let session = controller
        .login(&LoginForm::new("a@x.com", "p", Some(Role::Detective)))
        .await
        .unwrap();

    assert!(session.is_admin());
    assert!(controller.state().is_admin());
}

#[tokio::test]
async fn test_login_first_time_wrong_role_is_rejected_locally() {
    let backend = ScriptedBackend::new(|_| {
        Ok(json!({
            "access_token": "t2",
            "player": { "player_id": 4, "role": "Merchant" },
            "is_first_login": true,
            "assigned_role": "Merchant",
        }))
    });
    let controller = ready(backend, MemoryStorage::new()).await;

    let err = controller
        .login(&LoginForm::new("b@x.com", "p", Some(Role::Doctor)))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::RoleMismatch { assigned: Role::Merchant }));
    assert_eq!(
        err.to_string(),
        "You are assigned the role: Merchant. Please select the correct role."
    );
    assert_eq!(controller.backend().calls(), 1);
    assert!(all_keys_absent(controller.storage()));
    assert_eq!(controller.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_login_first_time_matching_role_succeeds() {
    let backend = ScriptedBackend::new(|_| {
        Ok(json!({
            "access_token": "t3",
            "player": { "player_id": 4, "role": "Merchant" },
            "is_first_login": true,
            "assigned_role": "Merchant",
        }))
    });
    let controller = ready(backend, MemoryStorage::new()).await;

    let session = controller
        .login(&LoginForm::new("b@x.com", "p", Some(Role::Merchant)))
        .await
        .unwrap();

    assert_eq!(session.token(), "t3");
}

#[tokio::test]
async fn test_login_returning_player_role_is_not_checked() {
    let backend = ScriptedBackend::new(|_| {
        Ok(json!({
            "access_token": "t4",
            "player": { "player_id": 4, "role": "Merchant" },
            "is_first_login": false,
            "assigned_role": "Merchant",
        }))
    });
    let controller = ready(backend, MemoryStorage::new()).await;

    let result = controller
        .login(&LoginForm::new("b@x.com", "p", Some(Role::Citizen)))
        .await;

    assert!(result.is_ok());
    assert_eq!(get(controller.storage(), keys::SAVED_ROLE).as_deref(), Some("Citizen"));
}

#[tokio::test]
async fn test_login_missing_role_sends_nothing() {
    let controller = ready(ScriptedBackend::unreachable(), MemoryStorage::new()).await;

    let err = controller
        .login(&LoginForm::new("a@x.com", "p", None))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Please select your role to continue");
    assert_eq!(controller.backend().calls(), 0);
}

#[tokio::test]
async fn test_login_rejection_shows_backend_detail_and_stores_nothing() {
    let controller = ready(
        ScriptedBackend::rejecting("Invalid email or password"),
        MemoryStorage::new(),
    )
    .await;

    let err = controller
        .login(&LoginForm::new("a@x.com", "wrong", Some(Role::Don)))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(all_keys_absent(controller.storage()));
}

#[tokio::test]
async fn test_login_failure_without_detail_uses_fallback() {
    let controller = ready(
        ScriptedBackend::new(|_| {
            Err(ApiError::Status {
                status: 500,
                detail: None,
            })
        }),
        MemoryStorage::new(),
    )
    .await;

    let err = controller
        .login(&LoginForm::new("a@x.com", "p", Some(Role::Don)))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), LOGIN_FAILED_FALLBACK);
}

// =========================================================================
// Logout / invalidate / update
// =========================================================================

#[tokio::test]
async fn test_logout_is_idempotent() {
    let controller = ready(ScriptedBackend::new(|_| Ok(detective_login())), MemoryStorage::new()).await;
    controller
        .login(&LoginForm::new("a@x.com", "p", Some(Role::Detective)))
        .await
        .unwrap();

    controller.logout().unwrap();
    let after_first = controller.state();
    assert!(all_keys_absent(controller.storage()));

    controller.logout().unwrap();
    assert!(all_keys_absent(controller.storage()));
    assert_eq!(controller.state(), after_first);
    assert_eq!(controller.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_logout_while_loading_only_clears_storage() {
    let controller = SessionController::new(
        ScriptedBackend::unreachable(),
        MemoryStorage::with_entries(saved_login()),
    );

    controller.logout().unwrap();

    assert!(controller.is_loading());
    assert!(all_keys_absent(controller.storage()));
    assert_eq!(controller.bootstrap().await.unwrap(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_invalidate_keeps_saved_login() {
    let controller = ready(ScriptedBackend::new(|_| Ok(detective_login())), MemoryStorage::new()).await;
    controller
        .login(&LoginForm::new("a@x.com", "p", Some(Role::Detective)))
        .await
        .unwrap();

    SessionHooks::invalidate(&controller);

    assert_eq!(controller.state(), AuthState::Unauthenticated);
    assert!(controller.bearer_token().is_none());
    assert!(get(controller.storage(), keys::TOKEN).is_none());
    assert!(get(controller.storage(), keys::PLAYER).is_none());
    let saved = controller.saved_credentials().unwrap().unwrap();
    assert_eq!(saved.email, "a@x.com");
    assert_eq!(saved.role, Role::Detective);
}

#[tokio::test]
async fn test_update_player_rederives_admin() {
    let controller = ready(ScriptedBackend::new(|_| Ok(detective_login())), MemoryStorage::new()).await;
    controller
        .login(&LoginForm::new("a@x.com", "p", Some(Role::Detective)))
        .await
        .unwrap();

    let promoted = serde_json::from_value(json!({
        "player_id": "u1", "name": "Ana", "role": "Godfather"
    }))
    .unwrap();
    let session = controller.update_player(promoted).unwrap();

    assert!(session.is_admin());
    assert_eq!(session.token(), "t1");
    assert!(controller.state().is_admin());
    let cached: Value =
        serde_json::from_str(&get(controller.storage(), keys::PLAYER).unwrap()).unwrap();
    assert_eq!(cached["role"], "Godfather");
}

// =========================================================================
// File-backed restart
// =========================================================================

#[tokio::test]
async fn test_file_storage_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    {
        let controller = SessionController::new(
            ScriptedBackend::new(|_| Ok(detective_login())),
            FileStorage::open(&path).unwrap(),
        );
        controller.bootstrap().await.unwrap();
        controller
            .login(&LoginForm::new("a@x.com", "p", Some(Role::Detective)))
            .await
            .unwrap();
    }

    let restarted =
        SessionController::new(ScriptedBackend::unreachable(), FileStorage::open(&path).unwrap());
    let state = restarted.bootstrap().await.unwrap();

    assert_eq!(state.session().map(|s| s.token()), Some("t1"));
    assert_eq!(restarted.backend().calls(), 0);
}

/// Replaces the session file's directory with a plain file so every later
/// write fails.
fn block_writes(dir: &std::path::Path) {
    std::fs::remove_dir_all(dir).unwrap();
    std::fs::write(dir, "").unwrap();
}

#[tokio::test]
async fn test_login_that_cannot_be_saved_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    std::fs::create_dir(&sub).unwrap();

    let controller = SessionController::new(
        ScriptedBackend::new(|_| Ok(detective_login())),
        FileStorage::open(sub.join("session.json")).unwrap(),
    );
    controller.bootstrap().await.unwrap();
    block_writes(&sub);

    let err = controller
        .login(&LoginForm::new("a@x.com", "p", Some(Role::Detective)))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Storage(_)));
    assert_eq!(controller.state(), AuthState::Unauthenticated);
    assert!(all_keys_absent(controller.storage()));
    assert!(controller.saved_credentials().unwrap().is_none());
}

#[tokio::test]
async fn test_update_player_that_cannot_be_saved_keeps_old_record() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    std::fs::create_dir(&sub).unwrap();

    let controller = SessionController::new(
        ScriptedBackend::new(|_| Ok(detective_login())),
        FileStorage::open(sub.join("session.json")).unwrap(),
    );
    controller.bootstrap().await.unwrap();
    controller
        .login(&LoginForm::new("a@x.com", "p", Some(Role::Detective)))
        .await
        .unwrap();
    block_writes(&sub);

    let promoted = serde_json::from_value(json!({
        "player_id": "u1", "name": "Ana", "role": "Godfather"
    }))
    .unwrap();
    assert!(controller.update_player(promoted).is_err());

    assert!(!controller.state().is_admin());
    let cached: Value =
        serde_json::from_str(&get(controller.storage(), keys::PLAYER).unwrap()).unwrap();
    assert_eq!(cached["role"], "Detective");
}
