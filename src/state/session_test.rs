use super::*;

use crate::state::storage::MemoryStorage;

const TIMEOUT: Duration = Duration::from_secs(300);

fn identity(id: i64, role: Role, token: &str) -> Identity {
    Identity { id, name: format!("user-{id}"), email: format!("u{id}@x.com"), role, access_token: token.to_owned() }
}

fn store() -> (SessionStore, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let session = SessionStore::new(storage.clone(), TIMEOUT);
    (session, storage)
}

/// Let spawned timer tasks run after the paused clock moved.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// bootstrap
// =============================================================================

#[tokio::test]
async fn new_store_is_loading_until_initialized() {
    let (session, _) = store();
    let snap = session.snapshot();
    assert!(snap.loading);
    assert!(snap.identity.is_none());

    let snap = session.initialize();
    assert!(!snap.loading);
    assert!(snap.identity.is_none());
    assert_eq!(session.idle_deadline(), None);
}

#[tokio::test]
async fn initialize_runs_once() {
    let (session, storage) = store();
    session.initialize();

    let raw = serde_json::to_string(&identity(1, Role::User, "T")).unwrap();
    storage.set(USER_KEY, &raw).unwrap();
    storage.set(TOKEN_KEY, "T").unwrap();

    let snap = session.initialize();
    assert!(snap.identity.is_none(), "second initialize must not re-read storage");
    assert!(!snap.loading);
}

#[tokio::test(start_paused = true)]
async fn initialize_restores_persisted_identity_and_arms_timer() {
    let (session, storage) = store();
    let raw = serde_json::to_string(&identity(4, Role::Admin, "T4")).unwrap();
    storage.set(USER_KEY, &raw).unwrap();
    storage.set(TOKEN_KEY, "T4").unwrap();

    let snap = session.initialize();
    assert_eq!(snap.identity.as_ref().map(|i| i.id), Some(4));
    assert_eq!(snap.role(), Some(Role::Admin));
    assert_eq!(session.idle_deadline(), Some(Instant::now() + TIMEOUT));
    assert_eq!(session.idle_phase(), IdlePhase::Active);
}

#[tokio::test]
async fn initialize_prefers_token_key_over_embedded_token() {
    let (session, storage) = store();
    let raw = serde_json::to_string(&identity(4, Role::User, "old")).unwrap();
    storage.set(USER_KEY, &raw).unwrap();
    storage.set(TOKEN_KEY, "fresh").unwrap();

    let snap = session.initialize();
    assert_eq!(snap.identity.unwrap().access_token, "fresh");
}

#[tokio::test]
async fn initialize_clears_corrupt_identity() {
    let (session, storage) = store();
    storage.set(USER_KEY, "{not json").unwrap();
    storage.set(TOKEN_KEY, "T").unwrap();

    let snap = session.initialize();
    assert!(snap.identity.is_none());
    assert!(!snap.loading);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn initialize_drops_orphan_token() {
    let (session, storage) = store();
    storage.set(TOKEN_KEY, "T").unwrap();

    session.initialize();
    assert_eq!(session.access_token(), None);
    assert!(storage.is_empty());
}

// =============================================================================
// login / logout
// =============================================================================

#[tokio::test]
async fn login_persists_identity_and_token() {
    let (session, storage) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));

    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("T"));
    let persisted: Identity = serde_json::from_str(&storage.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(persisted, identity(1, Role::User, "T"));
    assert_eq!(session.access_token().as_deref(), Some("T"));
    assert!(session.snapshot().is_authenticated());
}

#[tokio::test]
async fn login_replaces_identity_wholesale() {
    let (session, storage) = store();
    session.initialize();
    session.login(identity(1, Role::Admin, "A"));
    session.login(identity(2, Role::User, "B"));

    let snap = session.snapshot();
    assert_eq!(snap.identity, Some(identity(2, Role::User, "B")));
    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("B"));
}

#[tokio::test]
async fn login_then_logout_matches_pristine_state() {
    let (session, storage) = store();
    let pristine = session.initialize();
    assert!(storage.is_empty());

    session.login(identity(1, Role::User, "T"));
    session.logout();

    assert_eq!(session.snapshot(), pristine);
    assert!(storage.is_empty());
    assert_eq!(session.idle_deadline(), None);
    assert_eq!(session.idle_phase(), IdlePhase::LoggedOut);
}

#[tokio::test]
async fn logout_when_logged_out_is_noop() {
    let (session, storage) = store();
    session.initialize();
    let generation = session.generation();

    session.logout();
    session.logout();

    assert_eq!(session.generation(), generation);
    assert!(storage.is_empty());
    assert!(session.snapshot().identity.is_none());
}

#[tokio::test]
async fn generation_bumps_on_login_and_sign_out() {
    let (session, _) = store();
    session.initialize();
    let g0 = session.generation();
    session.login(identity(1, Role::User, "T"));
    let g1 = session.generation();
    session.force_sign_out();
    let g2 = session.generation();

    assert!(g1 != g0);
    assert!(g2 != g1);
}

#[tokio::test]
async fn force_sign_out_clears_memory_and_storage() {
    let (session, storage) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));

    session.force_sign_out();

    assert!(session.snapshot().identity.is_none());
    assert!(storage.is_empty());
    assert_eq!(session.access_token(), None);
}

// =============================================================================
// idle timer
// =============================================================================

#[tokio::test(start_paused = true)]
async fn interaction_rearms_to_exactly_timeout_after_last_signal() {
    let (session, _) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));

    for gap in [10_u64, 90, 250, 1, 299] {
        tokio::time::sleep(Duration::from_secs(gap)).await;
        assert!(session.reset_idle_timer());
        assert_eq!(session.idle_deadline(), Some(Instant::now() + TIMEOUT));
    }
    settle().await;
    assert!(!session.snapshot().idle_prompt_visible);
}

#[tokio::test(start_paused = true)]
async fn prompt_opens_after_timeout_without_interaction() {
    let (session, _) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));
    let mut rx = session.subscribe();
    rx.borrow_and_update();

    tokio::time::sleep(TIMEOUT - Duration::from_secs(1)).await;
    settle().await;
    assert!(!session.snapshot().idle_prompt_visible);

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    assert!(session.snapshot().idle_prompt_visible);
    assert_eq!(session.idle_phase(), IdlePhase::Prompting);
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().idle_prompt_visible);
}

#[tokio::test(start_paused = true)]
async fn interaction_is_ignored_while_prompting() {
    let (session, _) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));
    tokio::time::sleep(TIMEOUT + Duration::from_millis(1)).await;
    settle().await;
    assert!(session.snapshot().idle_prompt_visible);

    let mut rx = session.subscribe();
    let before = rx.borrow_and_update().clone();
    for _ in 0..5 {
        assert!(!session.reset_idle_timer());
    }
    tokio::time::sleep(TIMEOUT * 3).await;
    settle().await;

    assert!(!rx.has_changed().unwrap());
    assert_eq!(session.snapshot(), before);
    assert_eq!(session.idle_deadline(), None);
}

#[tokio::test(start_paused = true)]
async fn continue_session_closes_prompt_and_rearms() {
    let (session, _) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));
    assert!(!session.continue_session(), "nothing to continue while active");

    tokio::time::sleep(TIMEOUT + Duration::from_millis(1)).await;
    settle().await;
    assert!(session.continue_session());

    let snap = session.snapshot();
    assert!(!snap.idle_prompt_visible);
    assert!(snap.is_authenticated());
    assert_eq!(session.idle_deadline(), Some(Instant::now() + TIMEOUT));
    assert!(session.reset_idle_timer());
}

#[tokio::test(start_paused = true)]
async fn logout_from_prompt_closes_it_and_disarms() {
    let (session, storage) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));
    tokio::time::sleep(TIMEOUT + Duration::from_millis(1)).await;
    settle().await;

    session.logout();
    let snap = session.snapshot();
    assert!(!snap.idle_prompt_visible);
    assert!(snap.identity.is_none());
    assert!(storage.is_empty());

    tokio::time::sleep(TIMEOUT * 2).await;
    settle().await;
    assert!(!session.snapshot().idle_prompt_visible);
}

#[tokio::test(start_paused = true)]
async fn identity_cleared_before_firing_never_prompts() {
    let (session, _) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));
    tokio::time::sleep(TIMEOUT / 2).await;

    session.force_sign_out();
    tokio::time::sleep(TIMEOUT).await;
    settle().await;

    assert!(!session.snapshot().idle_prompt_visible);
    assert_eq!(session.idle_phase(), IdlePhase::LoggedOut);
}

#[tokio::test(start_paused = true)]
async fn prompt_fires_once_per_cycle() {
    let (session, _) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));

    // Two resets inside the window must not leave an orphaned timer behind.
    tokio::time::sleep(Duration::from_secs(100)).await;
    session.reset_idle_timer();
    tokio::time::sleep(Duration::from_secs(100)).await;
    session.reset_idle_timer();

    tokio::time::sleep(TIMEOUT - Duration::from_secs(1)).await;
    settle().await;
    assert!(!session.snapshot().idle_prompt_visible, "orphaned timer fired early");

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    assert!(session.snapshot().idle_prompt_visible);
}

#[tokio::test(start_paused = true)]
async fn relogin_after_logout_starts_fresh_cycle() {
    let (session, _) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));
    tokio::time::sleep(TIMEOUT + Duration::from_millis(1)).await;
    settle().await;
    session.logout();

    session.login(identity(2, Role::User, "U"));
    assert_eq!(session.idle_phase(), IdlePhase::Active);
    assert!(!session.snapshot().idle_prompt_visible);
    assert_eq!(session.idle_deadline(), Some(Instant::now() + TIMEOUT));
}

#[tokio::test]
async fn reset_without_identity_does_not_arm() {
    let (session, _) = store();
    session.initialize();
    assert!(!session.reset_idle_timer());
    assert_eq!(session.idle_deadline(), None);
}

#[tokio::test(start_paused = true)]
async fn teardown_disarms_but_keeps_identity() {
    let (session, storage) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));

    session.teardown();
    assert_eq!(session.idle_deadline(), None);
    assert!(session.snapshot().is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("T"));

    tokio::time::sleep(TIMEOUT * 2).await;
    settle().await;
    assert!(!session.snapshot().idle_prompt_visible);
}

#[tokio::test(start_paused = true)]
async fn activity_after_teardown_does_not_rearm() {
    let (session, _) = store();
    session.initialize();
    session.login(identity(1, Role::User, "T"));
    session.teardown();

    assert!(!session.reset_idle_timer());
    assert_eq!(session.idle_phase(), IdlePhase::LoggedOut);
    assert_eq!(session.idle_deadline(), None);
    assert!(session.snapshot().is_authenticated());
}
