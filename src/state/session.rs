//! Session store: the single source of truth for who is logged in.
//!
//! SYSTEM CONTEXT
//! ==============
//! Constructed once at startup and handed to every consumer by `Clone` (the
//! handle is an `Arc`). Views read [`SessionSnapshot`]s or subscribe to the
//! change stream; the HTTP wrapper reads the access token and calls
//! [`SessionStore::force_sign_out`] on authorization failures.
//!
//! DESIGN
//! ======
//! - `loading` starts true and flips to false exactly once, in `initialize`.
//! - Identity is replaced wholesale on login and cleared wholesale on logout;
//!   both persisted keys are written and cleared together.
//! - The idle prompt can only be visible while an identity is present.
//! - Every login, logout and forced sign-out bumps the session generation.
//!   The HTTP wrapper tags requests with it and drops responses that come
//!   back after the generation moved on.
//! - The idle timer task holds a `Weak` handle, so a dropped store never
//!   keeps itself alive through its own timer.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::idle::{Elapsed, IdleMonitor, IdlePhase, IdleTicket};
use super::storage::{Storage, TOKEN_KEY, USER_KEY};
use crate::net::types::{Identity, Role};

/// Read view of the session published to consumers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub loading: bool,
    pub idle_prompt_visible: bool,
}

impl SessionSnapshot {
    fn bootstrapping() -> Self {
        Self { identity: None, loading: true, idle_prompt_visible: false }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|identity| identity.role)
    }
}

struct SessionInner {
    identity: Option<Identity>,
    loading: bool,
    initialized: bool,
    generation: u64,
    idle: IdleMonitor,
}

impl SessionInner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.identity.clone(),
            loading: self.loading,
            idle_prompt_visible: self.idle.is_prompting() && self.identity.is_some(),
        }
    }
}

struct Shared {
    state: Mutex<SessionInner>,
    storage: Arc<dyn Storage>,
    updates: watch::Sender<SessionSnapshot>,
}

/// Cheap-to-clone handle to the process-wide session.
#[derive(Clone)]
pub struct SessionStore {
    shared: Arc<Shared>,
}

impl SessionStore {
    /// Create the store in its bootstrapping state (`loading = true`).
    ///
    /// Nothing is read from storage until [`SessionStore::initialize`].
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, idle_timeout: Duration) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::bootstrapping());
        let inner = SessionInner {
            identity: None,
            loading: true,
            initialized: false,
            generation: 0,
            idle: IdleMonitor::new(idle_timeout),
        };
        Self { shared: Arc::new(Shared { state: Mutex::new(inner), storage, updates }) }
    }

    /// Hydrate from persisted storage. Runs once; later calls return the
    /// current snapshot without touching storage.
    ///
    /// Must be called from within a tokio runtime when an identity is
    /// persisted, since it arms the idle timer.
    pub fn initialize(&self) -> SessionSnapshot {
        let mut inner = self.lock();
        if inner.initialized {
            return inner.snapshot();
        }
        inner.initialized = true;
        inner.identity = load_identity(self.shared.storage.as_ref());
        inner.loading = false;
        let restored = inner.identity.as_ref().map(|identity| (identity.id, identity.role));
        if let Some((user_id, role)) = restored {
            info!(user_id, role = %role, "session restored");
            let schedule = self.scheduler();
            inner.idle.start(Instant::now(), schedule);
        } else {
            debug!("no persisted session");
        }
        self.publish(&inner)
    }

    /// Replace the identity, persist it and start a fresh idle cycle.
    pub fn login(&self, identity: Identity) {
        let mut inner = self.lock();
        persist_identity(self.shared.storage.as_ref(), &identity);
        info!(user_id = identity.id, role = %identity.role, "logged in");
        inner.identity = Some(identity);
        inner.generation = inner.generation.wrapping_add(1);
        let schedule = self.scheduler();
        inner.idle.start(Instant::now(), schedule);
        self.publish(&inner);
    }

    /// Clear identity and storage, close the prompt, disarm the timer.
    /// Safe to call when already logged out.
    pub fn logout(&self) {
        let mut inner = self.lock();
        if inner.identity.is_some() {
            info!("logged out");
        }
        self.clear_locked(&mut inner);
    }

    /// Same effect as [`SessionStore::logout`], triggered by an authorization
    /// failure rather than the user.
    pub fn force_sign_out(&self) {
        let mut inner = self.lock();
        warn!(had_identity = inner.identity.is_some(), "session rejected by backend, signing out");
        self.clear_locked(&mut inner);
    }

    /// Interaction signal. Re-arms the idle timer unless the prompt is open
    /// or nobody is logged in. Returns whether the timer was re-armed.
    ///
    /// After [`SessionStore::teardown`] the identity is still set but the
    /// monitor stays in `LoggedOut`, so this returns false until the next
    /// login.
    pub fn reset_idle_timer(&self) -> bool {
        let mut inner = self.lock();
        if inner.identity.is_none() {
            return false;
        }
        if inner.idle.phase() == IdlePhase::LoggedOut {
            debug!("activity after idle monitor teardown ignored");
            return false;
        }
        let schedule = self.scheduler();
        inner.idle.record_activity(Instant::now(), schedule).is_some()
    }

    /// Dismiss the idle prompt and restart the countdown. Returns false when
    /// the prompt was not open.
    pub fn continue_session(&self) -> bool {
        let mut inner = self.lock();
        if inner.identity.is_none() {
            return false;
        }
        let schedule = self.scheduler();
        if inner.idle.resume(Instant::now(), schedule).is_none() {
            return false;
        }
        debug!("idle prompt dismissed, session continues");
        self.publish(&inner);
        true
    }

    /// Disarm the idle timer at process shutdown without touching identity.
    pub fn teardown(&self) {
        let mut inner = self.lock();
        inner.idle.end();
        self.publish(&inner);
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Change stream; yields a new snapshot after every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Access token as currently persisted.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.shared
            .storage
            .get(TOKEN_KEY)
            .filter(|token| !token.trim().is_empty())
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    #[must_use]
    pub fn idle_phase(&self) -> IdlePhase {
        self.lock().idle.phase()
    }

    /// When the idle prompt will open if no interaction arrives.
    #[must_use]
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.lock().idle.deadline()
    }

    fn clear_locked(&self, inner: &mut SessionInner) {
        clear_persisted(self.shared.storage.as_ref());
        if inner.identity.take().is_some() {
            inner.generation = inner.generation.wrapping_add(1);
        }
        inner.idle.end();
        self.publish(inner);
    }

    fn on_idle_elapsed(&self, epoch: u64) {
        let mut inner = self.lock();
        let identity_present = inner.identity.is_some();
        match inner.idle.elapsed(epoch, identity_present) {
            Elapsed::Prompt => {
                info!("session idle, prompting");
                self.publish(&inner);
            }
            Elapsed::NoIdentity => debug!("idle timer fired without identity"),
            Elapsed::Stale => debug!(epoch, "stale idle timer ignored"),
        }
    }

    fn scheduler(&self) -> impl FnOnce(IdleTicket) -> JoinHandle<()> + use<> {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        move |ticket: IdleTicket| {
            tokio::spawn(async move {
                tokio::time::sleep_until(ticket.deadline).await;
                if let Some(shared) = weak.upgrade() {
                    SessionStore { shared }.on_idle_elapsed(ticket.epoch);
                }
            })
        }
    }

    fn publish(&self, inner: &SessionInner) -> SessionSnapshot {
        let snapshot = inner.snapshot();
        self.shared.updates.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot.clone();
                true
            }
        });
        snapshot
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// =============================================================================
// PERSISTENCE
// =============================================================================

fn load_identity(storage: &dyn Storage) -> Option<Identity> {
    let Some(raw) = storage.get(USER_KEY) else {
        if storage.get(TOKEN_KEY).is_some() {
            warn!("dropping persisted token with no identity");
            clear_persisted(storage);
        }
        return None;
    };
    match serde_json::from_str::<Identity>(&raw) {
        Ok(mut identity) => {
            if let Some(token) = storage.get(TOKEN_KEY).filter(|t| !t.trim().is_empty()) {
                identity.access_token = token;
            }
            Some(identity)
        }
        Err(e) => {
            warn!(error = %e, "persisted identity unreadable, clearing");
            clear_persisted(storage);
            None
        }
    }
}

fn persist_identity(storage: &dyn Storage, identity: &Identity) {
    let raw = match serde_json::to_string(identity) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "identity encode failed, session will not survive restart");
            return;
        }
    };
    if let Err(e) = storage.set(USER_KEY, &raw) {
        warn!(error = %e, "identity persist failed");
    }
    if let Err(e) = storage.set(TOKEN_KEY, &identity.access_token) {
        warn!(error = %e, "token persist failed");
    }
}

fn clear_persisted(storage: &dyn Storage) {
    for key in [USER_KEY, TOKEN_KEY] {
        if let Err(e) = storage.remove(key) {
            warn!(key, error = %e, "persisted session clear failed");
        }
    }
}
