//! Route guards.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected screen is wrapped in one of these. `loading` and "no
//! identity" are different states: while the session is still bootstrapping
//! a guard waits, because redirecting then would bounce a returning user to
//! the login screen before their persisted session is read.
//!
//! Guards are pure decisions over a [`SessionSnapshot`]; only
//! [`GuardOutcome::navigate`] touches the navigator.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use super::{Access, Navigator, Route};
use crate::net::types::Identity;
use crate::state::SessionSnapshot;

/// What a guarded route shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome<T> {
    /// Session still bootstrapping; show a neutral waiting indicator.
    Waiting,
    /// Leave for another route.
    Redirect(Route),
    /// Show the protected content.
    Render(T),
}

impl<T> GuardOutcome<T> {
    /// Issue the redirect, if any, and hand the outcome back.
    #[must_use]
    pub fn navigate(self, navigator: &dyn Navigator) -> Self {
        if let Self::Redirect(route) = &self {
            navigator.navigate(*route);
        }
        self
    }

    #[must_use]
    pub fn into_content(self) -> Option<T> {
        match self {
            Self::Render(content) => Some(content),
            Self::Waiting | Self::Redirect(_) => None,
        }
    }
}

/// Render `content` for any logged-in principal.
pub fn require_authenticated<T, F>(session: &SessionSnapshot, content: F) -> GuardOutcome<T>
where
    F: FnOnce(&Identity) -> T,
{
    if session.loading {
        return GuardOutcome::Waiting;
    }
    match &session.identity {
        None => GuardOutcome::Redirect(Route::Login),
        Some(identity) => GuardOutcome::Render(content(identity)),
    }
}

/// Render `content` for admins only. Authenticated non-admins go to the
/// dashboard, not the login screen.
pub fn require_admin<T, F>(session: &SessionSnapshot, content: F) -> GuardOutcome<T>
where
    F: FnOnce(&Identity) -> T,
{
    if session.loading {
        return GuardOutcome::Waiting;
    }
    let Some(identity) = &session.identity else {
        return GuardOutcome::Redirect(Route::Login);
    };
    if identity.is_admin() {
        GuardOutcome::Render(content(identity))
    } else {
        GuardOutcome::Redirect(Route::Dashboard)
    }
}

/// Apply the guard a route's access level calls for.
pub fn guard_route<T, F>(route: Route, session: &SessionSnapshot, content: F) -> GuardOutcome<T>
where
    F: FnOnce(Option<&Identity>) -> T,
{
    match route.access() {
        Access::Public => GuardOutcome::Render(content(session.identity.as_ref())),
        Access::Authenticated => require_authenticated(session, |identity| content(Some(identity))),
        Access::Admin => require_admin(session, |identity| content(Some(identity))),
    }
}
