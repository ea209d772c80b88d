//! Route table and navigation sink.
//!
//! SYSTEM CONTEXT
//! ==============
//! Redirects are issued from two places: the HTTP wrapper on 401/403 and the
//! route guards. Both go through [`Navigator`] so front ends decide what a
//! redirect means (history push in a browser, a message in the CLI).


pub mod guard;

use std::sync::Mutex;

use crate::net::types::{Identity, Role};

/// Every screen the dashboard knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Dashboard,
    Projects,
    Map,
    Users,
    Login,
    Register,
}

/// Who may open a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

impl Route {
    pub const ALL: [Route; 6] =
        [Route::Dashboard, Route::Projects, Route::Map, Route::Users, Route::Login, Route::Register];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/",
            Self::Projects => "/projects",
            Self::Map => "/map",
            Self::Users => "/users",
            Self::Login => "/login",
            Self::Register => "/register",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Projects => "Projects",
            Self::Map => "Map",
            Self::Users => "Users",
            Self::Login => "Login",
            Self::Register => "Register",
        }
    }

    #[must_use]
    pub fn access(self) -> Access {
        match self {
            Self::Login | Self::Register => Access::Public,
            Self::Dashboard | Self::Projects | Self::Map => Access::Authenticated,
            Self::Users => Access::Admin,
        }
    }

    /// Exact path match, ignoring a trailing slash and query string.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default().trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    /// Path lookup with the catch-all: unknown paths land on the dashboard.
    #[must_use]
    pub fn resolve(path: &str) -> Self {
        Self::from_path(path).unwrap_or(Self::Dashboard)
    }
}

/// Menu entries shown for the current principal.
#[must_use]
pub fn nav_links(identity: Option<&Identity>) -> Vec<Route> {
    let Some(identity) = identity else {
        return vec![Route::Login, Route::Register];
    };
    match identity.role {
        Role::Admin => vec![Route::Dashboard, Route::Projects, Route::Map, Route::Users],
        Role::User => vec![Route::Dashboard],
    }
}

// =============================================================================
// NAVIGATOR
// =============================================================================

/// Receives redirect requests.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that records every redirect in order.
#[derive(Debug, Default)]
pub struct NavigationLog {
    visits: Mutex<Vec<Route>>,
}

impl NavigationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visits(&self) -> Vec<Route> {
        self.visits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.visits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .last()
            .copied()
    }

    /// Drain recorded redirects.
    pub fn take(&self) -> Vec<Route> {
        std::mem::take(
            &mut *self
                .visits
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }
}

impl Navigator for NavigationLog {
    fn navigate(&self, route: Route) {
        tracing::debug!(path = route.path(), "navigate");
        self.visits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(route);
    }
}
