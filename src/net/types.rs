//! Wire types for the dashboard backend.
//!
//! DESIGN
//! ======
//! Field names mirror the backend JSON exactly. Optional numeric fields stay
//! `Option` on the wire and get zero-defaulting accessors, because the backend
//! emits `null` for projects without sites.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// ROLE
// =============================================================================

/// Authorization role of a principal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// The role an admin "Change Role" action switches to.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::User => Self::Admin,
            Self::Admin => Self::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// User record embedded in auth responses and returned by `GET /users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

/// Response of `POST /auth/login` and `POST /auth/register`.
#[derive(Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserSummary,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// The authenticated principal. Replaced wholesale on login, never patched.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    pub access_token: String,
}

impl Identity {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        match self.role {
            Role::Admin => true,
            Role::User => false,
        }
    }
}

impl From<AuthResponse> for Identity {
    fn from(resp: AuthResponse) -> Self {
        let AuthResponse { access_token, user } = resp;
        Self { id: user.id, name: user.name, email: user.email, role: user.role, access_token }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// PROJECTS
// =============================================================================

/// Site reference nested in a project listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRef {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sites: Vec<SiteRef>,
    #[serde(default)]
    pub total_area_sqkm: Option<f64>,
    #[serde(default)]
    pub site_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Project {
    #[must_use]
    pub fn area_sqkm(&self) -> f64 {
        self.total_area_sqkm.unwrap_or(0.0)
    }

    #[must_use]
    pub fn site_total(&self) -> u64 {
        self.site_count.unwrap_or(0)
    }
}

/// Body of `POST /projects` and `PUT /projects/:id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectPayload {
    pub name: String,
    pub description: String,
}

// =============================================================================
// SITES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    /// GeoJSON geometry as emitted by the backend.
    #[serde(default)]
    pub geojson: Option<Value>,
    #[serde(default)]
    pub area_km2: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /sites`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewSitePayload {
    pub project_id: i64,
    pub name: String,
    pub polygon_wkt: String,
}

/// Body of `PUT /sites/:id`. A `None` polygon keeps the stored geometry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SiteUpdatePayload {
    pub name: String,
    pub project_id: i64,
    pub polygon_wkt: Option<String>,
}

/// Body of `PUT /users/:id/role`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RolePayload {
    pub role: Role,
}
