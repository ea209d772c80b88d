//! Site listing and CRUD.
//!
//! DESIGN
//! ======
//! Geometry arrives either as a drawn ring or as manual coordinate rows and
//! is encoded to WKT here, before the request. The backend computes area and
//! stores the polygon; the client never validates beyond vertex count and
//! numeric coordinates.

#[cfg(test)]
#[path = "sites_test.rs"]
mod sites_test;

use serde_json::json;
use tracing::info;

use super::{FeatureError, ValidationError, required};
use crate::net::types::{NewSitePayload, Site, SiteUpdatePayload};
use crate::net::{ApiClient, RequestOptions};
use crate::util::wkt::{self, Coordinate, ManualRow, WktError};

/// Where a site polygon came from.
#[derive(Clone, Debug, PartialEq)]
pub enum SiteGeometry {
    /// Ring from a drawing tool, `[lng, lat]` order, possibly closed already.
    Drawn(Vec<Coordinate>),
    /// Rows typed by the user, latitude first.
    Manual(Vec<ManualRow>),
}

impl SiteGeometry {
    /// # Errors
    ///
    /// Returns an error when fewer than three usable vertices remain.
    pub fn to_wkt(&self) -> Result<String, WktError> {
        match self {
            Self::Drawn(ring) => wkt::encode_ring(ring),
            Self::Manual(rows) => wkt::encode_manual_rows(rows),
        }
    }
}

/// All sites with GeoJSON geometry and computed area.
///
/// # Errors
///
/// Returns the backend error if the listing fails.
pub async fn list(api: &ApiClient) -> Result<Vec<Site>, FeatureError> {
    Ok(api
        .request_json::<Vec<Site>>("/sites", RequestOptions::get())
        .await?
        .unwrap_or_default())
}

/// Sites belonging to one project, in listing order.
#[must_use]
pub fn in_project(sites: &[Site], project_id: i64) -> Vec<&Site> {
    sites.iter().filter(|s| s.project_id == Some(project_id)).collect()
}

/// Create a site under a project.
///
/// # Errors
///
/// Returns a validation error for a blank name, a missing project or an
/// unusable polygon, or the backend error.
pub async fn create(
    api: &ApiClient,
    name: &str,
    project_id: Option<i64>,
    geometry: &SiteGeometry,
) -> Result<Option<Site>, FeatureError> {
    let name = required("site name", name)?;
    let project_id = project_id.ok_or(ValidationError::Required("project"))?;
    let polygon_wkt = geometry.to_wkt().map_err(ValidationError::from)?;

    let payload = NewSitePayload { project_id, name, polygon_wkt };
    let created = api
        .request_json::<Site>("/sites", RequestOptions::post(json!(payload)))
        .await?;
    if let Some(site) = &created {
        info!(site_id = site.id, project_id, "site created");
    }
    Ok(created)
}

/// Rename or move a site, optionally replacing its polygon. `None` geometry
/// keeps the stored one.
///
/// # Errors
///
/// Returns a validation error for a blank name or an unusable polygon, or
/// the backend error.
pub async fn update(
    api: &ApiClient,
    site_id: i64,
    name: &str,
    project_id: i64,
    geometry: Option<&SiteGeometry>,
) -> Result<Option<Site>, FeatureError> {
    let name = required("site name", name)?;
    let polygon_wkt = geometry
        .map(SiteGeometry::to_wkt)
        .transpose()
        .map_err(ValidationError::from)?;

    let payload = SiteUpdatePayload { name, project_id, polygon_wkt };
    let updated = api
        .request_json::<Site>(&format!("/sites/{site_id}"), RequestOptions::put(json!(payload)))
        .await?;
    if updated.is_some() {
        info!(site_id, "site updated");
    }
    Ok(updated)
}

/// # Errors
///
/// Returns the backend error, e.g. 404 for an unknown site.
pub async fn delete(api: &ApiClient, site_id: i64) -> Result<(), FeatureError> {
    api.request(&format!("/sites/{site_id}"), RequestOptions::delete())
        .await?;
    info!(site_id, "site delete sent");
    Ok(())
}
