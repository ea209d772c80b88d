//! Dashboard aggregates over the project listing.
//!
//! Three charts: area per project, site count per project, and each
//! project's share of the total area. Projects without sites report `null`
//! totals, which count as zero.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use serde::Serialize;

use super::{FeatureError, projects};
use crate::net::ApiClient;
use crate::net::types::Project;

/// One bar of a per-project chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeriesPoint<T> {
    pub name: String,
    pub value: T,
}

/// One slice of the area distribution chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AreaShare {
    pub name: String,
    pub area_sqkm: f64,
    /// Share of the total in percent, rounded to one decimal.
    pub percent: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub area: Vec<SeriesPoint<f64>>,
    pub sites: Vec<SeriesPoint<u64>>,
    pub shares: Vec<AreaShare>,
    pub total_area_sqkm: f64,
    pub total_sites: u64,
}

impl DashboardSummary {
    #[must_use]
    pub fn from_projects(projects: &[Project]) -> Self {
        let area: Vec<SeriesPoint<f64>> = projects
            .iter()
            .map(|p| SeriesPoint { name: p.name.clone(), value: p.area_sqkm() })
            .collect();
        let sites: Vec<SeriesPoint<u64>> = projects
            .iter()
            .map(|p| SeriesPoint { name: p.name.clone(), value: p.site_total() })
            .collect();
        let total_area_sqkm: f64 = area.iter().map(|point| point.value).sum();
        let total_sites = sites.iter().map(|point| point.value).sum();
        let shares = area
            .iter()
            .map(|point| AreaShare {
                name: point.name.clone(),
                area_sqkm: point.value,
                percent: share_percent(point.value, total_area_sqkm),
            })
            .collect();

        Self { area, sites, shares, total_area_sqkm, total_sites }
    }

    /// No projects yet; the view shows its empty-state hint instead of charts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.area.is_empty()
    }
}

/// Fetch projects and summarize them.
///
/// # Errors
///
/// Returns the backend error if the project listing fails.
pub async fn load(api: &ApiClient) -> Result<DashboardSummary, FeatureError> {
    let projects = projects::list(api).await?;
    Ok(DashboardSummary::from_projects(&projects))
}

fn share_percent(value: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (value / total * 1000.0).round() / 10.0
}
