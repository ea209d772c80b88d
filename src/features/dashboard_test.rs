use super::*;

use axum::Router;
use axum::routing::get;
use serde_json::json;

use crate::net::test_helpers::logged_in;
use crate::net::types::Role;

fn project(name: &str, area: Option<f64>, sites: Option<u64>) -> Project {
    serde_json::from_value(json!({
        "id": 1,
        "name": name,
        "total_area_sqkm": area,
        "site_count": sites,
    }))
    .unwrap()
}

#[test]
fn series_follow_project_order_and_default_to_zero() {
    let summary = DashboardSummary::from_projects(&[
        project("North", Some(12.5), Some(3)),
        project("South", None, None),
    ]);

    assert_eq!(summary.area[0], SeriesPoint { name: "North".into(), value: 12.5 });
    assert_eq!(summary.area[1].value, 0.0);
    assert_eq!(summary.sites[1], SeriesPoint { name: "South".into(), value: 0 });
    assert_eq!(summary.total_sites, 3);
    assert!((summary.total_area_sqkm - 12.5).abs() < f64::EPSILON);
}

#[test]
fn shares_round_to_one_decimal() {
    let summary = DashboardSummary::from_projects(&[
        project("A", Some(1.0), Some(1)),
        project("B", Some(2.0), Some(1)),
    ]);
    let percents: Vec<f64> = summary.shares.iter().map(|s| s.percent).collect();
    assert_eq!(percents, vec![33.3, 66.7]);
}

#[test]
fn zero_total_area_gives_zero_shares() {
    let summary = DashboardSummary::from_projects(&[project("A", Some(0.0), None), project("B", None, None)]);
    assert!(summary.shares.iter().all(|s| s.percent == 0.0));
}

#[test]
fn no_projects_is_empty() {
    let summary = DashboardSummary::from_projects(&[]);
    assert!(summary.is_empty());
    assert_eq!(summary, DashboardSummary::default());
}

#[tokio::test]
async fn load_summarizes_backend_listing() {
    let router = Router::new().route(
        "/projects",
        get(|| async {
            axum::Json(json!([
                {"id": 1, "name": "A", "total_area_sqkm": 3.0, "site_count": 2, "sites": []},
                {"id": 2, "name": "B", "total_area_sqkm": 1.0, "site_count": 1, "sites": []},
            ]))
        }),
    );
    let h = logged_in(router, Role::User).await;

    let summary = load(&h.client).await.unwrap();
    assert_eq!(summary.total_sites, 3);
    assert_eq!(summary.shares[0].percent, 75.0);
}
