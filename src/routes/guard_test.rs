use super::*;

use crate::net::types::Role;
use crate::routes::NavigationLog;

fn snapshot(loading: bool, role: Option<Role>) -> SessionSnapshot {
    SessionSnapshot {
        identity: role.map(|role| Identity {
            id: 1,
            name: "A".into(),
            email: "a@x.com".into(),
            role,
            access_token: "T".into(),
        }),
        loading,
        idle_prompt_visible: false,
    }
}

#[test]
fn authenticated_guard_waits_while_loading_without_navigation() {
    let nav = NavigationLog::new();
    let outcome = require_authenticated(&snapshot(true, None), |_| "page").navigate(&nav);
    assert_eq!(outcome, GuardOutcome::Waiting);
    assert!(nav.visits().is_empty());
}

#[test]
fn authenticated_guard_redirects_to_login_without_identity() {
    let nav = NavigationLog::new();
    let outcome = require_authenticated(&snapshot(false, None), |_| "page").navigate(&nav);
    assert_eq!(outcome, GuardOutcome::Redirect(Route::Login));
    assert_eq!(nav.visits(), vec![Route::Login]);
}

#[test]
fn authenticated_guard_renders_for_any_role() {
    for role in [Role::User, Role::Admin] {
        let outcome = require_authenticated(&snapshot(false, Some(role)), |identity| identity.role);
        assert_eq!(outcome, GuardOutcome::Render(role));
    }
}

#[test]
fn admin_guard_waits_while_loading() {
    let nav = NavigationLog::new();
    let outcome = require_admin(&snapshot(true, Some(Role::User)), |_| ()).navigate(&nav);
    assert_eq!(outcome, GuardOutcome::Waiting);
    assert!(nav.visits().is_empty());
}

#[test]
fn admin_guard_sends_plain_user_to_root_not_login() {
    let nav = NavigationLog::new();
    let outcome = require_admin(&snapshot(false, Some(Role::User)), |_| ()).navigate(&nav);
    assert_eq!(outcome, GuardOutcome::Redirect(Route::Dashboard));
    assert_eq!(nav.last().map(Route::path), Some("/"));
}

#[test]
fn admin_guard_sends_anonymous_to_login() {
    let outcome = require_admin(&snapshot(false, None), |_| ());
    assert_eq!(outcome, GuardOutcome::Redirect(Route::Login));
}

#[test]
fn admin_guard_renders_for_admin() {
    let outcome = require_admin(&snapshot(false, Some(Role::Admin)), |identity| identity.id);
    assert_eq!(outcome.into_content(), Some(1));
}

#[test]
fn content_is_not_built_unless_rendered() {
    let mut built = false;
    let _ = require_authenticated(&snapshot(false, None), |_| built = true);
    assert!(!built);
}

#[test]
fn guard_route_follows_access_table() {
    let anon = snapshot(false, None);
    let user = snapshot(false, Some(Role::User));

    assert_eq!(guard_route(Route::Login, &anon, |_| ()), GuardOutcome::Render(()));
    assert_eq!(guard_route(Route::Projects, &anon, |_| ()), GuardOutcome::Redirect(Route::Login));
    assert_eq!(guard_route(Route::Map, &user, |_| ()), GuardOutcome::Render(()));
    assert_eq!(guard_route(Route::Users, &user, |_| ()), GuardOutcome::Redirect(Route::Dashboard));
    assert_eq!(guard_route(Route::Users, &snapshot(true, None), |_| ()), GuardOutcome::Waiting);
}
