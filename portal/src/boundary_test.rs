use super::*;
use crate::identity::Role;

fn cookie_for(role: Role) -> String {
    Identity { id: "1".into(), email: "a@b.c".into(), name: "A".into(), role, avatar: None }
        .to_persisted()
        .unwrap()
}

fn redirect(to: &'static str) -> BoundaryDecision {
    BoundaryDecision { action: BoundaryAction::Redirect(to), clear_cookie: false }
}

fn allow() -> BoundaryDecision {
    BoundaryDecision { action: BoundaryAction::Allow, clear_cookie: false }
}

// =============================================================================
// classify_path
// =============================================================================

#[test]
fn classify_known_paths() {
    assert_eq!(classify_path("/"), PathClass::Home);
    assert_eq!(classify_path("/login"), PathClass::Login);
    assert_eq!(classify_path("/login/provider"), PathClass::Login);
    assert_eq!(classify_path("/dashboard"), PathClass::Dashboard { area: None });
    assert_eq!(classify_path("/dashboard/patient/exercises"), PathClass::Dashboard { area: Some(Area::Patient) });
    assert_eq!(classify_path("/loginx"), PathClass::Unguarded);
    assert_eq!(classify_path("/pose-estimation"), PathClass::Unguarded);
}

// =============================================================================
// Unauthenticated
// =============================================================================

#[test]
fn unauthenticated_public_paths_allowed() {
    assert_eq!(check("/", None), allow());
    assert_eq!(check("/login", None), allow());
    assert_eq!(check("/login/patient", Some("")), allow());
}

#[test]
fn unauthenticated_dashboard_redirects_to_login() {
    assert_eq!(check("/dashboard/patient", None), redirect("/login"));
    assert_eq!(check("/dashboard/provider/schedule", None), redirect("/login"));
    assert_eq!(check("/dashboard", None), redirect("/login"));
}

// =============================================================================
// Authenticated
// =============================================================================

#[test]
fn authenticated_public_paths_redirect_to_own_dashboard() {
    let provider = cookie_for(Role::Provider);
    let patient = cookie_for(Role::Patient);
    assert_eq!(check("/", Some(&provider)), redirect("/dashboard/provider"));
    assert_eq!(check("/login", Some(&patient)), redirect("/dashboard/patient"));
    assert_eq!(check("/login/provider", Some(&patient)), redirect("/dashboard/patient"));
}

#[test]
fn provider_on_patient_dashboard_goes_to_provider_dashboard() {
    let provider = cookie_for(Role::Provider);
    for _ in 0..3 {
        assert_eq!(check("/dashboard/patient", Some(&provider)), redirect("/dashboard/provider"));
    }
}

#[test]
fn matching_role_allowed() {
    assert_eq!(check("/dashboard/provider", Some(&cookie_for(Role::Provider))), allow());
    assert_eq!(check("/dashboard/patient/plan", Some(&cookie_for(Role::Patient))), allow());
    assert_eq!(check("/dashboard/patient", Some(&cookie_for(Role::Admin))), allow());
    assert_eq!(check("/dashboard/settings", Some(&cookie_for(Role::Provider))), allow());
}

#[test]
fn admin_on_provider_dashboard_goes_to_patient_dashboard() {
    assert_eq!(check("/dashboard/provider", Some(&cookie_for(Role::Admin))), redirect("/dashboard/patient"));
}

#[test]
fn unguarded_paths_pass_through_with_any_cookie() {
    assert_eq!(check("/api/auth/me", Some(&cookie_for(Role::Patient))), allow());
    assert_eq!(check("/pose-estimation", None), allow());
}

// =============================================================================
// Corrupt cookie
// =============================================================================

#[test]
fn corrupt_cookie_on_protected_path_redirects_and_clears() {
    let decision = check("/dashboard/provider", Some("{not json"));
    assert_eq!(decision.action, BoundaryAction::Redirect("/login"));
    assert!(decision.clear_cookie);
}

#[test]
fn corrupt_cookie_on_public_path_allows_and_clears() {
    for path in ["/", "/login", "/login/patient"] {
        let decision = check(path, Some("{not json"));
        assert_eq!(decision.action, BoundaryAction::Allow, "{path}");
        assert!(decision.clear_cookie, "{path}");
    }
}

#[test]
fn cookie_with_unknown_role_is_corrupt() {
    let raw = r#"{"id":"1","email":"a@b.c","name":"A","role":"superuser"}"#;
    assert_eq!(CookieSession::from_cookie(Some(raw)), CookieSession::Corrupt);
}

#[test]
fn cookie_session_identity_accessor() {
    assert!(CookieSession::Missing.identity().is_none());
    let valid = CookieSession::from_cookie(Some(&cookie_for(Role::Patient)));
    assert_eq!(valid.identity().map(|i| i.role), Some(Role::Patient));
}
