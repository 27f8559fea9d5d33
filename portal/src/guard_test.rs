use super::*;
use crate::identity::Identity;

fn with_role(role: Role) -> Session {
    Session::settled(Some(Identity {
        id: "x".into(),
        email: "x@kinetic.co.id".into(),
        name: "X".into(),
        role,
        avatar: None,
    }))
}

// =============================================================================
// Area
// =============================================================================

#[test]
fn area_from_path() {
    assert_eq!(Area::from_path("/dashboard/patient"), Some(Area::Patient));
    assert_eq!(Area::from_path("/dashboard/provider/patients/3"), Some(Area::Provider));
    assert_eq!(Area::from_path("/dashboard/providers"), None);
    assert_eq!(Area::from_path("/dashboard"), None);
    assert_eq!(Area::from_path("/login/patient"), None);
}

#[test]
fn area_admits_own_role_only() {
    assert!(Area::Patient.admits(Role::Patient));
    assert!(Area::Patient.admits(Role::Admin));
    assert!(!Area::Patient.admits(Role::Provider));
    assert!(Area::Provider.admits(Role::Provider));
    assert!(!Area::Provider.admits(Role::Admin));
}

// =============================================================================
// evaluate
// =============================================================================

#[test]
fn loading_session_is_pending() {
    assert_eq!(classify(&Session::loading(), Area::Provider), GuardState::Loading);
    assert_eq!(evaluate(&Session::loading(), Area::Provider), GuardDecision::Pending);
}

#[test]
fn unauthenticated_goes_to_area_login() {
    let session = Session::settled(None);
    assert_eq!(evaluate(&session, Area::Patient), GuardDecision::RedirectToLogin("/login/patient"));
    assert_eq!(evaluate(&session, Area::Provider), GuardDecision::RedirectToLogin("/login/provider"));
}

#[test]
fn wrong_role_goes_to_own_dashboard() {
    assert_eq!(
        evaluate(&with_role(Role::Provider), Area::Patient),
        GuardDecision::RedirectToOwnDashboard("/dashboard/provider")
    );
    assert_eq!(
        evaluate(&with_role(Role::Patient), Area::Provider),
        GuardDecision::RedirectToOwnDashboard("/dashboard/patient")
    );
    assert_eq!(classify(&with_role(Role::Admin), Area::Provider), GuardState::AuthenticatedWrongRole);
}

#[test]
fn matching_role_renders() {
    assert_eq!(evaluate(&with_role(Role::Provider), Area::Provider), GuardDecision::Render);
    assert_eq!(evaluate(&with_role(Role::Admin), Area::Patient), GuardDecision::Render);
    assert_eq!(GuardDecision::Render.redirect_target(), None);
}

#[test]
fn redirect_target_exposes_path() {
    assert_eq!(GuardDecision::RedirectToLogin("/login/patient").redirect_target(), Some("/login/patient"));
}

// =============================================================================
// settle
// =============================================================================

#[tokio::test]
async fn settle_waits_for_loading_to_finish() {
    let (tx, mut rx) = watch::channel(Session::loading());
    let guard = RouteGuard::new(Area::Provider);
    let waiter = tokio::spawn(async move { guard.settle(&mut rx).await });
    tx.send_replace(with_role(Role::Provider));
    assert_eq!(waiter.await.unwrap(), GuardDecision::Render);
}

#[tokio::test]
async fn settle_on_closed_store_is_pending() {
    let (tx, mut rx) = watch::channel(Session::loading());
    drop(tx);
    assert_eq!(RouteGuard::new(Area::Patient).settle(&mut rx).await, GuardDecision::Pending);
}
