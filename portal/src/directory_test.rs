use super::*;

#[tokio::test]
async fn find_by_email_exact_match() {
    let dir = MockDirectory::new();
    let found = dir.find_by_email("admin@kinetic.co.id").await.unwrap();
    assert_eq!(found.identity.name, "Admin Kinetic");
    assert_eq!(found.identity.role, Role::Admin);
}

#[tokio::test]
async fn find_by_email_is_case_insensitive() {
    let dir = MockDirectory::new();
    let found = dir.find_by_email("Dr.Lisa.Tan@Kinetic.CO.ID").await.unwrap();
    assert_eq!(found.identity.id, "6");
    assert_eq!(found.identity.role, Role::Provider);
}

#[tokio::test]
async fn find_by_email_unknown_returns_none() {
    let dir = MockDirectory::new();
    assert!(dir.find_by_email("nobody@kinetic.co.id").await.is_none());
    assert!(dir.find_by_email("").await.is_none());
}

#[test]
fn mock_directory_has_seven_accounts_with_unique_ids() {
    let dir = MockDirectory::default();
    let mut ids: Vec<_> = dir.entries().iter().map(|e| e.identity.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 7);
}

#[test]
fn into_identity_drops_password() {
    let dir = MockDirectory::new();
    let known = dir.entries()[0].clone();
    let identity = known.into_identity();
    assert!(!identity.to_persisted().unwrap().contains("password123"));
}

#[tokio::test]
async fn with_entries_replaces_table() {
    let dir = MockDirectory::with_entries(vec![]);
    assert!(dir.find_by_email("admin@kinetic.co.id").await.is_none());
}
