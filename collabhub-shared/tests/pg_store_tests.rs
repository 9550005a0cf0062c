//! PostgreSQL store tests
//!
//! These tests require a running PostgreSQL instance.
//! Set DATABASE_URL and run: cargo test --test pg_store_tests -- --ignored

use collabhub_shared::db::pool::{create_pool, DatabaseConfig};
use collabhub_shared::models::{
    DocumentStatus, NewDocument, NewNote, NewProject, Organization, UpsertOrganization, UpsertUser,
};
use collabhub_shared::store::postgres::PgStore;
use collabhub_shared::store::{Store, StoreError};
use uuid::Uuid;

async fn setup() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(DatabaseConfig {
        url,
        max_connections: 2,
        ..Default::default()
    })
    .await
    .expect("Failed to connect to database");

    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    PgStore::new(pool)
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

async fn seed_user(store: &PgStore) -> String {
    let id = unique("user");
    store
        .upsert_user(UpsertUser {
            id: id.clone(),
            email: format!("{}@example.com", id),
            first_name: Some("Test".to_string()),
            last_name: None,
            avatar_url: None,
        })
        .await
        .expect("Failed to seed user");
    id
}

async fn seed_org(store: &PgStore) -> Organization {
    store
        .upsert_organization(UpsertOrganization {
            external_org_id: unique("org"),
            name: "Acme".to_string(),
            slug: "acme".to_string(),
        })
        .await
        .expect("Failed to seed organization")
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_upserts_are_idempotent() {
    let store = setup().await;
    let user_id = seed_user(&store).await;
    let org = seed_org(&store).await;

    let again = store
        .upsert_organization(UpsertOrganization {
            external_org_id: org.external_org_id.clone(),
            name: "Acme Renamed".to_string(),
            slug: "acme-renamed".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(again.id, org.id);
    assert_eq!(again.name, "Acme Renamed");

    store.upsert_org_membership(org.id, &user_id, "member").await.unwrap();
    store.upsert_org_membership(org.id, &user_id, "admin").await.unwrap();

    let members = store.list_org_members(org.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].membership.role, "admin");
    assert_eq!(members[0].user.as_ref().unwrap().id, user_id);

    assert!(store.delete_org_membership(org.id, &user_id).await.unwrap());
    assert!(!store.delete_org_membership(org.id, &user_id).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_membership_for_unknown_user_is_foreign_key_error() {
    let store = setup().await;
    let org = seed_org(&store).await;

    let err = store
        .upsert_org_membership(org.id, &unique("ghost"), "member")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ForeignKey(_)));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_project_cascade() {
    let store = setup().await;
    let owner = seed_user(&store).await;
    let org = seed_org(&store).await;

    let project = store
        .insert_project(NewProject {
            org_id: org.id,
            name: "Launch".to_string(),
            description: None,
            owner_id: owner.clone(),
            assigned_to: None,
            start_date: None,
            due_date: None,
        })
        .await
        .unwrap();

    store.insert_project_member(project.id, &owner).await.unwrap();
    let duplicate = store.insert_project_member(project.id, &owner).await.unwrap_err();
    assert!(matches!(duplicate, StoreError::Conflict(_)));

    let document = store
        .insert_document(NewDocument {
            project_id: project.id,
            name: "brief.pdf".to_string(),
            file_path: format!("{}/brief.pdf", project.id),
            file_size: Some(12),
            file_type: Some("application/pdf".to_string()),
            uploaded_by: owner.clone(),
        })
        .await
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Draft);

    let approved = store
        .set_document_status(document.id, DocumentStatus::Approved)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approved.status, DocumentStatus::Approved);

    store
        .insert_note(NewNote {
            project_id: project.id,
            user_id: owner.clone(),
            content: "Kickoff on Monday".to_string(),
        })
        .await
        .unwrap();

    let detail = store.find_project_detail(project.id).await.unwrap().unwrap();
    assert_eq!(detail.documents.len(), 1);
    assert_eq!(detail.owner.unwrap().id, owner);

    assert!(store.delete_project(project.id).await.unwrap());
    assert!(store.find_document(document.id).await.unwrap().is_none());
    assert!(store.list_notes(project.id).await.unwrap().is_empty());
    assert!(!store.is_project_member(project.id, &owner).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_ping() {
    let store = setup().await;
    store.ping().await.unwrap();
}
