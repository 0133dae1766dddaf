//! Integration tests for template create/list/fetch/delete.
//!
//! Requires a running PostgreSQL; run with `cargo test -- --ignored`.

use sigil_core::{
    CreateDocumentDataRequest, CreateRecipientRequest, CreateTemplateMetaRequest,
    CreateTemplateRequest, DocumentDataType, Error, ListTemplatesRequest, TemplateAccess,
    TemplateRepository,
};
use sigil_db::test_fixtures::TestDatabase;

fn create_request(title: &str) -> CreateTemplateRequest {
    CreateTemplateRequest {
        title: title.to_string(),
        document_data: CreateDocumentDataRequest {
            data_type: DocumentDataType::Bytes64,
            data: "JVBERi0xLjc=".to_string(),
            initial_data: "JVBERi0xLjc=".to_string(),
        },
        recipients: vec![CreateRecipientRequest {
            email: "a@x.com".to_string(),
            name: "A".to_string(),
        }],
        meta: Some(CreateTemplateMetaRequest {
            subject: Some("Please sign".to_string()),
            ..Default::default()
        }),
    }
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn insert_creates_template_with_recipients_and_meta() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;

    let access = TemplateAccess::for_user(user_id, None);
    let created = test_db
        .db
        .templates
        .insert(&access, create_request("Offer letter"))
        .await
        .unwrap();

    assert_eq!(created.template.title, "Offer letter");
    assert_eq!(created.recipients.len(), 1);
    assert!(!created.recipients[0].token.is_empty());

    let fetched = test_db
        .db
        .templates
        .fetch(created.template.id, &access)
        .await
        .unwrap();
    assert_eq!(fetched.document_data.data_type, DocumentDataType::Bytes64);
    assert_eq!(
        fetched.meta.unwrap().subject.as_deref(),
        Some("Please sign")
    );

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn insert_into_team_requires_membership() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.seed_user("owner@example.com").await;
    let outsider = test_db.seed_user("outsider@example.com").await;
    let team_id = test_db.seed_team("Acme", owner).await;

    let access = TemplateAccess::for_user(outsider, Some(team_id));
    let err = test_db
        .db
        .templates
        .insert(&access, create_request("Sneaky"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn list_is_scoped_to_the_access_context() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;
    let team_id = test_db.seed_team("Acme", user_id).await;

    test_db.template(user_id).title("Personal A").build().await;
    test_db.template(user_id).title("Personal B").build().await;
    test_db
        .template(user_id)
        .team(team_id)
        .title("Team only")
        .build()
        .await;

    let personal = TemplateAccess::for_user(user_id, None);
    let listed = test_db
        .db
        .templates
        .list(&personal, ListTemplatesRequest::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|t| t.team_id.is_none()));

    let team = TemplateAccess::for_user(user_id, Some(team_id));
    let listed = test_db
        .db
        .templates
        .list(&team, ListTemplatesRequest::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Team only");

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn delete_removes_template_and_cascades() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;
    let seed = test_db
        .template(user_id)
        .with_recipient("a@x.com", "A")
        .build()
        .await;

    let access = TemplateAccess::for_user(user_id, None);
    test_db
        .db
        .templates
        .delete(seed.template_id, &access)
        .await
        .unwrap();

    assert!(matches!(
        test_db.db.templates.fetch(seed.template_id, &access).await,
        Err(Error::TemplateNotFound(_))
    ));

    test_db.cleanup().await;
}
