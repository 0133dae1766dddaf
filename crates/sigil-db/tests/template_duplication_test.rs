//! Integration tests for template duplication.
//!
//! Covers the duplication contract end-to-end:
//! - title suffixing, payload cloning by value, meta cloning
//! - recipient cloning with fresh tokens
//! - field remapping onto the new recipients
//! - transactional rollback when the recipient invariant is violated
//!
//! These tests require a running PostgreSQL (see `DEFAULT_TEST_DATABASE_URL`
//! in `test_fixtures`), so they are ignored by default. Run the slow tier
//! with `cargo test -- --ignored`.

use sqlx::Row;
use uuid::Uuid;

use sigil_core::{FieldType, TemplateAccess, TemplateRepository};
use sigil_db::test_fixtures::TestDatabase;

async fn count_rows(pool: &sqlx::PgPool, table: &str) -> i64 {
    sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
        .get("n")
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn duplicate_clones_title_recipients_and_fields() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;

    let seed = test_db
        .template(user_id)
        .title("Contract")
        .with_recipient("a@x.com", "A")
        .with_field(0, FieldType::Signature)
        .build()
        .await;

    let access = TemplateAccess::for_user(user_id, None);
    let copy = test_db
        .db
        .templates
        .duplicate(seed.template_id, &access)
        .await
        .unwrap();

    assert_eq!(copy.template.title, "Contract (copy)");
    assert_eq!(copy.template.user_id, user_id);
    assert_eq!(copy.template.team_id, None);
    assert_ne!(copy.template.id, seed.template_id);

    // Recipients: same email/name, a token of its own.
    assert_eq!(copy.recipients.len(), 1);
    let recipient = &copy.recipients[0];
    assert_eq!(recipient.email, "a@x.com");
    assert_eq!(recipient.name, "A");
    assert_ne!(recipient.token, seed.recipient_tokens[0]);
    assert_eq!(recipient.template_id, copy.template.id);

    // Fields: geometry and content carried over, pointed at the new recipient.
    let fetched = test_db
        .db
        .templates
        .fetch(copy.template.id, &access)
        .await
        .unwrap();
    assert_eq!(fetched.fields.len(), 1);
    let field = &fetched.fields[0];
    assert_eq!(field.field_type, FieldType::Signature);
    assert_eq!(field.page, 1);
    assert_eq!(field.position_x, 10.0);
    assert_eq!(field.position_y, 20.0);
    assert_eq!(field.width, 5.0);
    assert_eq!(field.height, 5.0);
    assert_eq!(field.custom_text, "");
    assert!(!field.inserted);
    assert_eq!(field.recipient_id, recipient.id);
    assert_eq!(field.template_id, copy.template.id);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn duplicate_clones_document_data_by_value() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;
    let seed = test_db.template(user_id).build().await;

    let access = TemplateAccess::for_user(user_id, None);
    let copy = test_db
        .db
        .templates
        .duplicate(seed.template_id, &access)
        .await
        .unwrap();

    // A brand-new payload row, not shared with the source.
    assert_ne!(copy.template.document_data_id, seed.document_data_id);

    let fetched = test_db
        .db
        .templates
        .fetch(copy.template.id, &access)
        .await
        .unwrap();
    assert_eq!(fetched.document_data.data, "JVBERi0xLjc=");
    assert_eq!(fetched.document_data.initial_data, "JVBERi0xLjc=");

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn duplicate_clones_meta_and_omits_empty_email_settings() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;
    let seed = test_db
        .template(user_id)
        .with_email_settings(serde_json::json!({}))
        .build()
        .await;

    let access = TemplateAccess::for_user(user_id, None);
    let copy = test_db
        .db
        .templates
        .duplicate(seed.template_id, &access)
        .await
        .unwrap();

    let fetched = test_db
        .db
        .templates
        .fetch(copy.template.id, &access)
        .await
        .unwrap();
    let meta = fetched.meta.expect("meta row cloned");
    assert_eq!(meta.subject.as_deref(), Some("Please sign"));
    assert_eq!(meta.template_id, copy.template.id);
    // Empty settings object was omitted, not copied as a placeholder.
    assert_eq!(meta.email_settings, None);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn duplicate_without_meta_creates_no_meta_row() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;
    let seed = test_db.template(user_id).build().await;

    let access = TemplateAccess::for_user(user_id, None);
    let copy = test_db
        .db
        .templates
        .duplicate(seed.template_id, &access)
        .await
        .unwrap();

    let fetched = test_db
        .db
        .templates
        .fetch(copy.template.id, &access)
        .await
        .unwrap();
    assert!(fetched.meta.is_none());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn duplicate_with_zero_recipients_yields_zero_recipients_and_fields() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;
    let seed = test_db.template(user_id).title("Empty").build().await;

    let access = TemplateAccess::for_user(user_id, None);
    let copy = test_db
        .db
        .templates
        .duplicate(seed.template_id, &access)
        .await
        .unwrap();

    assert_eq!(copy.template.title, "Empty (copy)");
    assert!(copy.recipients.is_empty());

    let fetched = test_db
        .db
        .templates
        .fetch(copy.template.id, &access)
        .await
        .unwrap();
    assert!(fetched.fields.is_empty());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn duplicate_keeps_fields_attached_when_recipients_share_an_email() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;

    // Two slots for the same address; each has its own field.
    let seed = test_db
        .template(user_id)
        .with_recipient("dup@x.com", "First")
        .with_recipient("dup@x.com", "Second")
        .with_field(0, FieldType::Signature)
        .with_field(1, FieldType::Initials)
        .build()
        .await;

    let access = TemplateAccess::for_user(user_id, None);
    let copy = test_db
        .db
        .templates
        .duplicate(seed.template_id, &access)
        .await
        .unwrap();
    assert_eq!(copy.recipients.len(), 2);

    let fetched = test_db
        .db
        .templates
        .fetch(copy.template.id, &access)
        .await
        .unwrap();
    assert_eq!(fetched.fields.len(), 2);

    // Recipients and fields are created in seed order, so the signature
    // field still belongs to "First" and the initials field to "Second".
    let by_name = |name: &str| {
        copy.recipients
            .iter()
            .find(|r| r.name == name)
            .unwrap()
            .id
    };
    let signature = fetched
        .fields
        .iter()
        .find(|f| f.field_type == FieldType::Signature)
        .unwrap();
    let initials = fetched
        .fields
        .iter()
        .find(|f| f.field_type == FieldType::Initials)
        .unwrap();
    assert_eq!(signature.recipient_id, by_name("First"));
    assert_eq!(initials.recipient_id, by_name("Second"));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn duplicate_leaves_source_untouched() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;
    let seed = test_db
        .template(user_id)
        .title("Original")
        .with_recipient("a@x.com", "A")
        .with_field(0, FieldType::Text)
        .build()
        .await;

    let access = TemplateAccess::for_user(user_id, None);
    test_db
        .db
        .templates
        .duplicate(seed.template_id, &access)
        .await
        .unwrap();

    let source = test_db
        .db
        .templates
        .fetch(seed.template_id, &access)
        .await
        .unwrap();
    assert_eq!(source.template.title, "Original");
    assert_eq!(source.recipients.len(), 1);
    assert_eq!(source.recipients[0].token, seed.recipient_tokens[0]);
    assert_eq!(source.fields.len(), 1);
    assert_eq!(source.fields[0].recipient_id, seed.recipient_ids[0]);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn duplicate_with_unresolvable_field_recipient_rolls_back() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;

    // A recipient that belongs to a different template.
    let other = test_db
        .template(user_id)
        .with_recipient("stray@x.com", "Stray")
        .build()
        .await;
    let seed = test_db.template(user_id).title("Broken").build().await;

    // Valid FK, but the recipient is not part of the template's own set.
    sqlx::query(
        "INSERT INTO field (id, template_id, recipient_id, field_type, page, \
                            position_x, position_y, width, height) \
         VALUES ($1, $2, $3, 'signature', 1, 0, 0, 1, 1)",
    )
    .bind(Uuid::now_v7())
    .bind(seed.template_id)
    .bind(other.recipient_ids[0])
    .execute(&test_db.pool)
    .await
    .unwrap();

    let templates_before = count_rows(&test_db.pool, "template").await;
    let payloads_before = count_rows(&test_db.pool, "document_data").await;
    let recipients_before = count_rows(&test_db.pool, "recipient").await;

    let access = TemplateAccess::for_user(user_id, None);
    let err = test_db
        .db
        .templates
        .duplicate(seed.template_id, &access)
        .await
        .unwrap_err();
    assert!(
        matches!(err, sigil_core::Error::RecipientNotFound(id) if id == other.recipient_ids[0])
    );

    // The whole duplication rolled back: no orphaned rows.
    assert_eq!(count_rows(&test_db.pool, "template").await, templates_before);
    assert_eq!(
        count_rows(&test_db.pool, "document_data").await,
        payloads_before
    );
    assert_eq!(
        count_rows(&test_db.pool, "recipient").await,
        recipients_before
    );

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a test database"]
async fn duplicate_missing_template_fails_without_writes() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("owner@example.com").await;

    let templates_before = count_rows(&test_db.pool, "template").await;
    let payloads_before = count_rows(&test_db.pool, "document_data").await;

    let access = TemplateAccess::for_user(user_id, None);
    let err = test_db
        .db
        .templates
        .duplicate(Uuid::new_v4(), &access)
        .await
        .unwrap_err();
    assert!(matches!(err, sigil_core::Error::TemplateNotFound(_)));

    assert_eq!(count_rows(&test_db.pool, "template").await, templates_before);
    assert_eq!(
        count_rows(&test_db.pool, "document_data").await,
        payloads_before
    );

    test_db.cleanup().await;
}
