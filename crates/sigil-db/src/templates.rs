//! Template repository implementation.
//!
//! Templates own their meta row, recipient slots, and fields, so all of
//! those writes live here and share one transaction per operation. Reads
//! and writes are scoped by [`TemplateAccess`]: a template the caller may
//! not see behaves exactly like a template that does not exist.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::info;
use uuid::Uuid;

use sigil_core::defaults::{COPY_SUFFIX, PAGE_LIMIT, PAGE_OFFSET};
use sigil_core::{
    new_v7, CreateFieldRequest, CreateTemplateMetaRequest, CreateTemplateRequest, Error, Field,
    ListTemplatesRequest, Result, Template, TemplateAccess, TemplateMeta, TemplateRepository,
    TemplateSummary, TemplateWithRecipients, TemplateWithRelations,
};

use crate::document_data::{row_to_document_data, PgDocumentDataRepository};
use crate::{fields, recipients};

const COLUMNS: &str =
    "id, user_id, team_id, title, document_data_id, created_at_utc, updated_at_utc";

fn row_to_template(row: &sqlx::postgres::PgRow) -> Template {
    Template {
        id: row.get("id"),
        user_id: row.get("user_id"),
        team_id: row.get("team_id"),
        title: row.get("title"),
        document_data_id: row.get("document_data_id"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

fn row_to_meta(row: &sqlx::postgres::PgRow) -> TemplateMeta {
    TemplateMeta {
        id: row.get("id"),
        template_id: row.get("template_id"),
        subject: row.get("subject"),
        message: row.get("message"),
        timezone: row.get("timezone"),
        date_format: row.get("date_format"),
        redirect_url: row.get("redirect_url"),
        email_settings: row.get("email_settings"),
    }
}

/// Title given to a duplicated template.
pub(crate) fn copy_title(source_title: &str) -> String {
    format!("{}{}", source_title, COPY_SUFFIX)
}

/// `email_settings` values that count as "unset" when cloning a meta row.
fn email_settings_is_empty(value: &JsonValue) -> bool {
    value.is_null() || value.as_object().is_some_and(|o| o.is_empty())
}

/// Build the creation payload for a cloned meta row.
///
/// Identity fields (`id`, `template_id`) are excluded; an unset
/// `email_settings` is omitted rather than copied as an empty placeholder.
pub(crate) fn clone_meta_request(meta: &TemplateMeta) -> CreateTemplateMetaRequest {
    CreateTemplateMetaRequest {
        subject: meta.subject.clone(),
        message: meta.message.clone(),
        timezone: meta.timezone.clone(),
        date_format: meta.date_format.clone(),
        redirect_url: meta.redirect_url.clone(),
        email_settings: meta
            .email_settings
            .clone()
            .filter(|v| !email_settings_is_empty(v)),
    }
}

/// Rewrite source fields against the freshly created recipients.
///
/// `id_map` maps source recipient ids to the ids created in the same
/// duplication batch. A field whose recipient is missing from the map is an
/// invariant violation and aborts the whole operation.
pub(crate) fn map_fields_to_new_recipients(
    source_fields: &[Field],
    id_map: &HashMap<Uuid, Uuid>,
) -> Result<Vec<CreateFieldRequest>> {
    source_fields
        .iter()
        .map(|field| {
            let recipient_id = id_map
                .get(&field.recipient_id)
                .copied()
                .ok_or(Error::RecipientNotFound(field.recipient_id))?;

            Ok(CreateFieldRequest {
                recipient_id,
                field_type: field.field_type,
                page: field.page,
                position_x: field.position_x,
                position_y: field.position_y,
                width: field.width,
                height: field.height,
                custom_text: field.custom_text.clone(),
                inserted: field.inserted,
            })
        })
        .collect()
}

/// PostgreSQL implementation of TemplateRepository.
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    /// Create a new PgTemplateRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a template row scoped by the access context, within an existing
    /// transaction. Returns `None` when the template does not exist or the
    /// caller may not see it — the two cases are indistinguishable.
    async fn fetch_scoped_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        access: &TemplateAccess,
    ) -> Result<Option<Template>> {
        let row = match access {
            TemplateAccess::Personal { user_id } => {
                let query = format!(
                    "SELECT {COLUMNS} FROM template \
                     WHERE id = $1 AND user_id = $2 AND team_id IS NULL"
                );
                sqlx::query(&query)
                    .bind(id)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await
            }
            TemplateAccess::Team { user_id, team_id } => {
                let query = format!(
                    "SELECT {COLUMNS} FROM template \
                     WHERE id = $1 AND team_id = $2 \
                       AND EXISTS (SELECT 1 FROM team_member m \
                                   WHERE m.team_id = $2 AND m.user_id = $3)"
                );
                sqlx::query(&query)
                    .bind(id)
                    .bind(team_id)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await
            }
        }
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(row_to_template))
    }

    /// Require team membership before creating rows in a team context.
    async fn ensure_member_tx(
        tx: &mut Transaction<'_, Postgres>,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<()> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM team_member \
             WHERE team_id = $1 AND user_id = $2) AS is_member",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        if row.get::<bool, _>("is_member") {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "User {} is not a member of team {}",
                user_id, team_id
            )))
        }
    }

    /// Insert the template row itself.
    async fn insert_row_tx(
        tx: &mut Transaction<'_, Postgres>,
        access: &TemplateAccess,
        title: &str,
        document_data_id: Uuid,
    ) -> Result<Template> {
        let id = new_v7();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO template (id, user_id, team_id, title, document_data_id,
                                  created_at_utc, updated_at_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            "#,
        )
        .bind(id)
        .bind(access.user_id())
        .bind(access.team_id())
        .bind(title)
        .bind(document_data_id)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(Template {
            id,
            user_id: access.user_id(),
            team_id: access.team_id(),
            title: title.to_string(),
            document_data_id,
            created_at_utc: now,
            updated_at_utc: now,
        })
    }

    async fn insert_meta_tx(
        tx: &mut Transaction<'_, Postgres>,
        template_id: Uuid,
        req: &CreateTemplateMetaRequest,
    ) -> Result<TemplateMeta> {
        let id = new_v7();

        sqlx::query(
            r#"
            INSERT INTO template_meta (id, template_id, subject, message, timezone,
                                       date_format, redirect_url, email_settings)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(template_id)
        .bind(&req.subject)
        .bind(&req.message)
        .bind(&req.timezone)
        .bind(&req.date_format)
        .bind(&req.redirect_url)
        .bind(&req.email_settings)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(TemplateMeta {
            id,
            template_id,
            subject: req.subject.clone(),
            message: req.message.clone(),
            timezone: req.timezone.clone(),
            date_format: req.date_format.clone(),
            redirect_url: req.redirect_url.clone(),
            email_settings: req.email_settings.clone(),
        })
    }

    async fn fetch_meta_tx(
        tx: &mut Transaction<'_, Postgres>,
        template_id: Uuid,
    ) -> Result<Option<TemplateMeta>> {
        let row = sqlx::query(
            "SELECT id, template_id, subject, message, timezone, date_format, \
             redirect_url, email_settings \
             FROM template_meta WHERE template_id = $1",
        )
        .bind(template_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(row_to_meta))
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn insert(
        &self,
        access: &TemplateAccess,
        req: CreateTemplateRequest,
    ) -> Result<TemplateWithRecipients> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        if let TemplateAccess::Team { user_id, team_id } = access {
            Self::ensure_member_tx(&mut tx, *team_id, *user_id).await?;
        }

        let document_data =
            PgDocumentDataRepository::insert_tx(&mut tx, &req.document_data).await?;
        let template = Self::insert_row_tx(&mut tx, access, &req.title, document_data.id).await?;

        if let Some(meta) = &req.meta {
            Self::insert_meta_tx(&mut tx, template.id, meta).await?;
        }

        let mut created = Vec::with_capacity(req.recipients.len());
        for recipient in &req.recipients {
            created.push(
                recipients::insert_recipient_tx(
                    &mut tx,
                    template.id,
                    &recipient.email,
                    &recipient.name,
                )
                .await?,
            );
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "templates",
            op = "insert",
            template_id = %template.id,
            user_id = %access.user_id(),
            recipient_count = created.len(),
            "Template created"
        );

        Ok(TemplateWithRecipients {
            template,
            recipients: created,
        })
    }

    async fn fetch(&self, id: Uuid, access: &TemplateAccess) -> Result<TemplateWithRelations> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let template = Self::fetch_scoped_tx(&mut tx, id, access)
            .await?
            .ok_or(Error::TemplateNotFound(id))?;

        let data_row = sqlx::query(
            "SELECT id, data_type, data, initial_data FROM document_data WHERE id = $1",
        )
        .bind(template.document_data_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let document_data = row_to_document_data(&data_row)?;

        let meta = Self::fetch_meta_tx(&mut tx, template.id).await?;
        let template_recipients = recipients::list_for_template_tx(&mut tx, template.id).await?;
        let template_fields = fields::list_for_template_tx(&mut tx, template.id).await?;

        tx.commit().await.map_err(Error::Database)?;

        Ok(TemplateWithRelations {
            template,
            document_data,
            meta,
            recipients: template_recipients,
            fields: template_fields,
        })
    }

    async fn list(
        &self,
        access: &TemplateAccess,
        req: ListTemplatesRequest,
    ) -> Result<Vec<TemplateSummary>> {
        let limit = req.limit.unwrap_or(PAGE_LIMIT);
        let offset = req.offset.unwrap_or(PAGE_OFFSET);

        let rows = match access {
            TemplateAccess::Personal { user_id } => {
                sqlx::query(
                    "SELECT id, title, team_id, created_at_utc, updated_at_utc FROM template \
                     WHERE user_id = $1 AND team_id IS NULL \
                     ORDER BY created_at_utc DESC LIMIT $2 OFFSET $3",
                )
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            TemplateAccess::Team { user_id, team_id } => {
                sqlx::query(
                    "SELECT id, title, team_id, created_at_utc, updated_at_utc FROM template \
                     WHERE team_id = $1 \
                       AND EXISTS (SELECT 1 FROM team_member m \
                                   WHERE m.team_id = $1 AND m.user_id = $2) \
                     ORDER BY created_at_utc DESC LIMIT $3 OFFSET $4",
                )
                .bind(team_id)
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| TemplateSummary {
                id: r.get("id"),
                title: r.get("title"),
                team_id: r.get("team_id"),
                created_at_utc: r.get("created_at_utc"),
                updated_at_utc: r.get("updated_at_utc"),
            })
            .collect())
    }

    async fn duplicate(
        &self,
        id: Uuid,
        access: &TemplateAccess,
    ) -> Result<TemplateWithRecipients> {
        let start = Instant::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Source template, scoped by ownership/membership; a miss on either
        // predicate is reported as not-found.
        let source = Self::fetch_scoped_tx(&mut tx, id, access)
            .await?
            .ok_or(Error::TemplateNotFound(id))?;

        let data_row = sqlx::query(
            "SELECT id, data_type, data, initial_data FROM document_data WHERE id = $1",
        )
        .bind(source.document_data_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let source_data = row_to_document_data(&data_row)?;

        let source_meta = Self::fetch_meta_tx(&mut tx, source.id).await?;
        let source_recipients = recipients::list_for_template_tx(&mut tx, source.id).await?;
        let source_fields = fields::list_for_template_tx(&mut tx, source.id).await?;

        // Clone the payload by value into a brand-new row.
        let document_data = PgDocumentDataRepository::insert_tx(
            &mut tx,
            &sigil_core::CreateDocumentDataRequest {
                data_type: source_data.data_type,
                data: source_data.data,
                initial_data: source_data.initial_data,
            },
        )
        .await?;

        let template =
            Self::insert_row_tx(&mut tx, access, &copy_title(&source.title), document_data.id)
                .await?;

        if let Some(meta) = &source_meta {
            Self::insert_meta_tx(&mut tx, template.id, &clone_meta_request(meta)).await?;
        }

        // Clone recipients with fresh tokens, recording old id → new id so
        // fields can be rewritten without relying on email uniqueness.
        let mut id_map = HashMap::with_capacity(source_recipients.len());
        let mut created = Vec::with_capacity(source_recipients.len());
        for recipient in &source_recipients {
            let clone = recipients::insert_recipient_tx(
                &mut tx,
                template.id,
                &recipient.email,
                &recipient.name,
            )
            .await?;
            id_map.insert(recipient.id, clone.id);
            created.push(clone);
        }

        let field_requests = map_fields_to_new_recipients(&source_fields, &id_map)?;
        fields::insert_fields_tx(&mut tx, template.id, &field_requests).await?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "templates",
            op = "duplicate",
            template_id = %source.id,
            user_id = %access.user_id(),
            recipient_count = created.len(),
            field_count = field_requests.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Template duplicated"
        );

        Ok(TemplateWithRecipients {
            template,
            recipients: created,
        })
    }

    async fn delete(&self, id: Uuid, access: &TemplateAccess) -> Result<()> {
        let result = match access {
            TemplateAccess::Personal { user_id } => {
                sqlx::query(
                    "DELETE FROM template WHERE id = $1 AND user_id = $2 AND team_id IS NULL",
                )
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await
            }
            TemplateAccess::Team { user_id, team_id } => {
                sqlx::query(
                    "DELETE FROM template WHERE id = $1 AND team_id = $2 \
                       AND EXISTS (SELECT 1 FROM team_member m \
                                   WHERE m.team_id = $2 AND m.user_id = $3)",
                )
                .bind(id)
                .bind(team_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::TemplateNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_core::FieldType;

    fn sample_field(recipient_id: Uuid) -> Field {
        Field {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            recipient_id,
            field_type: FieldType::Signature,
            page: 1,
            position_x: 10.0,
            position_y: 20.0,
            width: 5.0,
            height: 5.0,
            custom_text: String::new(),
            inserted: false,
        }
    }

    #[test]
    fn test_copy_title() {
        assert_eq!(copy_title("Contract"), "Contract (copy)");
        // Re-duplicating a copy stacks the suffix, matching the create rule.
        assert_eq!(copy_title("Contract (copy)"), "Contract (copy) (copy)");
    }

    #[test]
    fn test_map_fields_rewrites_recipient_ids() {
        let old_recipient = Uuid::new_v4();
        let new_recipient = Uuid::new_v4();
        let mut id_map = HashMap::new();
        id_map.insert(old_recipient, new_recipient);

        let source = sample_field(old_recipient);
        let mapped = map_fields_to_new_recipients(&[source.clone()], &id_map).unwrap();

        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].recipient_id, new_recipient);
        assert_eq!(mapped[0].field_type, source.field_type);
        assert_eq!(mapped[0].page, source.page);
        assert_eq!(mapped[0].position_x, source.position_x);
        assert_eq!(mapped[0].position_y, source.position_y);
        assert_eq!(mapped[0].width, source.width);
        assert_eq!(mapped[0].height, source.height);
        assert_eq!(mapped[0].custom_text, source.custom_text);
        assert_eq!(mapped[0].inserted, source.inserted);
    }

    #[test]
    fn test_map_fields_unresolvable_recipient_fails() {
        let orphan = Uuid::new_v4();
        let err = map_fields_to_new_recipients(&[sample_field(orphan)], &HashMap::new())
            .unwrap_err();

        match err {
            Error::RecipientNotFound(id) => assert_eq!(id, orphan),
            other => panic!("Expected RecipientNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_map_fields_duplicate_emails_resolve_by_id() {
        // Two source recipients may share an email; the id map keeps their
        // fields attached to the right clone.
        let old_a = Uuid::new_v4();
        let old_b = Uuid::new_v4();
        let new_a = Uuid::new_v4();
        let new_b = Uuid::new_v4();
        let id_map = HashMap::from([(old_a, new_a), (old_b, new_b)]);

        let mapped =
            map_fields_to_new_recipients(&[sample_field(old_a), sample_field(old_b)], &id_map)
                .unwrap();

        assert_eq!(mapped[0].recipient_id, new_a);
        assert_eq!(mapped[1].recipient_id, new_b);
    }

    #[test]
    fn test_map_fields_empty_input() {
        let mapped = map_fields_to_new_recipients(&[], &HashMap::new()).unwrap();
        assert!(mapped.is_empty());
    }

    #[test]
    fn test_clone_meta_copies_settings_fields() {
        let meta = TemplateMeta {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            subject: Some("Please sign".to_string()),
            message: Some("Attached for signature".to_string()),
            timezone: Some("Europe/Berlin".to_string()),
            date_format: Some("yyyy-MM-dd".to_string()),
            redirect_url: None,
            email_settings: Some(serde_json::json!({"recipientSigned": false})),
        };

        let req = clone_meta_request(&meta);
        assert_eq!(req.subject, meta.subject);
        assert_eq!(req.message, meta.message);
        assert_eq!(req.timezone, meta.timezone);
        assert_eq!(req.date_format, meta.date_format);
        assert_eq!(req.redirect_url, meta.redirect_url);
        assert_eq!(req.email_settings, meta.email_settings);
    }

    #[test]
    fn test_clone_meta_omits_empty_email_settings() {
        let base = TemplateMeta {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            subject: None,
            message: None,
            timezone: None,
            date_format: None,
            redirect_url: None,
            email_settings: Some(JsonValue::Null),
        };
        assert_eq!(clone_meta_request(&base).email_settings, None);

        let empty_object = TemplateMeta {
            email_settings: Some(serde_json::json!({})),
            ..base
        };
        assert_eq!(clone_meta_request(&empty_object).email_settings, None);
    }
}
