//! Field row helpers.
//!
//! Like recipients, fields live and die with their template; this module
//! provides transaction-aware writes and read queries used by the template
//! repository.

use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use sigil_core::{new_v7, CreateFieldRequest, Error, Field, FieldType, Result};

const COLUMNS: &str = "id, template_id, recipient_id, field_type, page, \
     position_x, position_y, width, height, custom_text, inserted";

/// Convert FieldType to its database string.
pub(crate) fn field_type_to_str(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Signature => "signature",
        FieldType::FreeSignature => "free_signature",
        FieldType::Initials => "initials",
        FieldType::Name => "name",
        FieldType::Email => "email",
        FieldType::Date => "date",
        FieldType::Text => "text",
    }
}

/// Convert a database string to FieldType.
pub(crate) fn str_to_field_type(s: &str) -> Result<FieldType> {
    match s {
        "signature" => Ok(FieldType::Signature),
        "free_signature" => Ok(FieldType::FreeSignature),
        "initials" => Ok(FieldType::Initials),
        "name" => Ok(FieldType::Name),
        "email" => Ok(FieldType::Email),
        "date" => Ok(FieldType::Date),
        "text" => Ok(FieldType::Text),
        other => Err(Error::Internal(format!(
            "Unknown field type in database: {}",
            other
        ))),
    }
}

fn row_to_field(row: &sqlx::postgres::PgRow) -> Result<Field> {
    Ok(Field {
        id: row.get("id"),
        template_id: row.get("template_id"),
        recipient_id: row.get("recipient_id"),
        field_type: str_to_field_type(row.get("field_type"))?,
        page: row.get("page"),
        position_x: row.get("position_x"),
        position_y: row.get("position_y"),
        width: row.get("width"),
        height: row.get("height"),
        custom_text: row.get("custom_text"),
        inserted: row.get("inserted"),
    })
}

/// Bulk-insert fields for a template within an existing transaction.
///
/// Uses a single multi-row INSERT via UNNEST so the fan-out stays one
/// round-trip regardless of field count.
pub(crate) async fn insert_fields_tx(
    tx: &mut Transaction<'_, Postgres>,
    template_id: Uuid,
    fields: &[CreateFieldRequest],
) -> Result<Vec<Uuid>> {
    if fields.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = fields.iter().map(|_| new_v7()).collect();
    let recipient_ids: Vec<Uuid> = fields.iter().map(|f| f.recipient_id).collect();
    let field_types: Vec<String> = fields
        .iter()
        .map(|f| field_type_to_str(f.field_type).to_string())
        .collect();
    let pages: Vec<i32> = fields.iter().map(|f| f.page).collect();
    let xs: Vec<f64> = fields.iter().map(|f| f.position_x).collect();
    let ys: Vec<f64> = fields.iter().map(|f| f.position_y).collect();
    let widths: Vec<f64> = fields.iter().map(|f| f.width).collect();
    let heights: Vec<f64> = fields.iter().map(|f| f.height).collect();
    let custom_texts: Vec<String> = fields.iter().map(|f| f.custom_text.clone()).collect();
    let inserteds: Vec<bool> = fields.iter().map(|f| f.inserted).collect();

    sqlx::query(
        r#"
        INSERT INTO field (id, template_id, recipient_id, field_type, page,
                           position_x, position_y, width, height, custom_text, inserted)
        SELECT t.id, $2, t.recipient_id, t.field_type, t.page,
               t.position_x, t.position_y, t.width, t.height, t.custom_text, t.inserted
        FROM UNNEST(
            $1::uuid[], $3::uuid[], $4::text[], $5::int4[],
            $6::float8[], $7::float8[], $8::float8[], $9::float8[],
            $10::text[], $11::bool[]
        ) AS t(id, recipient_id, field_type, page,
               position_x, position_y, width, height, custom_text, inserted)
        "#,
    )
    .bind(&ids)
    .bind(template_id)
    .bind(&recipient_ids)
    .bind(&field_types)
    .bind(&pages)
    .bind(&xs)
    .bind(&ys)
    .bind(&widths)
    .bind(&heights)
    .bind(&custom_texts)
    .bind(&inserteds)
    .execute(&mut **tx)
    .await
    .map_err(Error::Database)?;

    Ok(ids)
}

/// List a template's fields within an existing transaction.
pub(crate) async fn list_for_template_tx(
    tx: &mut Transaction<'_, Postgres>,
    template_id: Uuid,
) -> Result<Vec<Field>> {
    let query = format!("SELECT {COLUMNS} FROM field WHERE template_id = $1 ORDER BY id");
    let rows = sqlx::query(&query)
        .bind(template_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

    rows.iter().map(row_to_field).collect()
}
