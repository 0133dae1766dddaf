//! Recipient row helpers.
//!
//! Recipients are always created as part of a template write, so this module
//! only exposes transaction-aware helpers plus read queries; there is no
//! standalone recipient repository.

use chrono::Utc;
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use sigil_core::{generate_recipient_token, new_v7, Error, Recipient, Result};

const COLUMNS: &str = "id, template_id, email, name, token, created_at_utc";

fn row_to_recipient(row: &sqlx::postgres::PgRow) -> Recipient {
    Recipient {
        id: row.get("id"),
        template_id: row.get("template_id"),
        email: row.get("email"),
        name: row.get("name"),
        token: row.get("token"),
        created_at_utc: row.get("created_at_utc"),
    }
}

/// Insert one recipient slot with a freshly generated signing token.
pub(crate) async fn insert_recipient_tx(
    tx: &mut Transaction<'_, Postgres>,
    template_id: Uuid,
    email: &str,
    name: &str,
) -> Result<Recipient> {
    let id = new_v7();
    let token = generate_recipient_token();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO recipient (id, template_id, email, name, token, created_at_utc)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(template_id)
    .bind(email)
    .bind(name)
    .bind(&token)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(Error::Database)?;

    Ok(Recipient {
        id,
        template_id,
        email: email.to_string(),
        name: name.to_string(),
        token,
        created_at_utc: now,
    })
}

/// List a template's recipients within an existing transaction.
pub(crate) async fn list_for_template_tx(
    tx: &mut Transaction<'_, Postgres>,
    template_id: Uuid,
) -> Result<Vec<Recipient>> {
    let query = format!(
        "SELECT {COLUMNS} FROM recipient WHERE template_id = $1 ORDER BY id"
    );
    let rows = sqlx::query(&query)
        .bind(template_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

    Ok(rows.iter().map(row_to_recipient).collect())
}
