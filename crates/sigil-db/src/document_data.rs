//! Document payload repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use sigil_core::{
    new_v7, CreateDocumentDataRequest, DocumentData, DocumentDataType, DocumentDataRepository,
    Error, Result,
};

/// Convert DocumentDataType to its database string.
pub(crate) fn data_type_to_str(data_type: DocumentDataType) -> &'static str {
    match data_type {
        DocumentDataType::S3Path => "s3_path",
        DocumentDataType::Bytes => "bytes",
        DocumentDataType::Bytes64 => "bytes_64",
    }
}

/// Convert a database string to DocumentDataType.
pub(crate) fn str_to_data_type(s: &str) -> Result<DocumentDataType> {
    match s {
        "s3_path" => Ok(DocumentDataType::S3Path),
        "bytes" => Ok(DocumentDataType::Bytes),
        "bytes_64" => Ok(DocumentDataType::Bytes64),
        other => Err(Error::Internal(format!(
            "Unknown document data type in database: {}",
            other
        ))),
    }
}

pub(crate) fn row_to_document_data(row: &sqlx::postgres::PgRow) -> Result<DocumentData> {
    Ok(DocumentData {
        id: row.get("id"),
        data_type: str_to_data_type(row.get("data_type"))?,
        data: row.get("data"),
        initial_data: row.get("initial_data"),
    })
}

/// PostgreSQL implementation of DocumentDataRepository.
pub struct PgDocumentDataRepository {
    pool: PgPool,
}

impl PgDocumentDataRepository {
    /// Create a new PgDocumentDataRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a payload row within an existing transaction.
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        req: &CreateDocumentDataRequest,
    ) -> Result<DocumentData> {
        let id = new_v7();

        sqlx::query(
            r#"
            INSERT INTO document_data (id, data_type, data, initial_data)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(data_type_to_str(req.data_type))
        .bind(&req.data)
        .bind(&req.initial_data)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(DocumentData {
            id,
            data_type: req.data_type,
            data: req.data.clone(),
            initial_data: req.initial_data.clone(),
        })
    }
}

#[async_trait]
impl DocumentDataRepository for PgDocumentDataRepository {
    async fn insert(&self, req: CreateDocumentDataRequest) -> Result<DocumentData> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let data = Self::insert_tx(&mut tx, &req).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(data)
    }

    async fn fetch(&self, id: Uuid) -> Result<DocumentData> {
        let row = sqlx::query(
            r#"
            SELECT id, data_type, data, initial_data
            FROM document_data
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("Document data {} not found", id)))?;

        row_to_document_data(&row)
    }
}
