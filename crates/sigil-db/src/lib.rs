//! # sigil-db
//!
//! PostgreSQL database layer for sigil.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for templates, document payloads, and teams
//! - The transactional template duplication operation
//!
//! ## Example
//!
//! ```rust,ignore
//! use sigil_db::Database;
//! use sigil_core::{TemplateAccess, TemplateRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/sigil").await?;
//!
//!     let access = TemplateAccess::for_user(user_id, None);
//!     let copy = db.templates.duplicate(template_id, &access).await?;
//!
//!     println!("Created template: {}", copy.template.id);
//!     Ok(())
//! }
//! ```

pub mod document_data;
mod fields;
pub mod pool;
mod recipients;
pub mod teams;
pub mod templates;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use sigil_core::*;

// Re-export repository implementations
pub use document_data::PgDocumentDataRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use teams::PgTeamRepository;
pub use templates::PgTemplateRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Template repository (CRUD + duplication).
    pub templates: PgTemplateRepository,
    /// Document payload repository.
    pub document_data: PgDocumentDataRepository,
    /// Team and membership repository.
    pub teams: PgTeamRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            templates: PgTemplateRepository::new(pool.clone()),
            document_data: PgDocumentDataRepository::new(pool.clone()),
            teams: PgTeamRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
