//! Core traits for sigil abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

/// Repository for template operations.
///
/// Every read and write is scoped by a [`TemplateAccess`] context. A template
/// the caller is not authorized to see behaves exactly like one that does not
/// exist.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Create a template with its document payload, recipient slots, and
    /// optional settings, in a single transaction.
    async fn insert(
        &self,
        access: &TemplateAccess,
        req: CreateTemplateRequest,
    ) -> Result<TemplateWithRecipients>;

    /// Fetch a template with all related records eagerly loaded.
    async fn fetch(&self, id: Uuid, access: &TemplateAccess) -> Result<TemplateWithRelations>;

    /// List templates visible in the given access context.
    async fn list(
        &self,
        access: &TemplateAccess,
        req: ListTemplatesRequest,
    ) -> Result<Vec<TemplateSummary>>;

    /// Deep-copy a template: payload, settings, recipients (fresh tokens),
    /// and fields, all inside one transaction. Returns the new template with
    /// its newly created recipients.
    async fn duplicate(&self, id: Uuid, access: &TemplateAccess)
        -> Result<TemplateWithRecipients>;

    /// Delete a template. Related rows cascade.
    async fn delete(&self, id: Uuid, access: &TemplateAccess) -> Result<()>;
}

/// Repository for opaque document payload rows.
#[async_trait]
pub trait DocumentDataRepository: Send + Sync {
    /// Insert a new payload row.
    async fn insert(&self, req: CreateDocumentDataRequest) -> Result<DocumentData>;

    /// Fetch a payload row by id.
    async fn fetch(&self, id: Uuid) -> Result<DocumentData>;
}

/// Repository for teams and memberships.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create a team; the owner becomes its first member.
    async fn create(&self, req: CreateTeamRequest) -> Result<Team>;

    /// Add a user to a team. Idempotent.
    async fn add_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()>;

    /// Remove a user from a team.
    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()>;

    /// Whether the user is a member of the team.
    async fn is_member(&self, team_id: Uuid, user_id: Uuid) -> Result<bool>;
}
