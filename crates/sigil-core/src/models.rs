//! Core data models for sigil.
//!
//! These types are shared across all sigil crates and represent the
//! template-subsystem domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// DOCUMENT DATA
// =============================================================================

/// Storage tag for an opaque document payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentDataType {
    /// Payload is a path into object storage.
    S3Path,
    /// Payload is raw bytes stored inline.
    Bytes,
    /// Payload is base64-encoded bytes stored inline.
    #[serde(rename = "bytes_64")]
    Bytes64,
}

/// The underlying opaque document payload a template wraps.
///
/// `data` and `initial_data` are opaque to this service; their
/// interpretation is governed by `data_type`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DocumentData {
    pub id: Uuid,
    pub data_type: DocumentDataType,
    pub data: String,
    pub initial_data: String,
}

/// Request for creating a document payload row.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateDocumentDataRequest {
    pub data_type: DocumentDataType,
    pub data: String,
    pub initial_data: String,
}

// =============================================================================
// TEMPLATE
// =============================================================================

/// A reusable document blueprint containing placeholder fields and
/// recipient slots, not yet bound to a signed document instance.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Template {
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Owning team, if the template lives in a team workspace.
    pub team_id: Option<Uuid>,
    pub title: String,
    /// The document payload this template wraps.
    pub document_data_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Lightweight template row for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TemplateSummary {
    pub id: Uuid,
    pub title: String,
    pub team_id: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Auxiliary settings associated 1:1 with a template.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TemplateMeta {
    pub id: Uuid,
    pub template_id: Uuid,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub timezone: Option<String>,
    pub date_format: Option<String>,
    pub redirect_url: Option<String>,
    /// Per-template notification email toggles. `None` means "inherit
    /// platform defaults"; an empty object is normalized to `None`.
    pub email_settings: Option<JsonValue>,
}

/// Creation payload for a template meta row (identity fields assigned fresh).
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateTemplateMetaRequest {
    pub subject: Option<String>,
    pub message: Option<String>,
    pub timezone: Option<String>,
    pub date_format: Option<String>,
    pub redirect_url: Option<String>,
    pub email_settings: Option<JsonValue>,
}

/// Request for creating a new template with its payload, recipients, and
/// optional settings in one unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateTemplateRequest {
    pub title: String,
    pub document_data: CreateDocumentDataRequest,
    #[serde(default)]
    pub recipients: Vec<CreateRecipientRequest>,
    pub meta: Option<CreateTemplateMetaRequest>,
}

/// A template together with its recipients (the duplicate-response shape).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TemplateWithRecipients {
    #[serde(flatten)]
    pub template: Template,
    pub recipients: Vec<Recipient>,
}

/// A template with every related record eagerly loaded.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TemplateWithRelations {
    #[serde(flatten)]
    pub template: Template,
    pub document_data: DocumentData,
    pub meta: Option<TemplateMeta>,
    pub recipients: Vec<Recipient>,
    pub fields: Vec<Field>,
}

// =============================================================================
// RECIPIENT
// =============================================================================

/// A party assigned to a template, identified primarily by email, who will
/// later be asked to fill fields.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Recipient {
    pub id: Uuid,
    pub template_id: Uuid,
    pub email: String,
    pub name: String,
    /// Signing access token. Generated fresh on every create; a duplicated
    /// recipient never inherits the source token.
    pub token: String,
    pub created_at_utc: DateTime<Utc>,
}

/// Request for creating a recipient slot on a template.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateRecipientRequest {
    pub email: String,
    pub name: String,
}

// =============================================================================
// FIELD
// =============================================================================

/// Kind of placeholder a field renders on the document page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Signature,
    FreeSignature,
    Initials,
    Name,
    Email,
    Date,
    Text,
}

/// A placeholder region on a template page assigned to one recipient,
/// carrying geometry and content.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Field {
    pub id: Uuid,
    pub template_id: Uuid,
    pub recipient_id: Uuid,
    pub field_type: FieldType,
    pub page: i32,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    pub custom_text: String,
    /// Whether the field has been filled in.
    pub inserted: bool,
}

/// Request for creating a field on a template.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateFieldRequest {
    pub recipient_id: Uuid,
    pub field_type: FieldType,
    pub page: i32,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub custom_text: String,
    #[serde(default)]
    pub inserted: bool,
}

// =============================================================================
// TEAMS
// =============================================================================

/// A team workspace that can own templates.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub created_at_utc: DateTime<Utc>,
}

/// Request for creating a team.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateTeamRequest {
    pub name: String,
    /// The creating user becomes the first member.
    pub owner_user_id: Uuid,
}

// =============================================================================
// ACCESS CONTEXT
// =============================================================================

/// The caller's template-access context.
///
/// Present/absent team context changes both the authorization predicate and
/// the ownership of rows created on the caller's behalf, so the two paths
/// are modeled as explicit variants rather than an optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateAccess {
    /// Templates owned directly by the user, with no team association.
    Personal { user_id: Uuid },
    /// Templates owned by a team the user must be a member of.
    Team { user_id: Uuid, team_id: Uuid },
}

impl TemplateAccess {
    /// Build an access context from the wire shape (`user_id` + optional
    /// `team_id`).
    pub fn for_user(user_id: Uuid, team_id: Option<Uuid>) -> Self {
        match team_id {
            Some(team_id) => TemplateAccess::Team { user_id, team_id },
            None => TemplateAccess::Personal { user_id },
        }
    }

    /// The authenticated user this context acts for.
    pub fn user_id(&self) -> Uuid {
        match self {
            TemplateAccess::Personal { user_id } => *user_id,
            TemplateAccess::Team { user_id, .. } => *user_id,
        }
    }

    /// The owning team, if this is a team context.
    pub fn team_id(&self) -> Option<Uuid> {
        match self {
            TemplateAccess::Personal { .. } => None,
            TemplateAccess::Team { team_id, .. } => Some(*team_id),
        }
    }
}

/// Request for listing templates.
#[derive(Debug, Clone, Default)]
pub struct ListTemplatesRequest {
    /// Maximum results
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}
