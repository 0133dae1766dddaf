//! Template HTTP handlers.
//!
//! The caller's identity arrives as an explicit `user_id` (plus optional
//! `team_id`) supplied by the enclosing gateway, which has already
//! authenticated the session. Present/absent `team_id` selects the
//! personal or team authorization path.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiError, AppState};
use sigil_core::{
    CreateTemplateRequest, ListTemplatesRequest, TemplateAccess, TemplateRepository,
    TemplateSummary, TemplateWithRecipients, TemplateWithRelations,
};

/// Identity/scope parameters accepted by every template endpoint.
#[derive(Debug, Deserialize)]
pub struct AccessParams {
    pub user_id: Uuid,
    pub team_id: Option<Uuid>,
}

impl AccessParams {
    fn access(&self) -> TemplateAccess {
        TemplateAccess::for_user(self.user_id, self.team_id)
    }
}

/// Query parameters for listing templates.
#[derive(Debug, Deserialize)]
pub struct ListTemplatesQuery {
    pub user_id: Uuid,
    pub team_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for creating a template.
#[derive(Debug, Deserialize)]
pub struct CreateTemplateBody {
    pub user_id: Uuid,
    pub team_id: Option<Uuid>,
    #[serde(flatten)]
    pub template: CreateTemplateRequest,
}

/// List templates visible in the caller's context.
///
/// # Query Parameters
/// - `user_id`: acting user (required)
/// - `team_id`: team scope (optional)
/// - `limit` / `offset`: pagination
///
/// # Returns
/// - 200 OK with array of template summaries
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<Vec<TemplateSummary>>, ApiError> {
    let access = TemplateAccess::for_user(query.user_id, query.team_id);
    let templates = state
        .db
        .templates
        .list(
            &access,
            ListTemplatesRequest {
                limit: query.limit,
                offset: query.offset,
            },
        )
        .await?;
    Ok(Json(templates))
}

/// Create a new template with its payload, recipients, and settings.
///
/// # Returns
/// - 201 Created with the template and its recipients
/// - 403 Forbidden if `team_id` is given and the user is not a member
pub async fn create_template(
    State(state): State<AppState>,
    Json(body): Json<CreateTemplateBody>,
) -> Result<(StatusCode, Json<TemplateWithRecipients>), ApiError> {
    let access = TemplateAccess::for_user(body.user_id, body.team_id);
    let created = state.db.templates.insert(&access, body.template).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch a template with all related records.
///
/// # Path Parameters
/// - `id`: template id
///
/// # Returns
/// - 200 OK with the template, payload, meta, recipients, and fields
/// - 404 Not Found if the template doesn't exist or is out of scope
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<AccessParams>,
) -> Result<Json<TemplateWithRelations>, ApiError> {
    let template = state.db.templates.fetch(id, &params.access()).await?;
    Ok(Json(template))
}

/// Duplicate a template.
///
/// Deep-copies the payload, settings, recipients (with fresh signing
/// tokens), and fields into a new template titled `<source> (copy)`,
/// owned by the caller's context.
///
/// # Path Parameters
/// - `id`: source template id
///
/// # Returns
/// - 201 Created with the new template and its recipients
/// - 404 Not Found if the source doesn't exist or is out of scope
pub async fn duplicate_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AccessParams>,
) -> Result<(StatusCode, Json<TemplateWithRecipients>), ApiError> {
    let copy = state.db.templates.duplicate(id, &body.access()).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// Delete a template. Related rows cascade.
///
/// # Returns
/// - 204 No Content on success
/// - 404 Not Found if the template doesn't exist or is out of scope
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<AccessParams>,
) -> Result<StatusCode, ApiError> {
    state.db.templates.delete(id, &params.access()).await?;
    Ok(StatusCode::NO_CONTENT)
}
