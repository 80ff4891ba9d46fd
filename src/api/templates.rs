//! Template API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::{authorize_account, ApiResult};
use crate::auth::AccessClaims;
use crate::errors::AppError;
use crate::models::{CreatedResource, TemplateModel, TemplateRequest, TemplateResponse};
use crate::AppState;

/// GET /accounts/{accountName}/templates/{templateId}
pub async fn get_template(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path((account_name, template_id)): Path<(String, i64)>,
) -> ApiResult<Json<TemplateResponse>> {
    authorize_account(&claims, &account_name)?;

    let template = state
        .repo
        .get_template(&account_name, template_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {} not found", template_id)))?;

    Ok(Json(TemplateResponse::from(&template)))
}

/// POST /accounts/{accountName}/templates
pub async fn create_template(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(account_name): Path<String>,
    Json(request): Json<TemplateRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResource>)> {
    authorize_account(&claims, &account_name)?;

    let (name, content) = request.into_parts()?;
    let template_id = state
        .repo
        .create_template(&account_name, &name, &content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResource {
            created_resource_id: template_id,
        }),
    ))
}

/// PUT /accounts/{accountName}/templates/{templateId}
pub async fn update_template(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path((account_name, template_id)): Path<(String, i64)>,
    Json(request): Json<TemplateRequest>,
) -> ApiResult<StatusCode> {
    authorize_account(&claims, &account_name)?;

    let (name, content) = request.into_parts()?;
    let template = TemplateModel {
        id: template_id,
        account_name: Some(account_name.clone()),
        is_public: false,
        name,
        content,
    };
    state.repo.update_template(&account_name, &template).await?;

    Ok(StatusCode::OK)
}
