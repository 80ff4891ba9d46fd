//! Campaign content API endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{authorize_account, ApiResult};
use crate::auth::AccessClaims;
use crate::db::ContentSaveSummary;
use crate::errors::AppError;
use crate::models::{CampaignContentResponse, ContentRequest};
use crate::AppState;

/// GET /accounts/{accountName}/campaigns/{campaignId}/content
pub async fn get_campaign_content(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path((account_name, campaign_id)): Path<(String, i64)>,
) -> ApiResult<Json<CampaignContentResponse>> {
    authorize_account(&claims, &account_name)?;

    let content = state
        .repo
        .get_campaign_content(&account_name, campaign_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Content of campaign {} not found", campaign_id))
        })?;

    Ok(Json(CampaignContentResponse::from(&content)))
}

/// PUT /accounts/{accountName}/campaigns/{campaignId}/content
pub async fn put_campaign_content(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path((account_name, campaign_id)): Path<(String, i64)>,
    Json(request): Json<ContentRequest>,
) -> ApiResult<Json<ContentSaveSummary>> {
    authorize_account(&claims, &account_name)?;

    let content = request.into_variant()?;
    let summary = state
        .repo
        .save_campaign_content(&account_name, campaign_id, &content)
        .await?;

    Ok(Json(summary))
}

/// POST /accounts/{accountName}/campaigns/{campaignId}/content/from-template/{templateId}
pub async fn create_campaign_content_from_template(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path((account_name, campaign_id, template_id)): Path<(String, i64, i64)>,
) -> ApiResult<Json<ContentSaveSummary>> {
    authorize_account(&claims, &account_name)?;

    let summary = state
        .repo
        .create_campaign_content_from_template(&account_name, campaign_id, template_id)
        .await?;

    Ok(Json(summary))
}
