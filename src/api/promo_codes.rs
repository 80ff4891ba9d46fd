//! Promo code API endpoints.
//!
//! Promo codes hang off a campaign; the campaign must belong to the account in the path.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::{authorize_account, own_campaign, ApiResult};
use crate::auth::AccessClaims;
use crate::errors::AppError;
use crate::models::{CreatedResource, PromoCodeModel, PromoCodeRequest};
use crate::AppState;

/// POST /accounts/{accountName}/campaigns/{campaignId}/content/promo-codes
pub async fn create_promo_code(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path((account_name, campaign_id)): Path<(String, i64)>,
    Json(request): Json<PromoCodeRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResource>)> {
    authorize_account(&claims, &account_name)?;
    own_campaign(&state, &account_name, campaign_id).await?;

    let promo_code = request.into_model(campaign_id, 0)?;
    let promo_code_id = state.repo.create_promo_code(&promo_code).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResource {
            created_resource_id: promo_code_id,
        }),
    ))
}

/// GET /accounts/{accountName}/campaigns/{campaignId}/content/promo-codes/{promoCodeId}
pub async fn get_promo_code(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path((account_name, campaign_id, promo_code_id)): Path<(String, i64, i64)>,
) -> ApiResult<Json<PromoCodeModel>> {
    authorize_account(&claims, &account_name)?;
    own_campaign(&state, &account_name, campaign_id).await?;

    let promo_code = state
        .repo
        .get_promo_code(campaign_id, promo_code_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Promo code {} not found", promo_code_id))
        })?;

    Ok(Json(promo_code))
}

/// PUT /accounts/{accountName}/campaigns/{campaignId}/content/promo-codes/{promoCodeId}
pub async fn update_promo_code(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path((account_name, campaign_id, promo_code_id)): Path<(String, i64, i64)>,
    Json(request): Json<PromoCodeRequest>,
) -> ApiResult<StatusCode> {
    authorize_account(&claims, &account_name)?;
    own_campaign(&state, &account_name, campaign_id).await?;

    let promo_code = request.into_model(campaign_id, promo_code_id)?;
    state.repo.update_promo_code(&promo_code).await?;

    Ok(StatusCode::OK)
}
