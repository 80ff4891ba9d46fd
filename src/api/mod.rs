//! REST API module.
//!
//! Every route is scoped to an account; handlers authorize the caller against that
//! account before touching the repository.

mod campaigns;
mod promo_codes;
mod templates;

pub use campaigns::*;
pub use promo_codes::*;
pub use templates::*;

use crate::auth::{authorize, AccessClaims, AccessPolicy};
use crate::errors::AppError;
use crate::models::CampaignState;
use crate::AppState;

/// Handler result; errors render as the JSON error envelope.
pub type ApiResult<T> = Result<T, AppError>;

/// Policy shared by all account routes.
const ACCOUNT_POLICY: AccessPolicy = AccessPolicy::OWN_RESOURCE_OR_SUPER_USER;

fn authorize_account(claims: &AccessClaims, account_name: &str) -> ApiResult<()> {
    authorize(claims, ACCOUNT_POLICY, account_name)
}

/// Campaign state of a campaign the account owns, or 404.
async fn own_campaign(
    state: &AppState,
    account_name: &str,
    campaign_id: i64,
) -> ApiResult<CampaignState> {
    let campaign = state
        .repo
        .get_campaign_state(account_name, campaign_id)
        .await?;
    if !campaign.own_campaign_exists {
        return Err(AppError::NotFound(format!(
            "Campaign {} not found",
            campaign_id
        )));
    }
    Ok(campaign)
}
