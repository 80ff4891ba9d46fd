//! Campaign content models and the writability rule.

use serde::Serialize;

use super::{ContentBody, ContentVariant};

/// Status codes whose campaigns may still be edited: draft and in winner-selection.
///
/// The codes are not contiguous. A status missing from this list is read only.
pub const WRITABLE_CAMPAIGN_STATUSES: [i32; 3] = [1, 11, 18];

/// Editing step recorded on a campaign once its content has been saved.
pub const CONTENT_EDITED_STEP: i32 = 2;

/// Whether a campaign in the given situation accepts content changes.
///
/// Content existence does not matter: a campaign without content yet is writable.
pub fn evaluate_writability(
    own_campaign_exists: bool,
    _content_exists: bool,
    status: Option<i32>,
) -> bool {
    if !own_campaign_exists {
        return false;
    }
    match status {
        Some(code) => WRITABLE_CAMPAIGN_STATUSES.contains(&code),
        None => false,
    }
}

/// Derived state of a campaign, computed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignState {
    pub own_campaign_exists: bool,
    pub content_exists: bool,
    pub editor_type: Option<i32>,
    pub is_writable: bool,
}

impl CampaignState {
    /// State for a campaign id that does not exist or belongs to another account.
    pub fn not_found() -> Self {
        Self::evaluate(false, false, None, None)
    }

    pub fn evaluate(
        own_campaign_exists: bool,
        content_exists: bool,
        editor_type: Option<i32>,
        status: Option<i32>,
    ) -> Self {
        Self {
            own_campaign_exists,
            content_exists,
            editor_type,
            is_writable: evaluate_writability(own_campaign_exists, content_exists, status),
        }
    }
}

/// Content of a campaign together with its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignContentModel {
    pub campaign_id: i64,
    pub state: CampaignState,
    pub content: ContentVariant,
}

/// Campaign columns touched after a content save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignStatusUpdate {
    pub current_step: i32,
    pub editor_type: i32,
    pub preview_image: Option<String>,
}

/// Response for GET campaign content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignContentResponse {
    pub campaign_id: i64,
    pub read_only: bool,
    #[serde(flatten)]
    pub content: ContentBody,
}

impl From<&CampaignContentModel> for CampaignContentResponse {
    fn from(model: &CampaignContentModel) -> Self {
        Self {
            campaign_id: model.campaign_id,
            read_only: !model.state.is_writable,
            content: ContentBody::from(&model.content),
        }
    }
}
